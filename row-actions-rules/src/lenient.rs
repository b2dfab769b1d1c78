//! Loose deserializers for host-supplied configuration
//!
//! Action configuration arrives from the host with little validation. Fields of
//! the wrong shape degrade to permissive defaults instead of failing the whole
//! action list.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::value::string_form;

/// Distinguishes an explicit `null` from a missing field (paired with `#[serde(default)]`)
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Any scalar as its display form; null and empty strings count as missing
pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(string_form(Some(&other)).into_owned()),
    })
}

/// Any scalar as its display form, empty when missing
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    optional_string(deserializer).map(Option::unwrap_or_default)
}

/// A string-tagged enum; a value of any other shape counts as missing
pub(crate) fn tag<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        text @ Value::String(_) => T::deserialize(text).ok(),
        other => {
            tracing::warn!(value = %other, "ignoring tag that is not a string");
            None
        }
    })
}

/// Truthiness of an arbitrary value
pub(crate) fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// A list of column names; anything other than a list counts as missing
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| string_form(Some(item)).into_owned())
                .collect(),
        ),
        Value::Null => None,
        other => {
            tracing::warn!(value = %other, "ignoring valueColumns that is not a list");
            None
        }
    })
}
