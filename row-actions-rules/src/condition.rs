//! Single visibility conditions
//!
//! A condition compares either a row column or an RLS attribute against a
//! configured value. This path is permissive: a condition it cannot interpret
//! (no operator, no key, unknown operator) passes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use row_actions_common::types::Row;

use crate::attributes::AttributeSource;
use crate::lenient;
use crate::value::{in_list, is_nullish, numeric_like, string_form};

/// Where a condition reads its left-hand value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionSource {
    Column,
    Rls,
    Unknown,
}

impl<'de> Deserialize<'de> for ConditionSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if s == "column" => Self::Column,
            Value::String(s) if s == "rls" => Self::Rls,
            _ => Self::Unknown,
        })
    }
}

/// Comparison operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    IsNull,
    IsNotNull,
    In,
    NotIn,
    /// Kept verbatim so the RLS path can retry it case-insensitively
    Unknown(String),
}

impl Operator {
    /// Exact, case-sensitive match of the operator spelling
    pub fn parse(raw: &str) -> Self {
        match raw {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            "IS NULL" => Self::IsNull,
            "IS NOT NULL" => Self::IsNotNull,
            "IN" => Self::In,
            "NOT IN" => Self::NotIn,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Unknown(raw) => raw,
        }
    }

    /// Re-parse an unknown spelling in upper case (`in` -> `IN`)
    pub fn to_uppercase(&self) -> Self {
        match self {
            Self::Unknown(raw) => Self::parse(&raw.to_uppercase()),
            known => known.clone(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => Self::parse(&s),
            other => Self::Unknown(string_form(Some(&other)).into_owned()),
        })
    }
}

/// Column reference: a name, or a list whose first element is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColumnKey {
    Single(String),
    List(Vec<String>),
}

impl ColumnKey {
    /// The column actually read; empty names count as missing
    pub fn first(&self) -> Option<&str> {
        let name = match self {
            Self::Single(name) => Some(name.as_str()),
            Self::List(names) => names.first().map(String::as_str),
        };
        name.filter(|name| !name.is_empty())
    }
}

impl<'de> Deserialize<'de> for ColumnKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .map(|item| string_form(Some(item)).into_owned())
                    .collect(),
            ),
            other => Self::Single(string_form(Some(&other)).into_owned()),
        })
    }
}

/// One atomic visibility condition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ConditionSource>,
    #[serde(default, alias = "column", skip_serializing_if = "Option::is_none")]
    pub column_key: Option<ColumnKey>,
    #[serde(
        default,
        alias = "rlsKey",
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub attribute_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    /// `None` when the field is absent, `Some(Null)` for an explicit null
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

impl Condition {
    /// Condition on a row column
    pub fn column(column: &str, operator: Operator, value: Value) -> Self {
        Self {
            source: Some(ConditionSource::Column),
            column_key: Some(ColumnKey::Single(column.to_string())),
            operator: Some(operator),
            value: Some(value),
            ..Self::default()
        }
    }

    /// Condition on an RLS attribute
    pub fn attribute(key: &str, operator: Operator, value: Value) -> Self {
        Self {
            source: Some(ConditionSource::Rls),
            attribute_key: Some(key.to_string()),
            operator: Some(operator),
            value: Some(value),
            ..Self::default()
        }
    }

    /// The operator, unless missing or blank
    pub fn operator(&self) -> Option<&Operator> {
        self.operator
            .as_ref()
            .filter(|op| !matches!(op, Operator::Unknown(raw) if raw.is_empty()))
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column_key.as_ref().and_then(ColumnKey::first)
    }

    pub fn attribute_key(&self) -> Option<&str> {
        self.attribute_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Source on the single-condition path, where anything but `rls` reads a column
    pub fn single_source(&self) -> ConditionSource {
        match self.source {
            Some(ConditionSource::Rls) => ConditionSource::Rls,
            _ => ConditionSource::Column,
        }
    }

    /// Source inside RLS lists and groups, where anything but `column` reads an attribute
    pub fn grouped_source(&self) -> ConditionSource {
        match self.source {
            Some(ConditionSource::Column) => ConditionSource::Column,
            _ => ConditionSource::Rls,
        }
    }
}

/// Evaluates single conditions against a row or the attribute source
pub struct ConditionEvaluator<'a, S: AttributeSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: AttributeSource + ?Sized> ConditionEvaluator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Whether the row passes `condition`; absent or incomplete conditions pass
    pub fn evaluate(&self, condition: Option<&Condition>, row: &Row) -> bool {
        let Some(condition) = condition else {
            return true;
        };
        let Some(operator) = condition.operator() else {
            return true;
        };

        let attributes;
        let actual = match condition.single_source() {
            ConditionSource::Rls => {
                let Some(key) = condition.attribute_key() else {
                    return true;
                };
                attributes = self.source.resolve();
                attributes.get(key)
            }
            _ => {
                let Some(column) = condition.column_name() else {
                    return true;
                };
                row.get(column)
            }
        };

        compare(operator, actual, condition.value.as_ref())
    }
}

/// Full operator semantics: numeric when both sides are numeric-like, string
/// equality otherwise, ordering only between numbers, unknown operators pass
pub fn compare(operator: &Operator, actual: Option<&Value>, expected: Option<&Value>) -> bool {
    let numbers = numeric_like(actual).zip(numeric_like(expected));

    match operator {
        Operator::Eq => numbers.map_or_else(
            || string_form(actual) == string_form(expected),
            |(a, b)| a == b,
        ),
        Operator::Ne => numbers.map_or_else(
            || string_form(actual) != string_form(expected),
            |(a, b)| a != b,
        ),
        Operator::Gt => numbers.is_some_and(|(a, b)| a > b),
        Operator::Lt => numbers.is_some_and(|(a, b)| a < b),
        Operator::Ge => numbers.is_some_and(|(a, b)| a >= b),
        Operator::Le => numbers.is_some_and(|(a, b)| a <= b),
        Operator::IsNull => is_nullish(actual),
        Operator::IsNotNull => !is_nullish(actual),
        Operator::In => in_list(expected, actual),
        Operator::NotIn => !in_list(expected, actual),
        Operator::Unknown(_) => true,
    }
}
