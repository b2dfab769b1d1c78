//! Row action configuration as supplied by the host

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use row_actions_common::error;

use crate::condition::Condition;
use crate::group::RlsConditions;
use crate::lenient;

/// Icon shown next to the action label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionIcon {
    Plus,
    Edit,
    Delete,
    Eye,
    Link,
    Check,
    Key,
    Tag,
    More,
    #[serde(other)]
    Unknown,
}

/// Visual emphasis of the action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStyle {
    #[default]
    Default,
    Primary,
    Danger,
    Success,
    Warning,
    #[serde(other)]
    Unknown,
}

/// Selection-state literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    All,
    Selected,
    Unselected,
    /// Any other literal; never matches
    Unrecognized(String),
}

impl SelectionState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "all" => Self::All,
            "selected" => Self::Selected,
            "unselected" => Self::Unselected,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Selected => "selected",
            Self::Unselected => "unselected",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn matches(&self, is_selected: bool) -> bool {
        match self {
            Self::All => true,
            Self::Selected => is_selected,
            Self::Unselected => !is_selected,
            Self::Unrecognized(_) => false,
        }
    }
}

impl Serialize for SelectionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Basic visibility gate: a selection literal or a structured condition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VisibilityCondition {
    Selection(SelectionState),
    Condition(Condition),
}

/// Falsy values mean "no gate"; other non-string, non-object values gate on an
/// empty condition, which always passes
fn visibility_condition<'de, D>(deserializer: D) -> Result<Option<VisibilityCondition>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(VisibilityCondition::Selection(SelectionState::parse(&s))),
        object @ Value::Object(_) => Some(VisibilityCondition::Condition(
            Condition::deserialize(&object).unwrap_or_else(|e| {
                warn!(error = %e, "treating malformed visibilityCondition as empty");
                Condition::default()
            }),
        )),
        _ => Some(VisibilityCondition::Condition(Condition::default())),
    })
}

/// One configured row action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfig {
    /// Unique within an action set
    #[serde(default, deserialize_with = "lenient::string")]
    pub key: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub label: String,
    #[serde(
        default,
        deserialize_with = "lenient::tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<ActionIcon>,
    #[serde(
        default,
        deserialize_with = "lenient::tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub style: Option<ActionStyle>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub tooltip: Option<String>,
    /// Allow-list of columns sent in the payload
    #[serde(
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub value_columns: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "visibility_condition",
        skip_serializing_if = "Option::is_none"
    )]
    pub visibility_condition: Option<VisibilityCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rls_visibility_conditions: Option<RlsConditions>,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub publish_event: bool,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub open_in_new_tab: bool,
}

impl ActionConfig {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            ..Self::default()
        }
    }

    /// Actions from a host-supplied list; entries that are not action objects
    /// are skipped so the rest of the list still renders
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        let Value::Array(items) = value else {
            warn!(value = %value, "ignoring action list that is not a list");
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match Self::deserialize(item) {
                Ok(action) => Some(action),
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed action");
                    None
                }
            })
            .collect()
    }

    /// Parse an action list from JSON text
    ///
    /// # Errors
    /// Returns `Error::JsonError` if the text is not JSON at all.
    pub fn list_from_json(text: &str) -> error::Result<Vec<Self>> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::list_from_value(&value))
    }

    #[must_use]
    pub fn with_selection(mut self, state: SelectionState) -> Self {
        self.visibility_condition = Some(VisibilityCondition::Selection(state));
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.visibility_condition = Some(VisibilityCondition::Condition(condition));
        self
    }

    #[must_use]
    pub fn with_rls_conditions(mut self, conditions: RlsConditions) -> Self {
        self.rls_visibility_conditions = Some(conditions);
        self
    }

    #[must_use]
    pub fn with_value_columns(mut self, columns: &[&str]) -> Self {
        self.value_columns = Some(columns.iter().map(ToString::to_string).collect());
        self
    }

    #[must_use]
    pub fn publishing(mut self) -> Self {
        self.publish_event = true;
        self
    }
}
