//! Common types for the row action engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally supplied RLS attributes, keyed by attribute name
pub type AttributeMap = serde_json::Map<String, serde_json::Value>;

/// One table record, keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Payload Types
// ============================================================================

/// Tag carried by every action payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    #[default]
    #[serde(rename = "table-action")]
    TableAction,
}

/// Identifier supplied by the host: either a number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostId {
    Number(serde_json::Number),
    Text(String),
}

/// Chart the rendered cell belongs to
pub type ChartId = HostId;

/// Row the rendered cell belongs to
pub type RowId = HostId;

impl From<&str> for HostId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for HostId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Payload handed to the host when a user invokes an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    pub action: PayloadKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<ChartId>,
    pub key: String,
    /// Always exactly one (possibly trimmed) row
    pub value: Vec<Row>,
    /// RLS attributes that made the action visible, only for publishing actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_rls_conditions: Option<AttributeMap>,
}

// ============================================================================
// Evaluation Types
// ============================================================================

/// Outcome of evaluating an action's grouped visibility conditions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResult {
    pub visible: bool,
    pub matching_conditions: AttributeMap,
}

impl VisibilityResult {
    /// Visible with no contributing attributes
    pub fn visible() -> Self {
        Self {
            visible: true,
            matching_conditions: AttributeMap::new(),
        }
    }

    /// Hidden; never carries partial matches
    pub fn hidden() -> Self {
        Self {
            visible: false,
            matching_conditions: AttributeMap::new(),
        }
    }

    /// Visible with the attributes that contributed to the result
    pub fn with_matches(matching_conditions: AttributeMap) -> Self {
        Self {
            visible: true,
            matching_conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_wire_shape() {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(7));

        let payload = ActionPayload {
            action: PayloadKind::TableAction,
            chart_id: Some(ChartId::from(42)),
            key: "edit".to_string(),
            value: vec![row],
            matching_rls_conditions: None,
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "action": "table-action",
                "chartId": 42,
                "key": "edit",
                "value": [{"id": 7}]
            })
        );
    }

    #[test]
    fn test_payload_with_matches() {
        let mut matches = AttributeMap::new();
        matches.insert("region".to_string(), json!("us"));

        let payload = ActionPayload {
            action: PayloadKind::TableAction,
            chart_id: Some(ChartId::from("chart-1")),
            key: "approve".to_string(),
            value: vec![Row::new()],
            matching_rls_conditions: Some(matches),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chartId"], json!("chart-1"));
        assert_eq!(json["matchingRlsConditions"], json!({"region": "us"}));
    }

    #[test]
    fn test_host_id_display() {
        assert_eq!(ChartId::from(12).to_string(), "12");
        assert_eq!(ChartId::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_hidden_result_has_no_matches() {
        let result = VisibilityResult::hidden();
        assert!(!result.visible);
        assert!(result.matching_conditions.is_empty());
    }
}
