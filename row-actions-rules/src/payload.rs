//! Action invocation payloads

use row_actions_common::types::{ActionPayload, AttributeMap, ChartId, PayloadKind, Row};

use crate::action::ActionConfig;

/// Builds the payload handed to the host when an action is invoked
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    chart_id: Option<ChartId>,
}

impl PayloadBuilder {
    pub fn new(chart_id: Option<ChartId>) -> Self {
        Self { chart_id }
    }

    /// The RLS matches are attached only for publishing actions, and only when
    /// something actually matched
    pub fn build(&self, action: &ActionConfig, row: &Row, matching_rls: &AttributeMap) -> ActionPayload {
        let matching_rls_conditions =
            (action.publish_event && !matching_rls.is_empty()).then(|| matching_rls.clone());

        ActionPayload {
            action: PayloadKind::TableAction,
            chart_id: self.chart_id.clone(),
            key: action.key.clone(),
            value: vec![trim_row(row, action.value_columns.as_deref())],
            matching_rls_conditions,
        }
    }
}

/// Restrict a row to the listed columns that it actually has; no list (or an
/// empty one) keeps the full row
pub fn trim_row(row: &Row, columns: Option<&[String]>) -> Row {
    match columns {
        Some(columns) if !columns.is_empty() => columns
            .iter()
            .filter_map(|column| row.get(column).map(|value| (column.clone(), value.clone())))
            .collect(),
        _ => row.clone(),
    }
}
