//! Per-row action filtering

use tracing::debug;

use row_actions_common::types::{AttributeMap, Row, VisibilityResult};

use crate::action::{ActionConfig, VisibilityCondition};
use crate::attributes::AttributeSource;
use crate::condition::ConditionEvaluator;
use crate::group::GroupEvaluator;

/// An action offered for a row, with the RLS attributes that made it visible
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleAction<'a> {
    pub config: &'a ActionConfig,
    pub matching_rls_conditions: AttributeMap,
}

/// Decides which configured actions are visible for a row
pub struct ActionFilter<'a, S: AttributeSource + ?Sized> {
    conditions: ConditionEvaluator<'a, S>,
    groups: GroupEvaluator<'a, S>,
}

impl<'a, S: AttributeSource + ?Sized> ActionFilter<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            conditions: ConditionEvaluator::new(source),
            groups: GroupEvaluator::new(source),
        }
    }

    /// Visible actions in configuration order
    pub fn visible_actions<'c>(
        &self,
        actions: &'c [ActionConfig],
        row: &Row,
        is_selected: bool,
    ) -> Vec<VisibleAction<'c>> {
        actions
            .iter()
            .filter_map(|config| {
                let result = self.evaluate(config, row, is_selected);
                if !result.visible {
                    debug!(action = %config.key, "action hidden for row");
                    return None;
                }
                Some(VisibleAction {
                    config,
                    matching_rls_conditions: result.matching_conditions,
                })
            })
            .collect()
    }

    /// Visibility of a single action; grouped conditions are only consulted
    /// once the basic gate passes
    pub fn evaluate(&self, action: &ActionConfig, row: &Row, is_selected: bool) -> VisibilityResult {
        if !self.passes_basic(action, row, is_selected) {
            return VisibilityResult::hidden();
        }
        self.groups
            .evaluate(action.rls_visibility_conditions.as_ref(), row)
    }

    fn passes_basic(&self, action: &ActionConfig, row: &Row, is_selected: bool) -> bool {
        match &action.visibility_condition {
            None => true,
            Some(VisibilityCondition::Selection(state)) => state.matches(is_selected),
            Some(VisibilityCondition::Condition(condition)) => {
                self.conditions.evaluate(Some(condition), row)
            }
        }
    }
}
