//! Grouped RLS visibility conditions
//!
//! Two shapes arrive from the host under `rlsVisibilityConditions`: a flat list
//! of conditions (all must pass) or a list of groups, each combining its own
//! conditions with `joinOperator`, and the groups combined with the first
//! group's `groupJoinOperator`. Unlike the single-condition path, an RLS
//! condition with an operator outside `==`, `!=`, `IN`, `NOT IN` fails.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use row_actions_common::types::{AttributeMap, Row, VisibilityResult};

use crate::attributes::AttributeSource;
use crate::condition::{Condition, ConditionEvaluator, ConditionSource, Operator};
use crate::value::{in_list, loose_eq};

/// Boolean join between conditions or groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinOperator {
    #[default]
    And,
    Or,
}

impl JoinOperator {
    /// Case-insensitive; anything but `OR` joins with AND
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("OR") {
            Self::Or
        } else {
            Self::And
        }
    }

    fn combine<I: IntoIterator<Item = bool>>(self, results: I) -> bool {
        let mut results = results.into_iter();
        match self {
            Self::And => results.all(|passed| passed),
            Self::Or => results.any(|passed| passed),
        }
    }
}

impl<'de> Deserialize<'de> for JoinOperator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Self::parse(&s),
            _ => Self::And,
        })
    }
}

/// Conditions combined with one join operator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub conditions: Vec<Condition>,
    pub join_operator: JoinOperator,
    /// Only read from the first group of a list
    pub group_join_operator: JoinOperator,
}

impl ConditionGroup {
    pub fn new(conditions: Vec<Condition>, join_operator: JoinOperator) -> Self {
        Self {
            conditions,
            join_operator,
            group_join_operator: JoinOperator::And,
        }
    }

    #[must_use]
    pub fn with_group_join(mut self, group_join_operator: JoinOperator) -> Self {
        self.group_join_operator = group_join_operator;
        self
    }

    fn from_value(value: &Value) -> Self {
        let conditions = match value.get("conditions") {
            Some(Value::Array(items)) => items.iter().map(condition_from_value).collect(),
            _ => Vec::new(),
        };
        let join = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .map_or(JoinOperator::And, JoinOperator::parse)
        };

        Self {
            conditions,
            join_operator: join("joinOperator"),
            group_join_operator: join("groupJoinOperator"),
        }
    }
}

/// The two accepted shapes of `rlsVisibilityConditions`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RlsConditions {
    Flat(Vec<Condition>),
    Grouped(Vec<ConditionGroup>),
}

impl RlsConditions {
    /// Decide the shape from the first element: groups carry a `conditions` list
    pub fn from_items(items: &[Value]) -> Self {
        let grouped = items
            .first()
            .and_then(|first| first.get("conditions"))
            .is_some_and(Value::is_array);

        if grouped {
            Self::Grouped(items.iter().map(ConditionGroup::from_value).collect())
        } else {
            Self::Flat(items.iter().map(condition_from_value).collect())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Flat(conditions) => conditions.is_empty(),
            Self::Grouped(groups) => groups.is_empty(),
        }
    }
}

impl<'de> Deserialize<'de> for RlsConditions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(Self::from_items(&items)),
            Value::Null => Ok(Self::Flat(Vec::new())),
            other => {
                warn!(value = %other, "ignoring rlsVisibilityConditions that is not a list");
                Ok(Self::Flat(Vec::new()))
            }
        }
    }
}

fn condition_from_value(value: &Value) -> Condition {
    Condition::deserialize(value).unwrap_or_else(|e| {
        warn!(error = %e, "treating malformed visibility condition as empty");
        Condition::default()
    })
}

/// Evaluates flat and grouped condition lists, tracking contributing attributes
pub struct GroupEvaluator<'a, S: AttributeSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: AttributeSource + ?Sized> GroupEvaluator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Visibility plus the attributes that contributed, empty unless visible
    pub fn evaluate(&self, conditions: Option<&RlsConditions>, row: &Row) -> VisibilityResult {
        let Some(conditions) = conditions.filter(|c| !c.is_empty()) else {
            return VisibilityResult::visible();
        };

        let attributes = self.source.resolve();
        let mut matching = AttributeMap::new();
        let mut check =
            |condition: &Condition| self.evaluate_atomic(condition, row, &attributes, &mut matching);

        let visible = match conditions {
            RlsConditions::Flat(list) => list.iter().all(&mut check),
            RlsConditions::Grouped(groups) => {
                // every group is evaluated so matches accumulate across all of them
                let group_results: Vec<bool> = groups
                    .iter()
                    .map(|group| {
                        if group.conditions.is_empty() {
                            return true;
                        }
                        match group.join_operator {
                            JoinOperator::Or => group.conditions.iter().any(&mut check),
                            JoinOperator::And => group.conditions.iter().all(&mut check),
                        }
                    })
                    .collect();

                groups
                    .first()
                    .map(|first| first.group_join_operator)
                    .unwrap_or_default()
                    .combine(group_results)
            }
        };

        if visible {
            VisibilityResult::with_matches(matching)
        } else {
            VisibilityResult::hidden()
        }
    }

    fn evaluate_atomic(
        &self,
        condition: &Condition,
        row: &Row,
        attributes: &AttributeMap,
        matching: &mut AttributeMap,
    ) -> bool {
        if condition.grouped_source() == ConditionSource::Column {
            return ConditionEvaluator::new(self.source).evaluate(Some(condition), row);
        }

        let key = condition.attribute_key();
        let actual = key.and_then(|k| attributes.get(k));
        let expected = condition.value.as_ref();

        let passes = match condition.operator.as_ref().map(Operator::to_uppercase) {
            Some(Operator::Eq) => loose_eq(actual, expected),
            Some(Operator::Ne) => !loose_eq(actual, expected),
            Some(Operator::In) => in_list(expected, actual),
            Some(Operator::NotIn) => !in_list(expected, actual),
            _ => false,
        };

        if passes {
            if let Some(key) = key {
                matching.insert(key.to_string(), actual.cloned().unwrap_or(Value::Null));
            }
        }
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("attribute fixture must be an object"),
        }
    }

    fn conditions(value: Value) -> RlsConditions {
        serde_json::from_value(value).unwrap()
    }

    fn run(attrs: &AttributeMap, input: &RlsConditions, row: &Row) -> VisibilityResult {
        GroupEvaluator::new(attrs).evaluate(Some(input), row)
    }

    #[test]
    fn test_empty_input_is_visible() {
        let attrs = AttributeMap::new();
        let evaluator = GroupEvaluator::new(&attrs);

        assert_eq!(evaluator.evaluate(None, &Row::new()), VisibilityResult::visible());
        assert_eq!(
            evaluator.evaluate(Some(&conditions(json!([]))), &Row::new()),
            VisibilityResult::visible()
        );
    }

    #[test]
    fn test_shape_detection() {
        assert!(matches!(
            conditions(json!([{"conditions": [], "joinOperator": "OR"}])),
            RlsConditions::Grouped(_)
        ));
        assert!(matches!(
            conditions(json!([{"rlsKey": "a", "operator": "==", "value": 1}])),
            RlsConditions::Flat(_)
        ));
        // a non-list `conditions` field does not make a group
        assert!(matches!(
            conditions(json!([{"conditions": "x"}])),
            RlsConditions::Flat(_)
        ));
    }

    #[test]
    fn test_flat_in_condition_matches() {
        let attrs = attributes(json!({"region": "us"}));
        let input = conditions(json!([
            {"source": "rls", "attributeKey": "region", "operator": "IN", "value": "us,eu"}
        ]));

        let result = run(&attrs, &input, &Row::new());
        assert!(result.visible);
        assert_eq!(result.matching_conditions, attributes(json!({"region": "us"})));
    }

    #[test]
    fn test_flat_list_is_and() {
        let attrs = attributes(json!({"region": "us", "tier": "gold"}));
        let input = conditions(json!([
            {"rlsKey": "region", "operator": "==", "value": "us"},
            {"rlsKey": "tier", "operator": "!=", "value": "gold"}
        ]));

        assert_eq!(run(&attrs, &input, &Row::new()), VisibilityResult::hidden());
    }

    #[test]
    fn test_flat_rls_rejects_unknown_operators() {
        let attrs = attributes(json!({"level": 5}));
        for operator in [">", "<=", "IS NULL", "LIKE", ""] {
            let input = conditions(json!([
                {"rlsKey": "level", "operator": operator, "value": 1}
            ]));
            assert!(!run(&attrs, &input, &Row::new()).visible, "{operator}");
        }
    }

    #[test]
    fn test_rls_operators_are_case_insensitive() {
        let attrs = attributes(json!({"region": "eu"}));
        let input = conditions(json!([
            {"rlsKey": "region", "operator": "in", "value": "us, eu"},
            {"rlsKey": "region", "operator": "not in", "value": "apac"}
        ]));
        assert!(run(&attrs, &input, &Row::new()).visible);
    }

    #[test]
    fn test_loose_equality() {
        let attrs = attributes(json!({"level": 3}));
        let input = conditions(json!([{"rlsKey": "level", "operator": "==", "value": "3"}]));
        let result = run(&attrs, &input, &Row::new());
        assert!(result.visible);
        assert_eq!(result.matching_conditions.get("level"), Some(&json!(3)));
    }

    #[test]
    fn test_column_conditions_delegate() {
        let attrs = AttributeMap::new();
        let row = attributes(json!({"amount": 12}));
        let input = conditions(json!([
            {"source": "column", "column": "amount", "operator": ">", "value": 10},
            {"source": "column", "column": "amount", "operator": "LIKE", "value": "x"}
        ]));

        let result = run(&attrs, &input, &row);
        assert!(result.visible);
        assert!(result.matching_conditions.is_empty());
    }

    #[test]
    fn test_grouped_failure_returns_no_matches() {
        let attrs = attributes(json!({"tier": "silver"}));
        let input = conditions(json!([
            {"conditions": [{"attributeKey": "tier", "operator": "==", "value": "gold"}],
             "joinOperator": "AND"}
        ]));

        assert_eq!(run(&attrs, &input, &Row::new()), VisibilityResult::hidden());
    }

    #[test]
    fn test_partial_matches_do_not_leak() {
        let attrs = attributes(json!({"region": "us", "tier": "silver"}));
        let input = conditions(json!([
            {"conditions": [{"rlsKey": "region", "operator": "==", "value": "us"}]},
            {"conditions": [{"rlsKey": "tier", "operator": "==", "value": "gold"}]}
        ]));

        let result = run(&attrs, &input, &Row::new());
        assert!(!result.visible);
        assert!(result.matching_conditions.is_empty());
    }

    #[test]
    fn test_group_or() {
        let attrs = attributes(json!({"role": "editor"}));
        let input = conditions(json!([
            {"conditions": [
                {"rlsKey": "role", "operator": "==", "value": "admin"},
                {"rlsKey": "role", "operator": "==", "value": "editor"}
            ], "joinOperator": "or"}
        ]));

        let result = run(&attrs, &input, &Row::new());
        assert!(result.visible);
        assert_eq!(result.matching_conditions, attributes(json!({"role": "editor"})));

        let none_match = conditions(json!([
            {"conditions": [
                {"rlsKey": "role", "operator": "==", "value": "admin"},
                {"rlsKey": "role", "operator": "==", "value": "owner"}
            ], "joinOperator": "OR"}
        ]));
        assert!(!run(&attrs, &none_match, &Row::new()).visible);
    }

    #[test]
    fn test_only_first_group_join_counts() {
        let attrs = attributes(json!({"region": "us", "tier": "silver"}));
        let passing = json!({"rlsKey": "region", "operator": "==", "value": "us"});
        let failing = json!({"rlsKey": "tier", "operator": "==", "value": "gold"});

        let first_or = conditions(json!([
            {"conditions": [passing], "groupJoinOperator": "OR"},
            {"conditions": [failing], "groupJoinOperator": "AND"}
        ]));
        let result = run(&attrs, &first_or, &Row::new());
        assert!(result.visible);
        assert_eq!(result.matching_conditions, attributes(json!({"region": "us"})));

        let later_or = conditions(json!([
            {"conditions": [passing], "groupJoinOperator": "AND"},
            {"conditions": [failing], "groupJoinOperator": "OR"}
        ]));
        assert!(!run(&attrs, &later_or, &Row::new()).visible);
    }

    #[test]
    fn test_programmatic_groups() {
        let attrs = attributes(json!({"region": "eu", "tier": "gold"}));
        let input = RlsConditions::Grouped(vec![
            ConditionGroup::new(
                vec![Condition::attribute("region", Operator::Eq, json!("us"))],
                JoinOperator::And,
            )
            .with_group_join(JoinOperator::Or),
            ConditionGroup::new(
                vec![
                    Condition::attribute("tier", Operator::In, json!("gold,platinum")),
                    Condition::column("status", Operator::Ne, json!("closed")),
                ],
                JoinOperator::And,
            ),
        ]);

        let result = run(&attrs, &input, &attributes(json!({"status": "open"})));
        assert!(result.visible);
        assert_eq!(result.matching_conditions, attributes(json!({"tier": "gold"})));
    }

    #[test]
    fn test_empty_group_is_vacuously_true() {
        let attrs = attributes(json!({"tier": "silver"}));
        let input = conditions(json!([
            {"conditions": []},
            {"conditions": [{"rlsKey": "tier", "operator": "==", "value": "silver"}]}
        ]));

        let result = run(&attrs, &input, &Row::new());
        assert!(result.visible);
        assert_eq!(result.matching_conditions, attributes(json!({"tier": "silver"})));
    }

    #[test]
    fn test_short_circuit_limits_matches() {
        let attrs = attributes(json!({"a": 1, "b": 2}));
        let input = conditions(json!([
            {"conditions": [
                {"rlsKey": "a", "operator": "==", "value": 1},
                {"rlsKey": "b", "operator": "==", "value": 2}
            ], "joinOperator": "OR"}
        ]));

        let result = run(&attrs, &input, &Row::new());
        assert_eq!(result.matching_conditions, attributes(json!({"a": 1})));
    }

    #[test]
    fn test_missing_attribute() {
        let attrs = AttributeMap::new();
        let not_in = conditions(json!([{"rlsKey": "region", "operator": "NOT IN", "value": "us"}]));
        let result = run(&attrs, &not_in, &Row::new());
        assert!(result.visible);
        assert_eq!(result.matching_conditions.get("region"), Some(&Value::Null));

        let eq = conditions(json!([{"rlsKey": "region", "operator": "==", "value": "us"}]));
        assert!(!run(&attrs, &eq, &Row::new()).visible);
    }

    #[test]
    fn test_non_string_source_reads_attributes() {
        let attrs = attributes(json!({"region": "us"}));
        let input = conditions(json!([
            {"source": 5, "rlsKey": "region", "operator": "==", "value": "us"}
        ]));

        let result = run(&attrs, &input, &Row::new());
        assert!(result.visible);
        assert_eq!(result.matching_conditions, attributes(json!({"region": "us"})));
    }

    #[test]
    fn test_malformed_entries_degrade() {
        let attrs = AttributeMap::new();
        assert!(!run(&attrs, &conditions(json!(["not a condition"])), &Row::new()).visible);
        assert!(run(&attrs, &conditions(json!({"rlsKey": "x"})), &Row::new()).visible);
    }
}
