//! Condition evaluation over resolved operands.

use crate::resolve::resolve_value;
use cueflow_core::context::ExecutionContext;
use cueflow_core::logging::LogCategory;
use cueflow_core::value::{as_f64, is_empty_value, is_truthy, number, to_display_string, values_equal};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    /// Equal after one-sided literal coercion.
    #[serde(alias = "==", alias = "===", alias = "eq")]
    Equals,
    /// Negation of `equals`.
    #[serde(alias = "!=", alias = "!==", alias = "neq")]
    NotEquals,
    /// Numeric `>`.
    #[serde(alias = ">", alias = "gt")]
    GreaterThan,
    /// Numeric `<`.
    #[serde(alias = "<", alias = "lt")]
    LessThan,
    /// Numeric `>=`.
    #[serde(alias = ">=", alias = "gte")]
    GreaterThanOrEqual,
    /// Numeric `<=`.
    #[serde(alias = "<=", alias = "lte")]
    LessThanOrEqual,
    /// Substring, or array membership.
    Contains,
    /// Negation of `contains`.
    NotContains,
    /// String prefix.
    StartsWith,
    /// String suffix.
    EndsWith,
    /// Absent, null, blank string, empty array or object.
    IsEmpty,
    /// Negation of `isEmpty`.
    IsNotEmpty,
    /// Truthy.
    IsTrue,
    /// Not truthy.
    IsFalse,
    /// Regular expression match against the display string.
    Matches,
}

impl ConditionOperator {
    /// Every operator, in declaration order.
    pub const ALL: [ConditionOperator; 15] = [
        Self::Equals,
        Self::NotEquals,
        Self::GreaterThan,
        Self::LessThan,
        Self::GreaterThanOrEqual,
        Self::LessThanOrEqual,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::IsEmpty,
        Self::IsNotEmpty,
        Self::IsTrue,
        Self::IsFalse,
        Self::Matches,
    ];

    /// Parse an operator name or symbol.
    pub fn parse(s: &str) -> Option<Self> {
        let op = match s.trim() {
            "==" | "===" | "eq" | "equals" => Self::Equals,
            "!=" | "!==" | "neq" | "notEquals" => Self::NotEquals,
            ">" | "gt" | "greaterThan" => Self::GreaterThan,
            "<" | "lt" | "lessThan" => Self::LessThan,
            ">=" | "gte" | "greaterThanOrEqual" => Self::GreaterThanOrEqual,
            "<=" | "lte" | "lessThanOrEqual" => Self::LessThanOrEqual,
            "contains" => Self::Contains,
            "notContains" => Self::NotContains,
            "startsWith" => Self::StartsWith,
            "endsWith" => Self::EndsWith,
            "isEmpty" => Self::IsEmpty,
            "isNotEmpty" => Self::IsNotEmpty,
            "isTrue" => Self::IsTrue,
            "isFalse" => Self::IsFalse,
            "matches" => Self::Matches,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::GreaterThanOrEqual => "greaterThanOrEqual",
            Self::LessThanOrEqual => "lessThanOrEqual",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::IsEmpty => "isEmpty",
            Self::IsNotEmpty => "isNotEmpty",
            Self::IsTrue => "isTrue",
            Self::IsFalse => "isFalse",
            Self::Matches => "matches",
        }
    }

    /// Whether the comparand is ignored.
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Self::IsEmpty | Self::IsNotEmpty | Self::IsTrue | Self::IsFalse
        )
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `{operand, operator, comparand}`; both sides go through [`resolve_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Left-hand side.
    #[serde(alias = "left", alias = "field")]
    pub operand: Value,
    /// Comparison.
    pub operator: ConditionOperator,
    /// Right-hand side; unused by the unary operators.
    #[serde(default, alias = "right", alias = "value")]
    pub comparand: Value,
}

impl Condition {
    /// Build a condition.
    pub fn new(operand: impl Into<Value>, operator: ConditionOperator, comparand: impl Into<Value>) -> Self {
        Self {
            operand: operand.into(),
            operator,
            comparand: comparand.into(),
        }
    }
}

/// A comparand that was authored as plain text.
fn literal_text<'a>(raw: &'a Value, resolved: Option<&Value>) -> Option<&'a str> {
    match (raw, resolved) {
        (Value::String(s), Some(Value::String(r))) if s == r => Some(s.as_str()),
        _ => None,
    }
}

/// Coerce literal text towards the type of the other side.
fn coerce_literal(text: &str, like: &Value) -> Value {
    match like {
        Value::Number(_) => text
            .trim()
            .parse::<f64>()
            .map(number)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        Value::Bool(_) => match text.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        Value::Null if text.trim() == "null" => Value::Null,
        _ => Value::String(text.to_string()),
    }
}

fn equals(left: Option<&Value>, right: Option<&Value>, literal: Option<&str>) -> bool {
    match (left, right, literal) {
        (Some(l), _, Some(text)) => values_equal(l, &coerce_literal(text, l)),
        (Some(l), Some(r), None) => values_equal(l, r),
        (None, None, _) | (None, Some(Value::Null), _) | (Some(Value::Null), None, _) => true,
        _ => false,
    }
}

fn ordering(left: Option<&Value>, right: Option<&Value>) -> Option<(f64, f64)> {
    let l = as_f64(left?)?;
    let r = as_f64(right?)?;
    (!l.is_nan() && !r.is_nan()).then_some((l, r))
}

fn contains(left: Option<&Value>, right: Option<&Value>, literal: Option<&str>) -> bool {
    let (Some(haystack), Some(needle)) = (left, right) else {
        return false;
    };
    match haystack {
        Value::Array(items) => items.iter().any(|item| match literal {
            Some(text) => values_equal(item, &coerce_literal(text, item)),
            None => values_equal(item, needle),
        }),
        Value::Object(map) => map.contains_key(&to_display_string(needle)),
        Value::Null => false,
        other => to_display_string(other).contains(&to_display_string(needle)),
    }
}

fn text_pair(left: Option<&Value>, right: Option<&Value>) -> Option<(String, String)> {
    match (left?, right?) {
        (Value::Null, _) | (_, Value::Null) => None,
        (l, r) => Some((to_display_string(l), to_display_string(r))),
    }
}

fn matches_pattern(left: Option<&Value>, right: Option<&Value>, ctx: &ExecutionContext) -> bool {
    let Some((text, pattern)) = text_pair(left, right) else {
        return false;
    };
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(&text),
        Err(e) => {
            ctx.warn(
                LogCategory::Script,
                format!("Invalid pattern '{}' in condition: {}", pattern, e),
            );
            false
        }
    }
}

/// Evaluate a condition. Never fails: unresolvable or non-comparable
/// operands make the condition false.
pub fn evaluate_condition(condition: &Condition, ctx: &ExecutionContext) -> bool {
    let left = resolve_value(&condition.operand, ctx);
    let op = condition.operator;
    let (right, literal) = if op.is_unary() {
        (None, None)
    } else {
        let right = resolve_value(&condition.comparand, ctx);
        let literal = literal_text(&condition.comparand, right.as_ref());
        (right, literal)
    };
    let (l, r) = (left.as_ref(), right.as_ref());

    let result = match op {
        ConditionOperator::Equals => equals(l, r, literal),
        ConditionOperator::NotEquals => !equals(l, r, literal),
        ConditionOperator::GreaterThan => ordering(l, r).is_some_and(|(a, b)| a > b),
        ConditionOperator::LessThan => ordering(l, r).is_some_and(|(a, b)| a < b),
        ConditionOperator::GreaterThanOrEqual => ordering(l, r).is_some_and(|(a, b)| a >= b),
        ConditionOperator::LessThanOrEqual => ordering(l, r).is_some_and(|(a, b)| a <= b),
        ConditionOperator::Contains => contains(l, r, literal),
        ConditionOperator::NotContains => !contains(l, r, literal),
        ConditionOperator::StartsWith => text_pair(l, r).is_some_and(|(a, b)| a.starts_with(&b)),
        ConditionOperator::EndsWith => text_pair(l, r).is_some_and(|(a, b)| a.ends_with(&b)),
        ConditionOperator::IsEmpty => is_empty_value(l),
        ConditionOperator::IsNotEmpty => !is_empty_value(l),
        ConditionOperator::IsTrue => l.is_some_and(is_truthy),
        ConditionOperator::IsFalse => !l.is_some_and(is_truthy),
        ConditionOperator::Matches => matches_pattern(l, r, ctx),
    };

    tracing::trace!(
        operator = %op,
        left = ?left,
        right = ?right,
        result,
        "Condition evaluated"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::testing::TestHarness;
    use serde_json::json;

    fn check(state: Value, operand: Value, op: &str, comparand: Value) -> bool {
        let harness = TestHarness::builder().state(state).build();
        let condition = Condition::new(
            operand,
            ConditionOperator::parse(op).unwrap(),
            comparand,
        );
        evaluate_condition(&condition, &harness.ctx)
    }

    #[test]
    fn ordering_coerces_numeric_text() {
        assert!(check(json!({"Score": 15}), json!("@Score"), "greaterThan", json!("10")));
        assert!(!check(json!({"Score": 5}), json!("@Score"), "greaterThan", json!("10")));
        assert!(!check(json!({"Score": "abc"}), json!("@Score"), "greaterThan", json!("10")));
        assert!(check(json!({"n": 3}), json!("state.n"), "<=", json!(3)));
    }

    #[test]
    fn equality_coerces_only_literals() {
        assert!(check(json!({"x": 1}), json!("state.x"), "equals", json!("1")));
        assert!(check(json!({"on": true}), json!("state.on"), "==", json!("true")));
        assert!(check(json!({"x": 1.0}), json!("state.x"), "equals", json!(1)));
        // A resolved string is not coerced
        assert!(!check(json!({"x": 1, "y": "1"}), json!("state.x"), "equals", json!("state.y")));
        assert!(check(json!({"x": 2}), json!("state.x"), "!=", json!("1")));
    }

    #[test]
    fn text_operators() {
        let state = json!({"name": "Lower Third", "tags": ["live", "news"]});
        assert!(check(state.clone(), json!("state.name"), "contains", json!("Third")));
        assert!(check(state.clone(), json!("state.tags"), "contains", json!("news")));
        assert!(check(state.clone(), json!("state.tags"), "notContains", json!("sport")));
        assert!(check(state.clone(), json!("state.name"), "startsWith", json!("Lower")));
        assert!(check(state.clone(), json!("state.name"), "endsWith", json!("Third")));
        assert!(check(state, json!("state.name"), "matches", json!("^Lower\\s+T")));
    }

    #[test]
    fn emptiness_and_truthiness() {
        let state = json!({"blank": "  ", "list": [], "flag": true, "zero": 0});
        assert!(check(state.clone(), json!("state.blank"), "isEmpty", Value::Null));
        assert!(check(state.clone(), json!("state.list"), "isEmpty", Value::Null));
        assert!(check(state.clone(), json!("state.missing"), "isEmpty", Value::Null));
        assert!(check(state.clone(), json!("state.flag"), "isTrue", Value::Null));
        assert!(check(state.clone(), json!("state.zero"), "isFalse", Value::Null));
        assert!(check(state, json!("state.missing"), "isFalse", Value::Null));
    }

    #[test]
    fn invalid_pattern_is_false_with_warning() {
        let harness = TestHarness::builder().state(json!({"s": "abc"})).build();
        let condition = Condition::new("state.s", ConditionOperator::Matches, "(");
        assert!(!evaluate_condition(&condition, &harness.ctx));
        assert_eq!(harness.warnings().len(), 1);
    }

    #[test]
    fn deserializes_with_aliases() {
        let condition: Condition =
            serde_json::from_value(json!({"left": "state.x", "operator": ">=", "right": 2})).unwrap();
        assert_eq!(condition.operator, ConditionOperator::GreaterThanOrEqual);
        assert_eq!(condition.comparand, json!(2));

        let condition: Condition =
            serde_json::from_value(json!({"operand": "state.x", "operator": "isEmpty"})).unwrap();
        assert_eq!(condition.comparand, Value::Null);
    }

    #[test]
    fn every_operator_round_trips_its_name() {
        for op in ConditionOperator::ALL {
            assert_eq!(ConditionOperator::parse(op.as_str()), Some(op));
        }
    }
}
