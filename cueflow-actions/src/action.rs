//! Action definitions.
//!
//! An action list is plain JSON or YAML:
//!
//! ```yaml
//! - type: setState
//!   target: score
//!   value: "=state.score + 1"
//! - type: wait
//!   durationMs: 500
//! - type: playAnimation
//!   template: "@template.Lower_Third"
//!   phase: out
//! ```
//!
//! Every operand that accepts a value goes through `resolve_value`, so
//! literals, field paths, `{{bindings}}`, `=expressions` and `@addresses`
//! are interchangeable.

use cueflow_core::model::Phase;
use cueflow_script::{Condition, ConditionOperator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// One authored step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Optional author-assigned id, used in reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Disabled actions are skipped.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Authoring hint that the step suspends. Every step is awaited in
    /// order regardless.
    #[serde(default, rename = "await")]
    pub awaited: bool,

    /// What the step does.
    #[serde(flatten)]
    pub kind: ActionKind,
}

fn default_enabled() -> bool {
    true
}

impl Action {
    /// An enabled action without an id.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            id: None,
            enabled: true,
            awaited: false,
            kind,
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Disable the action.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Self::new(kind)
    }
}

/// The closed set of action kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ActionKind {
    /// Switch screens.
    Navigate {
        /// Screen id.
        screen: Value,
    },
    /// Return to the previous screen.
    NavigateBack,
    /// Write a state key, `state.path` or `@address`.
    SetState {
        /// Assignment target.
        target: String,
        /// New value.
        value: Value,
    },
    /// Flip a boolean target.
    ToggleState {
        /// Assignment target.
        target: String,
    },
    /// Add to a numeric target; a missing target counts as zero.
    IncrementState {
        /// Assignment target.
        target: String,
        /// Step, default 1.
        #[serde(default = "default_step")]
        by: Value,
    },
    /// Keep list items that pass a filter.
    FilterData {
        /// List operand.
        source: Value,
        /// Item filter.
        filter: ItemFilter,
        /// Where to write the result.
        target: String,
    },
    /// Sort a list.
    SortData {
        /// List operand.
        source: Value,
        /// Item field to sort by; items themselves when absent.
        #[serde(default)]
        field: Option<String>,
        /// Largest first.
        #[serde(default)]
        descending: bool,
        /// Where to write the result.
        target: String,
    },
    /// Reduce a list to one number.
    AggregateData {
        /// List operand.
        source: Value,
        /// Reduction.
        operation: Aggregation,
        /// Item field to read; items themselves when absent.
        #[serde(default)]
        field: Option<String>,
        /// Where to write the result.
        target: String,
    },
    /// Map each list item through an expression (`item`, `index` in scope).
    TransformData {
        /// List operand; a non-list value is transformed once.
        source: Value,
        /// Expression producing the new item.
        expression: String,
        /// Where to write the result.
        target: String,
    },
    /// Fetch JSON through the host fetcher.
    FetchData {
        /// URL operand.
        url: Value,
        /// HTTP method.
        #[serde(default = "default_method")]
        method: String,
        /// Request headers.
        #[serde(default)]
        headers: HashMap<String, String>,
        /// Body operand.
        #[serde(default)]
        body: Option<Value>,
        /// Path into the response to keep.
        #[serde(default)]
        path: Option<String>,
        /// Where to write the result.
        target: String,
    },
    /// Write a property on an element.
    SetElementProperty {
        /// Element id, name or `@address`.
        element: String,
        /// Dotted property path.
        property: String,
        /// New value.
        value: Value,
    },
    /// Show, hide or flip an element.
    ToggleVisibility {
        /// Element id, name or `@address`.
        element: String,
        /// Explicit visibility; flips when absent.
        #[serde(default)]
        visible: Option<Value>,
    },
    /// Run one phase of a template on a layer.
    PlayAnimation {
        /// Template id, name or `@template.` address.
        template: String,
        /// Layer override; the template's own layer otherwise.
        #[serde(default)]
        layer: Option<String>,
        /// Phase, default `in`.
        #[serde(default)]
        phase: Phase,
    },
    /// Run template phases in order with optional gaps.
    PlayTimeline {
        /// Steps.
        steps: Vec<TimelineStep>,
    },
    /// Check form values against rules and store the errors.
    ValidateForm {
        /// Form name.
        form: String,
        /// Field rules.
        #[serde(default)]
        rules: BTreeMap<String, FieldRule>,
        /// Where to write the validity flag.
        #[serde(default)]
        target: Option<String>,
    },
    /// Validate, mark submitted and optionally post the values.
    SubmitForm {
        /// Form name.
        form: String,
        /// Field rules.
        #[serde(default)]
        rules: BTreeMap<String, FieldRule>,
        /// URL operand to POST the values to.
        #[serde(default)]
        url: Option<Value>,
        /// Where to write the response (or the values when no URL).
        #[serde(default)]
        target: Option<String>,
    },
    /// Run a script under the script guards.
    RunScript {
        /// Source.
        script: String,
        /// Where to write the completion value.
        #[serde(default)]
        target: Option<String>,
    },
    /// Call a host function.
    CallFunction {
        /// Registered name.
        name: String,
        /// Argument operands.
        #[serde(default)]
        args: Vec<Value>,
        /// Where to write the result.
        #[serde(default)]
        target: Option<String>,
    },
    /// Branch on a condition.
    Conditional {
        /// Test.
        condition: Guard,
        /// Actions when true.
        #[serde(default, rename = "then")]
        then_actions: Vec<Action>,
        /// Actions when false.
        #[serde(default, rename = "else")]
        else_actions: Vec<Action>,
    },
    /// Repeat actions a number of times or once per list item.
    Loop {
        /// Repeat count operand.
        #[serde(default)]
        times: Option<Value>,
        /// List operand; each item is bound to `item_name`.
        #[serde(default)]
        items: Option<Value>,
        /// Local name for the current item.
        #[serde(default = "default_item_name")]
        item_name: String,
        /// Body.
        actions: Vec<Action>,
    },
    /// Suspend.
    Wait {
        /// Milliseconds operand.
        #[serde(alias = "ms", alias = "duration")]
        duration_ms: Value,
    },
    /// Write an authored log message (interpolated).
    Log {
        /// Message operand.
        message: Value,
    },
}

fn default_step() -> Value {
    Value::from(1)
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_item_name() -> String {
    "item".to_string()
}

impl ActionKind {
    /// The `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::NavigateBack => "navigateBack",
            Self::SetState { .. } => "setState",
            Self::ToggleState { .. } => "toggleState",
            Self::IncrementState { .. } => "incrementState",
            Self::FilterData { .. } => "filterData",
            Self::SortData { .. } => "sortData",
            Self::AggregateData { .. } => "aggregateData",
            Self::TransformData { .. } => "transformData",
            Self::FetchData { .. } => "fetchData",
            Self::SetElementProperty { .. } => "setElementProperty",
            Self::ToggleVisibility { .. } => "toggleVisibility",
            Self::PlayAnimation { .. } => "playAnimation",
            Self::PlayTimeline { .. } => "playTimeline",
            Self::ValidateForm { .. } => "validateForm",
            Self::SubmitForm { .. } => "submitForm",
            Self::RunScript { .. } => "runScript",
            Self::CallFunction { .. } => "callFunction",
            Self::Conditional { .. } => "conditional",
            Self::Loop { .. } => "loop",
            Self::Wait { .. } => "wait",
            Self::Log { .. } => "log",
        }
    }

    /// Whether the step can suspend.
    pub fn suspends(&self) -> bool {
        matches!(
            self,
            Self::Wait { .. }
                | Self::FetchData { .. }
                | Self::SubmitForm { url: Some(_), .. }
                | Self::RunScript { .. }
                | Self::PlayTimeline { .. }
                | Self::Conditional { .. }
                | Self::Loop { .. }
        )
    }
}

/// Test used by `conditional`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Guard {
    /// `{operand, operator, comparand}`.
    Condition(Condition),
    /// `{expression: "..."}`, truthy result passes.
    Expression {
        /// Expression source.
        expression: String,
    },
}

/// Filter applied to each list item (`item` and `index` in scope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemFilter {
    /// Truthy expression.
    Expression {
        /// Expression source.
        expression: String,
    },
    /// Condition on an item field.
    Match {
        /// Item field; the item itself when absent.
        #[serde(default)]
        field: Option<String>,
        /// Comparison.
        operator: ConditionOperator,
        /// Comparand operand.
        #[serde(default)]
        value: Value,
    },
}

/// Reduction used by `aggregateData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Sum of numeric values.
    Sum,
    /// Mean of numeric values; 0 when there are none.
    #[serde(alias = "average")]
    Avg,
    /// Smallest numeric value; null when there are none.
    Min,
    /// Largest numeric value; null when there are none.
    Max,
    /// Number of items.
    Count,
}

/// One step of a `playTimeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStep {
    /// Template id, name or address.
    pub template: String,
    /// Layer override.
    #[serde(default)]
    pub layer: Option<String>,
    /// Phase.
    #[serde(default)]
    pub phase: Phase,
    /// Gap before this step.
    #[serde(default)]
    pub delay_ms: u64,
}

/// Validation rule for one form field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    /// Value must be present and non-blank.
    #[serde(default)]
    pub required: bool,
    /// Minimum length in characters.
    #[serde(default)]
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Regular expression the value must match.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Message stored when the rule fails.
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tagged_actions() {
        let actions: Vec<Action> = serde_json::from_value(json!([
            {"type": "setState", "target": "score", "value": 3},
            {"type": "navigateBack", "enabled": false},
            {"type": "wait", "ms": 250, "await": true},
            {"type": "loop", "times": 2, "actions": [{"type": "log", "message": "tick"}]},
        ]))
        .unwrap();

        assert_eq!(actions[0].kind.type_name(), "setState");
        assert!(!actions[1].enabled);
        assert!(actions[2].awaited);
        assert_eq!(actions[2].kind, ActionKind::Wait { duration_ms: json!(250) });
        match &actions[3].kind {
            ActionKind::Loop { item_name, actions, .. } => {
                assert_eq!(item_name, "item");
                assert_eq!(actions.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn guards_and_filters_pick_their_shape() {
        let guard: Guard = serde_json::from_value(json!({"expression": "state.x > 1"})).unwrap();
        assert!(matches!(guard, Guard::Expression { .. }));

        let guard: Guard = serde_json::from_value(
            json!({"operand": "state.x", "operator": "equals", "comparand": 1}),
        )
        .unwrap();
        assert!(matches!(guard, Guard::Condition(_)));

        let filter: ItemFilter =
            serde_json::from_value(json!({"field": "team", "operator": "equals", "value": "Red"}))
                .unwrap();
        assert!(matches!(filter, ItemFilter::Match { .. }));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let result: Result<Action, _> = serde_json::from_value(json!({"type": "launchRocket"}));
        assert!(result.is_err());
    }

    #[test]
    fn suspension_points() {
        assert!(ActionKind::Wait { duration_ms: json!(1) }.suspends());
        assert!(!ActionKind::NavigateBack.suspends());
    }
}
