//! Ordered action execution.
//!
//! Actions run strictly one after another on the caller's task. A step that
//! suspends (wait, fetch, script, timeline) is awaited before the next one
//! starts. A failing step is logged and recorded in the report; the rest of
//! the list still runs.

use crate::action::{Action, ActionKind, Guard};
use crate::handlers::data::FetchSpec;
use crate::handlers::{data, element, flow, form, playout, require, state};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result, serialize_error};
use cueflow_core::ids::DispatchId;
use cueflow_core::logging::LogCategory;
use cueflow_core::model::TriggerEvent;
use cueflow_core::value::{as_f64, is_truthy};
use cueflow_script::{Budget, ScriptLimits, evaluate_condition, try_evaluate};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Instant;

/// A step that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionFailure {
    /// Position in its list.
    pub index: usize,
    /// Action type tag.
    pub action: String,
    /// Author-assigned id, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// What went wrong.
    #[serde(serialize_with = "serialize_error")]
    pub error: CueError,
}

/// Outcome of one `execute_actions` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    /// Correlation id shared with the log events.
    pub dispatch_id: DispatchId,
    /// Steps that completed, nested steps included.
    pub executed: usize,
    /// Disabled steps.
    pub skipped: usize,
    /// Failed steps, in the order they failed.
    pub failures: Vec<ActionFailure>,
}

impl ExecutionReport {
    fn new(dispatch_id: DispatchId) -> Self {
        Self {
            dispatch_id,
            executed: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every step succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run `actions` in order for `event`. Never fails; see the report.
pub async fn execute_actions(
    actions: &[Action],
    event: &TriggerEvent,
    ctx: &ExecutionContext,
) -> ExecutionReport {
    let ctx = ctx
        .with_event(event.clone())
        .with_dispatch_id(DispatchId::new());
    let started = Instant::now();
    let mut report = ExecutionReport::new(ctx.dispatch_id());

    run_list(actions, &ctx, &mut report).await;

    tracing::info!(
        dispatch_id = %report.dispatch_id,
        event = %event.event_type,
        executed = report.executed,
        skipped = report.skipped,
        failed = report.failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Action list finished"
    );
    report
}

/// Run a single action, surfacing its error instead of recording it.
pub async fn execute_action(action: &Action, ctx: &ExecutionContext) -> Result<()> {
    let mut report = ExecutionReport::new(ctx.dispatch_id());
    run_action(&action.kind, ctx, &mut report).await
}

fn run_list<'a>(
    actions: &'a [Action],
    ctx: &'a ExecutionContext,
    report: &'a mut ExecutionReport,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        for (index, action) in actions.iter().enumerate() {
            let tag = action.kind.type_name();
            if !action.enabled {
                report.skipped += 1;
                ctx.debug(LogCategory::Action, format!("Skipping disabled {}", tag));
                continue;
            }

            match run_action(&action.kind, ctx, report).await {
                Ok(()) => report.executed += 1,
                Err(error) => {
                    ctx.warn(
                        LogCategory::Action,
                        format!("Action #{} ({}) failed: {}", index, tag, error),
                    );
                    report.failures.push(ActionFailure {
                        index,
                        action: tag.to_string(),
                        id: action.id.clone(),
                        error,
                    });
                }
            }
        }
    })
}

fn run_action<'a>(
    kind: &'a ActionKind,
    ctx: &'a ExecutionContext,
    report: &'a mut ExecutionReport,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        match kind {
            ActionKind::Navigate { screen } => flow::navigate(screen, ctx),
            ActionKind::NavigateBack => flow::navigate_back(ctx),
            ActionKind::SetState { target, value } => state::set_state(target, value, ctx),
            ActionKind::ToggleState { target } => state::toggle_state(target, ctx).map(drop),
            ActionKind::IncrementState { target, by } => {
                state::increment_state(target, by, ctx).map(drop)
            }
            ActionKind::FilterData {
                source,
                filter,
                target,
            } => data::filter_data(source, filter, target, ctx),
            ActionKind::SortData {
                source,
                field,
                descending,
                target,
            } => data::sort_data(source, field.as_deref(), *descending, target, ctx),
            ActionKind::AggregateData {
                source,
                operation,
                field,
                target,
            } => data::aggregate_data(source, *operation, field.as_deref(), target, ctx),
            ActionKind::TransformData {
                source,
                expression,
                target,
            } => data::transform_data(source, expression, target, ctx),
            ActionKind::FetchData {
                url,
                method,
                headers,
                body,
                path,
                target,
            } => {
                let spec = FetchSpec {
                    url,
                    method,
                    headers,
                    body: body.as_ref(),
                    path: path.as_deref(),
                    target,
                };
                data::fetch_data(spec, ctx).await
            }
            ActionKind::SetElementProperty {
                element: reference,
                property,
                value,
            } => element::set_element_property(reference, property, value, ctx),
            ActionKind::ToggleVisibility {
                element: reference,
                visible,
            } => element::set_visibility(reference, visible.as_ref(), ctx).map(drop),
            ActionKind::PlayAnimation {
                template,
                layer,
                phase,
            } => playout::play_animation(template, layer.as_deref(), *phase, ctx).map(drop),
            ActionKind::PlayTimeline { steps } => playout::play_timeline(steps, ctx).await,
            ActionKind::ValidateForm {
                form: name,
                rules,
                target,
            } => form::validate_form_action(name, rules, target.as_deref(), ctx).map(drop),
            ActionKind::SubmitForm {
                form: name,
                rules,
                url,
                target,
            } => form::submit_form(name, rules, url.as_ref(), target.as_deref(), ctx).await,
            ActionKind::RunScript { script, target } => {
                flow::run_script(script, target.as_deref(), ctx).await.map(drop)
            }
            ActionKind::CallFunction { name, args, target } => {
                flow::call_function(name, args, target.as_deref(), ctx).map(drop)
            }
            ActionKind::Conditional {
                condition,
                then_actions,
                else_actions,
            } => {
                let branch = if check_guard(condition, ctx) {
                    then_actions
                } else {
                    else_actions
                };
                run_list(branch, ctx, report).await;
                Ok(())
            }
            ActionKind::Loop {
                times,
                items,
                item_name,
                actions,
            } => run_loop(times.as_ref(), items.as_ref(), item_name, actions, ctx, report).await,
            ActionKind::Wait { duration_ms } => flow::wait(duration_ms, ctx).await,
            ActionKind::Log { message } => {
                flow::log(message, ctx);
                Ok(())
            }
        }
    })
}

/// Evaluate a `conditional` test; an expression that fails counts as false.
pub fn check_guard(guard: &Guard, ctx: &ExecutionContext) -> bool {
    match guard {
        Guard::Condition(condition) => evaluate_condition(condition, ctx),
        Guard::Expression { expression } => {
            try_evaluate(expression, ctx).is_some_and(|v| is_truthy(&v))
        }
    }
}

async fn run_loop(
    times: Option<&Value>,
    items: Option<&Value>,
    item_name: &str,
    body: &[Action],
    ctx: &ExecutionContext,
    report: &mut ExecutionReport,
) -> Result<()> {
    let mut budget = Budget::new(ScriptLimits::for_action_loop(ctx.settings()));

    let rounds: Vec<Value> = match (items, times) {
        (Some(items), _) => match require("loop", items, ctx)? {
            Value::Array(items) => items,
            other => {
                return Err(CueError::invalid_action(
                    "loop",
                    format!("items is not a list: {}", other),
                ));
            }
        },
        (None, Some(times)) => {
            let resolved = require("loop", times, ctx)?;
            let count = as_f64(&resolved)
                .filter(|n| n.is_finite() && *n >= 0.0)
                .ok_or_else(|| {
                    CueError::invalid_action("loop", format!("bad repeat count {}", resolved))
                })?;
            let count = count.min(budget.limits().max_iterations.unwrap_or(u64::MAX) as f64 + 1.0);
            (0..count as u64).map(|i| json!(i)).collect()
        }
        (None, None) => {
            return Err(CueError::invalid_action("loop", "needs 'times' or 'items'"));
        }
    };

    for (index, item) in rounds.into_iter().enumerate() {
        budget.iterate()?;
        let scope = ctx
            .with_local(item_name, item)
            .with_local("index", json!(index));
        run_list(body, &scope, report).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::settings::EngineSettings;
    use cueflow_core::testing::TestHarness;

    fn actions(value: Value) -> Vec<Action> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn runs_in_order() {
        let h = TestHarness::empty();
        let list = actions(json!([
            {"type": "setState", "target": "log", "value": "a"},
            {"type": "setState", "target": "log", "value": "=state.log + 'b'"},
            {"type": "setState", "target": "log", "value": "=state.log + 'c'"},
        ]));
        let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;
        assert_eq!(report.executed, 3);
        assert_eq!(h.state("log"), Some(json!("abc")));
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_list() {
        let h = TestHarness::empty();
        let list = actions(json!([
            {"type": "setState", "target": "a", "value": 1},
            {"id": "bad", "type": "setElementProperty", "element": "@Ghost", "property": "x", "value": 1},
            {"type": "setState", "target": "b", "value": 2},
        ]));
        let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;

        assert_eq!(report.executed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].id.as_deref(), Some("bad"));
        assert_eq!(h.state("b"), Some(json!(2)));
    }

    #[tokio::test]
    async fn disabled_actions_are_skipped() {
        let h = TestHarness::empty();
        let list = actions(json!([
            {"type": "setState", "target": "a", "value": 1, "enabled": false},
        ]));
        let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;
        assert_eq!((report.executed, report.skipped), (0, 1));
        assert_eq!(h.state("a"), None);
    }

    #[tokio::test]
    async fn conditional_branches() {
        let h = TestHarness::builder().state(json!({"score": 15})).build();
        let list = actions(json!([{
            "type": "conditional",
            "condition": {"operand": "state.score", "operator": ">", "comparand": "10"},
            "then": [{"type": "setState", "target": "result", "value": "win"}],
            "else": [{"type": "setState", "target": "result", "value": "lose"}],
        }, {
            "type": "conditional",
            "condition": {"expression": "state.score < 0"},
            "then": [{"type": "setState", "target": "negative", "value": true}],
        }]));
        execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;
        assert_eq!(h.state("result"), Some(json!("win")));
        assert_eq!(h.state("negative"), None);
    }

    #[tokio::test]
    async fn loops_bind_items_and_indices() {
        let h = TestHarness::builder().state(json!({"names": ["a", "b"]})).build();
        let list = actions(json!([{
            "type": "loop",
            "items": "state.names",
            "itemName": "name",
            "actions": [{"type": "setState", "target": "last", "value": "=name + index"}],
        }, {
            "type": "loop",
            "times": 3,
            "actions": [{"type": "incrementState", "target": "n"}],
        }]));
        let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;
        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(h.state("last"), Some(json!("b1")));
        assert_eq!(h.state("n"), Some(json!(3)));
    }

    #[tokio::test]
    async fn loop_ceiling_is_enforced() {
        let h = TestHarness::builder()
            .settings(EngineSettings::default().with_max_loop_iterations(5))
            .build();
        let list = actions(json!([{
            "type": "loop",
            "times": 1000,
            "actions": [{"type": "incrementState", "target": "n"}],
        }]));
        let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error, CueError::LoopLimitExceeded { limit: 5 });
        assert_eq!(h.state("n"), Some(json!(5)));
    }

    #[tokio::test]
    async fn event_is_visible_to_operands() {
        let h = TestHarness::empty();
        let list = actions(json!([
            {"type": "setState", "target": "clicked", "value": "event.elementId"},
        ]));
        let event = TriggerEvent::new("click").on_element("btn-1");
        execute_actions(&list, &event, &h.ctx).await;
        assert_eq!(h.state("clicked"), Some(json!("btn-1")));
    }
}
