//! Node handlers.
//!
//! Each handler returns whether the walk continues into the node's
//! children. Only condition nodes ever say no; every other kind either
//! succeeds or fails, and the runtime continues past failures.

use crate::model::{AnimationNode, DataOperation, GraphAction, Node, NodeKind};
use cueflow_actions::check_guard;
use cueflow_actions::handlers::{element, flow, playout, state};
use cueflow_core::address::{SIGIL, write_target};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::logging::LogCategory;
use cueflow_core::model::Phase;
use cueflow_core::value::to_display_string;
use cueflow_script::resolve_value;
use serde_json::Value;

/// Execute one node. `Ok(false)` stops this branch without error.
pub async fn run_node(node: &Node, ctx: &ExecutionContext) -> Result<bool> {
    match &node.kind {
        NodeKind::Event(_) => Ok(true),
        NodeKind::Condition(guard) => {
            let passed = check_guard(guard, ctx);
            tracing::trace!(node_id = %node.id, passed, "Condition node");
            if !passed {
                ctx.debug(LogCategory::Graph, format!("Condition '{}' is false", node.id));
            }
            Ok(passed)
        }
        NodeKind::Action(action) => run_action(action, ctx).await.map(|()| true),
        NodeKind::Data(operation) => run_data(&node.id, operation, ctx).map(|()| true),
        NodeKind::Animation(animation) => run_animation(animation, ctx).map(|()| true),
    }
}

/// Execute a graph action.
pub async fn run_action(action: &GraphAction, ctx: &ExecutionContext) -> Result<()> {
    match action {
        GraphAction::SetState { target, value } => state::set_state(target, value, ctx),
        GraphAction::ToggleState { target } => state::toggle_state(target, ctx).map(drop),
        GraphAction::Navigate { screen } => flow::navigate(screen, ctx),
        GraphAction::PlayTemplate { template, layer } => {
            playout::play_animation(template, layer.as_deref(), Phase::In, ctx).map(drop)
        }
        GraphAction::ToggleTemplate { template, layer } => {
            playout::toggle_template(template, layer.as_deref(), ctx).map(drop)
        }
        GraphAction::ShowElement { element: reference } => {
            element::set_visibility(reference, Some(&Value::Bool(true)), ctx).map(drop)
        }
        GraphAction::HideElement { element: reference } => {
            element::set_visibility(reference, Some(&Value::Bool(false)), ctx).map(drop)
        }
        GraphAction::ToggleElement { element: reference } => {
            element::set_visibility(reference, None, ctx).map(drop)
        }
        GraphAction::PlayAnimation {
            template,
            layer,
            phase,
        } => playout::play_animation(template, layer.as_deref(), *phase, ctx).map(drop),
        GraphAction::StopAnimation { template, layer } => {
            playout::play_animation(template, layer.as_deref(), Phase::Out, ctx).map(drop)
        }
        GraphAction::Log { message } => {
            flow::log(message, ctx);
            Ok(())
        }
        GraphAction::Delay { duration_ms } => flow::wait(duration_ms, ctx).await,
        GraphAction::CallFunction { name, args, target } => {
            if ctx.functions().contains(name) {
                flow::call_function(name, args, target.as_deref(), ctx).map(drop)
            } else {
                ctx.log(format!("callFunction '{}' (no host function registered)", name));
                Ok(())
            }
        }
    }
}

/// Read an address, `state.<key>` or bare state key.
fn read_source(source: &str, ctx: &ExecutionContext) -> Option<Value> {
    let source = source.trim();
    if source.starts_with(SIGIL) {
        return resolve_value(&Value::String(source.to_string()), ctx);
    }
    let path = source.strip_prefix("state.").unwrap_or(source);
    ctx.store().get_path(path)
}

fn run_data(node_id: &str, operation: &DataOperation, ctx: &ExecutionContext) -> Result<()> {
    let failed = |cause: String| CueError::NodeFailed {
        node_id: node_id.to_string(),
        cause,
    };

    match operation {
        DataOperation::Get { source, target } => {
            let value = read_source(source, ctx)
                .ok_or_else(|| failed(format!("'{}' did not resolve", source)))?;
            match target {
                Some(target) => {
                    if !write_target(target, value, ctx) {
                        return Err(failed(format!("could not write '{}'", target)));
                    }
                }
                None => ctx.debug(
                    LogCategory::Graph,
                    format!("{} = {}", source, to_display_string(&value)),
                ),
            }
            Ok(())
        }
        DataOperation::Set { target, value } => {
            let value = resolve_value(value, ctx)
                .ok_or_else(|| failed(format!("value for '{}' did not resolve", target)))?;
            if write_target(target, value, ctx) {
                Ok(())
            } else {
                Err(failed(format!("could not write '{}'", target)))
            }
        }
    }
}

fn run_animation(animation: &AnimationNode, ctx: &ExecutionContext) -> Result<()> {
    playout::play_animation(
        &animation.template,
        animation.layer.as_deref(),
        animation.phase,
        ctx,
    )
    .map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::functions::FunctionRegistry;
    use cueflow_core::model::{Element, Layer, Template};
    use cueflow_core::providers::PlayoutCall;
    use cueflow_core::testing::TestHarness;
    use serde_json::json;

    fn harness() -> TestHarness {
        TestHarness::builder()
            .element(Element::new("e1", "Logo"))
            .template(Template::new("t1", "Lower Third", Some("L1")))
            .layer(Layer::new("L1", "Main"))
            .state(json!({"score": 3, "team": {"name": "Red"}}))
            .build()
    }

    #[tokio::test]
    async fn element_visibility_actions() {
        let h = harness();
        let hide = GraphAction::HideElement { element: "@Logo".into() };
        let toggle = GraphAction::ToggleElement { element: "e1".into() };
        run_action(&hide, &h.ctx).await.unwrap();
        run_action(&toggle, &h.ctx).await.unwrap();
        let visibility: Vec<Value> = h
            .elements
            .patches()
            .into_iter()
            .map(|(_, patch)| patch["visible"].clone())
            .collect();
        assert_eq!(visibility, vec![json!(false), json!(true)]);
    }

    #[tokio::test]
    async fn template_toggle_flips_phase() {
        let h = harness();
        let toggle = GraphAction::ToggleTemplate {
            template: "Lower Third".into(),
            layer: None,
        };
        run_action(&toggle, &h.ctx).await.unwrap();
        run_action(&toggle, &h.ctx).await.unwrap();
        assert_eq!(
            h.playout.calls(),
            vec![
                PlayoutCall::PlayIn { template_id: "t1".into(), layer_id: "L1".into() },
                PlayoutCall::PlayOut { layer_id: "L1".into() },
            ]
        );
    }

    #[tokio::test]
    async fn unregistered_functions_only_log() {
        let h = harness();
        let call = GraphAction::CallFunction {
            name: "refresh".into(),
            args: vec![],
            target: None,
        };
        run_action(&call, &h.ctx).await.unwrap();
        assert!(h.messages()[0].contains("refresh"));
    }

    #[tokio::test]
    async fn registered_functions_run() {
        let h = TestHarness::builder()
            .functions(FunctionRegistry::new().register("answer", |_| Ok(json!(42))))
            .build();
        let call = GraphAction::CallFunction {
            name: "answer".into(),
            args: vec![],
            target: Some("result".into()),
        };
        run_action(&call, &h.ctx).await.unwrap();
        assert_eq!(h.state("result"), Some(json!(42)));
    }

    #[test]
    fn data_nodes_read_and_write() {
        let h = harness();
        let copy = DataOperation::Get {
            source: "state.team.name".into(),
            target: Some("winner".into()),
        };
        run_data("d1", &copy, &h.ctx).unwrap();
        assert_eq!(h.state("winner"), Some(json!("Red")));

        let set = DataOperation::Set {
            target: "@Logo.opacity".into(),
            value: json!("=state.score / 10"),
        };
        run_data("d2", &set, &h.ctx).unwrap();
        assert_eq!(
            h.elements.patches().last().unwrap(),
            &("e1".to_string(), json!({"opacity": 0.3}))
        );

        let missing = DataOperation::Get {
            source: "nope".into(),
            target: None,
        };
        assert_eq!(run_data("d3", &missing, &h.ctx).unwrap_err().code(), "E303");
    }
}
