//! End-to-end action lists against an in-memory scene.

mod common;

use common::{actions, actions_yaml, quiz};
use cueflow_actions::{ActionKind, execute_actions};
use cueflow_core::model::TriggerEvent;
use cueflow_core::providers::PlayoutCall;
use serde_json::json;

#[tokio::test]
async fn a_broken_step_does_not_stop_the_rest() {
    let h = quiz(json!({}));
    let list = actions(json!([
        {"type": "setState", "target": "first", "value": true},
        {"type": "setElementProperty", "element": "@DoesNotExist", "property": "content.text", "value": "x"},
        {"type": "setState", "target": "second", "value": true},
        {"type": "log", "message": "done"},
    ]));

    let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;

    assert_eq!(report.executed, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].action, "setElementProperty");
    assert_eq!(h.state("first"), Some(json!(true)));
    assert_eq!(h.state("second"), Some(json!(true)));
    assert!(h.messages().contains(&"done".to_string()));
    assert!(!h.warnings().is_empty());
}

#[tokio::test]
async fn yaml_authored_scoring_flow() {
    let h = quiz(json!({"score": 0}));
    let list = actions_yaml(
        r#"
- type: incrementState
  target: score
  by: 5
- type: setElementProperty
  element: "@Score"
  property: content.text
  value: "{{state.score}} pts"
- type: conditional
  condition:
    operand: state.score
    operator: ">="
    comparand: 5
  then:
    - type: playAnimation
      template: "@template.Lower_Third"
  else:
    - type: log
      message: not yet
"#,
    );

    let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(h.state("score"), Some(json!(5)));
    let (id, patch) = h.elements.patches().pop().unwrap();
    assert_eq!(id, "el-score");
    assert_eq!(patch, json!({"content": {"text": "5 pts"}}));
    assert_eq!(
        h.playout.calls(),
        vec![PlayoutCall::PlayIn {
            template_id: "tpl-lt".into(),
            layer_id: "L1".into()
        }]
    );
}

#[tokio::test]
async fn fetched_data_feeds_later_steps() {
    let h = quiz(json!({}));
    let list = actions(json!([
        {"type": "fetchData", "url": "https://api.test/results", "path": "data.votes", "target": "votes"},
        {"type": "sortData", "source": "state.votes", "field": "n", "descending": true, "target": "ranked"},
        {"type": "aggregateData", "source": "state.votes", "operation": "sum", "field": "n", "target": "total"},
        {"type": "setState", "target": "leader", "value": "=state.ranked[0].team"},
    ]));

    let report = execute_actions(&list, &TriggerEvent::new("poll"), &h.ctx).await;

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(h.state("total"), Some(json!(13)));
    assert_eq!(h.state("leader"), Some(json!("Blue")));
    assert_eq!(h.fetcher.requests()[0].method, "GET");
}

#[tokio::test]
async fn timelines_and_waits_go_through_the_clock() {
    let h = quiz(json!({}));
    let list = actions(json!([
        {"type": "playTimeline", "steps": [
            {"template": "tpl-lt", "phase": "in"},
            {"template": "tpl-lt", "phase": "out", "delayMs": 5000},
        ]},
        {"type": "wait", "ms": 250},
        {"type": "setState", "target": "after", "value": 1},
    ]));

    let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;

    assert!(report.is_success());
    assert_eq!(h.clock.total_slept().as_millis(), 5_250);
    assert_eq!(h.playout.calls().len(), 2);
    assert_eq!(h.state("after"), Some(json!(1)));
}

#[tokio::test]
async fn event_fields_are_operands() {
    let h = quiz(json!({}));
    let list = actions(json!([
        {"type": "setState", "target": "clicked", "value": "event.elementId"},
        {"type": "toggleVisibility", "element": "el-banner", "visible": "=event.payload.show"},
    ]));

    let event = TriggerEvent::new("click")
        .on_element("el-banner")
        .with_payload(json!({"show": false}));
    let report = execute_actions(&list, &event, &h.ctx).await;

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(h.state("clicked"), Some(json!("el-banner")));
    assert_eq!(h.elements.patches().last().unwrap().1, json!({"visible": false}));
}

#[test]
fn unknown_action_types_are_rejected_at_parse_time() {
    let parsed: Result<Vec<cueflow_actions::Action>, _> =
        serde_json::from_value(json!([{"type": "launchRocket"}]));
    assert!(parsed.is_err());

    let list = actions(json!([{"type": "navigateBack", "enabled": false}]));
    assert!(matches!(list[0].kind, ActionKind::NavigateBack));
    assert!(!list[0].enabled);
}

#[tokio::test]
async fn increments_leave_numeric_text_untouched() {
    let h = quiz(json!({"count": "5"}));
    let list = actions(json!([
        {"type": "incrementState", "target": "count", "by": 1},
        {"type": "setState", "target": "after", "value": true},
    ]));

    let report = execute_actions(&list, &TriggerEvent::new("click"), &h.ctx).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].action, "incrementState");
    assert_eq!(h.state("count"), Some(json!("5")));
    assert_eq!(h.state("after"), Some(json!(true)));
}
