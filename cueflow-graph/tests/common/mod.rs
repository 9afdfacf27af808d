//! Common test utilities for graph integration tests.

#![allow(dead_code)]

use cueflow_actions::Guard;
use cueflow_core::model::{Element, Layer, Template};
use cueflow_core::testing::TestHarness;
use cueflow_graph::{Edge, GraphAction, Node};
use cueflow_script::{Condition, ConditionOperator};
use serde_json::{Value, json};

/// A studio scene: a button, a score element and a lower third.
pub fn studio(state: Value) -> TestHarness {
    TestHarness::builder()
        .element(Element::new("btn-a", "Button A"))
        .element(
            Element::new("el-score", "Score").with_property("content", json!({"text": "0"})),
        )
        .template(Template::new("tpl-lt", "Lower Third", Some("L1")))
        .layer(Layer::new("L1", "Main"))
        .state(state)
        .build()
}

/// `setState target = value`.
pub fn set_state(id: &str, target: &str, value: Value) -> Node {
    Node::action(
        id,
        GraphAction::SetState {
            target: target.into(),
            value,
        },
    )
}

/// Condition node over two operands.
pub fn condition(id: &str, operand: &str, operator: ConditionOperator, comparand: Value) -> Node {
    Node::condition(
        id,
        Guard::Condition(Condition::new(operand, operator, comparand)),
    )
}

/// `delay ms`.
pub fn delay(id: &str, ms: u64) -> Node {
    Node::action(id, GraphAction::Delay { duration_ms: json!(ms) })
}

/// Edges from `(source, target)` pairs.
pub fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
    pairs.iter().map(|(s, t)| Edge::new(*s, *t)).collect()
}
