//! Common test utilities for action integration tests.

#![allow(dead_code)]

use cueflow_actions::Action;
use cueflow_core::model::{Element, Layer, Template};
use cueflow_core::providers::StaticFetcher;
use cueflow_core::testing::TestHarness;
use serde_json::{Value, json};

/// Parse an action list from JSON.
pub fn actions(value: Value) -> Vec<Action> {
    serde_json::from_value(value).expect("valid action list")
}

/// Parse an action list from YAML.
pub fn actions_yaml(source: &str) -> Vec<Action> {
    serde_yaml::from_str(source).expect("valid action list")
}

/// A quiz scene: score text, a lower third and a results endpoint.
pub fn quiz(state: Value) -> TestHarness {
    TestHarness::builder()
        .element(
            Element::new("el-score", "Score")
                .with_property("content", json!({"text": "0"})),
        )
        .element(Element::new("el-banner", "Banner"))
        .template(Template::new("tpl-lt", "Lower Third", Some("L1")))
        .layer(Layer::new("L1", "Main"))
        .fetcher(StaticFetcher::new().respond(
            "https://api.test/results",
            json!({"data": {"votes": [{"team": "Red", "n": 4}, {"team": "Blue", "n": 9}]}}),
        ))
        .state(state)
        .build()
}
