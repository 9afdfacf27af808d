//! Common test utilities for script integration tests.

#![allow(dead_code)]

use cueflow_core::model::{Element, Template};
use cueflow_core::settings::EngineSettings;
use cueflow_core::testing::TestHarness;
use serde_json::{Value, json};

/// A scoreboard scene: one text element, one template with records.
pub fn scoreboard(state: Value) -> TestHarness {
    TestHarness::builder()
        .element(
            Element::new("el-score", "Score Text")
                .with_property("content", json!({"text": "0"})),
        )
        .template(
            Template::new("tpl-lt", "Lower Third", Some("layer-1")).with_records(
                vec![json!({"name": "Ada"}), json!({"name": "Grace"})],
                Some("name"),
            ),
        )
        .state(state)
        .build()
}

/// Settings with tight guards so runaway tests finish quickly.
pub fn tight_settings() -> EngineSettings {
    EngineSettings::default()
        .with_expression_timeout_ms(20)
        .with_script_timeout_ms(200)
        .with_max_loop_iterations(500)
}

/// Harness with tight guards and the given state.
pub fn guarded(state: Value) -> TestHarness {
    TestHarness::builder()
        .settings(tight_settings())
        .state(state)
        .build()
}
