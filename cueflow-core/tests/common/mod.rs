//! Common test utilities for core integration tests.

#![allow(dead_code)]

use cueflow_core::model::{DataScope, DataSource, Element, Layer, Template};
use cueflow_core::testing::{TestHarness, TestHarnessBuilder};
use serde_json::{Value, json};

/// A small studio: two elements, a lower third with player records, two layers.
pub fn studio() -> TestHarnessBuilder {
    TestHarness::builder()
        .element(
            Element::new("el-score", "Home Score")
                .with_property("content", json!({"text": "0", "color": "white"})),
        )
        .element(Element::new("el-logo", "Logo").with_property("opacity", json!(1)))
        .template(
            Template::new("tpl-lt", "Lower Third", Some("L1")).with_records(
                vec![
                    json!({"name": "Ada Lovelace", "role": "Analyst"}),
                    json!({"name": "Grace Hopper", "role": "Host"}),
                ],
                Some("name"),
            ),
        )
        .layer(Layer::new("L1", "Main"))
        .layer(Layer::new("L2", "Bug"))
        .data(
            DataScope::new(vec![json!({"team": "Red", "score": 3}), json!({"team": "Blue", "score": 5})], 1)
                .with_source("Standings", DataSource::new(vec![json!({"leader": "Blue"})], 0)),
        )
}

/// `studio()` with seeded state.
pub fn studio_with_state(state: Value) -> TestHarness {
    studio().state(state).build()
}
