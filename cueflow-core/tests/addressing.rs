//! Address reads and writes against a live studio.

mod common;

use common::{studio, studio_with_state};
use cueflow_core::address::{build_animation_address, resolve_address, set_address_value};
use cueflow_core::ids::DispatchId;
use cueflow_core::logging::LogCategory;
use cueflow_core::model::Phase;
use cueflow_core::providers::ElementStore;
use cueflow_core::store::StoreChange;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

#[test]
fn element_properties_read_and_patch() {
    let h = studio().build();

    assert_eq!(resolve_address("@Home_Score.content.text", &h.ctx), Some(json!("0")));
    assert!(set_address_value("@home_score.content.text", json!("3"), &h.ctx));

    let element = h.elements.element("el-score").unwrap();
    assert_eq!(element.properties["content"], json!({"text": "3", "color": "white"}));
    assert_eq!(resolve_address("@Home_Score.content.text", &h.ctx), Some(json!("3")));
    assert!(h.warnings().is_empty());
}

#[test]
fn template_records_select_by_display_name() {
    let h = studio().build();

    assert_eq!(
        resolve_address("@template.Lower_Third.record.role", &h.ctx),
        Some(json!("Analyst"))
    );
    assert!(set_address_value("@template.Lower_Third", json!(" grace hopper "), &h.ctx));
    assert_eq!(
        resolve_address("@template.Lower_Third.record.role", &h.ctx),
        Some(json!("Host"))
    );
    assert_eq!(resolve_address("@template.Lower_Third.index", &h.ctx), Some(json!(1)));

    assert!(!set_address_value("@template.Lower_Third", json!("Alan Turing"), &h.ctx));
    assert!(!set_address_value("@template.Lower_Third.index", json!(7), &h.ctx));
    assert_eq!(h.warnings().len(), 2);
}

#[test]
fn data_reads_follow_the_cursor_and_named_sources() {
    let h = studio().build();

    assert_eq!(resolve_address("@data.team", &h.ctx), Some(json!("Blue")));
    assert_eq!(resolve_address("@data.standings.leader", &h.ctx), Some(json!("Blue")));
    assert_eq!(resolve_address("@data.index", &h.ctx), Some(json!(1)));
    assert_eq!(resolve_address("@data.count", &h.ctx), Some(json!(2)));
    assert!(h.warnings().is_empty());

    assert_eq!(resolve_address("@data.missing", &h.ctx), None);
    let warnings = h.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, LogCategory::Address);
}

#[test]
fn animation_addresses_describe_playout() {
    let h = studio().build();
    let address = build_animation_address("Lower Third", Phase::Out);
    assert_eq!(address, "@template.Lower_Third.out");

    assert_eq!(
        resolve_address(&address, &h.ctx),
        Some(json!({
            "template": "tpl-lt",
            "templateName": "Lower Third",
            "layer": "L1",
            "phase": "out",
        }))
    );
}

#[test]
fn state_addresses_defer_reads_and_write_through() {
    let h = studio_with_state(json!({"count": 4}));

    assert_eq!(resolve_address("@state.count", &h.ctx), Some(json!("{{state.count}}")));
    assert!(set_address_value("@state.score.home", json!(2), &h.ctx));
    assert_eq!(h.ctx.store().get_path("score.home"), Some(json!(2)));
}

#[test]
fn unresolvable_addresses_warn_and_continue() {
    let h = studio().build();

    assert_eq!(resolve_address("@Nowhere.opacity", &h.ctx), None);
    assert_eq!(resolve_address("Logo.opacity", &h.ctx), None);
    assert_eq!(resolve_address("@Logo.missing.deep", &h.ctx), None);
    assert!(!set_address_value("@Logo", json!(0.5), &h.ctx));

    let categories: Vec<LogCategory> = h.warnings().iter().map(|e| e.category).collect();
    assert_eq!(categories, vec![LogCategory::Address; 3]);
}

#[test]
fn log_events_carry_dispatch_and_node() {
    let h = studio().build();
    let dispatch_id = DispatchId::new();
    let node_ctx = h.ctx.with_dispatch_id(dispatch_id).with_node("n-7");

    node_ctx.warn(LogCategory::Graph, "first");
    node_ctx.log("second");
    h.ctx.log("unrelated");

    let events = h.logs.by_dispatch(dispatch_id);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.node_id.as_deref() == Some("n-7")));
}

#[test]
fn navigation_resets_state_and_notifies() {
    let h = studio_with_state(json!({"x": 1}));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.ctx.store().subscribe(move |change| sink.lock().push(change.clone()));

    h.ctx.navigate("results").unwrap();
    h.ctx.navigate("credits").unwrap();

    assert_eq!(h.ctx.store().get("x"), None);
    assert_eq!(h.navigator.screens(), vec!["results", "credits"]);
    assert_eq!(
        seen.lock().first(),
        Some(&StoreChange::Navigated {
            from: None,
            to: "results".into()
        })
    );

    assert_eq!(h.ctx.navigate_back().unwrap(), Some("results".to_string()));
    assert_eq!(h.ctx.store().current_screen(), Some("results".to_string()));
}
