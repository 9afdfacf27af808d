//! Run command - dispatch one event through a node graph.

use super::session::{Scene, Session, load_state, read};
use anyhow::{Context, Result, bail};
use cueflow_core::model::TriggerEvent;
use cueflow_core::settings::EngineSettings;
use cueflow_graph::{DispatchReport, GraphRuntime, GraphValidator};
use serde_json::Value;
use std::path::Path;

/// Inputs for one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions<'a> {
    /// Graph file.
    pub graph: &'a Path,
    /// Event type.
    pub event: &'a str,
    /// Triggering element id.
    pub element: Option<&'a str>,
    /// Event payload as JSON.
    pub payload: Option<&'a str>,
    /// Scene file.
    pub scene: Option<&'a Path>,
    /// Initial state file.
    pub state: Option<&'a Path>,
    /// Complete delays immediately.
    pub instant: bool,
}

/// Build the triggering event from flags.
pub fn trigger(event: &str, element: Option<&str>, payload: Option<&str>) -> Result<TriggerEvent> {
    let mut trigger = TriggerEvent::new(event.trim());
    if let Some(element) = element {
        trigger = trigger.on_element(element);
    }
    if let Some(payload) = payload {
        let payload: Value = serde_json::from_str(payload).context("Invalid --payload JSON")?;
        trigger = trigger.with_payload(payload);
    }
    Ok(trigger)
}

/// Load, validate and dispatch. Validation errors stop before anything runs.
pub async fn dispatch(
    options: &RunOptions<'_>,
    settings: EngineSettings,
) -> Result<(Session, DispatchReport)> {
    let source = read(options.graph)?;
    let (graph, report) = GraphValidator::new().validate_source(&source);
    for warning in report.warnings() {
        tracing::warn!(location = %warning.location, kind = %warning.kind, "{}", warning.message);
    }
    report
        .into_result()
        .with_context(|| format!("Graph is invalid: {}", options.graph.display()))?;
    let Some(graph) = graph else {
        bail!("Graph could not be parsed: {}", options.graph.display());
    };

    let event = trigger(options.event, options.element, options.payload)?;
    let session = Session::new(
        Scene::load(options.scene)?,
        load_state(options.state)?,
        settings,
        options.instant,
    );

    let runtime = GraphRuntime::new(graph);
    let report = runtime.dispatch(&event, &session.ctx).await;
    Ok((session, report))
}

/// Run the run command.
pub async fn run(options: RunOptions<'_>, settings: EngineSettings) -> Result<()> {
    let (session, report) = dispatch(&options, settings).await?;

    println!(
        "Dispatched '{}' ({}): {} event node(s) matched, {} node(s) visited",
        report.event_type,
        report.dispatch_id,
        report.matched,
        report.visited.len()
    );
    if !report.visited.is_empty() {
        println!("Path: {}", report.visited.join(" -> "));
    }
    println!();
    session.print_summary()?;

    if !report.is_success() {
        println!();
        println!("Failures:");
        for failure in &report.failures {
            println!(
                "  ✗ {} ({}): {}",
                failure.node_id, failure.node_type, failure.error
            );
        }
        bail!("{} node(s) failed", report.failures.len());
    }
    Ok(())
}
