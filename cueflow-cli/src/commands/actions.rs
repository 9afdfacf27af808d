//! Actions command - run an authored action list.

use super::run::trigger;
use super::session::{Scene, Session, load_state, read};
use anyhow::{Context, Result, bail};
use cueflow_actions::{Action, ExecutionReport, execute_actions};
use cueflow_core::settings::EngineSettings;
use serde::Deserialize;
use std::path::Path;

/// A bare list, or a mapping with an `actions` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum ActionFile {
    List(Vec<Action>),
    Bound { actions: Vec<Action> },
}

/// Parse an action list file.
pub fn load(path: &Path) -> Result<Vec<Action>> {
    let source = read(path)?;
    let file: ActionFile = serde_yaml::from_str(&source)
        .with_context(|| format!("Invalid action list: {}", path.display()))?;
    Ok(match file {
        ActionFile::List(actions) | ActionFile::Bound { actions } => actions,
    })
}

/// Inputs for one action run.
#[derive(Debug, Clone, Copy)]
pub struct ActionOptions<'a> {
    /// Action list file.
    pub file: &'a Path,
    /// Event type the list is bound to.
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

/// Load and execute an action list.
pub async fn execute(
    options: &ActionOptions<'_>,
    settings: EngineSettings,
) -> Result<(Session, ExecutionReport)> {
    let actions = load(options.file)?;
    let event = trigger(options.event, options.element, options.payload)?;
    let session = Session::new(
        Scene::load(options.scene)?,
        load_state(options.state)?,
        settings,
        options.instant,
    );
    tracing::info!(file = %options.file.display(), actions = actions.len(), "Running action list");
    let report = execute_actions(&actions, &event, &session.ctx).await;
    Ok((session, report))
}

/// Run the actions command.
pub async fn run(options: ActionOptions<'_>, settings: EngineSettings) -> Result<()> {
    let (session, report) = execute(&options, settings).await?;

    println!(
        "Ran {} ({}): {} executed, {} skipped, {} failed",
        options.file.display(),
        report.dispatch_id,
        report.executed,
        report.skipped,
        report.failures.len()
    );
    println!();
    session.print_summary()?;

    if !report.is_success() {
        println!();
        println!("Failures:");
        for failure in &report.failures {
            let id = failure.id.as_deref().unwrap_or("-");
            println!(
                "  ✗ #{} {} ({}): {}",
                failure.index, failure.action, id, failure.error
            );
        }
        bail!("{} action(s) failed", report.failures.len());
    }
    Ok(())
}
