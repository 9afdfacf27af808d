//! Eval command - evaluate an expression or script against a state file.

use super::session::{Scene, Session, load_state};
use anyhow::{Context, Result};
use cueflow_core::settings::EngineSettings;
use cueflow_script::{evaluate_expression, execute_script_async, validate_expression, validate_script};
use serde_json::Value;
use std::path::Path;

/// Evaluate `source` as an expression, or as a script with `script`.
pub async fn evaluate(
    source: &str,
    script: bool,
    scene: Option<&Path>,
    state: Option<&Path>,
    settings: EngineSettings,
) -> Result<(Session, Value)> {
    let session = Session::new(Scene::load(scene)?, load_state(state)?, settings, true);
    let value = if script {
        execute_script_async(source, &session.ctx).await
    } else {
        evaluate_expression(source, &session.ctx)
    }
    .context("Evaluation failed")?;
    Ok((session, value))
}

/// Run the eval command. With `check`, only validate.
pub async fn run(
    source: &str,
    script: bool,
    check: bool,
    scene: Option<&Path>,
    state: Option<&Path>,
    settings: EngineSettings,
) -> Result<()> {
    if check {
        if script {
            validate_script(source)
        } else {
            validate_expression(source)
        }
        .context("Validation failed")?;
        println!("✓ valid");
        return Ok(());
    }

    let (session, value) = evaluate(source, script, scene, state, settings).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&value).context("Failed to render result")?
    );
    for event in session.logs.all() {
        eprintln!("{}", event.format_line());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::error::CueError;
    use serde_json::json;
    use std::io::Write;

    fn state_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"votes: [4, 9, 2]\nteam: { name: Red }\n").unwrap();
        file
    }

    #[tokio::test]
    async fn expressions_see_the_state_file() {
        let state = state_file();
        let (_, value) = evaluate(
            "sum(state.votes) + ' for ' + state.team.name",
            false,
            None,
            Some(state.path()),
            EngineSettings::default(),
        )
        .await
        .unwrap();
        assert_eq!(value, json!("15 for Red"));
    }

    #[tokio::test]
    async fn runaway_scripts_hit_the_ceiling() {
        let settings = EngineSettings::default().with_max_loop_iterations(100);
        let err = evaluate("while (true) {}", true, None, None, settings)
            .await
            .err()
            .unwrap();
        let cause = err.downcast_ref::<CueError>().unwrap();
        assert_eq!(cause.code(), "E203");
    }

    #[tokio::test]
    async fn check_mode_only_validates() {
        let settings = EngineSettings::default();
        assert!(run("1 +", false, true, None, None, settings.clone()).await.is_err());
        assert!(run("state.missing.deep", false, true, None, None, settings).await.is_ok());
    }
}
