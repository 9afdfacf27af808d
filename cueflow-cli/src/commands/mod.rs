//! CLI command implementations.

pub mod actions;
pub mod eval;
pub mod run;
pub mod session;
pub mod validate;
pub mod version;

use anyhow::{Context, Result};
use cueflow_core::settings::EngineSettings;
use std::path::Path;

/// Engine settings from `--config` (or defaults), then `CUEFLOW_*` overrides.
pub fn load_settings(config: Option<&Path>, debug: bool) -> Result<EngineSettings> {
    let settings = match config {
        Some(path) => EngineSettings::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineSettings::default(),
    };
    let mut settings = settings.with_env_overrides();
    settings.debug |= debug;
    settings.validate().context("Invalid engine settings")?;
    tracing::debug!(?settings, "Engine settings");
    Ok(settings)
}
