//! Engine settings.
//!
//! Loaded from YAML or JSON, then overridden by `CUEFLOW_*` environment
//! variables. These are the only timing caps in the runtime: evaluation
//! deadlines, loop ceilings and the delay cap.

use crate::error::{CueError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How multiple matching event nodes for one trigger are walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// One walk completes before the next starts.
    #[default]
    Sequential,
    /// Walks interleave at their suspension points on the calling task.
    Concurrent,
}

impl DispatchMode {
    /// Parse a mode name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Some(Self::Sequential),
            "concurrent" => Some(Self::Concurrent),
            _ => None,
        }
    }
}

/// Runtime settings for evaluation and dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Wall-clock deadline for one expression.
    #[serde(default = "default_expression_timeout_ms")]
    pub expression_timeout_ms: u64,

    /// Wall-clock deadline for one script.
    #[serde(default = "default_script_timeout_ms")]
    pub script_timeout_ms: u64,

    /// Loop iterations allowed per script or `loop` action.
    #[serde(default = "default_max_loop_iterations")]
    pub max_loop_iterations: u64,

    /// Nested function call depth allowed in scripts.
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,

    /// Longest single `delay`/`wait`; longer requests are clamped.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Walk mode for multiple matching event nodes.
    #[serde(default)]
    pub dispatch_mode: DispatchMode,

    /// Clear runtime state when navigating to another screen.
    #[serde(default = "default_reset_state_on_navigate")]
    pub reset_state_on_navigate: bool,

    /// Emit per-node debug events to the log collector.
    #[serde(default)]
    pub debug: bool,
}

fn default_expression_timeout_ms() -> u64 {
    100
}
fn default_script_timeout_ms() -> u64 {
    1_000
}
fn default_max_loop_iterations() -> u64 {
    10_000
}
fn default_max_call_depth() -> usize {
    64
}
fn default_max_delay_ms() -> u64 {
    60_000
}
fn default_reset_state_on_navigate() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            expression_timeout_ms: default_expression_timeout_ms(),
            script_timeout_ms: default_script_timeout_ms(),
            max_loop_iterations: default_max_loop_iterations(),
            max_call_depth: default_max_call_depth(),
            max_delay_ms: default_max_delay_ms(),
            dispatch_mode: DispatchMode::default(),
            reset_state_on_navigate: default_reset_state_on_navigate(),
            debug: false,
        }
    }
}

impl EngineSettings {
    /// Parse settings from YAML (JSON is valid YAML).
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| CueError::Io {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;
        Self::from_yaml_str(&source)
    }

    /// Defaults overridden by the process environment.
    ///
    /// ```bash
    /// export CUEFLOW_EXPRESSION_TIMEOUT_MS=50
    /// export CUEFLOW_DISPATCH_MODE=concurrent
    /// ```
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `CUEFLOW_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(variable = key, value = %raw, "Ignoring unparseable setting");
                    None
                }
            }
        }

        if let Some(v) = parsed(&lookup, "CUEFLOW_EXPRESSION_TIMEOUT_MS") {
            self.expression_timeout_ms = v;
        }
        if let Some(v) = parsed(&lookup, "CUEFLOW_SCRIPT_TIMEOUT_MS") {
            self.script_timeout_ms = v;
        }
        if let Some(v) = parsed(&lookup, "CUEFLOW_MAX_LOOP_ITERATIONS") {
            self.max_loop_iterations = v;
        }
        if let Some(v) = parsed(&lookup, "CUEFLOW_MAX_CALL_DEPTH") {
            self.max_call_depth = v;
        }
        if let Some(v) = parsed(&lookup, "CUEFLOW_MAX_DELAY_MS") {
            self.max_delay_ms = v;
        }
        if let Some(v) = parsed(&lookup, "CUEFLOW_RESET_STATE_ON_NAVIGATE") {
            self.reset_state_on_navigate = v;
        }
        if let Some(raw) = lookup("CUEFLOW_DISPATCH_MODE") {
            match DispatchMode::parse(&raw) {
                Some(mode) => self.dispatch_mode = mode,
                None => tracing::warn!(value = %raw, "Ignoring unknown dispatch mode"),
            }
        }
        self
    }

    /// Reject settings that would disable a guard.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("expression_timeout_ms", self.expression_timeout_ms == 0),
            ("script_timeout_ms", self.script_timeout_ms == 0),
            ("max_loop_iterations", self.max_loop_iterations == 0),
            ("max_call_depth", self.max_call_depth == 0),
        ];
        for (field, is_zero) in checks {
            if is_zero {
                return Err(CueError::Config {
                    field: field.to_string(),
                    cause: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Expression deadline as a duration.
    pub fn expression_timeout(&self) -> Duration {
        Duration::from_millis(self.expression_timeout_ms)
    }

    /// Script deadline as a duration.
    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }

    /// Clamp a requested delay to the configured cap.
    pub fn clamp_delay(&self, requested_ms: u64) -> Duration {
        Duration::from_millis(requested_ms.min(self.max_delay_ms))
    }

    /// Set the expression deadline.
    pub fn with_expression_timeout_ms(mut self, ms: u64) -> Self {
        self.expression_timeout_ms = ms.max(1);
        self
    }

    /// Set the script deadline.
    pub fn with_script_timeout_ms(mut self, ms: u64) -> Self {
        self.script_timeout_ms = ms.max(1);
        self
    }

    /// Set the loop ceiling.
    pub fn with_max_loop_iterations(mut self, max: u64) -> Self {
        self.max_loop_iterations = max.max(1);
        self
    }

    /// Set the dispatch mode.
    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    /// Set whether navigation clears state.
    pub fn with_reset_state_on_navigate(mut self, reset: bool) -> Self {
        self.reset_state_on_navigate = reset;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.expression_timeout_ms, 100);
        assert_eq!(settings.max_loop_iterations, 10_000);
        assert_eq!(settings.dispatch_mode, DispatchMode::Sequential);
        assert!(settings.reset_state_on_navigate);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings = EngineSettings::from_yaml_str(
            "script_timeout_ms: 250\ndispatch_mode: concurrent\n",
        )
        .unwrap();
        assert_eq!(settings.script_timeout_ms, 250);
        assert_eq!(settings.dispatch_mode, DispatchMode::Concurrent);
        assert_eq!(settings.expression_timeout_ms, 100);
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let err = EngineSettings::from_yaml_str("max_loop_iterations: 0").unwrap_err();
        assert_eq!(err.code(), "E801");
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let vars: HashMap<&str, &str> = [
            ("CUEFLOW_EXPRESSION_TIMEOUT_MS", "25"),
            ("CUEFLOW_MAX_LOOP_ITERATIONS", "lots"),
            ("CUEFLOW_DISPATCH_MODE", "Concurrent"),
        ]
        .into_iter()
        .collect();

        let settings = EngineSettings::default()
            .with_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.expression_timeout_ms, 25);
        assert_eq!(settings.max_loop_iterations, 10_000);
        assert_eq!(settings.dispatch_mode, DispatchMode::Concurrent);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"max_delay_ms\": 500}}").unwrap();

        let settings = EngineSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.max_delay_ms, 500);
        assert_eq!(settings.clamp_delay(2_000), Duration::from_millis(500));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineSettings::from_file("/nonexistent/cueflow.yaml").unwrap_err();
        assert_eq!(err.code(), "E901");
    }
}
