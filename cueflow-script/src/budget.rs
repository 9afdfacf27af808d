//! Evaluation guards: wall-clock deadline, iteration ceiling, call depth.
//!
//! The deadline is checked on every evaluation step, so code that never
//! yields is still stopped. The iteration ceiling counts loop iterations
//! independently of time and fails with its own error kind.

use cueflow_core::error::{CueError, Result};
use cueflow_core::settings::EngineSettings;
use std::time::{Duration, Instant};

/// Default cap on string length produced by evaluation.
pub const DEFAULT_MAX_STRING_LEN: usize = 1024 * 1024;

/// Default cap on array length produced by evaluation.
pub const DEFAULT_MAX_COLLECTION_LEN: usize = 100_000;

/// Limits applied to one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLimits {
    /// Wall-clock deadline.
    pub timeout: Duration,
    /// Loop iteration ceiling; `None` leaves loops bounded by the deadline only.
    pub max_iterations: Option<u64>,
    /// Maximum function call nesting.
    pub max_call_depth: usize,
    /// Maximum string length.
    pub max_string_len: usize,
    /// Maximum array length.
    pub max_collection_len: usize,
}

impl ScriptLimits {
    /// Limits for a single expression: the short deadline only.
    pub fn for_expression(settings: &EngineSettings) -> Self {
        Self {
            timeout: settings.expression_timeout(),
            max_iterations: None,
            max_call_depth: settings.max_call_depth,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
        }
    }

    /// Limits for a script: the longer deadline plus the iteration ceiling.
    pub fn for_script(settings: &EngineSettings) -> Self {
        Self {
            timeout: settings.script_timeout(),
            max_iterations: Some(settings.max_loop_iterations),
            ..Self::for_expression(settings)
        }
    }

    /// Limits for a `loop` action: the iteration ceiling with no deadline,
    /// since loop bodies may suspend.
    pub fn for_action_loop(settings: &EngineSettings) -> Self {
        Self {
            timeout: Duration::MAX,
            ..Self::for_script(settings)
        }
    }
}

/// Running counters for one evaluation.
#[derive(Debug)]
pub struct Budget {
    limits: ScriptLimits,
    started: Instant,
    deadline: Option<Instant>,
    steps: u64,
    iterations: u64,
}

impl Budget {
    /// Start the clock.
    pub fn new(limits: ScriptLimits) -> Self {
        let started = Instant::now();
        Self {
            deadline: started.checked_add(limits.timeout),
            started,
            limits,
            steps: 0,
            iterations: 0,
        }
    }

    /// Limits in force.
    pub fn limits(&self) -> &ScriptLimits {
        &self.limits
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Loop iterations counted so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Fail with a timeout if the deadline has passed.
    pub fn check_deadline(&self) -> Result<()> {
        let Some(deadline) = self.deadline else {
            return Ok(());
        };
        let now = Instant::now();
        if now >= deadline {
            return Err(CueError::ScriptTimeout {
                elapsed_ms: now.duration_since(self.started).as_millis() as u64,
                limit_ms: self.limits.timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    /// Account for one evaluation step.
    pub fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        self.check_deadline()
    }

    /// Account for one loop iteration.
    pub fn iterate(&mut self) -> Result<()> {
        self.iterations += 1;
        if let Some(limit) = self.limits.max_iterations {
            if self.iterations > limit {
                return Err(CueError::LoopLimitExceeded { limit });
            }
        }
        self.check_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(timeout_ms: u64, max_iterations: Option<u64>) -> ScriptLimits {
        ScriptLimits {
            timeout: Duration::from_millis(timeout_ms),
            max_iterations,
            ..ScriptLimits::for_expression(&EngineSettings::default())
        }
    }

    #[test]
    fn iteration_ceiling_is_its_own_error() {
        let mut budget = Budget::new(limits(60_000, Some(3)));
        for _ in 0..3 {
            budget.iterate().unwrap();
        }
        assert_eq!(
            budget.iterate().unwrap_err(),
            CueError::LoopLimitExceeded { limit: 3 }
        );
    }

    #[test]
    fn deadline_fires_as_timeout() {
        let mut budget = Budget::new(limits(0, None));
        let err = budget.tick().unwrap_err();
        assert_eq!(err.code(), "E202");
        assert!(err.is_guard_failure());
    }

    #[test]
    fn expression_limits_have_no_iteration_ceiling() {
        let settings = EngineSettings::default();
        assert_eq!(ScriptLimits::for_expression(&settings).max_iterations, None);
        assert_eq!(
            ScriptLimits::for_script(&settings).max_iterations,
            Some(settings.max_loop_iterations)
        );
        assert!(
            ScriptLimits::for_script(&settings).timeout
                > ScriptLimits::for_expression(&settings).timeout
        );
    }

    #[test]
    fn action_loops_count_without_a_deadline() {
        let settings = EngineSettings::default().with_max_loop_iterations(2);
        let mut budget = Budget::new(ScriptLimits::for_action_loop(&settings));
        budget.check_deadline().unwrap();
        budget.iterate().unwrap();
        budget.iterate().unwrap();
        assert_eq!(budget.iterate().unwrap_err().code(), "E203");
    }
}
