//! Error types for cueflow.
//!
//! Every variant carries a stable code so log lines and CLI output can be
//! matched without parsing prose. Resolution failures are usually reported
//! as warnings and an absent value rather than as errors; the variants here
//! are what crosses an action, node or engine boundary.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cueflow operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CueError {
    // =========================================================================
    // Address Errors (E100-E199)
    // =========================================================================
    /// Address string could not be parsed.
    #[error("E101: Malformed address '{address}': {cause}")]
    AddressSyntax {
        /// The offending address.
        address: String,
        /// Why it was rejected.
        cause: String,
    },

    /// The entity named by an address does not exist.
    #[error("E102: {kind} '{name}' not found")]
    EntityNotFound {
        /// Entity kind (element, template, layer, data source, form).
        kind: String,
        /// The name or id that was looked up.
        name: String,
    },

    /// A property path could not be read or written.
    #[error("E103: Property '{path}' not available on {target}")]
    PropertyNotFound {
        /// The entity the path was applied to.
        target: String,
        /// The dotted property path.
        path: String,
    },

    /// Address namespace does not accept writes.
    #[error("E104: Address '{address}' is read-only")]
    ReadOnlyAddress {
        /// The address that was written to.
        address: String,
    },

    // =========================================================================
    // Script Errors (E200-E299)
    // =========================================================================
    /// Source text failed to parse.
    #[error("E201: Syntax error at {line}:{column}: {message}")]
    ScriptSyntax {
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        column: usize,
        /// Parser message.
        message: String,
    },

    /// Evaluation exceeded its wall-clock deadline.
    #[error("E202: Evaluation timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    ScriptTimeout {
        /// Milliseconds spent before the guard fired.
        elapsed_ms: u64,
        /// The configured deadline.
        limit_ms: u64,
    },

    /// Loop iterations exceeded the configured ceiling.
    #[error("E203: Loop iteration limit of {limit} exceeded")]
    LoopLimitExceeded {
        /// The configured ceiling.
        limit: u64,
    },

    /// Runtime error raised by evaluated code.
    #[error("E204: Script error: {message}")]
    ScriptError {
        /// Error message.
        message: String,
    },

    /// Evaluated code reached for something outside the allowlist.
    #[error("E205: Capability '{name}' is not available to scripts")]
    CapabilityDenied {
        /// The denied identifier or member.
        name: String,
    },

    /// Nested calls exceeded the configured depth.
    #[error("E206: Call depth limit of {limit} exceeded")]
    CallDepthExceeded {
        /// The configured ceiling.
        limit: usize,
    },

    // =========================================================================
    // Action / Node Errors (E300-E399)
    // =========================================================================
    /// Action definition or operand is invalid.
    #[error("E301: Invalid action '{action}': {cause}")]
    InvalidAction {
        /// Action type tag.
        action: String,
        /// Reason.
        cause: String,
    },

    /// Action failed while executing.
    #[error("E302: Action '{action}' failed: {cause}")]
    ActionFailed {
        /// Action type tag.
        action: String,
        /// Reason.
        cause: String,
    },

    /// Graph node failed while executing.
    #[error("E303: Node '{node_id}' failed: {cause}")]
    NodeFailed {
        /// Node id.
        node_id: String,
        /// Reason.
        cause: String,
    },

    /// Host collaborator does not support the requested operation.
    #[error("E304: Unsupported operation: {operation}")]
    Unsupported {
        /// Description of the operation.
        operation: String,
    },

    /// Named host function is not registered.
    #[error("E305: Function '{name}' is not registered")]
    FunctionNotFound {
        /// Function name.
        name: String,
    },

    // =========================================================================
    // Graph Errors (E400-E499)
    // =========================================================================
    /// Graph definition failed validation.
    #[error("E401: Graph validation failed: {cause}")]
    GraphValidation {
        /// Summary of the findings.
        cause: String,
    },

    // =========================================================================
    // Configuration Errors (E800-E899)
    // =========================================================================
    /// Invalid configuration value.
    #[error("E801: Invalid configuration for '{field}': {cause}")]
    Config {
        /// Setting name.
        field: String,
        /// Reason.
        cause: String,
    },

    // =========================================================================
    // I/O and Serialization Errors (E900-E999)
    // =========================================================================
    /// File could not be read.
    #[error("E901: Failed to read {path}: {cause}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Reason.
        cause: String,
    },

    /// Document could not be (de)serialized.
    #[error("E902: Serialization failed: {cause}")]
    Serialization {
        /// Reason.
        cause: String,
    },
}

impl CueError {
    /// Get the error code (e.g., "E101").
    pub fn code(&self) -> &'static str {
        match self {
            Self::AddressSyntax { .. } => "E101",
            Self::EntityNotFound { .. } => "E102",
            Self::PropertyNotFound { .. } => "E103",
            Self::ReadOnlyAddress { .. } => "E104",
            Self::ScriptSyntax { .. } => "E201",
            Self::ScriptTimeout { .. } => "E202",
            Self::LoopLimitExceeded { .. } => "E203",
            Self::ScriptError { .. } => "E204",
            Self::CapabilityDenied { .. } => "E205",
            Self::CallDepthExceeded { .. } => "E206",
            Self::InvalidAction { .. } => "E301",
            Self::ActionFailed { .. } => "E302",
            Self::NodeFailed { .. } => "E303",
            Self::Unsupported { .. } => "E304",
            Self::FunctionNotFound { .. } => "E305",
            Self::GraphValidation { .. } => "E401",
            Self::Config { .. } => "E801",
            Self::Io { .. } => "E901",
            Self::Serialization { .. } => "E902",
        }
    }

    /// Whether this error came from one of the evaluation guards.
    pub fn is_guard_failure(&self) -> bool {
        matches!(
            self,
            Self::ScriptTimeout { .. }
                | Self::LoopLimitExceeded { .. }
                | Self::CallDepthExceeded { .. }
        )
    }

    /// Shorthand for a script runtime error.
    pub fn script(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Shorthand for an invalid action error.
    pub fn invalid_action(action: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::InvalidAction {
            action: action.into(),
            cause: cause.into(),
        }
    }

    /// Shorthand for a not-found error.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::EntityNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl From<serde_json::Error> for CueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            cause: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CueError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            cause: err.to_string(),
        }
    }
}

/// Serialize an error as `{"code", "message"}` for reports.
pub fn serialize_error<S>(error: &CueError, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("code", error.code())?;
    map.serialize_entry("message", &error.to_string())?;
    map.end()
}

/// Result type alias for cueflow operations.
pub type Result<T> = std::result::Result<T, CueError>;

/// Extension trait for adding action/node context to errors.
pub trait ResultExt<T> {
    /// Attribute an error to an action type.
    fn in_action(self, action: &str) -> Result<T>;

    /// Attribute an error to a graph node.
    fn in_node(self, node_id: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn in_action(self, action: &str) -> Result<T> {
        self.map_err(|e| CueError::ActionFailed {
            action: action.to_string(),
            cause: e.to_string(),
        })
    }

    fn in_node(self, node_id: &str) -> Result<T> {
        self.map_err(|e| CueError::NodeFailed {
            node_id: node_id.to_string(),
            cause: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_correct() {
        let err = CueError::AddressSyntax {
            address: "Logo".to_string(),
            cause: "missing '@'".to_string(),
        };
        assert_eq!(err.code(), "E101");

        let err = CueError::LoopLimitExceeded { limit: 10 };
        assert_eq!(err.code(), "E203");

        let err = CueError::Config {
            field: "script_timeout_ms".to_string(),
            cause: "must be positive".to_string(),
        };
        assert_eq!(err.code(), "E801");
    }

    #[test]
    fn timeout_and_loop_limit_are_distinct() {
        let timeout = CueError::ScriptTimeout {
            elapsed_ms: 101,
            limit_ms: 100,
        };
        let looped = CueError::LoopLimitExceeded { limit: 100 };

        assert_ne!(timeout.code(), looped.code());
        assert!(timeout.is_guard_failure());
        assert!(looped.is_guard_failure());
        assert!(!CueError::script("boom").is_guard_failure());
    }

    #[test]
    fn error_display_includes_code() {
        let err = CueError::not_found("element", "Logo");
        assert_eq!(err.to_string(), "E102: element 'Logo' not found");
    }

    #[test]
    fn result_ext_wraps_with_action() {
        let result: std::result::Result<(), &str> = Err("bad operand");
        let err = result.in_action("setState").unwrap_err();
        assert_eq!(err.code(), "E302");
        assert!(err.to_string().contains("setState"));
    }
}
