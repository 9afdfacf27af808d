//! Validation finding types.

use cueflow_core::error::{CueError, Result};
use serde::Serialize;
use std::fmt;

/// How serious a finding is. Errors make a graph invalid; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth a look; the graph still runs.
    Warning,
    /// The graph, or part of it, cannot run as authored.
    Error,
}

/// Types of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    /// Missing or empty required field.
    MissingField,
    /// Node that does not parse or has an unusable value.
    InvalidNode,
    /// Duplicate node id.
    DuplicateId,
    /// Edge pointing at a node that does not exist.
    InvalidReference,
    /// Graph without any event node.
    MissingEventNode,
    /// Node no event node can reach.
    UnreachableNode,
    /// Cycle; each walk still visits a node at most once.
    CycleDetected,
    /// Expression that does not parse or leaves the allowlist.
    InvalidExpression,
    /// `callFunction` naming an unregistered host function.
    UnknownFunction,
    /// Size or count limit exceeded.
    LimitExceeded,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingField => "MISSING_FIELD",
            Self::InvalidNode => "INVALID_NODE",
            Self::DuplicateId => "DUPLICATE_ID",
            Self::InvalidReference => "INVALID_REFERENCE",
            Self::MissingEventNode => "MISSING_EVENT_NODE",
            Self::UnreachableNode => "UNREACHABLE_NODE",
            Self::CycleDetected => "CYCLE_DETECTED",
            Self::InvalidExpression => "INVALID_EXPRESSION",
            Self::UnknownFunction => "UNKNOWN_FUNCTION",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
        };
        write!(f, "{}", s)
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// What kind of problem.
    pub kind: FindingKind,
    /// Error or warning.
    pub severity: Severity,
    /// Where in the graph, e.g. `nodes.check` or `edges[2].target`.
    pub location: String,
    /// Human-readable message.
    pub message: String,
}

impl Finding {
    /// Create an error finding.
    pub fn error(kind: FindingKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a warning finding.
    pub fn warning(kind: FindingKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            ..Self::error(kind, location, message)
        }
    }

    /// Missing field error.
    pub fn missing_field(location: impl Into<String>, field: &str) -> Self {
        Self::error(
            FindingKind::MissingField,
            location,
            format!("missing required field '{}'", field),
        )
    }

    /// Dangling edge error.
    pub fn invalid_reference(location: impl Into<String>, reference: &str) -> Self {
        Self::error(
            FindingKind::InvalidReference,
            location,
            format!("reference to non-existent node '{}'", reference),
        )
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{} [{}] {}: {}", severity, self.kind, self.location, self.message)
    }
}

/// Everything a validation pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Findings in discovery order.
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// No errors (warnings allowed).
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Error findings.
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    /// Warning findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    /// Whether any finding has this kind.
    pub fn has(&self, kind: FindingKind) -> bool {
        self.findings.iter().any(|f| f.kind == kind)
    }

    /// `Err(GraphValidation)` summarising the errors, if any.
    pub fn into_result(self) -> Result<()> {
        let errors: Vec<String> = self.errors().map(ToString::to_string).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CueError::GraphValidation {
                cause: errors.join("; "),
            })
        }
    }

    pub(crate) fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }
}
