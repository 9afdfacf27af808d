//! Log events produced by authored content and by the runtime.

use crate::ids::DispatchId;
use serde::Serialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-node tracing, recorded only in debug mode.
    Debug,
    /// Authored `log` steps.
    Info,
    /// Resolution misses and caught failures.
    Warn,
    /// Failures the host should surface.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// Which part of the engine raised an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    /// Address resolution and writes.
    Address,
    /// Expression and script evaluation.
    Script,
    /// Action list execution.
    Action,
    /// Graph dispatch and node execution.
    Graph,
    /// Navigation and other store changes.
    Store,
    /// Messages written by authored `log` steps.
    User,
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Address => "address",
            Self::Script => "script",
            Self::Action => "action",
            Self::Graph => "graph",
            Self::Store => "store",
            Self::User => "user",
        })
    }
}

/// One entry in the authored log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    /// Sequence number, assigned by the collector.
    pub id: u64,
    /// Nanoseconds since UNIX epoch.
    pub timestamp_ns: u64,
    /// Severity.
    pub level: LogLevel,
    /// Origin.
    pub category: LogCategory,
    /// Dispatch the event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_id: Option<DispatchId>,
    /// Graph node or action id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Message text.
    pub message: String,
}

impl LogEvent {
    /// Event stamped with the current time.
    pub fn new(level: LogLevel, category: LogCategory, message: impl Into<String>) -> Self {
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self {
            id: 0,
            timestamp_ns,
            level,
            category,
            dispatch_id: None,
            node_id: None,
            message: message.into(),
        }
    }

    /// Tag with a dispatch.
    pub fn with_dispatch_id(mut self, dispatch_id: DispatchId) -> Self {
        self.dispatch_id = Some(dispatch_id);
        self
    }

    /// Tag with a node or action id.
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// `<time> [LEVEL] [category] node=<id> message`, for terminals.
    pub fn format_line(&self) -> String {
        let secs = (self.timestamp_ns / 1_000_000_000) as i64;
        let nanos = (self.timestamp_ns % 1_000_000_000) as u32;
        let time = match chrono::DateTime::from_timestamp(secs, nanos) {
            Some(at) => at.format("%H:%M:%S%.3f").to_string(),
            None => format!("{}ns", self.timestamp_ns),
        };
        match self.node_id {
            Some(ref node) => format!(
                "{} [{}] [{}] node={} {}",
                time, self.level, self.category, node, self.message
            ),
            None => format!("{} [{}] [{}] {}", time, self.level, self.category, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order_by_severity() {
        assert!(LogLevel::Warn > LogLevel::Info);
        assert!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn format_line_includes_node() {
        let event = LogEvent::new(LogLevel::Warn, LogCategory::Graph, "condition failed")
            .with_node_id("c1");
        assert!(event.format_line().ends_with("[WARN] [graph] node=c1 condition failed"));

        let plain = LogEvent::new(LogLevel::Info, LogCategory::User, "hello");
        assert!(plain.format_line().ends_with("[INFO] [user] hello"));
    }
}
