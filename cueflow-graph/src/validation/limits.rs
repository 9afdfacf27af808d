//! Size limits for graphs loaded from untrusted editor output.

use super::finding::{Finding, FindingKind};

/// Upper bounds checked before a graph is walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphLimits {
    /// Maximum source size in bytes (default: 4MB).
    pub max_source_bytes: usize,
    /// Maximum number of nodes (default: 2000).
    pub max_node_count: usize,
    /// Maximum number of edges (default: 10000).
    pub max_edge_count: usize,
    /// Maximum number of event nodes (default: 200).
    pub max_event_nodes: usize,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 4 * 1024 * 1024,
            max_node_count: 2_000,
            max_edge_count: 10_000,
            max_event_nodes: 200,
        }
    }
}

impl GraphLimits {
    /// Default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum source size.
    pub fn with_max_source_bytes(mut self, bytes: usize) -> Self {
        self.max_source_bytes = bytes;
        self
    }

    /// Set maximum node count.
    pub fn with_max_node_count(mut self, count: usize) -> Self {
        self.max_node_count = count;
        self
    }

    /// Set maximum edge count.
    pub fn with_max_edge_count(mut self, count: usize) -> Self {
        self.max_edge_count = count;
        self
    }

    /// Check raw source size before parsing.
    pub fn check_source_size(&self, source: &str) -> Option<Finding> {
        (source.len() > self.max_source_bytes).then(|| {
            Finding::error(
                FindingKind::LimitExceeded,
                "graph",
                format!(
                    "source size ({} bytes) exceeds maximum allowed ({} bytes)",
                    source.len(),
                    self.max_source_bytes
                ),
            )
        })
    }

    pub(crate) fn check_count(
        &self,
        location: &str,
        noun: &str,
        count: usize,
        max: usize,
    ) -> Option<Finding> {
        (count > max).then(|| {
            Finding::error(
                FindingKind::LimitExceeded,
                location,
                format!("{} count ({}) exceeds maximum allowed ({})", noun, count, max),
            )
        })
    }
}
