//! Event dispatch over a node graph.
//!
//! A trigger selects every event node whose type matches and whose element
//! filter admits the triggering element. Each match starts its own walk
//! with a fresh visited set, so a node runs at most once per walk even in
//! cyclic or diamond-shaped graphs. Within a walk, children start only
//! after their parent (including any `delay`) has completed, in authored
//! edge order.

use crate::graph::Adjacency;
use crate::handlers::run_node;
use crate::model::{Edge, EventNode, Node, NodeGraph};
use cueflow_core::address::find_element;
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, serialize_error};
use cueflow_core::ids::DispatchId;
use cueflow_core::logging::LogCategory;
use cueflow_core::model::TriggerEvent;
use cueflow_core::settings::DispatchMode;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

/// A node that failed during a walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeFailure {
    /// Node id.
    pub node_id: String,
    /// Node kind tag.
    pub node_type: String,
    /// What went wrong.
    #[serde(serialize_with = "serialize_error")]
    pub error: CueError,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    /// Correlation id shared with the log events.
    pub dispatch_id: DispatchId,
    /// Triggering event type.
    pub event_type: String,
    /// Event nodes that matched.
    pub matched: usize,
    /// Node ids in the order they ran, event nodes included.
    pub visited: Vec<String>,
    /// Failed nodes, in the order they failed.
    pub failures: Vec<NodeFailure>,
}

impl DispatchReport {
    fn new(dispatch_id: DispatchId, event_type: &str) -> Self {
        Self {
            dispatch_id,
            event_type: event_type.to_string(),
            matched: 0,
            visited: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Whether every visited node succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// How many times a node ran across all walks.
    pub fn visits(&self, node_id: &str) -> usize {
        self.visited.iter().filter(|id| *id == node_id).count()
    }

    fn absorb(&mut self, outcome: WalkOutcome) {
        self.visited.extend(outcome.visited);
        self.failures.extend(outcome.failures);
    }
}

/// A graph ready for repeated dispatch.
#[derive(Debug, Clone)]
pub struct GraphRuntime {
    graph: NodeGraph,
    adjacency: Adjacency,
}

impl GraphRuntime {
    /// Index a graph for dispatch.
    pub fn new(graph: NodeGraph) -> Self {
        let adjacency = Adjacency::of(&graph);
        Self { graph, adjacency }
    }

    /// The underlying graph.
    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Event nodes that would start a walk for `event`.
    pub fn matching_events(&self, event: &TriggerEvent, ctx: &ExecutionContext) -> Vec<&Node> {
        matching_events(&self.graph.nodes, event, ctx)
    }

    /// Dispatch one event. Never fails; see the report.
    pub async fn dispatch(&self, event: &TriggerEvent, ctx: &ExecutionContext) -> DispatchReport {
        dispatch(&self.graph.nodes, &self.adjacency, event, ctx).await
    }
}

/// Dispatch one event over a node/edge list.
///
/// No matching event node is a no-op, as is an empty graph.
pub async fn execute_node_graph(
    event_type: &str,
    element_id: Option<&str>,
    nodes: &[Node],
    edges: &[Edge],
    ctx: &ExecutionContext,
) -> DispatchReport {
    let mut event = TriggerEvent::new(event_type);
    event.element_id = element_id.map(str::to_string);
    let adjacency = Adjacency::build(nodes, edges);
    dispatch(nodes, &adjacency, &event, ctx).await
}

fn event_matches(spec: &EventNode, event: &TriggerEvent, ctx: &ExecutionContext) -> bool {
    if spec.event_type.trim() != event.event_type {
        return false;
    }
    let Some(filter) = spec.element_filter() else {
        return true;
    };
    match event.element_id.as_deref() {
        Some(id) => filter == id || find_element(filter, ctx).is_some_and(|e| e.id == id),
        None => false,
    }
}

fn matching_events<'g>(
    nodes: &'g [Node],
    event: &TriggerEvent,
    ctx: &ExecutionContext,
) -> Vec<&'g Node> {
    nodes
        .iter()
        .filter(|node| {
            node.as_event()
                .is_some_and(|spec| event_matches(spec, event, ctx))
        })
        .collect()
}

async fn dispatch(
    nodes: &[Node],
    adjacency: &Adjacency,
    event: &TriggerEvent,
    ctx: &ExecutionContext,
) -> DispatchReport {
    let ctx = ctx
        .with_event(event.clone())
        .with_dispatch_id(DispatchId::new());
    let started = Instant::now();
    let mut report = DispatchReport::new(ctx.dispatch_id(), &event.event_type);

    let roots = matching_events(nodes, event, &ctx);
    report.matched = roots.len();
    if roots.is_empty() {
        ctx.debug(
            LogCategory::Graph,
            format!(
                "No event node matches '{}' on {}",
                event.event_type,
                event.element_id.as_deref().unwrap_or("any element")
            ),
        );
        return report;
    }

    let walk = Walk { nodes, adjacency };
    match ctx.settings().dispatch_mode {
        DispatchMode::Sequential => {
            for root in roots {
                let outcome = walk.run(root, &ctx).await;
                report.absorb(outcome);
            }
        }
        DispatchMode::Concurrent => {
            let outcomes = join_all(roots.into_iter().map(|root| walk.run(root, &ctx))).await;
            for outcome in outcomes {
                report.absorb(outcome);
            }
        }
    }

    tracing::info!(
        dispatch_id = %report.dispatch_id,
        event = %report.event_type,
        matched = report.matched,
        visited = report.visited.len(),
        failed = report.failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Graph dispatch finished"
    );
    report
}

#[derive(Default)]
struct WalkOutcome {
    visited: Vec<String>,
    failures: Vec<NodeFailure>,
}

struct Walk<'g> {
    nodes: &'g [Node],
    adjacency: &'g Adjacency,
}

impl<'g> Walk<'g> {
    /// Depth-first over an explicit stack of (node, next successor) cursors,
    /// so chain length never grows the call stack.
    async fn run(&self, root: &'g Node, ctx: &ExecutionContext) -> WalkOutcome {
        let mut seen: HashSet<&'g str> = HashSet::from([root.id.as_str()]);
        let mut outcome = WalkOutcome::default();
        let mut stack: Vec<(&'g Node, usize)> = Vec::new();
        if self.enter(root, ctx, &mut outcome).await {
            stack.push((root, 0));
        }

        while let Some(top) = stack.last_mut() {
            let (node, cursor) = *top;
            top.1 += 1;
            let Some(next) = self.adjacency.successors(&node.id).get(cursor) else {
                stack.pop();
                continue;
            };
            let Some(child) = self.adjacency.position(next).and_then(|i| self.nodes.get(i)) else {
                ctx.with_node(node.id.as_str()).warn(
                    LogCategory::Graph,
                    format!("Edge from '{}' points at missing node '{}'", node.id, next),
                );
                continue;
            };
            if seen.insert(child.id.as_str()) && self.enter(child, ctx, &mut outcome).await {
                stack.push((child, 0));
            }
        }
        outcome
    }

    /// Run one node to completion. Returns whether its children should run.
    async fn enter(&self, node: &'g Node, ctx: &ExecutionContext, outcome: &mut WalkOutcome) -> bool {
        outcome.visited.push(node.id.clone());
        let node_ctx = ctx.with_node(node.id.as_str());

        match run_node(node, &node_ctx).await {
            Ok(descend) => descend,
            Err(error) => {
                node_ctx.warn(
                    LogCategory::Graph,
                    format!("Node '{}' ({}) failed: {}", node.id, node.type_name(), error),
                );
                outcome.failures.push(NodeFailure {
                    node_id: node.id.clone(),
                    node_type: node.type_name().to_string(),
                    error,
                });
                true
            }
        }
    }
}
