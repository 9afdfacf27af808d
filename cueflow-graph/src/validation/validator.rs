//! Graph validation logic.

use super::finding::{Finding, FindingKind, ValidationReport};
use super::limits::GraphLimits;
use crate::graph::Adjacency;
use crate::model::{DataOperation, Edge, GraphAction, Node, NodeGraph, NodeKind};
use cueflow_actions::Guard;
use cueflow_core::value::as_f64;
use cueflow_script::Validator;
use serde_json::Value;
use std::collections::HashSet;

/// Validator for node graphs.
pub struct GraphValidator {
    limits: GraphLimits,
    scripts: Validator,
    functions: HashSet<String>,
    report: ValidationReport,
}

impl GraphValidator {
    /// Create a validator with default limits and no host functions.
    pub fn new() -> Self {
        Self::with_limits(GraphLimits::default())
    }

    /// Create a validator with custom limits.
    pub fn with_limits(limits: GraphLimits) -> Self {
        Self {
            limits,
            scripts: Validator::new(),
            functions: HashSet::new(),
            report: ValidationReport::default(),
        }
    }

    /// Host functions that `callFunction` nodes and expressions may call.
    pub fn with_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.functions.extend(names.into_iter().map(Into::into));
        self.scripts = Validator::new().with_functions(self.functions.iter().cloned());
        self
    }

    /// Validate a parsed graph.
    pub fn validate(mut self, graph: &NodeGraph) -> ValidationReport {
        self.check(graph);
        self.report
    }

    /// Validate raw editor output node by node, so one bad node is reported
    /// instead of failing the whole parse. Returns the nodes that parsed.
    pub fn validate_value(mut self, value: &Value) -> (Option<NodeGraph>, ValidationReport) {
        let Some(object) = value.as_object() else {
            self.report.push(Finding::error(
                FindingKind::InvalidNode,
                "graph",
                "graph must be an object with 'nodes' and 'edges'",
            ));
            return (None, self.report);
        };

        let nodes = self.parse_list::<Node>(object.get("nodes"), "nodes");
        let edges = self.parse_list::<Edge>(object.get("edges"), "edges");
        let graph = NodeGraph::new(nodes, edges);
        self.check(&graph);
        (Some(graph), self.report)
    }

    /// Validate YAML or JSON source text.
    pub fn validate_source(mut self, source: &str) -> (Option<NodeGraph>, ValidationReport) {
        if let Some(finding) = self.limits.check_source_size(source) {
            self.report.push(finding);
            return (None, self.report);
        }
        match serde_yaml::from_str::<Value>(source) {
            Ok(value) => self.validate_value(&value),
            Err(e) => {
                self.report.push(Finding::error(
                    FindingKind::InvalidNode,
                    "graph",
                    format!("not valid YAML/JSON: {}", e),
                ));
                (None, self.report)
            }
        }
    }

    fn parse_list<T: serde::de::DeserializeOwned>(
        &mut self,
        list: Option<&Value>,
        location: &str,
    ) -> Vec<T> {
        let items = match list {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.report.push(Finding::error(
                    FindingKind::InvalidNode,
                    location,
                    format!("'{}' must be a list", location),
                ));
                return Vec::new();
            }
        };

        let mut parsed = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            match serde_json::from_value::<T>(item.clone()) {
                Ok(value) => parsed.push(value),
                Err(e) => {
                    let at = match item.get("id").and_then(Value::as_str) {
                        Some(id) => format!("{}.{}", location, id),
                        None => format!("{}[{}]", location, idx),
                    };
                    self.report
                        .push(Finding::error(FindingKind::InvalidNode, at, e.to_string()));
                }
            }
        }
        parsed
    }

    fn check(&mut self, graph: &NodeGraph) {
        // Structural limits first
        self.check_limits(graph);

        let adjacency = Adjacency::of(graph);
        self.check_nodes(graph);
        self.check_edges(graph, &adjacency);
        self.check_reachability(graph, &adjacency);
        self.check_cycles(graph, &adjacency);
    }

    fn check_limits(&mut self, graph: &NodeGraph) {
        let events = graph.nodes.iter().filter(|n| n.as_event().is_some()).count();
        let checks = [
            self.limits
                .check_count("nodes", "node", graph.nodes.len(), self.limits.max_node_count),
            self.limits
                .check_count("edges", "edge", graph.edges.len(), self.limits.max_edge_count),
            self.limits
                .check_count("nodes", "event node", events, self.limits.max_event_nodes),
        ];
        for finding in checks.into_iter().flatten() {
            self.report.push(finding);
        }
    }

    fn check_nodes(&mut self, graph: &NodeGraph) {
        let mut seen_ids = HashSet::new();

        for (idx, node) in graph.nodes.iter().enumerate() {
            if node.id.trim().is_empty() {
                self.report
                    .push(Finding::missing_field(format!("nodes[{}]", idx), "id"));
                continue;
            }
            let location = format!("nodes.{}", node.id);
            if !seen_ids.insert(node.id.as_str()) {
                self.report.push(Finding::error(
                    FindingKind::DuplicateId,
                    &location,
                    format!("duplicate identifier '{}'", node.id),
                ));
            }
            self.check_node(node, &location);
        }
    }

    fn check_node(&mut self, node: &Node, location: &str) {
        match &node.kind {
            NodeKind::Event(event) => {
                if event.event_type.trim().is_empty() {
                    self.report
                        .push(Finding::missing_field(location, "eventType"));
                }
            }
            NodeKind::Condition(Guard::Condition(condition)) => {
                if matches!(&condition.operand, Value::Null)
                    || condition.operand.as_str().is_some_and(|s| s.trim().is_empty())
                {
                    self.report.push(Finding::missing_field(location, "operand"));
                }
                self.check_operand(&format!("{}.operand", location), &condition.operand);
                self.check_operand(&format!("{}.comparand", location), &condition.comparand);
            }
            NodeKind::Condition(Guard::Expression { expression }) => {
                self.check_expression(&format!("{}.expression", location), expression);
            }
            NodeKind::Action(action) => self.check_action(action, location),
            NodeKind::Data(DataOperation::Get { source, .. }) => {
                self.require(location, "source", source);
            }
            NodeKind::Data(DataOperation::Set { target, value }) => {
                self.require(location, "target", target);
                self.check_operand(&format!("{}.value", location), value);
            }
            NodeKind::Animation(animation) => {
                self.require(location, "template", &animation.template);
            }
        }
    }

    fn check_action(&mut self, action: &GraphAction, location: &str) {
        match action {
            GraphAction::SetState { target, .. } | GraphAction::ToggleState { target } => {
                self.require(location, "target", target)
            }
            GraphAction::ShowElement { element }
            | GraphAction::HideElement { element }
            | GraphAction::ToggleElement { element } => self.require(location, "element", element),
            GraphAction::PlayTemplate { template, .. }
            | GraphAction::ToggleTemplate { template, .. }
            | GraphAction::PlayAnimation { template, .. }
            | GraphAction::StopAnimation { template, .. } => {
                self.require(location, "template", template)
            }
            GraphAction::Delay { duration_ms } => {
                if let Some(ms) = duration_ms.as_number().and_then(|_| as_f64(duration_ms)) {
                    if !ms.is_finite() || ms < 0.0 {
                        self.report.push(Finding::error(
                            FindingKind::InvalidNode,
                            location,
                            format!("delay must be a non-negative number, got {}", ms),
                        ));
                    }
                }
            }
            GraphAction::CallFunction { name, .. } => {
                self.require(location, "name", name);
                if !name.trim().is_empty() && !self.functions.contains(name) {
                    self.report.push(Finding::warning(
                        FindingKind::UnknownFunction,
                        location,
                        format!("no host function '{}' is registered; the node will only log", name),
                    ));
                }
            }
            GraphAction::Navigate { .. } | GraphAction::Log { .. } => {}
        }

        for (i, operand) in action.operands().into_iter().enumerate() {
            self.check_operand(&format!("{}.{}[{}]", location, action.type_name(), i), operand);
        }
    }

    fn require(&mut self, location: &str, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.report.push(Finding::missing_field(location, field));
        }
    }

    /// Static checks for `=expression`, `{{binding}}` and `{"expression"}`
    /// operands. Literals, paths and addresses need none.
    fn check_operand(&mut self, location: &str, operand: &Value) {
        match operand {
            Value::String(s) => {
                if let Some(expression) = s.trim().strip_prefix('=') {
                    self.check_expression(location, expression);
                    return;
                }
                let mut rest = s.as_str();
                while let Some(start) = rest.find("{{") {
                    let after = &rest[start + 2..];
                    let Some(end) = after.find("}}") else { break };
                    self.check_expression(location, &after[..end]);
                    rest = &after[end + 2..];
                }
            }
            Value::Object(map) if map.len() == 1 => {
                if let Some(Value::String(expression)) = map.get("expression") {
                    self.check_expression(location, expression);
                }
            }
            _ => {}
        }
    }

    fn check_expression(&mut self, location: &str, expression: &str) {
        if let Err(e) = self.scripts.validate_expression(expression) {
            self.report.push(Finding::error(
                FindingKind::InvalidExpression,
                location,
                e.to_string(),
            ));
        }
    }

    fn check_edges(&mut self, graph: &NodeGraph, adjacency: &Adjacency) {
        for (idx, edge) in graph.edges.iter().enumerate() {
            let location = format!("edges[{}]", idx);
            for (field, id) in [("source", &edge.source), ("target", &edge.target)] {
                if id.trim().is_empty() {
                    self.report.push(Finding::missing_field(&location, field));
                } else if !adjacency.contains(id) {
                    self.report
                        .push(Finding::invalid_reference(format!("{}.{}", location, field), id));
                }
            }
        }
    }

    fn check_reachability(&mut self, graph: &NodeGraph, adjacency: &Adjacency) {
        let roots: Vec<&str> = graph
            .nodes
            .iter()
            .filter(|n| n.as_event().is_some())
            .map(|n| n.id.as_str())
            .collect();

        if roots.is_empty() {
            self.report.push(Finding::warning(
                FindingKind::MissingEventNode,
                "nodes",
                "graph has no event node and will never run",
            ));
            return;
        }

        let reachable = adjacency.reachable_from(roots);
        for node in &graph.nodes {
            if !reachable.contains(node.id.as_str()) {
                self.report.push(Finding::warning(
                    FindingKind::UnreachableNode,
                    format!("nodes.{}", node.id),
                    "node is unreachable from every event node",
                ));
            }
        }
    }

    fn check_cycles(&mut self, graph: &NodeGraph, adjacency: &Adjacency) {
        for cycle in adjacency.find_cycles(&graph.nodes) {
            let Some(first) = cycle.first() else { continue };
            let path = cycle
                .iter()
                .chain(std::iter::once(first))
                .copied()
                .collect::<Vec<_>>()
                .join(" -> ");
            self.report.push(Finding::warning(
                FindingKind::CycleDetected,
                format!("nodes.{}", first),
                format!("cycle {}; each node still runs at most once per event", path),
            ));
        }
    }
}

impl Default for GraphValidator {
    fn default() -> Self {
        Self::new()
    }
}
