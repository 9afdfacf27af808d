//! Graph validation.
//!
//! Editor-time checks over a node graph:
//! - Structural: duplicate ids, dangling edges, missing event nodes
//! - Reachability and cycles (warnings; the runtime guards cycles itself)
//! - Semantic: required fields, expression syntax and allowlist, host functions
//! - Size limits for untrusted input

mod finding;
mod limits;
mod validator;

pub use finding::{Finding, FindingKind, Severity, ValidationReport};
pub use limits::GraphLimits;
pub use validator::GraphValidator;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, GraphAction, Node, NodeGraph};
    use cueflow_actions::Guard;
    use cueflow_script::{Condition, ConditionOperator};
    use serde_json::json;

    fn set_y() -> Node {
        Node::action(
            "set",
            GraphAction::SetState {
                target: "y".into(),
                value: json!(2),
            },
        )
    }

    fn minimal_graph() -> NodeGraph {
        NodeGraph::new(
            vec![
                Node::event("click", "click", Some("btn")),
                Node::condition(
                    "check",
                    Guard::Condition(Condition::new("state.x", ConditionOperator::Equals, 1)),
                ),
                set_y(),
            ],
            vec![Edge::new("click", "check"), Edge::new("check", "set")],
        )
    }

    #[test]
    fn validate_minimal_graph() {
        let report = GraphValidator::new().validate(&minimal_graph());
        assert!(report.is_valid());
        assert!(report.findings.is_empty(), "{:?}", report.findings);
    }

    #[test]
    fn validate_duplicate_ids() {
        let mut graph = minimal_graph();
        graph.nodes.push(set_y());

        let report = GraphValidator::new().validate(&graph);
        assert!(!report.is_valid());
        assert!(report.has(FindingKind::DuplicateId));
    }

    #[test]
    fn validate_dangling_edge() {
        let mut graph = minimal_graph();
        graph.edges.push(Edge::new("set", "ghost"));

        let report = GraphValidator::new().validate(&graph);
        let finding = report.errors().next().unwrap();
        assert_eq!(finding.kind, FindingKind::InvalidReference);
        assert_eq!(finding.location, "edges[2].target");
    }

    #[test]
    fn cycles_and_islands_are_warnings() {
        let mut graph = minimal_graph();
        graph.edges.push(Edge::new("set", "check"));
        graph.nodes.push(Node::action("island", GraphAction::Log { message: json!("x") }));

        let report = GraphValidator::new().validate(&graph);
        assert!(report.is_valid());
        assert!(report.has(FindingKind::CycleDetected));
        assert!(report.has(FindingKind::UnreachableNode));
        let cycle = report
            .warnings()
            .find(|f| f.kind == FindingKind::CycleDetected)
            .unwrap();
        assert!(cycle.message.contains("check -> set -> check"));
    }

    #[test]
    fn graph_without_events_never_runs() {
        let graph = NodeGraph::new(vec![set_y()], vec![]);
        let report = GraphValidator::new().validate(&graph);
        assert!(report.has(FindingKind::MissingEventNode));
        assert!(!report.has(FindingKind::UnreachableNode));
    }

    #[test]
    fn expressions_are_checked_statically() {
        let mut graph = minimal_graph();
        graph.nodes.push(Node::action(
            "bad",
            GraphAction::SetState {
                target: "z".into(),
                value: json!("=fetch('https://x')"),
            },
        ));
        graph.nodes.push(Node::condition(
            "broken",
            Guard::Expression {
                expression: "state.x ==".into(),
            },
        ));
        graph.edges.push(Edge::new("set", "bad"));
        graph.edges.push(Edge::new("set", "broken"));

        let report = GraphValidator::new().validate(&graph);
        let invalid: Vec<_> = report
            .errors()
            .filter(|f| f.kind == FindingKind::InvalidExpression)
            .map(|f| f.location.as_str())
            .collect();
        assert_eq!(invalid, vec!["nodes.bad.setState[0]", "nodes.broken.expression"]);
    }

    #[test]
    fn unregistered_functions_warn() {
        let mut graph = minimal_graph();
        graph.nodes.push(Node::action(
            "call",
            GraphAction::CallFunction {
                name: "refreshScores".into(),
                args: vec![],
                target: None,
            },
        ));
        graph.edges.push(Edge::new("set", "call"));

        assert!(GraphValidator::new().validate(&graph).has(FindingKind::UnknownFunction));
        assert!(
            !GraphValidator::new()
                .with_functions(["refreshScores"])
                .validate(&graph)
                .has(FindingKind::UnknownFunction)
        );
    }

    #[test]
    fn bad_nodes_are_reported_individually() {
        let (graph, report) = GraphValidator::new().validate_value(&json!({
            "nodes": [
                {"id": "e", "type": "event", "data": {"eventType": "click"}},
                {"id": "c", "type": "condition",
                 "data": {"operand": "state.x", "operator": "roughly", "comparand": 1}},
                {"id": "a", "type": "action", "data": {"actionType": "log", "message": "hi"}},
            ],
            "edges": [{"source": "e", "target": "a"}],
        }));

        let graph = graph.unwrap();
        assert_eq!(graph.nodes.len(), 2);
        let finding = report.errors().next().unwrap();
        assert_eq!(finding.kind, FindingKind::InvalidNode);
        assert_eq!(finding.location, "nodes.c");
    }

    #[test]
    fn limits_apply() {
        let limits = GraphLimits::default().with_max_node_count(2);
        let report = GraphValidator::with_limits(limits).validate(&minimal_graph());
        assert!(report.has(FindingKind::LimitExceeded));

        let limits = GraphLimits::default().with_max_source_bytes(10);
        let (graph, report) =
            GraphValidator::with_limits(limits).validate_source("nodes: []\nedges: []\n");
        assert!(graph.is_none());
        assert!(report.errors().next().unwrap().message.contains("bytes"));
    }

    #[test]
    fn into_result_summarises_errors() {
        let mut graph = minimal_graph();
        graph.edges.push(Edge::new("", "set"));
        let err = GraphValidator::new()
            .validate(&graph)
            .into_result()
            .unwrap_err();
        assert_eq!(err.code(), "E401");
        assert!(err.to_string().contains("MISSING_FIELD"));
    }
}
