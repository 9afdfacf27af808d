//! Adjacency representation and structural analysis.

use crate::model::{Edge, Node, NodeGraph};
use std::collections::{HashMap, HashSet, VecDeque};

/// Nodes indexed by id with outgoing edges in authored order.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    /// Node index by id (first occurrence wins).
    index: HashMap<String, usize>,
    /// Source id to ordered target ids.
    outgoing: HashMap<String, Vec<String>>,
    /// Target id to source ids.
    incoming: HashMap<String, Vec<String>>,
}

impl Adjacency {
    /// Build the adjacency for a node/edge list.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id.clone()).or_insert(i);
        }

        let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();
        let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
        for edge in edges {
            outgoing
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
            incoming
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
        }

        Self {
            index,
            outgoing,
            incoming,
        }
    }

    /// Build from a whole graph.
    pub fn of(graph: &NodeGraph) -> Self {
        Self::build(&graph.nodes, &graph.edges)
    }

    /// Position of a node in the node list.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Whether a node id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Targets of `id`, in edge order.
    pub fn successors(&self, id: &str) -> &[String] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sources pointing at `id`.
    pub fn predecessors(&self, id: &str) -> &[String] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every node reachable from `roots`, roots included.
    pub fn reachable_from<'a>(&'a self, roots: impl IntoIterator<Item = &'a str>) -> HashSet<&'a str> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&str> = roots.into_iter().collect();

        while let Some(id) = queue.pop_front() {
            if visited.insert(id) {
                for next in self.successors(id) {
                    queue.push_back(next.as_str());
                }
            }
        }
        visited
    }

    /// One cycle per strongly connected loop, as the node ids along it.
    ///
    /// Iterative three-colour DFS; back edges close a cycle.
    pub fn find_cycles<'a>(&'a self, nodes: &'a [Node]) -> Vec<Vec<&'a str>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Open,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut cycles = Vec::new();

        for root in nodes.iter().map(|n| n.id.as_str()) {
            if marks.contains_key(root) {
                continue;
            }
            let mut path: Vec<&str> = vec![root];
            let mut cursors: Vec<usize> = vec![0];
            marks.insert(root, Mark::Open);

            while let (Some(&current), Some(cursor)) = (path.last(), cursors.last_mut()) {
                let successors = self.successors(current);
                if *cursor >= successors.len() {
                    marks.insert(current, Mark::Done);
                    path.pop();
                    cursors.pop();
                    continue;
                }
                let next = successors[*cursor].as_str();
                *cursor += 1;

                if !self.contains(next) {
                    continue;
                }
                match marks.get(next) {
                    None => {
                        marks.insert(next, Mark::Open);
                        path.push(next);
                        cursors.push(0);
                    }
                    Some(Mark::Open) => {
                        if let Some(start) = path.iter().position(|id| *id == next) {
                            cycles.push(path[start..].to_vec());
                        }
                    }
                    Some(Mark::Done) => {}
                }
            }
        }
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphAction;
    use serde_json::json;

    fn log(id: &str) -> Node {
        Node::action(id, GraphAction::Log { message: json!(id) })
    }

    #[test]
    fn successors_keep_edge_order() {
        let nodes = vec![Node::event("e", "click", None), log("b"), log("a")];
        let edges = vec![Edge::new("e", "b"), Edge::new("e", "a")];
        let adjacency = Adjacency::build(&nodes, &edges);
        assert_eq!(adjacency.successors("e"), ["b", "a"]);
        assert_eq!(adjacency.predecessors("a"), ["e"]);
        assert!(adjacency.successors("a").is_empty());
    }

    #[test]
    fn reachability_survives_cycles() {
        let nodes = vec![Node::event("e", "click", None), log("a"), log("b"), log("island")];
        let edges = vec![Edge::new("e", "a"), Edge::new("a", "b"), Edge::new("b", "a")];
        let adjacency = Adjacency::build(&nodes, &edges);

        let reachable = adjacency.reachable_from(["e"]);
        assert_eq!(reachable.len(), 3);
        assert!(!reachable.contains("island"));
    }

    #[test]
    fn cycles_are_reported_once() {
        let nodes = vec![Node::event("e", "click", None), log("a"), log("b"), log("c")];
        let edges = vec![
            Edge::new("e", "a"),
            Edge::new("a", "b"),
            Edge::new("b", "a"),
            Edge::new("b", "c"),
            Edge::new("c", "c"),
        ];
        let adjacency = Adjacency::build(&nodes, &edges);
        let cycles = adjacency.find_cycles(&nodes);
        assert_eq!(cycles, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn diamonds_are_not_cycles() {
        let nodes = vec![Node::event("e", "click", None), log("l"), log("r"), log("join")];
        let edges = vec![
            Edge::new("e", "l"),
            Edge::new("e", "r"),
            Edge::new("l", "join"),
            Edge::new("r", "join"),
        ];
        assert!(Adjacency::build(&nodes, &edges).find_cycles(&nodes).is_empty());
    }
}
