//! Node graph definition types.
//!
//! Graphs are authored in a visual editor and stored as plain JSON (or
//! YAML): a list of typed nodes and a list of directed edges.
//!
//! ```yaml
//! nodes:
//!   - id: start
//!     type: event
//!     data: { eventType: click, elementId: btn-next }
//!   - id: check
//!     type: condition
//!     data: { operand: state.step, operator: lessThan, comparand: 3 }
//!   - id: bump
//!     type: action
//!     data: { actionType: setState, target: step, value: "=state.step + 1" }
//! edges:
//!   - { source: start, target: check }
//!   - { source: check, target: bump }
//! ```

use cueflow_actions::Guard;
use cueflow_core::error::{CueError, Result};
use cueflow_core::model::Phase;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Event-node element filter matching every element.
pub const ANY_ELEMENT: &str = "any";

/// A complete graph: nodes plus edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGraph {
    /// Nodes in authored order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in authored order.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl NodeGraph {
    /// Create a graph from parts.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Parse a graph from YAML (JSON is valid YAML).
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Load a graph from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| CueError::Io {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;
        Self::from_yaml_str(&source)
    }

    /// Find a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// One graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within the graph.
    pub id: String,
    /// Editor label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// What the node does.
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// Create a node.
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: None,
            kind,
        }
    }

    /// Event node shorthand.
    pub fn event(id: impl Into<String>, event_type: impl Into<String>, element_id: Option<&str>) -> Self {
        Self::new(
            id,
            NodeKind::Event(EventNode {
                event_type: event_type.into(),
                element_id: element_id.map(str::to_string),
            }),
        )
    }

    /// Action node shorthand.
    pub fn action(id: impl Into<String>, action: GraphAction) -> Self {
        Self::new(id, NodeKind::Action(action))
    }

    /// Condition node shorthand.
    pub fn condition(id: impl Into<String>, guard: Guard) -> Self {
        Self::new(id, NodeKind::Condition(guard))
    }

    /// Kind tag, e.g. `event` or `action`.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// The event spec when this is an event node.
    pub fn as_event(&self) -> Option<&EventNode> {
        match self.kind {
            NodeKind::Event(ref event) => Some(event),
            _ => None,
        }
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum NodeKind {
    /// Entry point matched against the triggering event.
    Event(EventNode),
    /// Gate: children run only when the test holds.
    Condition(Guard),
    /// Side effect.
    Action(GraphAction),
    /// Read or write a value.
    Data(DataOperation),
    /// Run one phase of a template.
    Animation(AnimationNode),
}

impl NodeKind {
    /// Kind tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::Condition(_) => "condition",
            Self::Action(_) => "action",
            Self::Data(_) => "data",
            Self::Animation(_) => "animation",
        }
    }
}

/// Event-node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNode {
    /// Event type to match, e.g. `click`.
    pub event_type: String,
    /// Element filter: an id, name or `@address`; absent or `any` matches all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl EventNode {
    /// The element filter, unless it matches everything.
    pub fn element_filter(&self) -> Option<&str> {
        self.element_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && !id.eq_ignore_ascii_case(ANY_ELEMENT))
    }
}

/// Actions available to graph nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "actionType",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum GraphAction {
    /// Write a state key or `@address`.
    SetState {
        /// Assignment target.
        target: String,
        /// Value operand.
        value: Value,
    },
    /// Flip a boolean state key or `@address`.
    ToggleState {
        /// Assignment target.
        target: String,
    },
    /// Switch screens.
    Navigate {
        /// Screen operand.
        screen: Value,
    },
    /// Play a template in.
    PlayTemplate {
        /// Template id, name or address.
        template: String,
        /// Layer override.
        #[serde(default)]
        layer: Option<String>,
    },
    /// Play a template in, or out if it is on air.
    ToggleTemplate {
        /// Template id, name or address.
        template: String,
        /// Layer override.
        #[serde(default)]
        layer: Option<String>,
    },
    /// Make an element visible.
    ShowElement {
        /// Element id, name or address.
        element: String,
    },
    /// Hide an element.
    HideElement {
        /// Element id, name or address.
        element: String,
    },
    /// Flip an element's visibility.
    ToggleElement {
        /// Element id, name or address.
        element: String,
    },
    /// Run a template phase.
    PlayAnimation {
        /// Template id, name or address.
        template: String,
        /// Layer override.
        #[serde(default)]
        layer: Option<String>,
        /// Phase, default `in`.
        #[serde(default)]
        phase: Phase,
    },
    /// Take a template off air.
    StopAnimation {
        /// Template id, name or address.
        template: String,
        /// Layer override.
        #[serde(default)]
        layer: Option<String>,
    },
    /// Authored log message.
    Log {
        /// Message operand, `{{...}}` interpolated.
        message: Value,
    },
    /// Suspend this branch.
    Delay {
        /// Milliseconds operand.
        #[serde(alias = "ms", alias = "duration")]
        duration_ms: Value,
    },
    /// Call a host function; unregistered names only log.
    CallFunction {
        /// Function name.
        name: String,
        /// Argument operands.
        #[serde(default)]
        args: Vec<Value>,
        /// Where to write the result.
        #[serde(default)]
        target: Option<String>,
    },
}

impl GraphAction {
    /// The `actionType` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SetState { .. } => "setState",
            Self::ToggleState { .. } => "toggleState",
            Self::Navigate { .. } => "navigate",
            Self::PlayTemplate { .. } => "playTemplate",
            Self::ToggleTemplate { .. } => "toggleTemplate",
            Self::ShowElement { .. } => "showElement",
            Self::HideElement { .. } => "hideElement",
            Self::ToggleElement { .. } => "toggleElement",
            Self::PlayAnimation { .. } => "playAnimation",
            Self::StopAnimation { .. } => "stopAnimation",
            Self::Log { .. } => "log",
            Self::Delay { .. } => "delay",
            Self::CallFunction { .. } => "callFunction",
        }
    }

    /// Operands that may hold expressions, for static checks.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Self::SetState { value, .. } => vec![value],
            Self::Navigate { screen } => vec![screen],
            Self::Log { message } => vec![message],
            Self::Delay { duration_ms } => vec![duration_ms],
            Self::CallFunction { args, .. } => args.iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// Data-node operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum DataOperation {
    /// Read `source` (an address, `state.<key>` or bare key).
    Get {
        /// What to read.
        source: String,
        /// Where to copy the value; only logged when absent.
        #[serde(default)]
        target: Option<String>,
    },
    /// Write `value` to `target` (an address, `state.<key>` or bare key).
    Set {
        /// Assignment target.
        target: String,
        /// Value operand.
        value: Value,
    },
}

/// Animation-node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationNode {
    /// Template id, name or address.
    pub template: String,
    /// Layer override.
    #[serde(default)]
    pub layer: Option<String>,
    /// Phase, default `in`.
    #[serde(default)]
    pub phase: Phase,
}

/// Directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Editor id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Source node id.
    #[serde(alias = "from")]
    pub source: String,
    /// Target node id.
    #[serde(alias = "to")]
    pub target: String,
}

impl Edge {
    /// Create an edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
        }
    }
}
