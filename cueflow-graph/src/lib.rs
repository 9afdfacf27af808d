//! cueflow visual node graph runtime.
//!
//! Interprets a user-drawn graph as event-triggered automation, the visual
//! counterpart of the action list executor.
//!
//! # Key Components
//!
//! - **Model**: closed node kinds (event, condition, action, data,
//!   animation) and directed edges, loaded from JSON or YAML
//! - **Adjacency**: source-to-targets map preserving authored edge order
//! - **Validation**: editor-time findings with size limits
//! - **Runtime**: event matching and per-walk visited sets that keep
//!   cyclic graphs terminating
//!
//! # Example
//!
//! ```ignore
//! use cueflow_graph::prelude::*;
//!
//! let graph = NodeGraph::from_file("scoreboard.yaml")?;
//! GraphValidator::new().validate(&graph).into_result()?;
//!
//! let runtime = GraphRuntime::new(graph);
//! let report = runtime
//!     .dispatch(&TriggerEvent::new("click").on_element("btn-home"), &ctx)
//!     .await;
//! println!("{} nodes ran", report.visited.len());
//! ```

#![warn(missing_docs)]

pub mod graph;
pub mod handlers;
pub mod model;
pub mod runtime;
pub mod validation;

pub use graph::Adjacency;
pub use model::{
    AnimationNode, DataOperation, Edge, EventNode, GraphAction, Node, NodeGraph, NodeKind,
};
pub use runtime::{DispatchReport, GraphRuntime, NodeFailure, execute_node_graph};
pub use validation::{Finding, FindingKind, GraphLimits, GraphValidator, Severity, ValidationReport};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::model::{
        AnimationNode, DataOperation, Edge, EventNode, GraphAction, Node, NodeGraph, NodeKind,
    };
    pub use crate::runtime::{DispatchReport, GraphRuntime, NodeFailure, execute_node_graph};
    pub use crate::validation::{GraphValidator, ValidationReport};
    pub use cueflow_actions::Guard;
    pub use cueflow_core::prelude::*;
    pub use cueflow_script::{Condition, ConditionOperator};
}
