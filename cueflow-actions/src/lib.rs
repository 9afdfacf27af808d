//! cueflow action executor.
//!
//! Authored "when X happens, do Y" behavior expressed as a flat list of
//! typed steps. Each step names an action type and its operands; operands
//! go through [`resolve_value`] so they may be literals, state paths,
//! `{{...}}` bindings, `=expressions` or `@addresses`.
//!
//! # Example
//!
//! ```ignore
//! use cueflow_actions::prelude::*;
//!
//! let actions: Vec<Action> = serde_json::from_value(json!([
//!     {"type": "incrementState", "target": "score", "by": 5},
//!     {"type": "setElementProperty", "element": "@Score", "property": "content.text",
//!      "value": "{{state.score}}"},
//! ]))?;
//!
//! let report = execute_actions(&actions, &TriggerEvent::new("click"), &ctx).await;
//! assert!(report.is_success());
//! ```
//!
//! [`resolve_value`]: cueflow_script::resolve_value

#![warn(missing_docs)]

pub mod action;
pub mod executor;
pub mod handlers;

pub use action::{Action, ActionKind, Aggregation, FieldRule, Guard, ItemFilter, TimelineStep};
pub use executor::{ActionFailure, ExecutionReport, check_guard, execute_action, execute_actions};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::action::{
        Action, ActionKind, Aggregation, FieldRule, Guard, ItemFilter, TimelineStep,
    };
    pub use crate::executor::{
        ActionFailure, ExecutionReport, check_guard, execute_action, execute_actions,
    };
    pub use cueflow_core::prelude::*;
}
