//! cueflow core library
//!
//! Shared foundation for the cueflow interactive runtime: the pieces that
//! let a non-programmer attach "when X happens, do Y" behavior to broadcast
//! graphics and have it run safely against live state.
//!
//! # Key Components
//!
//! - **Address**: `@name.path` parsing, building, resolution and writes
//! - **Store**: session state, navigation and forms behind one setter
//! - **Context**: the per-event bundle of store, collaborators, log and clock
//! - **Providers**: host collaborator traits and in-memory implementations
//! - **Logging**: collectors for authored log steps and caught failures
//!
//! # Example
//!
//! ```ignore
//! use cueflow_core::prelude::*;
//!
//! let ctx = ExecutionContext::builder()
//!     .elements(Arc::new(InMemoryElements::new(vec![Element::new("e1", "Logo")])))
//!     .build();
//!
//! set_address_value("@Logo.opacity", json!(0.5), &ctx);
//! assert_eq!(resolve_address("@Logo.opacity", &ctx), Some(json!(0.5)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod context;
pub mod error;
pub mod functions;
pub mod ids;
pub mod logging;
pub mod model;
pub mod providers;
pub mod settings;
pub mod store;
pub mod testing;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::address::{
        Address, AddressKind, find_element, parse_address, resolve_address, set_address_value,
        write_target,
    };
    pub use crate::context::ExecutionContext;
    pub use crate::error::{CueError, Result, ResultExt};
    pub use crate::functions::FunctionRegistry;
    pub use crate::ids::DispatchId;
    pub use crate::logging::{BufferedCollector, LogCategory, LogCollector, LogLevel};
    pub use crate::model::{DataScope, DataSource, Element, Layer, Phase, Template, TriggerEvent};
    pub use crate::providers::{
        ClockProvider, DataFetcher, ElementStore, InMemoryElements, InMemoryPlayout, Navigator,
        TemplateStore,
    };
    pub use crate::settings::{DispatchMode, EngineSettings};
    pub use crate::store::RuntimeStore;
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
