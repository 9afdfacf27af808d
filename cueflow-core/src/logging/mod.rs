//! Log collection for authored content and runtime failures.
//!
//! Diagnostics go to `tracing`; everything an operator should see (authored
//! `log` steps, caught action and node failures, resolution warnings) is also
//! delivered to a [`LogCollector`] carried by the execution context.

mod collector;
mod event;

pub use collector::{BufferedCollector, CallbackCollector, DEFAULT_BUFFER_CAPACITY, LogCollector};
pub use event::{LogCategory, LogEvent, LogLevel};
