//! Execution context passed into scripts, actions and graph nodes.
//!
//! A context is built per triggering event. It carries the shared store by
//! reference (never a snapshot, so reads after a suspension point see live
//! values), the host collaborators, the log collector, the delay clock and
//! the event itself. Cloning is cheap: everything shared sits behind an `Arc`.

use crate::error::Result;
use crate::functions::FunctionRegistry;
use crate::ids::DispatchId;
use crate::logging::{BufferedCollector, LogCategory, LogCollector, LogEvent, LogLevel};
use crate::model::{DataScope, TriggerEvent};
use crate::providers::{
    ClockProvider, DataFetcher, ElementStore, InMemoryElements, InMemoryPlayout, Navigator,
    NoFetcher, RealClock, RecordingNavigator, TemplateStore,
};
use crate::settings::EngineSettings;
use crate::store::RuntimeStore;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Bundle of live accessors for one execution.
#[derive(Clone)]
pub struct ExecutionContext {
    store: Arc<RuntimeStore>,
    elements: Arc<dyn ElementStore>,
    templates: Arc<dyn TemplateStore>,
    navigator: Arc<dyn Navigator>,
    fetcher: Arc<dyn DataFetcher>,
    logs: Arc<dyn LogCollector>,
    clock: Arc<dyn ClockProvider>,
    functions: Arc<FunctionRegistry>,
    settings: Arc<EngineSettings>,
    data: Arc<DataScope>,
    event: TriggerEvent,
    locals: Map<String, Value>,
    dispatch_id: DispatchId,
    node_id: Option<String>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("event", &self.event)
            .field("dispatch_id", &self.dispatch_id)
            .field("node_id", &self.node_id)
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Start building a context.
    pub fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder::default()
    }

    /// The shared runtime store.
    pub fn store(&self) -> &RuntimeStore {
        &self.store
    }

    /// A handle to the shared runtime store.
    pub fn store_handle(&self) -> Arc<RuntimeStore> {
        self.store.clone()
    }

    /// Element collaborator.
    pub fn elements(&self) -> &dyn ElementStore {
        self.elements.as_ref()
    }

    /// Template/layer collaborator.
    pub fn templates(&self) -> &dyn TemplateStore {
        self.templates.as_ref()
    }

    /// Data fetch collaborator.
    pub fn fetcher(&self) -> &dyn DataFetcher {
        self.fetcher.as_ref()
    }

    /// Delay clock.
    pub fn clock(&self) -> &dyn ClockProvider {
        self.clock.as_ref()
    }

    /// Host function registry.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Data visible to this execution.
    pub fn data(&self) -> &DataScope {
        &self.data
    }

    /// The triggering event.
    pub fn event(&self) -> &TriggerEvent {
        &self.event
    }

    /// Local bindings (loop items and the like).
    pub fn locals(&self) -> &Map<String, Value> {
        &self.locals
    }

    /// Look up one local binding.
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Correlation id of the current dispatch.
    pub fn dispatch_id(&self) -> DispatchId {
        self.dispatch_id
    }

    /// Node or action currently executing.
    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    /// Same context for a different triggering event.
    pub fn with_event(&self, event: TriggerEvent) -> Self {
        let mut ctx = self.clone();
        ctx.event = event;
        ctx
    }

    /// Same context with an extra local binding.
    pub fn with_local(&self, name: impl Into<String>, value: Value) -> Self {
        let mut ctx = self.clone();
        ctx.locals.insert(name.into(), value);
        ctx
    }

    /// Same context attributed to a node or action.
    pub fn with_node(&self, node_id: impl Into<String>) -> Self {
        let mut ctx = self.clone();
        ctx.node_id = Some(node_id.into());
        ctx
    }

    /// Same context under a fresh dispatch id.
    pub fn with_dispatch_id(&self, dispatch_id: DispatchId) -> Self {
        let mut ctx = self.clone();
        ctx.dispatch_id = dispatch_id;
        ctx
    }

    /// Same context over a different data scope.
    pub fn with_data(&self, data: DataScope) -> Self {
        let mut ctx = self.clone();
        ctx.data = Arc::new(data);
        ctx
    }

    /// Navigate the host and record the move in the store.
    pub fn navigate(&self, screen_id: &str) -> Result<()> {
        self.navigator.navigate(screen_id)?;
        self.store
            .navigate(screen_id, self.settings.reset_state_on_navigate);
        self.debug(LogCategory::Store, format!("navigated to {}", screen_id));
        Ok(())
    }

    /// Return to the previous screen, if any.
    pub fn navigate_back(&self) -> Result<Option<String>> {
        let Some(previous) = self.store.back() else {
            return Ok(None);
        };
        self.navigator.navigate(&previous)?;
        Ok(Some(previous))
    }

    /// Suspend for `ms` milliseconds, clamped to the configured cap.
    pub async fn delay(&self, ms: u64) {
        let duration = self.settings.clamp_delay(ms);
        if duration.as_millis() < u128::from(ms) {
            self.warn(
                LogCategory::Action,
                format!("delay of {}ms clamped to {}ms", ms, duration.as_millis()),
            );
        }
        self.clock.sleep(duration).await;
    }

    fn emit(&self, level: LogLevel, category: LogCategory, message: String) {
        let mut event = LogEvent::new(level, category, message).with_dispatch_id(self.dispatch_id);
        if let Some(ref node_id) = self.node_id {
            event = event.with_node_id(node_id.clone());
        }
        self.logs.collect(event);
    }

    /// Authored log message.
    pub fn log(&self, message: impl AsRef<str>) {
        tracing::info!(
            dispatch_id = %self.dispatch_id,
            node_id = self.node_id.as_deref().unwrap_or("-"),
            "{}",
            message.as_ref()
        );
        self.emit(LogLevel::Info, LogCategory::User, message.as_ref().to_string());
    }

    /// Debug message, forwarded to the collector only in debug mode.
    pub fn debug(&self, category: LogCategory, message: impl AsRef<str>) {
        tracing::debug!(
            dispatch_id = %self.dispatch_id,
            node_id = self.node_id.as_deref().unwrap_or("-"),
            category = %category,
            "{}",
            message.as_ref()
        );
        if self.settings.debug {
            self.emit(LogLevel::Debug, category, message.as_ref().to_string());
        }
    }

    /// Warning, e.g. an unresolved address or a caught failure.
    pub fn warn(&self, category: LogCategory, message: impl AsRef<str>) {
        tracing::warn!(
            dispatch_id = %self.dispatch_id,
            node_id = self.node_id.as_deref().unwrap_or("-"),
            category = %category,
            "{}",
            message.as_ref()
        );
        self.emit(LogLevel::Warn, category, message.as_ref().to_string());
    }

    /// Error message.
    pub fn error(&self, category: LogCategory, message: impl AsRef<str>) {
        tracing::error!(
            dispatch_id = %self.dispatch_id,
            node_id = self.node_id.as_deref().unwrap_or("-"),
            category = %category,
            "{}",
            message.as_ref()
        );
        self.emit(LogLevel::Error, category, message.as_ref().to_string());
    }
}

/// Builder for [`ExecutionContext`]. Unset collaborators default to empty
/// in-memory stores, a buffered log collector and the real clock.
#[derive(Default)]
pub struct ExecutionContextBuilder {
    store: Option<Arc<RuntimeStore>>,
    elements: Option<Arc<dyn ElementStore>>,
    templates: Option<Arc<dyn TemplateStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    fetcher: Option<Arc<dyn DataFetcher>>,
    logs: Option<Arc<dyn LogCollector>>,
    clock: Option<Arc<dyn ClockProvider>>,
    functions: Option<FunctionRegistry>,
    settings: Option<EngineSettings>,
    data: Option<DataScope>,
    event: Option<TriggerEvent>,
}

impl ExecutionContextBuilder {
    /// Use a shared store.
    pub fn store(mut self, store: Arc<RuntimeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an element collaborator.
    pub fn elements(mut self, elements: Arc<dyn ElementStore>) -> Self {
        self.elements = Some(elements);
        self
    }

    /// Use a template/layer collaborator.
    pub fn templates(mut self, templates: Arc<dyn TemplateStore>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Use a navigation collaborator.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Use a data fetch collaborator.
    pub fn fetcher(mut self, fetcher: Arc<dyn DataFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use a log collector.
    pub fn logs(mut self, logs: Arc<dyn LogCollector>) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Use a clock.
    pub fn clock(mut self, clock: Arc<dyn ClockProvider>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a host function registry.
    pub fn functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Use engine settings.
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Use a data scope.
    pub fn data(mut self, data: DataScope) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the triggering event.
    pub fn event(mut self, event: TriggerEvent) -> Self {
        self.event = Some(event);
        self
    }

    /// Build the context.
    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            store: self.store.unwrap_or_default(),
            elements: self
                .elements
                .unwrap_or_else(|| Arc::new(InMemoryElements::default())),
            templates: self
                .templates
                .unwrap_or_else(|| Arc::new(InMemoryPlayout::default())),
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(RecordingNavigator::new())),
            fetcher: self.fetcher.unwrap_or_else(|| Arc::new(NoFetcher)),
            logs: self
                .logs
                .unwrap_or_else(|| Arc::new(BufferedCollector::default())),
            clock: self.clock.unwrap_or_else(|| Arc::new(RealClock::new())),
            functions: Arc::new(self.functions.unwrap_or_default()),
            settings: Arc::new(self.settings.unwrap_or_default()),
            data: Arc::new(self.data.unwrap_or_default()),
            event: self.event.unwrap_or_default(),
            locals: Map::new(),
            dispatch_id: DispatchId::new(),
            node_id: None,
        }
    }
}
