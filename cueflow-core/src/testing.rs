//! Test harness shared by the cueflow crates.
//!
//! Builds an [`ExecutionContext`] over in-memory collaborators and keeps
//! handles to each so tests can assert on side effects.
//!
//! ```ignore
//! let harness = TestHarness::builder()
//!     .element(Element::new("e1", "Score"))
//!     .state(json!({"x": 1}))
//!     .build();
//! harness.ctx.store().set("y", json!(2));
//! assert!(harness.warnings().is_empty());
//! ```

use crate::context::ExecutionContext;
use crate::functions::FunctionRegistry;
use crate::logging::{BufferedCollector, LogEvent, LogLevel};
use crate::model::{DataScope, Element, Layer, Template, TriggerEvent};
use crate::providers::{
    ImmediateClock, InMemoryElements, InMemoryPlayout, RecordingNavigator, StaticFetcher,
};
use crate::settings::EngineSettings;
use crate::store::RuntimeStore;
use serde_json::Value;
use std::sync::Arc;

/// Context plus handles to every in-memory collaborator.
pub struct TestHarness {
    /// The context under test.
    pub ctx: ExecutionContext,
    /// Element store.
    pub elements: Arc<InMemoryElements>,
    /// Template/layer store.
    pub playout: Arc<InMemoryPlayout>,
    /// Navigator.
    pub navigator: Arc<RecordingNavigator>,
    /// Log collector.
    pub logs: Arc<BufferedCollector>,
    /// Clock; delays complete immediately.
    pub clock: Arc<ImmediateClock>,
    /// Data fetcher.
    pub fetcher: Arc<StaticFetcher>,
}

impl TestHarness {
    /// Start building a harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Harness with no entities.
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Warning and error events logged so far.
    pub fn warnings(&self) -> Vec<LogEvent> {
        self.logs.by_level(LogLevel::Warn)
    }

    /// Messages logged so far.
    pub fn messages(&self) -> Vec<String> {
        self.logs.messages()
    }

    /// Read a state variable.
    pub fn state(&self, key: &str) -> Option<Value> {
        self.ctx.store().get(key)
    }
}

/// Builder for [`TestHarness`].
#[derive(Default)]
pub struct TestHarnessBuilder {
    elements: Vec<Element>,
    templates: Vec<Template>,
    layers: Vec<Layer>,
    state: Option<Value>,
    data: Option<DataScope>,
    settings: Option<EngineSettings>,
    functions: Option<FunctionRegistry>,
    fetcher: Option<StaticFetcher>,
    event: Option<TriggerEvent>,
}

impl TestHarnessBuilder {
    /// Add an element.
    pub fn element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Add a template.
    pub fn template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }

    /// Add a layer.
    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Seed state from a JSON object.
    pub fn state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Set the data scope.
    pub fn data(mut self, data: DataScope) -> Self {
        self.data = Some(data);
        self
    }

    /// Set engine settings.
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set host functions.
    pub fn functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Set the fetcher.
    pub fn fetcher(mut self, fetcher: StaticFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the triggering event.
    pub fn event(mut self, event: TriggerEvent) -> Self {
        self.event = Some(event);
        self
    }

    /// Build the harness.
    pub fn build(self) -> TestHarness {
        let elements = Arc::new(InMemoryElements::new(self.elements));
        let playout = Arc::new(InMemoryPlayout::new(self.templates, self.layers));
        let navigator = Arc::new(RecordingNavigator::new());
        let logs = Arc::new(BufferedCollector::default());
        let clock = Arc::new(ImmediateClock::new());
        let fetcher = Arc::new(self.fetcher.unwrap_or_default());

        let store = match self.state {
            Some(Value::Object(map)) => RuntimeStore::with_state(map),
            _ => RuntimeStore::new(),
        };

        let mut builder = ExecutionContext::builder()
            .store(Arc::new(store))
            .elements(elements.clone())
            .templates(playout.clone())
            .navigator(navigator.clone())
            .fetcher(fetcher.clone())
            .logs(logs.clone())
            .clock(clock.clone())
            .settings(self.settings.unwrap_or_default())
            .data(self.data.unwrap_or_default())
            .functions(self.functions.unwrap_or_default());
        if let Some(event) = self.event {
            builder = builder.event(event);
        }

        TestHarness {
            ctx: builder.build(),
            elements,
            playout,
            navigator,
            logs,
            clock,
            fetcher,
        }
    }
}
