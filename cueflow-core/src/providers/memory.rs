//! In-memory collaborators.
//!
//! Used by the CLI to run graphs headless and by tests to observe side
//! effects. Each store records what the runtime asked of it.

use super::collaborators::{
    DataFetcher, ElementStore, FetchFuture, FetchRequest, Navigator, TemplateStore,
};
use crate::error::{CueError, Result};
use crate::model::{Element, Layer, Template};
use crate::value::deep_merge;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Element store over a vector of elements.
#[derive(Debug, Default)]
pub struct InMemoryElements {
    elements: RwLock<Vec<Element>>,
    patches: RwLock<Vec<(String, Value)>>,
}

impl InMemoryElements {
    /// Create a store holding `elements`.
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements: RwLock::new(elements),
            patches: RwLock::new(Vec::new()),
        }
    }

    /// Patches applied so far, in order.
    pub fn patches(&self) -> Vec<(String, Value)> {
        self.patches.read().clone()
    }
}

impl ElementStore for InMemoryElements {
    fn elements(&self) -> Vec<Element> {
        self.elements.read().clone()
    }

    fn update_element(&self, id: &str, patch: &Value) -> Result<()> {
        let mut elements = self.elements.write();
        let element = elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CueError::not_found("element", id))?;

        let mut merged = element.to_value();
        deep_merge(&mut merged, patch);
        *element = serde_json::from_value(merged)?;

        self.patches.write().push((id.to_string(), patch.clone()));
        Ok(())
    }
}

/// A playout request observed by [`InMemoryPlayout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum PlayoutCall {
    /// `play_in(template, layer)`.
    PlayIn {
        /// Template id.
        template_id: String,
        /// Layer id.
        layer_id: String,
    },
    /// `play_loop(template, layer)`.
    PlayLoop {
        /// Template id.
        template_id: String,
        /// Layer id.
        layer_id: String,
    },
    /// `play_out(layer)`.
    PlayOut {
        /// Layer id.
        layer_id: String,
    },
}

/// Template store that tracks what is on air per layer.
#[derive(Debug, Default)]
pub struct InMemoryPlayout {
    templates: RwLock<Vec<Template>>,
    layers: RwLock<Vec<Layer>>,
    on_air: RwLock<HashMap<String, String>>,
    calls: RwLock<Vec<PlayoutCall>>,
}

impl InMemoryPlayout {
    /// Create a store with templates and layers.
    pub fn new(templates: Vec<Template>, layers: Vec<Layer>) -> Self {
        Self {
            templates: RwLock::new(templates),
            layers: RwLock::new(layers),
            on_air: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Playout calls so far, in order.
    pub fn calls(&self) -> Vec<PlayoutCall> {
        self.calls.read().clone()
    }

    /// Template currently on a layer.
    pub fn on_air(&self, layer_id: &str) -> Option<String> {
        self.on_air.read().get(layer_id).cloned()
    }
}

impl TemplateStore for InMemoryPlayout {
    fn templates(&self) -> Vec<Template> {
        self.templates.read().clone()
    }

    fn layers(&self) -> Vec<Layer> {
        self.layers.read().clone()
    }

    fn play_in(&self, template_id: &str, layer_id: &str) -> Result<()> {
        self.on_air
            .write()
            .insert(layer_id.to_string(), template_id.to_string());
        self.calls.write().push(PlayoutCall::PlayIn {
            template_id: template_id.to_string(),
            layer_id: layer_id.to_string(),
        });
        Ok(())
    }

    fn play_out(&self, layer_id: &str) -> Result<()> {
        self.on_air.write().remove(layer_id);
        self.calls.write().push(PlayoutCall::PlayOut {
            layer_id: layer_id.to_string(),
        });
        Ok(())
    }

    fn play_loop(&self, template_id: &str, layer_id: &str) -> Result<()> {
        self.calls.write().push(PlayoutCall::PlayLoop {
            template_id: template_id.to_string(),
            layer_id: layer_id.to_string(),
        });
        Ok(())
    }

    fn set_record_index(&self, template_id: &str, index: usize) -> Result<()> {
        let mut templates = self.templates.write();
        let template = templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(|| CueError::not_found("template", template_id))?;
        template.record_index = index;
        Ok(())
    }
}

/// Navigator that remembers the screens it was sent to.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    screens: RwLock<Vec<String>>,
}

impl RecordingNavigator {
    /// Create an empty navigator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Screens navigated to, in order.
    pub fn screens(&self) -> Vec<String> {
        self.screens.read().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, screen_id: &str) -> Result<()> {
        self.screens.write().push(screen_id.to_string());
        Ok(())
    }
}

/// Fetcher answering from a fixed URL map.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Value>,
    requests: RwLock<Vec<FetchRequest>>,
}

impl StaticFetcher {
    /// Create a fetcher with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `body`.
    pub fn respond(mut self, url: impl Into<String>, body: Value) -> Self {
        self.responses.insert(url.into(), body);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.read().clone()
    }
}

impl DataFetcher for StaticFetcher {
    fn fetch(&self, request: FetchRequest) -> FetchFuture<'_> {
        let response = self.responses.get(&request.url).cloned();
        let url = request.url.clone();
        self.requests.write().push(request);
        Box::pin(async move { response.ok_or_else(|| CueError::not_found("url", url)) })
    }
}
