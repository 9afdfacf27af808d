//! Host collaborator interfaces.
//!
//! The core never owns elements, templates or screens. It reaches them only
//! through these traits, which the host implements over its own stores.

use crate::error::{CueError, Result};
use crate::model::{Element, Layer, Template};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Element store: read the element list, apply patches.
pub trait ElementStore: Send + Sync {
    /// Snapshot of all elements.
    fn elements(&self) -> Vec<Element>;

    /// Deep-merge `patch` into the element with `id`.
    fn update_element(&self, id: &str, patch: &Value) -> Result<()>;

    /// Look up one element by id.
    fn element(&self, id: &str) -> Option<Element> {
        self.elements().into_iter().find(|e| e.id == id)
    }
}

/// Template/layer store and playout control.
pub trait TemplateStore: Send + Sync {
    /// Snapshot of all templates.
    fn templates(&self) -> Vec<Template>;

    /// Snapshot of all layers.
    fn layers(&self) -> Vec<Layer>;

    /// Animate a template on to a layer.
    fn play_in(&self, template_id: &str, layer_id: &str) -> Result<()>;

    /// Animate whatever is on a layer off.
    fn play_out(&self, layer_id: &str) -> Result<()>;

    /// Enter the loop phase of an on-air template.
    fn play_loop(&self, template_id: &str, layer_id: &str) -> Result<()> {
        let _ = layer_id;
        Err(CueError::Unsupported {
            operation: format!("loop phase for template '{}'", template_id),
        })
    }

    /// Select the record a template displays.
    fn set_record_index(&self, template_id: &str, index: usize) -> Result<()>;
}

/// Screen navigation.
pub trait Navigator: Send + Sync {
    /// Switch to a screen.
    fn navigate(&self, screen_id: &str) -> Result<()>;
}

/// A data fetch issued by a `fetchData` action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Target URL.
    pub url: String,
    /// HTTP method, upper-case.
    #[serde(default = "default_method")]
    pub method: String,
    /// Request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl FetchRequest {
    /// A GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

/// Future returned by [`DataFetcher::fetch`].
pub type FetchFuture<'a> = BoxFuture<'a, Result<Value>>;

/// Network access for data actions. Scripts never see this.
pub trait DataFetcher: Send + Sync {
    /// Perform the request and return the decoded JSON body.
    fn fetch(&self, request: FetchRequest) -> FetchFuture<'_>;
}

/// Fetcher used when the host provides none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFetcher;

impl DataFetcher for NoFetcher {
    fn fetch(&self, request: FetchRequest) -> FetchFuture<'_> {
        Box::pin(async move {
            Err(CueError::Unsupported {
                operation: format!("fetch {} {}", request.method, request.url),
            })
        })
    }
}
