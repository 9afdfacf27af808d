//! In-memory scene shared by the `run`, `actions` and `eval` commands.
//!
//! A scene file stands in for the host: the elements, templates and layers
//! on the canvas, the active data payload, and canned responses for
//! `fetchData` URLs.
//!
//! ```yaml
//! elements:
//!   - { id: el-score, name: Score, content: { text: "0" } }
//! templates:
//!   - { id: tpl-lt, name: Lower Third, layerId: L1 }
//! layers:
//!   - { id: L1, name: Main }
//! responses:
//!   https://api.example/results: { votes: [] }
//! ```

use anyhow::{Context, Result, bail};
use cueflow_core::context::ExecutionContext;
use cueflow_core::logging::BufferedCollector;
use cueflow_core::model::{DataScope, Element, Layer, Template};
use cueflow_core::providers::{
    ClockProvider, ImmediateClock, InMemoryElements, InMemoryPlayout, PlayoutCall, RealClock,
    RecordingNavigator, StaticFetcher,
};
use cueflow_core::settings::EngineSettings;
use cueflow_core::store::RuntimeStore;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Host entities and canned data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Canvas elements.
    pub elements: Vec<Element>,
    /// Playable templates.
    pub templates: Vec<Template>,
    /// Output layers.
    pub layers: Vec<Layer>,
    /// Active payload and named sources.
    pub data: DataScope,
    /// Response body per fetch URL.
    pub responses: BTreeMap<String, Value>,
}

impl Scene {
    /// Load a scene from YAML or JSON, or an empty scene.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let source = read(path)?;
                serde_yaml::from_str(&source)
                    .with_context(|| format!("Invalid scene file: {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

/// Load initial runtime state; must be a mapping.
pub fn load_state(path: Option<&Path>) -> Result<Map<String, Value>> {
    let Some(path) = path else {
        return Ok(Map::new());
    };
    let source = read(path)?;
    let value: Value = serde_yaml::from_str(&source)
        .with_context(|| format!("Invalid state file: {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => bail!("State file must contain a mapping: {}", path.display()),
    }
}

/// Read a UTF-8 file with a path in the error.
pub fn read(path: &Path) -> Result<String> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Context over in-memory collaborators, with handles for reporting.
pub struct Session {
    /// Context passed to the engine.
    pub ctx: ExecutionContext,
    /// Element store.
    pub elements: Arc<InMemoryElements>,
    /// Template/layer store.
    pub playout: Arc<InMemoryPlayout>,
    /// Navigator.
    pub navigator: Arc<RecordingNavigator>,
    /// Authored-content log.
    pub logs: Arc<BufferedCollector>,
}

impl Session {
    /// Wire a scene and initial state into a context. With `instant`, delays
    /// complete immediately instead of sleeping.
    pub fn new(
        scene: Scene,
        state: Map<String, Value>,
        settings: EngineSettings,
        instant: bool,
    ) -> Self {
        let elements = Arc::new(InMemoryElements::new(scene.elements));
        let playout = Arc::new(InMemoryPlayout::new(scene.templates, scene.layers));
        let navigator = Arc::new(RecordingNavigator::new());
        let logs = Arc::new(BufferedCollector::default());
        let fetcher = scene
            .responses
            .into_iter()
            .fold(StaticFetcher::new(), |fetcher, (url, body)| fetcher.respond(url, body));
        let clock: Arc<dyn ClockProvider> = if instant {
            Arc::new(ImmediateClock::new())
        } else {
            Arc::new(RealClock::new())
        };

        let ctx = ExecutionContext::builder()
            .store(Arc::new(RuntimeStore::with_state(state)))
            .elements(elements.clone())
            .templates(playout.clone())
            .navigator(navigator.clone())
            .fetcher(Arc::new(fetcher))
            .logs(logs.clone())
            .clock(clock)
            .settings(settings)
            .data(scene.data)
            .build();

        Self {
            ctx,
            elements,
            playout,
            navigator,
            logs,
        }
    }

    /// Print resulting state and every observed side effect.
    pub fn print_summary(&self) -> Result<()> {
        println!("State:");
        let state = serde_json::to_string_pretty(&self.ctx.store().snapshot())
            .context("Failed to render state")?;
        for line in state.lines() {
            println!("  {}", line);
        }

        let calls = self.playout.calls();
        if !calls.is_empty() {
            println!();
            println!("Playout:");
            for call in calls {
                match call {
                    PlayoutCall::PlayIn { template_id, layer_id } => {
                        println!("  in    {} on {}", template_id, layer_id)
                    }
                    PlayoutCall::PlayLoop { template_id, layer_id } => {
                        println!("  loop  {} on {}", template_id, layer_id)
                    }
                    PlayoutCall::PlayOut { layer_id } => println!("  out   {}", layer_id),
                }
            }
        }

        let patches = self.elements.patches();
        if !patches.is_empty() {
            println!();
            println!("Elements:");
            for (id, patch) in patches {
                println!("  {} <- {}", id, patch);
            }
        }

        let screens = self.navigator.screens();
        if !screens.is_empty() {
            println!();
            println!("Navigation: {}", screens.join(" -> "));
        }

        let events = self.logs.all();
        if !events.is_empty() {
            println!();
            println!("Log:");
            for event in events {
                println!("  {}", event.format_line());
            }
        }
        Ok(())
    }
}
