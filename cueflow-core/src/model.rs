//! Data model for entities the runtime reads and drives.
//!
//! Elements, templates and layers are owned by the host; the core only holds
//! snapshots obtained through the collaborator traits. Everything is plain
//! serde data so a headless host can feed it from JSON or YAML.

use crate::address::normalize_name;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// A graphic element on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Host-assigned identifier.
    pub id: String,
    /// Author-facing name used by addresses.
    pub name: String,
    /// Visibility flag.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Nested content and properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

impl Element {
    /// Create an element with no properties.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visible: true,
            properties: Map::new(),
        }
    }

    /// Set a top-level property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// The element as one JSON object (id, name, visible and properties).
    pub fn to_value(&self) -> Value {
        let mut map = self.properties.clone();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("visible".to_string(), Value::Bool(self.visible));
        Value::Object(map)
    }
}

/// A playable graphic template bound to a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template identifier.
    pub id: String,
    /// Author-facing name.
    pub name: String,
    /// Layer the template plays on by default.
    #[serde(default, alias = "layerId", skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<String>,
    /// Data records the template can step through.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Value>,
    /// Record field shown to operators and matched by name writes.
    #[serde(
        default,
        alias = "displayField",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_field: Option<String>,
    /// Currently selected record.
    #[serde(default, alias = "recordIndex")]
    pub record_index: usize,
    /// Any further template properties.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Template {
    /// Create a template on a layer.
    pub fn new(id: impl Into<String>, name: impl Into<String>, layer_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            layer_id: layer_id.map(str::to_string),
            records: Vec::new(),
            display_field: None,
            record_index: 0,
            extra: Map::new(),
        }
    }

    /// Attach records and the field used to find them by name.
    pub fn with_records(mut self, records: Vec<Value>, display_field: Option<&str>) -> Self {
        self.records = records;
        self.display_field = display_field.map(str::to_string);
        self
    }

    /// The record at the current index, if any.
    pub fn current_record(&self) -> Option<&Value> {
        self.records.get(self.record_index)
    }

    /// The template as one JSON object.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// An output layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Layer identifier.
    pub id: String,
    /// Author-facing name.
    pub name: String,
    /// Any further layer properties.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layer {
    /// Create a layer.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }

    /// The layer as one JSON object.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// The event that triggered an execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    /// Event type, e.g. `click` or `load`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Element that raised the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl TriggerEvent {
    /// Create an event without element or payload.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            element_id: None,
            payload: None,
        }
    }

    /// Set the originating element.
    pub fn on_element(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The event as one JSON object for scripts and field paths.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Stage of a graphic's on-air animation lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Animate on.
    #[default]
    In,
    /// Hold/loop while on air.
    Loop,
    /// Animate off.
    Out,
}

impl Phase {
    /// Parse a phase name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "in" => Some(Self::In),
            "loop" => Some(Self::Loop),
            "out" => Some(Self::Out),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Loop => "loop",
            Self::Out => "out",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cached data payload with its record cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Records.
    #[serde(default)]
    pub payload: Vec<Value>,
    /// Current record index.
    #[serde(default)]
    pub index: usize,
}

impl DataSource {
    /// Create a source positioned at `index`.
    pub fn new(payload: Vec<Value>, index: usize) -> Self {
        Self { payload, index }
    }

    /// The record under the cursor.
    pub fn current(&self) -> Option<&Value> {
        self.payload.get(self.index)
    }
}

/// Data visible to one execution: the active payload plus named sources
/// cached for previewing other contexts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataScope {
    /// Active payload and cursor.
    #[serde(flatten)]
    pub active: DataSource,
    /// Named sources.
    #[serde(default)]
    pub sources: HashMap<String, DataSource>,
}

impl DataScope {
    /// Create a scope over an active payload.
    pub fn new(records: Vec<Value>, index: usize) -> Self {
        Self {
            active: DataSource::new(records, index),
            sources: HashMap::new(),
        }
    }

    /// Add a named source.
    pub fn with_source(mut self, name: impl Into<String>, source: DataSource) -> Self {
        self.sources.insert(name.into(), source);
        self
    }

    /// The active payload's current record.
    pub fn current_record(&self) -> Option<&Value> {
        self.active.current()
    }

    /// Look up a named source by normalized name.
    pub fn source(&self, name: &str) -> Option<&DataSource> {
        let wanted = normalize_name(name);
        self.sources
            .iter()
            .find(|(key, _)| normalize_name(key) == wanted)
            .map(|(_, source)| source)
    }
}
