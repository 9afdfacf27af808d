//! Address resolution and writes against live application state.
//!
//! Neither entry point fails: an address that is malformed or names nothing
//! logs a warning and yields `None` (reads) or `false` (writes).

use super::{Address, AddressKind, SIGIL, names_match, normalize_name, parse_address};
use crate::context::ExecutionContext;
use crate::logging::LogCategory;
use crate::model::{Element, Layer, Phase, Template};
use crate::value::{PathSegment, build_patch, parse_path};
use serde_json::{Value, json};

/// Placeholder returned for state addresses; substituted with the live value
/// at the point of use.
pub fn state_placeholder(path: &str) -> String {
    format!("{{{{state.{}}}}}", path)
}

/// Find an element by raw id, `@address` or name.
pub fn find_element(reference: &str, ctx: &ExecutionContext) -> Option<Element> {
    let reference = reference.trim();
    let elements = ctx.elements().elements();

    if let Some(element) = elements.iter().find(|e| e.id == reference) {
        return Some(element.clone());
    }

    let name = match parse_address(reference) {
        Some(address) if address.kind == AddressKind::Element => address.name,
        Some(_) => return None,
        None => reference.to_string(),
    };
    elements.into_iter().find(|e| names_match(&e.name, &name))
}

/// Find a template by id, name or `@template.` address.
pub fn find_template(reference: &str, ctx: &ExecutionContext) -> Option<Template> {
    let reference = reference.trim();
    let name = match parse_address(reference) {
        Some(address) if address.kind == AddressKind::Template => address.name,
        _ => reference.to_string(),
    };
    let templates = ctx.templates().templates();
    if let Some(template) = templates.iter().find(|t| t.id == name) {
        return Some(template.clone());
    }
    templates.into_iter().find(|t| names_match(&t.name, &name))
}

/// Find a layer by id, name or `@layer.` address.
pub fn find_layer(reference: &str, ctx: &ExecutionContext) -> Option<Layer> {
    let reference = reference.trim();
    let name = match parse_address(reference) {
        Some(address) if address.kind == AddressKind::Layer => address.name,
        _ => reference.to_string(),
    };
    let layers = ctx.templates().layers();
    if let Some(layer) = layers.iter().find(|l| l.id == name) {
        return Some(layer.clone());
    }
    layers.into_iter().find(|l| names_match(&l.name, &name))
}

/// Path read that falls back to a normalized key match at each object step.
fn read_lenient(root: &Value, segments: &[PathSegment]) -> Option<Value> {
    let mut current = root;
    for segment in segments {
        current = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => match map.get(key) {
                Some(v) => v,
                None => {
                    let wanted = normalize_name(key);
                    map.iter()
                        .find(|(k, _)| normalize_name(k) == wanted)
                        .map(|(_, v)| v)?
                }
            },
            (Value::Array(items), PathSegment::Index(idx)) => items.get(*idx)?,
            (Value::Array(items), PathSegment::Key(key)) => {
                items.get(key.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(current.clone())
}

fn read_strict(root: &Value, path: &str) -> Option<Value> {
    crate::value::get_nested_value(root, path).cloned()
}

/// Resolve an address to its current value.
pub fn resolve_address(address: &str, ctx: &ExecutionContext) -> Option<Value> {
    let Some(parsed) = parse_address(address) else {
        ctx.warn(
            LogCategory::Address,
            format!("Malformed address '{}': expected '{}name.path'", address, SIGIL),
        );
        return None;
    };

    let resolved = match parsed.kind {
        AddressKind::Element => resolve_element(&parsed, ctx),
        AddressKind::Template => resolve_template(&parsed, ctx),
        AddressKind::Layer => resolve_layer(&parsed, ctx),
        AddressKind::Data => resolve_data(&parsed, ctx),
        AddressKind::State => Some(Value::String(state_placeholder(&parsed.full_path()))),
    };

    tracing::trace!(address = %address, found = resolved.is_some(), "Resolved address");
    resolved
}

fn resolve_element(address: &Address, ctx: &ExecutionContext) -> Option<Value> {
    let Some(element) = find_element(&address.name, ctx) else {
        ctx.warn(
            LogCategory::Address,
            format!("Element '{}' not found", address.name),
        );
        return None;
    };
    let value = element.to_value();
    if address.path.is_empty() {
        return Some(value);
    }
    read_strict(&value, &address.path_string())
}

fn resolve_template(address: &Address, ctx: &ExecutionContext) -> Option<Value> {
    let Some(template) = find_template(&address.name, ctx) else {
        ctx.warn(
            LogCategory::Address,
            format!("Template '{}' not found", address.name),
        );
        return None;
    };

    // `@template.Name.in` describes an animation rather than a property
    if let [segment] = address.path.as_slice() {
        if let Some(phase) = Phase::parse(segment) {
            return Some(json!({
                "template": template.id,
                "templateName": template.name,
                "layer": template.layer_id,
                "phase": phase,
            }));
        }
    }

    let mut view = template.to_value();
    if let Value::Object(ref mut map) = view {
        map.insert(
            "record".to_string(),
            template.current_record().cloned().unwrap_or(Value::Null),
        );
        map.insert("index".to_string(), json!(template.record_index));
        map.insert("count".to_string(), json!(template.records.len()));
    }
    if address.path.is_empty() {
        return Some(view);
    }
    read_strict(&view, &address.path_string())
}

fn resolve_layer(address: &Address, ctx: &ExecutionContext) -> Option<Value> {
    let Some(layer) = find_layer(&address.name, ctx) else {
        ctx.warn(
            LogCategory::Address,
            format!("Layer '{}' not found", address.name),
        );
        return None;
    };
    let value = layer.to_value();
    if address.path.is_empty() {
        return Some(value);
    }
    read_strict(&value, &address.path_string())
}

fn resolve_data(address: &Address, ctx: &ExecutionContext) -> Option<Value> {
    let scope = ctx.data();

    // A first segment naming a cached source previews that source
    if let Some(source) = scope.source(&address.name) {
        let found = source
            .current()
            .and_then(|record| read_lenient(record, &parse_path(&address.path_string())));
        if found.is_none() {
            ctx.warn(
                LogCategory::Address,
                format!("Data field '{}' not found in source '{}'", address.path_string(), address.name),
            );
        }
        return found;
    }

    let segments = parse_path(&address.full_path());
    if let Some(record) = scope.current_record() {
        if let Some(found) = read_lenient(record, &segments) {
            return Some(found);
        }
    }

    match (address.name.as_str(), address.path.is_empty()) {
        ("index", true) => Some(json!(scope.active.index)),
        ("count", true) => Some(json!(scope.active.payload.len())),
        _ => {
            ctx.warn(
                LogCategory::Address,
                format!("Data field '{}' not found in current record", address.full_path()),
            );
            None
        }
    }
}

/// Write a value through an address.
pub fn set_address_value(address: &str, value: Value, ctx: &ExecutionContext) -> bool {
    let Some(parsed) = parse_address(address) else {
        ctx.warn(
            LogCategory::Address,
            format!("Cannot write malformed address '{}'", address),
        );
        return false;
    };

    match parsed.kind {
        AddressKind::Element => write_element(&parsed, value, ctx),
        AddressKind::Template => write_template(&parsed, value, ctx),
        AddressKind::State => match ctx.store().set_path(&parsed.full_path(), value) {
            Ok(()) => true,
            Err(e) => {
                ctx.warn(LogCategory::Address, format!("{}", e));
                false
            }
        },
        AddressKind::Layer | AddressKind::Data => {
            ctx.warn(
                LogCategory::Address,
                format!("Address '{}' is read-only", address),
            );
            false
        }
    }
}

fn write_element(address: &Address, value: Value, ctx: &ExecutionContext) -> bool {
    let Some(element) = find_element(&address.name, ctx) else {
        ctx.warn(
            LogCategory::Address,
            format!("Element '{}' not found", address.name),
        );
        return false;
    };
    if address.path.is_empty() {
        ctx.warn(
            LogCategory::Address,
            format!("Write to '{}' needs a property path", address),
        );
        return false;
    }

    let patch = build_patch(&address.path_string(), value);
    match ctx.elements().update_element(&element.id, &patch) {
        Ok(()) => {
            tracing::debug!(element = %element.id, path = %address.path_string(), "Element updated");
            true
        }
        Err(e) => {
            ctx.warn(LogCategory::Address, format!("Element update failed: {}", e));
            false
        }
    }
}

fn write_template(address: &Address, value: Value, ctx: &ExecutionContext) -> bool {
    let Some(template) = find_template(&address.name, ctx) else {
        ctx.warn(
            LogCategory::Address,
            format!("Template '{}' not found", address.name),
        );
        return false;
    };

    let property = address.path_string();
    if !matches!(property.as_str(), "" | "index" | "record" | "recordIndex") {
        ctx.warn(
            LogCategory::Address,
            format!("Template property '{}' is not writable", property),
        );
        return false;
    }

    let index = match &value {
        Value::Number(n) => n
            .as_f64()
            .filter(|idx| idx.is_finite() && *idx >= 0.0 && idx.fract() == 0.0)
            .map(|idx| idx as usize)
            .filter(|idx| *idx < template.records.len()),
        Value::String(wanted) => {
            let Some(ref field) = template.display_field else {
                ctx.warn(
                    LogCategory::Address,
                    format!("Template '{}' has no display field", template.name),
                );
                return false;
            };
            let wanted = wanted.trim().to_lowercase();
            template.records.iter().position(|record| {
                record
                    .get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|s| s.trim().to_lowercase() == wanted)
            })
        }
        _ => None,
    };

    let Some(index) = index else {
        ctx.warn(
            LogCategory::Address,
            format!("No record {} in template '{}'", value, template.name),
        );
        return false;
    };

    match ctx.templates().set_record_index(&template.id, index) {
        Ok(()) => true,
        Err(e) => {
            ctx.warn(LogCategory::Address, format!("Record selection failed: {}", e));
            false
        }
    }
}

/// Write to an assignment target: an `@address`, a `state.path`, or a bare
/// state key.
pub fn write_target(target: &str, value: Value, ctx: &ExecutionContext) -> bool {
    let target = target.trim();
    if target.starts_with(SIGIL) {
        return set_address_value(target, value, ctx);
    }
    let path = target.strip_prefix("state.").unwrap_or(target);
    if path.is_empty() {
        ctx.warn(LogCategory::Address, "Empty assignment target");
        return false;
    }
    match ctx.store().set_path(path, value) {
        Ok(()) => true,
        Err(e) => {
            ctx.warn(LogCategory::Address, format!("{}", e));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{BufferedCollector, LogLevel};
    use crate::model::{DataScope, DataSource};
    use crate::providers::{InMemoryElements, InMemoryPlayout};
    use std::sync::Arc;
    use crate::providers::{ElementStore, TemplateStore};

    struct Fixture {
        ctx: ExecutionContext,
        elements: Arc<InMemoryElements>,
        playout: Arc<InMemoryPlayout>,
        logs: Arc<BufferedCollector>,
    }

    fn fixture() -> Fixture {
        let elements = Arc::new(InMemoryElements::new(vec![
            Element::new("e1", "Foo").with_property(
                "content",
                json!({"text": "old", "color": "red"}),
            ),
            Element::new("e2", "Score Box").with_property("value", json!(15)),
        ]));
        let playout = Arc::new(InMemoryPlayout::new(
            vec![
                Template::new("t1", "Lower Third", Some("L1")).with_records(
                    vec![json!({"name": "Alice"}), json!({"name": "Bob"})],
                    Some("name"),
                ),
            ],
            vec![Layer::new("L1", "Main")],
        ));
        let logs = Arc::new(BufferedCollector::default());
        let data = DataScope::new(vec![json!({"score": 3}), json!({"score": 7})], 1)
            .with_source("Team Stats", DataSource::new(vec![json!({"wins": 9})], 0));

        let ctx = ExecutionContext::builder()
            .elements(elements.clone())
            .templates(playout.clone())
            .logs(logs.clone())
            .data(data)
            .build();

        Fixture {
            ctx,
            elements,
            playout,
            logs,
        }
    }

    #[test]
    fn missing_element_is_none_with_warning() {
        let f = fixture();
        assert_eq!(resolve_address("@Missing", &f.ctx), None);
        assert_eq!(f.logs.by_level(LogLevel::Warn).len(), 1);
    }

    #[test]
    fn malformed_address_is_none() {
        let f = fixture();
        assert_eq!(resolve_address("Foo", &f.ctx), None);
        assert_eq!(resolve_address("@", &f.ctx), None);
    }

    #[test]
    fn element_reads_are_normalized() {
        let f = fixture();
        assert_eq!(
            resolve_address("@foo.content.text", &f.ctx),
            Some(json!("old"))
        );
        assert_eq!(resolve_address("@score_box.value", &f.ctx), Some(json!(15)));
        assert_eq!(resolve_address("@Foo.content.missing.deep", &f.ctx), None);
    }

    #[test]
    fn element_write_touches_only_the_path() {
        let f = fixture();
        assert!(set_address_value("@Foo.content.text", json!("Hi"), &f.ctx));

        let element = f.elements.element("e1").unwrap();
        assert_eq!(
            element.properties["content"],
            json!({"text": "Hi", "color": "red"})
        );
        assert_eq!(
            f.elements.patches(),
            vec![("e1".to_string(), json!({"content": {"text": "Hi"}}))]
        );
        let other = f.elements.element("e2").unwrap();
        assert_eq!(other.properties["value"], json!(15));
    }

    #[test]
    fn write_to_missing_element_is_false() {
        let f = fixture();
        assert!(!set_address_value("@Nope.x", json!(1), &f.ctx));
        assert!(!set_address_value("@Foo", json!(1), &f.ctx));
    }

    #[test]
    fn template_reads() {
        let f = fixture();
        assert_eq!(
            resolve_address("@template.Lower_Third.layer_id", &f.ctx),
            Some(json!("L1"))
        );
        assert_eq!(
            resolve_address("@template.lower third.record.name", &f.ctx),
            Some(json!("Alice"))
        );
        let animation = resolve_address("@template.Lower_Third.out", &f.ctx).unwrap();
        assert_eq!(animation["phase"], json!("out"));
        assert_eq!(animation["layer"], json!("L1"));
    }

    #[test]
    fn template_writes_select_records() {
        let f = fixture();
        assert!(set_address_value("@template.Lower_Third.index", json!(1), &f.ctx));
        assert_eq!(f.playout.templates()[0].record_index, 1);

        assert!(set_address_value("@template.Lower_Third", json!("alice"), &f.ctx));
        assert_eq!(f.playout.templates()[0].record_index, 0);

        assert!(!set_address_value("@template.Lower_Third", json!("Carol"), &f.ctx));
        assert!(!set_address_value("@template.Lower_Third", json!(9), &f.ctx));
        assert!(!set_address_value("@template.Lower_Third.name", json!("x"), &f.ctx));
    }

    #[test]
    fn template_index_accepts_whole_floats_within_records() {
        let f = fixture();
        assert!(set_address_value("@template.Lower_Third.index", json!(1.0), &f.ctx));
        assert_eq!(f.playout.templates()[0].record_index, 1);

        for bad in [json!(2), json!(0.5), json!(-1), json!(2.0)] {
            assert!(!set_address_value("@template.Lower_Third.index", bad.clone(), &f.ctx), "{}", bad);
        }
        assert_eq!(f.playout.templates()[0].record_index, 1);
    }

    #[test]
    fn template_index_without_records_is_refused() {
        let f = fixture();
        let ctx = ExecutionContext::builder()
            .templates(Arc::new(InMemoryPlayout::new(
                vec![Template::new("t2", "Bug", Some("L1"))],
                vec![Layer::new("L1", "Main")],
            )))
            .logs(f.logs.clone())
            .build();
        assert!(!set_address_value("@template.Bug.index", json!(0), &ctx));
        assert!(!set_address_value("@template.Bug.index", json!(3), &ctx));
        assert_eq!(f.logs.by_level(LogLevel::Warn).len(), 2);
    }

    #[test]
    fn layer_reads_and_rejects_writes() {
        let f = fixture();
        assert_eq!(resolve_address("@layer.main.id", &f.ctx), Some(json!("L1")));
        assert!(!set_address_value("@layer.Main.name", json!("x"), &f.ctx));
    }

    #[test]
    fn data_reads_current_record_and_sources() {
        let f = fixture();
        assert_eq!(resolve_address("@data.score", &f.ctx), Some(json!(7)));
        assert_eq!(resolve_address("@data.Team_Stats.wins", &f.ctx), Some(json!(9)));
        assert_eq!(resolve_address("@data.count", &f.ctx), Some(json!(2)));
        assert!(f.logs.by_level(LogLevel::Warn).is_empty());

        assert_eq!(resolve_address("@data.nothing", &f.ctx), None);
        assert_eq!(resolve_address("@data.Team_Stats.losses", &f.ctx), None);
        let warnings = f.logs.by_level(LogLevel::Warn);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("nothing"));
        assert!(warnings[1].message.contains("losses"));

        assert!(!set_address_value("@data.score", json!(1), &f.ctx));
    }

    #[test]
    fn state_reads_are_deferred() {
        let f = fixture();
        f.ctx.store().set("count", json!(4));
        assert_eq!(
            resolve_address("@state.count", &f.ctx),
            Some(json!("{{state.count}}"))
        );
    }

    #[test]
    fn state_and_target_writes_go_through_store() {
        let f = fixture();
        assert!(set_address_value("@state.score.home", json!(2), &f.ctx));
        assert!(write_target("state.flag", json!(true), &f.ctx));
        assert!(write_target("plain", json!("v"), &f.ctx));
        assert!(write_target("@Foo.content.text", json!("via target"), &f.ctx));

        assert_eq!(f.ctx.store().get_path("score.home"), Some(json!(2)));
        assert_eq!(f.ctx.store().get("flag"), Some(json!(true)));
        assert_eq!(f.ctx.store().get("plain"), Some(json!("v")));
        assert_eq!(
            resolve_address("@Foo.content.text", &f.ctx),
            Some(json!("via target"))
        );
    }

    #[test]
    fn find_element_accepts_id_name_or_address() {
        let f = fixture();
        assert_eq!(find_element("e2", &f.ctx).unwrap().id, "e2");
        assert_eq!(find_element("score box", &f.ctx).unwrap().id, "e2");
        assert_eq!(find_element("@Score_Box", &f.ctx).unwrap().id, "e2");
        assert!(find_element("@template.Lower_Third", &f.ctx).is_none());
    }
}
