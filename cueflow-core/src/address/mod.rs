//! String addressing for live application state.
//!
//! An address is a sigil-prefixed token such as `@Logo.opacity`,
//! `@template.Lower_Third.record.name`, `@layer.Main.id`, `@data.score` or
//! `@state.count`. The namespace is decided by the literal first segment;
//! anything else names an element. Addresses are parsed on demand and never
//! stored as objects, so the same reference works whichever concrete object
//! currently backs the name.
//!
//! Name matching lives here and only here: [`normalize_name`] is applied
//! identically on the read and write paths.

mod resolver;

pub use resolver::{
    find_element, find_layer, find_template, resolve_address, set_address_value,
    state_placeholder, write_target,
};

use crate::model::Phase;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking a string as an address.
pub const SIGIL: char = '@';

/// Namespace of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// A canvas element, addressed by bare name.
    Element,
    /// A template (`@template.`).
    Template,
    /// A layer (`@layer.`).
    Layer,
    /// A data field (`@data.`).
    Data,
    /// A runtime state variable (`@state.`).
    State,
}

impl AddressKind {
    /// Keyword that introduces the namespace, if any.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::Element => None,
            Self::Template => Some("template"),
            Self::Layer => Some("layer"),
            Self::Data => Some("data"),
            Self::State => Some("state"),
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "template" => Some(Self::Template),
            "layer" => Some(Self::Layer),
            "data" => Some(Self::Data),
            "state" => Some(Self::State),
            _ => None,
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Element => "element",
            Self::Template => "template",
            Self::Layer => "layer",
            Self::Data => "data",
            Self::State => "state",
        };
        write!(f, "{}", s)
    }
}

/// A parsed address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Namespace.
    #[serde(rename = "type")]
    pub kind: AddressKind,
    /// Entity name (element/template/layer name, data field or source,
    /// state key).
    pub name: String,
    /// Property path below the entity.
    pub path: Vec<String>,
}

impl Address {
    /// The property path joined with dots.
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }

    /// Name and path joined with dots.
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.path_string())
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SIGIL)?;
        if let Some(keyword) = self.kind.keyword() {
            write!(f, "{}.", keyword)?;
        }
        write!(f, "{}", self.full_path())
    }
}

/// Whether a string looks like an address.
pub fn is_address(s: &str) -> bool {
    s.trim_start().starts_with(SIGIL)
}

/// Parse an address. Returns `None` without the sigil or without a name.
pub fn parse_address(s: &str) -> Option<Address> {
    let body = s.trim().strip_prefix(SIGIL)?;
    let segments: Vec<&str> = body
        .split('.')
        .map(str::trim)
        .filter(|seg| !seg.is_empty())
        .collect();

    let (first, rest) = segments.split_first()?;

    // A namespace keyword needs a name after it; alone it is an element name
    if let Some(kind) = AddressKind::from_keyword(first) {
        if let Some((name, path)) = rest.split_first() {
            return Some(Address {
                kind,
                name: name.to_string(),
                path: path.iter().map(|s| s.to_string()).collect(),
            });
        }
    }

    Some(Address {
        kind: AddressKind::Element,
        name: first.to_string(),
        path: rest.iter().map(|s| s.to_string()).collect(),
    })
}

/// Make a name safe for use in an address: whitespace becomes `_`, anything
/// that is not alphanumeric or `_` is dropped. Never returns an empty string.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_alphanumeric() || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

/// Lookup key for a name: sanitized, lower-cased, with runs of `_` collapsed.
pub fn normalize_name(name: &str) -> String {
    let lowered = sanitize_name(name).to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Whether two names refer to the same entity.
pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

fn sanitize_path(path: &str) -> String {
    path.split('.')
        .filter(|seg| !seg.trim().is_empty())
        .map(|seg| {
            // Keep bracket indices intact
            match seg.find('[') {
                Some(idx) => format!("{}{}", sanitize_name(&seg[..idx]), &seg[idx..]),
                None => sanitize_name(seg),
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn build(keyword: Option<&str>, name: &str, path: Option<&str>) -> String {
    let mut address = String::from(SIGIL);
    if let Some(keyword) = keyword {
        address.push_str(keyword);
        address.push('.');
    }
    address.push_str(&sanitize_name(name));
    if let Some(path) = path {
        let path = sanitize_path(path);
        if !path.is_empty() {
            address.push('.');
            address.push_str(&path);
        }
    }
    address
}

/// `@Name[.path]`
pub fn build_element_address(name: &str, path: Option<&str>) -> String {
    build(None, name, path)
}

/// `@template.Name[.path]`
pub fn build_template_address(name: &str, path: Option<&str>) -> String {
    build(Some("template"), name, path)
}

/// `@layer.Name[.path]`
pub fn build_layer_address(name: &str, path: Option<&str>) -> String {
    build(Some("layer"), name, path)
}

/// `@data.field` for the active payload, `@data.Source.field` for a
/// cached source.
pub fn build_data_address(field: &str, source: Option<&str>) -> String {
    match source {
        Some(source) => build(Some("data"), source, Some(field)),
        None => {
            let field = sanitize_path(field);
            let field = if field.is_empty() { "_".to_string() } else { field };
            format!("{}data.{}", SIGIL, field)
        }
    }
}

/// `@state.key`
pub fn build_state_address(key: &str) -> String {
    build(Some("state"), key, None)
}

/// `@template.Name.phase`
pub fn build_animation_address(template: &str, phase: Phase) -> String {
    build(Some("template"), template, Some(phase.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_element_address() {
        let address = parse_address("@Logo.content.text").unwrap();
        assert_eq!(address.kind, AddressKind::Element);
        assert_eq!(address.name, "Logo");
        assert_eq!(address.path, vec!["content", "text"]);
        assert_eq!(address.to_string(), "@Logo.content.text");
    }

    #[test]
    fn parse_namespaces() {
        let t = parse_address("@template.Lower_Third.record.name").unwrap();
        assert_eq!(t.kind, AddressKind::Template);
        assert_eq!(t.name, "Lower_Third");
        assert_eq!(t.path, vec!["record", "name"]);

        assert_eq!(parse_address("@layer.Main").unwrap().kind, AddressKind::Layer);
        assert_eq!(parse_address("@data.score").unwrap().kind, AddressKind::Data);
        let s = parse_address("@state.count").unwrap();
        assert_eq!((s.kind, s.name.as_str()), (AddressKind::State, "count"));
    }

    #[test]
    fn parse_rejects_missing_sigil_or_name() {
        assert_eq!(parse_address("Logo.opacity"), None);
        assert_eq!(parse_address("@"), None);
        assert_eq!(parse_address("@..."), None);
    }

    #[test]
    fn lone_keyword_is_an_element() {
        let address = parse_address("@state").unwrap();
        assert_eq!(address.kind, AddressKind::Element);
        assert_eq!(address.name, "state");
    }

    #[test]
    fn sanitize_and_normalize() {
        assert_eq!(sanitize_name("Lower Third (v2)"), "Lower_Third_v2");
        assert_eq!(sanitize_name("!!!"), "_");
        assert_eq!(normalize_name("Lower  Third"), "lower_third");
        assert!(names_match("lower_third", "Lower Third"));
        assert!(!names_match("Lower Third", "LowerThird"));
    }

    #[test]
    fn build_then_parse_is_identity_on_sanitized_names() {
        let names = [
            "Logo",
            "Lower Third",
            "score-board #1",
            "  padded  ",
            "data",
            "template",
            "Ünïcode Näme",
            "",
            "a.b.c",
        ];
        for name in names {
            let parsed = parse_address(&build_element_address(name, None)).unwrap();
            assert_eq!(parsed.kind, AddressKind::Element, "name {:?}", name);
            assert_eq!(parsed.name, sanitize_name(name), "name {:?}", name);
            assert!(parsed.path.is_empty());
        }
    }

    #[test]
    fn builders_per_namespace() {
        assert_eq!(
            build_element_address("Score Box", Some("content.text")),
            "@Score_Box.content.text"
        );
        assert_eq!(
            build_template_address("Lower Third", None),
            "@template.Lower_Third"
        );
        assert_eq!(build_layer_address("Main", Some("id")), "@layer.Main.id");
        assert_eq!(build_data_address("first name", None), "@data.first_name");
        assert_eq!(
            build_data_address("score", Some("Team Stats")),
            "@data.Team_Stats.score"
        );
        assert_eq!(build_state_address("count"), "@state.count");
        assert_eq!(
            build_animation_address("Lower Third", Phase::Out),
            "@template.Lower_Third.out"
        );
        assert_eq!(
            build_element_address("List", Some("items[2].label")),
            "@List.items[2].label"
        );
    }
}
