//! Curated helper library: the only functions evaluated code can call
//! besides its own arrows and registered host functions.

use crate::interpreter::{Interpreter, Val, loose_equals, num};
use crate::resolve::resolve_value;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use cueflow_core::address::{set_address_value, write_target};
use cueflow_core::error::{CueError, Result};
use cueflow_core::value::{as_f64, get_nested_value, to_display_string};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt::Write;

/// Free functions available to every expression and script.
pub const FUNCTIONS: &[&str] = &[
    "sum", "avg", "min", "max", "count", "filter", "map", "find", "sort", "groupBy", "format",
    "round", "abs", "floor", "ceil", "len", "upper", "lower", "trim", "concat", "includes", "keys",
    "values", "number", "string", "now", "formatDate", "Number", "String", "Boolean", "parseInt",
    "parseFloat", "isNaN", "getState", "setState", "navigate", "log", "resolve", "setValue",
];

/// Namespaces whose members are callable (`Math.max(...)`).
pub const NAMESPACES: &[&str] = &["Math", "JSON", "Object", "Array"];

/// Whether `name` is a helper namespace.
pub fn is_namespace(name: &str) -> bool {
    NAMESPACES.contains(&name)
}

/// Whether `name` is a helper function.
pub fn is_known_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

/// Constant members of a namespace.
pub fn namespace_constant(namespace: &str, name: &str) -> Option<Value> {
    match (namespace, name) {
        ("Math", "PI") => Some(cueflow_core::value::number(std::f64::consts::PI)),
        ("Math", "E") => Some(cueflow_core::value::number(std::f64::consts::E)),
        _ => None,
    }
}

fn arg(args: &[Val], index: usize) -> Val {
    args.get(index).cloned().unwrap_or(Val::Undefined)
}

fn items_arg(args: &[Val], index: usize, function: &str) -> Result<Vec<Value>> {
    match arg(args, index) {
        Val::Json(Value::Array(items)) => Ok(items),
        v if v.is_nullish() => Ok(Vec::new()),
        other => Err(CueError::script(format!(
            "{}() expects an array, got {}",
            function,
            other.type_name()
        ))),
    }
}

fn text_arg(args: &[Val], index: usize) -> String {
    match arg(args, index) {
        Val::Undefined => String::new(),
        other => other.display(),
    }
}

/// How a helper picks a value out of each item.
enum Selector {
    Identity,
    Field(String),
    Func(Val),
}

impl Selector {
    fn from_arg(value: Val) -> Result<Self> {
        match value {
            Val::Undefined | Val::Json(Value::Null) => Ok(Selector::Identity),
            Val::Json(Value::String(field)) => Ok(Selector::Field(field)),
            f @ Val::Func(_) => Ok(Selector::Func(f)),
            other => Err(CueError::script(format!(
                "expected a field name or function, got {}",
                other.type_name()
            ))),
        }
    }

    fn select(&self, interp: &mut Interpreter<'_>, item: &Value, index: usize) -> Result<Val> {
        match self {
            Selector::Identity => Ok(Val::Json(item.clone())),
            Selector::Field(field) => Ok(get_nested_value(item, field)
                .cloned()
                .map(Val::Json)
                .unwrap_or(Val::Undefined)),
            Selector::Func(f) => {
                interp.iterate()?;
                interp.call_value(f, vec![Val::Json(item.clone()), num(index as f64)])
            }
        }
    }
}

/// Item filter built from `(selector[, expected])`.
struct Predicate {
    selector: Selector,
    expected: Option<Val>,
}

impl Predicate {
    fn from_args(args: &[Val], index: usize) -> Result<Self> {
        Ok(Self {
            selector: Selector::from_arg(arg(args, index))?,
            expected: args.get(index + 1).cloned(),
        })
    }

    fn test(&self, interp: &mut Interpreter<'_>, item: &Value, index: usize) -> Result<bool> {
        let selected = self.selector.select(interp, item, index)?;
        Ok(match &self.expected {
            Some(expected) => loose_equals(&selected, expected),
            None => selected.truthy(),
        })
    }
}

fn numbers(interp: &mut Interpreter<'_>, args: &[Val], function: &str) -> Result<Vec<f64>> {
    if let Val::Json(Value::Array(_)) = arg(args, 0) {
        let items = items_arg(args, 0, function)?;
        let selector = Selector::from_arg(arg(args, 1))?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if let Val::Json(v) = selector.select(interp, item, i)? {
                if let Some(n) = as_f64(&v) {
                    out.push(n);
                }
            }
        }
        return Ok(out);
    }
    Ok(args
        .iter()
        .filter_map(|v| v.as_json().and_then(as_f64))
        .collect())
}

/// Ordering for sort: numbers, then strings, then everything else; null last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Bool(_) => 2,
            Value::Array(_) | Value::Object(_) => 3,
            Value::Null => 4,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_items(
    interp: &mut Interpreter<'_>,
    mut items: Vec<Value>,
    by: Val,
    descending: bool,
) -> Result<Vec<Value>> {
    match by {
        Val::Func(ref closure) if closure.arity() >= 2 => {
            let mut failure = None;
            items.sort_by(|a, b| {
                if failure.is_some() {
                    return Ordering::Equal;
                }
                let result = interp
                    .iterate()
                    .and_then(|_| interp.call_value(&by, vec![Val::Json(a.clone()), Val::Json(b.clone())]));
                match result {
                    Ok(v) => v.to_number().partial_cmp(&0.0).unwrap_or(Ordering::Equal),
                    Err(e) => {
                        failure = Some(e);
                        Ordering::Equal
                    }
                }
            });
            if let Some(e) = failure {
                return Err(e);
            }
        }
        by => {
            let selector = Selector::from_arg(by)?;
            let mut keyed = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let key = selector.select(interp, &item, i)?.into_json();
                keyed.push((key, item));
            }
            keyed.sort_by(|(a, _), (b, _)| compare_values(a, b));
            items = keyed.into_iter().map(|(_, item)| item).collect();
        }
    }
    if descending {
        items.reverse();
    }
    Ok(items)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a number with a pattern such as `"0.00"`, `"#,##0"` or `"$#,##0.00"`.
fn format_number(n: f64, pattern: &str) -> String {
    let is_pattern_char = |c: char| matches!(c, '#' | '0' | ',' | '.');
    let (Some(start), Some(end)) = (
        pattern.find(is_pattern_char),
        pattern.rfind(is_pattern_char),
    ) else {
        return format!("{}{}", pattern, to_display_string(&cueflow_core::value::number(n)));
    };
    let (prefix, body, suffix) = (&pattern[..start], &pattern[start..=end], &pattern[end + 1..]);
    let decimals = body
        .split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| matches!(c, '0' | '#')).count())
        .unwrap_or(0);
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };
    let int_part = if body.contains(',') {
        group_thousands(&int_part)
    } else {
        int_part
    };
    let sign = if n < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}{}.{}{}", sign, prefix, int_part, frac, suffix),
        None => format!("{}{}{}{}", sign, prefix, int_part, suffix),
    }
}

/// `{0}` / `{name}` substitution from the remaining arguments.
fn format_template(template: &str, args: &[Val]) -> String {
    let named = match args.first() {
        Some(Val::Json(Value::Object(map))) => Some(map),
        _ => None,
    };
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = after[..close].trim();
        let replacement = match key.parse::<usize>() {
            Ok(i) => args.get(i).map(Val::display),
            Err(_) => named
                .and_then(|map| get_nested_value(&Value::Object(map.clone()), key).cloned())
                .map(|v| to_display_string(&v)),
        };
        match replacement {
            Some(text) => out.push_str(&text),
            None => {
                out.push('{');
                out.push_str(&after[..close]);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

fn format(args: &[Val]) -> Val {
    let text = match arg(args, 0) {
        Val::Json(Value::String(template)) if template.contains('{') => {
            format_template(&template, &args[1..])
        }
        Val::Undefined => String::new(),
        first => {
            let n = first.to_number();
            match (n.is_nan(), arg(args, 1)) {
                (true, _) => first.display(),
                (false, Val::Json(Value::Number(d))) => {
                    let decimals = d.as_u64().unwrap_or(0).min(20) as usize;
                    format!("{:.*}", decimals, n)
                }
                (false, Val::Json(Value::String(pattern))) => format_number(n, &pattern),
                (false, _) => first.display(),
            }
        }
    };
    Val::Json(Value::String(text))
}

fn format_date(args: &[Val]) -> Result<Val> {
    let moment: DateTime<Utc> = match arg(args, 0) {
        Val::Json(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CueError::script(format!("formatDate(): {}", e)))?,
        other => {
            let millis = other.to_number();
            if millis.is_nan() {
                return Err(CueError::script("formatDate() expects a timestamp"));
            }
            DateTime::from_timestamp_millis(millis as i64)
                .ok_or_else(|| CueError::script("formatDate(): timestamp out of range"))?
        }
    };
    let pattern = match arg(args, 1) {
        Val::Json(Value::String(p)) => p,
        _ => "%Y-%m-%d %H:%M:%S".to_string(),
    };
    if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
        return Err(CueError::script(format!(
            "formatDate(): invalid pattern '{}'",
            pattern
        )));
    }
    let mut out = String::new();
    write!(out, "{}", moment.format_with_items(StrftimeItems::new(&pattern)))
        .map_err(|_| CueError::script("formatDate(): formatting failed"))?;
    Ok(Val::Json(Value::String(out)))
}

fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor).round() / factor
}

fn bool_val(b: bool) -> Val {
    Val::Json(Value::Bool(b))
}

fn string_val(interp: &Interpreter<'_>, s: String) -> Result<Val> {
    interp.check_string_len(s.len())?;
    Ok(Val::Json(Value::String(s)))
}

/// Byte length of `parts` joined by `separator`, saturating on overflow.
fn joined_len<'a>(parts: impl ExactSizeIterator<Item = &'a str>, separator: &str) -> usize {
    let gaps = parts.len().saturating_sub(1);
    parts
        .map(str::len)
        .fold(separator.len().saturating_mul(gaps), usize::saturating_add)
}

/// Byte length of `s` with every `from` swapped for `to`.
fn replaced_len(s: &str, from: &str, to: &str, limit: Option<usize>) -> usize {
    let hits = match limit {
        Some(n) => s.matches(from).take(n).count(),
        None => s.matches(from).count(),
    };
    (s.len() - hits * from.len()).saturating_add(hits.saturating_mul(to.len()))
}

fn array_val(interp: &Interpreter<'_>, items: Vec<Value>) -> Result<Val> {
    interp.check_collection(items.len())?;
    Ok(Val::Json(Value::Array(items)))
}

fn contains(haystack: &Val, needle: &Val) -> bool {
    match haystack {
        Val::Json(Value::String(s)) => s.contains(&needle.display()),
        Val::Json(Value::Array(items)) => items
            .iter()
            .any(|item| loose_equals(&Val::Json(item.clone()), needle)),
        Val::Json(Value::Object(map)) => map.contains_key(&needle.display()),
        _ => false,
    }
}

/// Call a free helper. `Ok(None)` means no helper has that name.
pub fn call_function(interp: &mut Interpreter<'_>, name: &str, args: Vec<Val>) -> Result<Option<Val>> {
    let ctx = interp.ctx();
    let result = match name {
        "sum" => num(numbers(interp, &args, name)?.iter().sum()),
        "avg" => {
            let values = numbers(interp, &args, name)?;
            if values.is_empty() {
                num(0.0)
            } else {
                num(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        "min" => numbers(interp, &args, name)?
            .into_iter()
            .reduce(f64::min)
            .map(num)
            .unwrap_or(Val::Json(Value::Null)),
        "max" => numbers(interp, &args, name)?
            .into_iter()
            .reduce(f64::max)
            .map(num)
            .unwrap_or(Val::Json(Value::Null)),
        "count" => {
            let items = items_arg(&args, 0, name)?;
            if args.len() < 2 {
                num(items.len() as f64)
            } else {
                let predicate = Predicate::from_args(&args, 1)?;
                let mut n = 0usize;
                for (i, item) in items.iter().enumerate() {
                    if predicate.test(interp, item, i)? {
                        n += 1;
                    }
                }
                num(n as f64)
            }
        }
        "filter" => {
            let items = items_arg(&args, 0, name)?;
            let predicate = Predicate::from_args(&args, 1)?;
            let mut kept = Vec::new();
            for (i, item) in items.into_iter().enumerate() {
                if predicate.test(interp, &item, i)? {
                    kept.push(item);
                }
            }
            Val::Json(Value::Array(kept))
        }
        "map" => {
            let items = items_arg(&args, 0, name)?;
            let selector = Selector::from_arg(arg(&args, 1))?;
            let mut mapped = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                mapped.push(selector.select(interp, item, i)?.into_json());
            }
            Val::Json(Value::Array(mapped))
        }
        "find" => {
            let items = items_arg(&args, 0, name)?;
            let predicate = Predicate::from_args(&args, 1)?;
            let mut found = Val::Undefined;
            for (i, item) in items.into_iter().enumerate() {
                if predicate.test(interp, &item, i)? {
                    found = Val::Json(item);
                    break;
                }
            }
            found
        }
        "sort" => {
            let items = items_arg(&args, 0, name)?;
            let (by, direction) = match (arg(&args, 1), arg(&args, 2)) {
                (Val::Json(Value::String(d)), Val::Undefined)
                    if d.eq_ignore_ascii_case("asc") || d.eq_ignore_ascii_case("desc") =>
                {
                    (Val::Undefined, d)
                }
                (by, direction) => (by, direction.display()),
            };
            let sorted = sort_items(interp, items, by, direction.eq_ignore_ascii_case("desc"))?;
            Val::Json(Value::Array(sorted))
        }
        "groupBy" => {
            let items = items_arg(&args, 0, name)?;
            let selector = Selector::from_arg(arg(&args, 1))?;
            let mut groups: Map<String, Value> = Map::new();
            for (i, item) in items.into_iter().enumerate() {
                let key = selector.select(interp, &item, i)?.display();
                if let Value::Array(bucket) = groups
                    .entry(key)
                    .or_insert_with(|| Value::Array(Vec::new()))
                {
                    bucket.push(item);
                }
            }
            Val::Json(Value::Object(groups))
        }
        "format" => format(&args),
        "formatDate" => format_date(&args)?,
        "round" => {
            let decimals = match arg(&args, 1) {
                Val::Undefined => 0,
                d => d.to_number() as i32,
            };
            num(round_to(arg(&args, 0).to_number(), decimals.clamp(0, 15)))
        }
        "abs" => num(arg(&args, 0).to_number().abs()),
        "floor" => num(arg(&args, 0).to_number().floor()),
        "ceil" => num(arg(&args, 0).to_number().ceil()),
        "len" => num(match arg(&args, 0) {
            Val::Json(Value::String(s)) => s.chars().count(),
            Val::Json(Value::Array(items)) => items.len(),
            Val::Json(Value::Object(map)) => map.len(),
            _ => 0,
        } as f64),
        "upper" => Val::Json(Value::String(text_arg(&args, 0).to_uppercase())),
        "lower" => Val::Json(Value::String(text_arg(&args, 0).to_lowercase())),
        "trim" => Val::Json(Value::String(text_arg(&args, 0).trim().to_string())),
        "concat" => match arg(&args, 0) {
            Val::Json(Value::Array(_)) => {
                let mut joined = Vec::new();
                for value in args {
                    match value.into_json() {
                        Value::Array(items) => joined.extend(items),
                        other => joined.push(other),
                    }
                }
                array_val(interp, joined)?
            }
            _ => {
                let parts: Vec<String> = args.iter().map(Val::display).collect();
                interp.check_string_len(joined_len(parts.iter().map(String::as_str), ""))?;
                Val::Json(Value::String(parts.concat()))
            }
        },
        "includes" => bool_val(contains(&arg(&args, 0), &arg(&args, 1))),
        "keys" | "values" => object_parts(name, &arg(&args, 0)),
        "number" | "Number" => num(arg(&args, 0).to_number()),
        "string" | "String" => Val::Json(Value::String(text_arg(&args, 0))),
        "Boolean" => bool_val(arg(&args, 0).truthy()),
        "parseInt" => {
            let text = text_arg(&args, 0);
            let digits: String = text
                .trim()
                .chars()
                .enumerate()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
                .map(|(_, c)| c)
                .collect();
            num(digits.parse::<f64>().unwrap_or(f64::NAN))
        }
        "parseFloat" => num(arg(&args, 0).to_number()),
        "isNaN" => bool_val(arg(&args, 0).to_number().is_nan()),
        "now" => num(ctx.clock().system_time_millis() as f64),
        "getState" => {
            let key = text_arg(&args, 0);
            let key = key.strip_prefix("state.").unwrap_or(&key);
            ctx.store()
                .get_path(key)
                .map(Val::Json)
                .unwrap_or(Val::Undefined)
        }
        "setState" => {
            let key = text_arg(&args, 0);
            bool_val(write_target(&key, arg(&args, 1).into_json(), ctx))
        }
        "setValue" => {
            let address = text_arg(&args, 0);
            bool_val(set_address_value(&address, arg(&args, 1).into_json(), ctx))
        }
        "resolve" => resolve_value(&arg(&args, 0).into_json(), ctx)
            .map(Val::Json)
            .unwrap_or(Val::Undefined),
        "navigate" => {
            ctx.navigate(&text_arg(&args, 0))?;
            Val::Undefined
        }
        "log" => {
            let message: Vec<String> = args.iter().map(Val::display).collect();
            ctx.log(message.join(" "));
            Val::Undefined
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

fn object_parts(which: &str, target: &Val) -> Val {
    let Val::Json(Value::Object(map)) = target else {
        return Val::Json(Value::Array(Vec::new()));
    };
    let parts = match which {
        "keys" => map.keys().map(|k| Value::String(k.clone())).collect(),
        "entries" => map
            .iter()
            .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
            .collect(),
        _ => map.values().cloned().collect(),
    };
    Val::Json(Value::Array(parts))
}

/// Call `Namespace.name(...)`.
pub fn call_namespaced(
    interp: &mut Interpreter<'_>,
    namespace: &str,
    name: &str,
    args: Vec<Val>,
) -> Result<Val> {
    let n = |i: usize| arg(&args, i).to_number();
    Ok(match (namespace, name) {
        ("Math", "abs") => num(n(0).abs()),
        ("Math", "floor") => num(n(0).floor()),
        ("Math", "ceil") => num(n(0).ceil()),
        ("Math", "round") => num(n(0).round()),
        ("Math", "trunc") => num(n(0).trunc()),
        ("Math", "sign") => num(if n(0) == 0.0 { 0.0 } else { n(0).signum() }),
        ("Math", "sqrt") => num(n(0).sqrt()),
        ("Math", "pow") => num(n(0).powf(n(1))),
        ("Math", "min" | "max") => {
            return Ok(call_function(interp, name, args)?.unwrap_or(Val::Undefined));
        }
        ("JSON", "stringify") => {
            let value = arg(&args, 0).into_json();
            let text = if arg(&args, 2).is_nullish() {
                serde_json::to_string(&value)
            } else {
                serde_json::to_string_pretty(&value)
            }
            .map_err(|e| CueError::script(format!("JSON.stringify(): {}", e)))?;
            string_val(interp, text)?
        }
        ("JSON", "parse") => {
            let text = text_arg(&args, 0);
            let value: Value = serde_json::from_str(&text)
                .map_err(|e| CueError::script(format!("JSON.parse(): {}", e)))?;
            Val::Json(value)
        }
        ("Object", "keys" | "values" | "entries") => object_parts(name, &arg(&args, 0)),
        ("Array", "isArray") => bool_val(matches!(arg(&args, 0), Val::Json(Value::Array(_)))),
        _ => {
            return Err(CueError::FunctionNotFound {
                name: format!("{}.{}", namespace, name),
            });
        }
    })
}

fn slice_bounds(len: usize, start: &Val, end: &Val) -> (usize, usize) {
    let clamp = |v: &Val, default: usize| -> usize {
        if matches!(v, Val::Undefined) {
            return default;
        }
        let n = v.to_number();
        if n.is_nan() {
            return 0;
        }
        let n = n.trunc() as i64;
        if n < 0 {
            (len as i64 + n).max(0) as usize
        } else {
            (n as usize).min(len)
        }
    };
    let (s, e) = (clamp(start, 0), clamp(end, len));
    (s, e.max(s))
}

fn string_method(interp: &mut Interpreter<'_>, s: String, name: &str, args: &[Val]) -> Result<Val> {
    let needle = || text_arg(args, 0);
    Ok(match name {
        "includes" => bool_val(s.contains(&needle())),
        "startsWith" => bool_val(s.starts_with(&needle())),
        "endsWith" => bool_val(s.ends_with(&needle())),
        "indexOf" => num(match s.find(&needle()) {
            Some(byte) => s[..byte].chars().count() as f64,
            None => -1.0,
        }),
        "toUpperCase" => Val::Json(Value::String(s.to_uppercase())),
        "toLowerCase" => Val::Json(Value::String(s.to_lowercase())),
        "trim" => Val::Json(Value::String(s.trim().to_string())),
        "toString" => Val::Json(Value::String(s)),
        "charAt" => Val::Json(Value::String(
            s.chars()
                .nth(arg(args, 0).to_number().max(0.0) as usize)
                .map(String::from)
                .unwrap_or_default(),
        )),
        "slice" | "substring" => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), &arg(args, 0), &arg(args, 1));
            Val::Json(Value::String(chars[start..end].iter().collect()))
        }
        "split" => {
            let separator = needle();
            let parts: Vec<Value> = if separator.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(separator.as_str())
                    .map(|p| Value::String(p.to_string()))
                    .collect()
            };
            array_val(interp, parts)?
        }
        "replace" | "replaceAll" => {
            let (from, to) = (needle(), text_arg(args, 1));
            let limit = (name == "replace").then_some(1);
            if from.is_empty() {
                return Ok(Val::Json(Value::String(s)));
            }
            interp.check_string_len(replaced_len(&s, &from, &to, limit))?;
            Val::Json(Value::String(match limit {
                Some(n) => s.replacen(&from, &to, n),
                None => s.replace(&from, &to),
            }))
        }
        "repeat" => {
            let count = arg(args, 0).to_number();
            if !count.is_finite() || count < 0.0 {
                return Err(CueError::script(format!("repeat(): invalid count {}", count)));
            }
            let count = count as usize;
            interp.check_string_len(s.len().saturating_mul(count))?;
            Val::Json(Value::String(s.repeat(count)))
        }
        "padStart" | "padEnd" => {
            let width = arg(args, 0).to_number().max(0.0) as usize;
            let fill = match arg(args, 1) {
                Val::Undefined => " ".to_string(),
                v => v.display(),
            };
            let missing = width.saturating_sub(s.chars().count());
            if missing == 0 || fill.is_empty() {
                Val::Json(Value::String(s))
            } else {
                let fill_chars = fill.chars().count();
                let tail: usize = fill.chars().take(missing % fill_chars).map(char::len_utf8).sum();
                let pad_len = (missing / fill_chars)
                    .saturating_mul(fill.len())
                    .saturating_add(tail);
                interp.check_string_len(s.len().saturating_add(pad_len))?;
                let pad: String = fill.chars().cycle().take(missing).collect();
                let padded = if name == "padStart" {
                    format!("{}{}", pad, s)
                } else {
                    format!("{}{}", s, pad)
                };
                Val::Json(Value::String(padded))
            }
        }
        "concat" => {
            let mut joined = s;
            for value in args {
                let part = value.display();
                interp.check_string_len(joined.len().saturating_add(part.len()))?;
                joined.push_str(&part);
            }
            Val::Json(Value::String(joined))
        }
        _ => {
            return Err(CueError::script(format!(
                "'{}' is not a string method",
                name
            )));
        }
    })
}

fn array_method(
    interp: &mut Interpreter<'_>,
    items: Vec<Value>,
    name: &str,
    args: Vec<Val>,
) -> Result<Val> {
    let callback = || -> Result<Val> {
        match arg(&args, 0) {
            f @ Val::Func(_) => Ok(f),
            other => Err(CueError::script(format!(
                "{}() expects a function, got {}",
                name,
                other.type_name()
            ))),
        }
    };
    Ok(match name {
        "includes" => bool_val(contains(&Val::Json(Value::Array(items)), &arg(&args, 0))),
        "indexOf" => {
            let needle = arg(&args, 0);
            num(items
                .iter()
                .position(|item| loose_equals(&Val::Json(item.clone()), &needle))
                .map(|i| i as f64)
                .unwrap_or(-1.0))
        }
        "join" => {
            let separator = match arg(&args, 0) {
                Val::Undefined => ",".to_string(),
                v => v.display(),
            };
            let parts: Vec<String> = items.iter().map(to_display_string).collect();
            interp.check_string_len(joined_len(parts.iter().map(String::as_str), &separator))?;
            Val::Json(Value::String(parts.join(&separator)))
        }
        "slice" => {
            let (start, end) = slice_bounds(items.len(), &arg(&args, 0), &arg(&args, 1));
            Val::Json(Value::Array(items[start..end].to_vec()))
        }
        "concat" => {
            let mut joined = items;
            for value in args {
                match value.into_json() {
                    Value::Array(more) => joined.extend(more),
                    other => joined.push(other),
                }
            }
            array_val(interp, joined)?
        }
        "reverse" => {
            let mut reversed = items;
            reversed.reverse();
            Val::Json(Value::Array(reversed))
        }
        "sort" => {
            let sorted = sort_items(interp, items, arg(&args, 0), false)?;
            Val::Json(Value::Array(sorted))
        }
        "map" => {
            let f = Selector::Func(callback()?);
            let mut mapped = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                mapped.push(f.select(interp, item, i)?.into_json());
            }
            Val::Json(Value::Array(mapped))
        }
        "forEach" => {
            let f = Selector::Func(callback()?);
            for (i, item) in items.iter().enumerate() {
                f.select(interp, item, i)?;
            }
            Val::Undefined
        }
        "filter" | "find" | "findIndex" | "some" | "every" => {
            let f = Selector::Func(callback()?);
            let mut kept = Vec::new();
            for (i, item) in items.into_iter().enumerate() {
                let hit = f.select(interp, &item, i)?.truthy();
                match (name, hit) {
                    ("find", true) => return Ok(Val::Json(item)),
                    ("findIndex", true) => return Ok(num(i as f64)),
                    ("some", true) => return Ok(bool_val(true)),
                    ("every", false) => return Ok(bool_val(false)),
                    ("filter", true) => kept.push(item),
                    _ => {}
                }
            }
            match name {
                "find" => Val::Undefined,
                "findIndex" => num(-1.0),
                "some" => bool_val(false),
                "every" => bool_val(true),
                _ => Val::Json(Value::Array(kept)),
            }
        }
        "reduce" => {
            let f = callback()?;
            let mut iter = items.into_iter().enumerate();
            let mut acc = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match iter.next() {
                    Some((_, first)) => Val::Json(first),
                    None => {
                        return Err(CueError::script("reduce() of empty array with no initial value"));
                    }
                },
            };
            for (i, item) in iter {
                interp.iterate()?;
                acc = interp.call_value(&f, vec![acc, Val::Json(item), num(i as f64)])?;
            }
            acc
        }
        _ => {
            return Err(CueError::script(format!(
                "'{}' is not an array method",
                name
            )));
        }
    })
}

/// Call `receiver.name(...)`.
pub fn call_method(
    interp: &mut Interpreter<'_>,
    receiver: Val,
    name: &str,
    args: Vec<Val>,
) -> Result<Val> {
    match receiver {
        Val::Json(Value::String(s)) => string_method(interp, s, name, &args),
        Val::Json(Value::Array(items)) => array_method(interp, items, name, args),
        Val::Json(Value::Number(ref n)) => match name {
            "toFixed" => {
                let decimals = arg(&args, 0).to_number();
                let decimals = if decimals.is_nan() { 0 } else { decimals.clamp(0.0, 20.0) as usize };
                Ok(Val::Json(Value::String(format!(
                    "{:.*}",
                    decimals,
                    n.as_f64().unwrap_or(0.0)
                ))))
            }
            "toString" => Ok(Val::Json(Value::String(receiver.display()))),
            _ => Err(CueError::script(format!("'{}' is not a number method", name))),
        },
        Val::Json(Value::Object(ref map)) => match map.get(name) {
            Some(_) => Err(CueError::script(format!("'{}' is not a function", name))),
            None => Err(CueError::script(format!("'{}' is not a method of object", name))),
        },
        Val::Func(_) if name == "call" => {
            let rest = args.into_iter().skip(1).collect();
            interp.call_value(&receiver, rest)
        }
        other => Err(CueError::script(format!(
            "cannot call '{}' on {}",
            name,
            other.type_name()
        ))),
    }
}
