//! `filterData`, `sortData`, `aggregateData`, `transformData`, `fetchData`.

use super::{require, require_text, write};
use crate::action::{Aggregation, ItemFilter};
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::providers::FetchRequest;
use cueflow_core::value::{as_f64, get_nested_value, is_truthy, number};
use cueflow_script::helpers::compare_values;
use cueflow_script::{Condition, evaluate_condition, evaluate_expression, resolve_value};
use serde_json::{Value, json};
use std::collections::HashMap;

fn items(action: &str, source: &Value, ctx: &ExecutionContext) -> Result<Vec<Value>> {
    match require(action, source, ctx)? {
        Value::Array(items) => Ok(items),
        other => Err(CueError::invalid_action(
            action,
            format!("source is not a list: {}", other),
        )),
    }
}

fn item_scope(item: &Value, index: usize, ctx: &ExecutionContext) -> ExecutionContext {
    ctx.with_local("item", item.clone())
        .with_local("index", json!(index))
}

fn field_of<'a>(item: &'a Value, field: Option<&str>) -> Option<&'a Value> {
    match field {
        Some(field) => get_nested_value(item, field),
        None => Some(item),
    }
}

/// Keep the items that pass `filter`.
pub fn filter_items(items: Vec<Value>, filter: &ItemFilter, ctx: &ExecutionContext) -> Result<Vec<Value>> {
    let mut kept = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let scope = item_scope(&item, index, ctx);
        let pass = match filter {
            ItemFilter::Expression { expression } => {
                is_truthy(&evaluate_expression(expression, &scope)?)
            }
            ItemFilter::Match {
                field,
                operator,
                value,
            } => {
                let operand = match field {
                    Some(field) => format!("item.{}", field),
                    None => "item".to_string(),
                };
                let condition = Condition::new(operand, *operator, value.clone());
                evaluate_condition(&condition, &scope)
            }
        };
        if pass {
            kept.push(item);
        }
    }
    Ok(kept)
}

/// Sort items by a field (or by value), nulls last.
pub fn sort_items(mut items: Vec<Value>, field: Option<&str>, descending: bool) -> Vec<Value> {
    items.sort_by(|a, b| {
        let a = field_of(a, field).unwrap_or(&Value::Null);
        let b = field_of(b, field).unwrap_or(&Value::Null);
        let ordering = compare_values(a, b);
        if descending && !a.is_null() && !b.is_null() {
            ordering.reverse()
        } else {
            ordering
        }
    });
    items
}

/// Reduce items to one value.
pub fn aggregate(items: &[Value], operation: Aggregation, field: Option<&str>) -> Value {
    if operation == Aggregation::Count {
        return json!(items.len());
    }
    let values: Vec<f64> = items
        .iter()
        .filter_map(|item| field_of(item, field).and_then(as_f64))
        .collect();
    match operation {
        Aggregation::Sum => number(values.iter().sum()),
        Aggregation::Avg if values.is_empty() => json!(0),
        Aggregation::Avg => number(values.iter().sum::<f64>() / values.len() as f64),
        Aggregation::Min => values.into_iter().reduce(f64::min).map_or(Value::Null, number),
        Aggregation::Max => values.into_iter().reduce(f64::max).map_or(Value::Null, number),
        Aggregation::Count => json!(items.len()),
    }
}

/// `filterData`.
pub fn filter_data(source: &Value, filter: &ItemFilter, target: &str, ctx: &ExecutionContext) -> Result<()> {
    let items = items("filterData", source, ctx)?;
    let kept = filter_items(items, filter, ctx)?;
    write("filterData", target, Value::Array(kept), ctx)
}

/// `sortData`.
pub fn sort_data(
    source: &Value,
    field: Option<&str>,
    descending: bool,
    target: &str,
    ctx: &ExecutionContext,
) -> Result<()> {
    let items = items("sortData", source, ctx)?;
    write("sortData", target, Value::Array(sort_items(items, field, descending)), ctx)
}

/// `aggregateData`.
pub fn aggregate_data(
    source: &Value,
    operation: Aggregation,
    field: Option<&str>,
    target: &str,
    ctx: &ExecutionContext,
) -> Result<()> {
    let items = items("aggregateData", source, ctx)?;
    write("aggregateData", target, aggregate(&items, operation, field), ctx)
}

/// `transformData`.
pub fn transform_data(source: &Value, expression: &str, target: &str, ctx: &ExecutionContext) -> Result<()> {
    let result = match require("transformData", source, ctx)? {
        Value::Array(items) => {
            let mut mapped = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                mapped.push(evaluate_expression(expression, &item_scope(item, index, ctx))?);
            }
            Value::Array(mapped)
        }
        single => evaluate_expression(expression, &item_scope(&single, 0, ctx))?,
    };
    write("transformData", target, result, ctx)
}

/// Everything `fetchData` needs, borrowed from the action.
#[derive(Debug)]
pub struct FetchSpec<'a> {
    /// URL operand.
    pub url: &'a Value,
    /// HTTP method.
    pub method: &'a str,
    /// Headers.
    pub headers: &'a HashMap<String, String>,
    /// Body operand.
    pub body: Option<&'a Value>,
    /// Response path to keep.
    pub path: Option<&'a str>,
    /// Where to write the result.
    pub target: &'a str,
}

/// `fetchData`: the only network access, and only through the host fetcher.
pub async fn fetch_data(spec: FetchSpec<'_>, ctx: &ExecutionContext) -> Result<()> {
    let url = require_text("fetchData", spec.url, ctx)?;
    let request = FetchRequest {
        url,
        method: spec.method.to_uppercase(),
        headers: spec.headers.clone(),
        body: spec.body.and_then(|body| resolve_value(body, ctx)),
    };
    tracing::debug!(method = %request.method, url = %request.url, "Fetching data");

    let response = ctx.fetcher().fetch(request).await?;
    let value = match spec.path {
        Some(path) => get_nested_value(&response, path).cloned().ok_or_else(|| {
            CueError::ActionFailed {
                action: "fetchData".to_string(),
                cause: format!("response has no '{}'", path),
            }
        })?,
        None => response,
    };
    write("fetchData", spec.target, value, ctx)
}
