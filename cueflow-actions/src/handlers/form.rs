//! `validateForm`, `submitForm`.

use super::{require_text, write};
use crate::action::FieldRule;
use cueflow_core::context::ExecutionContext;
use cueflow_core::error::{CueError, Result};
use cueflow_core::logging::LogCategory;
use cueflow_core::providers::FetchRequest;
use cueflow_core::value::{is_empty_value, to_display_string};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

fn check_field(field: &str, value: Option<&Value>, rule: &FieldRule) -> Option<String> {
    let fail = |default: String| Some(rule.message.clone().unwrap_or(default));

    if is_empty_value(value) {
        return if rule.required {
            fail(format!("{} is required", field))
        } else {
            None
        };
    }
    let text = value.map(to_display_string).unwrap_or_default();
    let len = text.chars().count();

    if let Some(min) = rule.min_length {
        if len < min {
            return fail(format!("{} must be at least {} characters", field, min));
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return fail(format!("{} must be at most {} characters", field, max));
        }
    }
    if let Some(ref pattern) = rule.pattern {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(&text) => {}
            Ok(_) => return fail(format!("{} has an invalid format", field)),
            Err(e) => return fail(format!("{} has an unusable pattern: {}", field, e)),
        }
    }
    None
}

/// Check a form against `rules`, store the errors and return the validity.
pub fn validate_form(form: &str, rules: &BTreeMap<String, FieldRule>, ctx: &ExecutionContext) -> bool {
    let values = ctx.store().form_values(form);
    let errors: BTreeMap<String, String> = rules
        .iter()
        .filter_map(|(field, rule)| {
            check_field(field, values.get(field), rule).map(|message| (field.clone(), message))
        })
        .collect();

    let valid = errors.is_empty();
    if !valid {
        ctx.debug(
            LogCategory::Action,
            format!("Form '{}' has {} invalid field(s)", form, errors.len()),
        );
    }
    ctx.store().set_form_errors(form, errors);
    valid
}

/// `validateForm`: the validity flag optionally lands in `target`.
pub fn validate_form_action(
    form: &str,
    rules: &BTreeMap<String, FieldRule>,
    target: Option<&str>,
    ctx: &ExecutionContext,
) -> Result<bool> {
    let valid = validate_form(form, rules, ctx);
    if let Some(target) = target {
        write("validateForm", target, Value::Bool(valid), ctx)?;
    }
    Ok(valid)
}

/// `submitForm`: validate, mark submitted, then POST the values when a URL
/// is given. An invalid form is a failure and nothing is sent.
pub async fn submit_form(
    form: &str,
    rules: &BTreeMap<String, FieldRule>,
    url: Option<&Value>,
    target: Option<&str>,
    ctx: &ExecutionContext,
) -> Result<()> {
    if !rules.is_empty() && !validate_form(form, rules, ctx) {
        return Err(CueError::ActionFailed {
            action: "submitForm".to_string(),
            cause: format!(
                "form '{}' has {} error(s)",
                form,
                ctx.store().form_errors(form).len()
            ),
        });
    }

    let values = Value::Object(ctx.store().form_values(form));
    ctx.store().mark_submitted(form);

    let result = match url {
        Some(url) => {
            let request = FetchRequest {
                url: require_text("submitForm", url, ctx)?,
                method: "POST".to_string(),
                headers: HashMap::from([(
                    "Content-Type".to_string(),
                    "application/json".to_string(),
                )]),
                body: Some(values),
            };
            ctx.fetcher().fetch(request).await?
        }
        None => values,
    };

    if let Some(target) = target {
        write("submitForm", target, result, ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueflow_core::testing::TestHarness;
    use serde_json::json;

    fn rules() -> BTreeMap<String, FieldRule> {
        BTreeMap::from([
            (
                "name".to_string(),
                FieldRule {
                    required: true,
                    min_length: Some(2),
                    ..FieldRule::default()
                },
            ),
            (
                "email".to_string(),
                FieldRule {
                    pattern: Some("^[^@]+@[^@]+$".into()),
                    message: Some("Bad email".into()),
                    ..FieldRule::default()
                },
            ),
        ])
    }

    #[test]
    fn validation_stores_errors() {
        let h = TestHarness::empty();
        h.ctx.store().set_form_value("signup", "name", json!("A"));
        h.ctx.store().set_form_value("signup", "email", json!("nope"));

        assert!(!validate_form("signup", &rules(), &h.ctx));
        let errors = h.ctx.store().form_errors("signup");
        assert_eq!(errors["email"], "Bad email");
        assert!(errors["name"].contains("at least 2"));

        h.ctx.store().set_form_value("signup", "name", json!("Ada"));
        h.ctx.store().set_form_value("signup", "email", json!("ada@example.com"));
        assert!(validate_form("signup", &rules(), &h.ctx));
        assert!(h.ctx.store().form_errors("signup").is_empty());
    }

    #[tokio::test]
    async fn submit_copies_values_without_url() {
        let h = TestHarness::empty();
        h.ctx.store().set_form_value("vote", "choice", json!("red"));
        submit_form("vote", &BTreeMap::new(), None, Some("lastVote"), &h.ctx)
            .await
            .unwrap();
        assert!(h.ctx.store().is_submitted("vote"));
        assert_eq!(h.state("lastVote"), Some(json!({"choice": "red"})));
    }

    #[tokio::test]
    async fn invalid_submit_sends_nothing() {
        let h = TestHarness::empty();
        let err = submit_form("signup", &rules(), Some(&json!("https://x.test")), None, &h.ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E302");
        assert!(h.fetcher.requests().is_empty());
        assert!(!h.ctx.store().is_submitted("signup"));
    }
}
