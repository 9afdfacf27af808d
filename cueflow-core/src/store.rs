//! Interactive runtime store.
//!
//! Holds the session's state variables, navigation position and form data.
//! Every mutation funnels through one private setter that releases the lock
//! before notifying subscribers, so a subscriber may write the store again
//! (a handler synchronously triggering another event) without deadlocking.

use crate::error::{CueError, Result};
use crate::value::{self, PathSegment, get_by_segments, parse_path, set_in_place};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// A state variable was set (`Some`) or removed (`None`).
    State {
        /// Top-level key.
        key: String,
        /// New value.
        value: Option<Value>,
    },
    /// The current screen changed.
    Navigated {
        /// Previous screen.
        from: Option<String>,
        /// New screen.
        to: String,
    },
    /// A form's values, errors or submission flag changed.
    Form {
        /// Form id.
        form: String,
    },
    /// State was cleared.
    Reset,
}

/// Values, errors and submission flag of one form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    /// Field values.
    pub values: Map<String, Value>,
    /// Field errors keyed by field name.
    pub errors: BTreeMap<String, String>,
    /// Whether the form has been submitted.
    pub submitted: bool,
}

#[derive(Debug, Default)]
struct StoreInner {
    state: Map<String, Value>,
    screen: Option<String>,
    history: Vec<String>,
    forms: HashMap<String, FormState>,
}

/// Identifies a subscription for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&StoreChange) + Send + Sync>;

/// Process-wide state container shared by every execution context.
pub struct RuntimeStore {
    inner: RwLock<StoreInner>,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl Default for RuntimeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuntimeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeStore")
            .field("inner", &*self.inner.read())
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

impl RuntimeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Create a store seeded with state variables.
    pub fn with_state(initial: Map<String, Value>) -> Self {
        let store = Self::new();
        store.inner.write().state = initial;
        store
    }

    /// Register a change callback.
    pub fn subscribe(&self, callback: impl Fn(&StoreChange) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Remove a change callback.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.write().retain(|(sid, _)| *sid != id);
    }

    /// The single mutation path.
    fn apply<T>(&self, mutate: impl FnOnce(&mut StoreInner) -> (T, Vec<StoreChange>)) -> T {
        let (result, changes) = {
            let mut inner = self.inner.write();
            mutate(&mut inner)
        };

        if !changes.is_empty() {
            let subscribers: Vec<Subscriber> =
                self.subscribers.read().iter().map(|(_, s)| s.clone()).collect();
            for change in &changes {
                tracing::trace!(?change, "Store changed");
                for subscriber in &subscribers {
                    subscriber(change);
                }
            }
        }
        result
    }

    // ---------------------------------------------------------------------
    // State
    // ---------------------------------------------------------------------

    /// Read a top-level state variable.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().state.get(key).cloned()
    }

    /// Read a nested state path (`score.home`).
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let segments = parse_path(path);
        let (first, rest) = segments.split_first()?;
        let PathSegment::Key(key) = first else {
            return None;
        };
        let inner = self.inner.read();
        let root = inner.state.get(key)?;
        get_by_segments(root, rest).cloned()
    }

    /// Whether a state variable exists.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().state.contains_key(key)
    }

    /// Set a top-level state variable.
    pub fn set(&self, key: &str, value: Value) {
        let key = key.to_string();
        self.apply(|inner| {
            inner.state.insert(key.clone(), value.clone());
            ((), vec![StoreChange::State { key, value: Some(value) }])
        })
    }

    /// Set a nested state path, creating containers as needed.
    pub fn set_path(&self, path: &str, value: Value) -> Result<()> {
        let segments = parse_path(path);
        let Some((PathSegment::Key(key), rest)) = segments.split_first() else {
            return Err(CueError::PropertyNotFound {
                target: "state".to_string(),
                path: path.to_string(),
            });
        };
        let key = key.clone();
        let rest = rest.to_vec();

        self.apply(|inner| {
            let slot = inner.state.entry(key.clone()).or_insert(Value::Null);
            set_in_place(slot, &rest, value);
            let current = slot.clone();
            (
                Ok(()),
                vec![StoreChange::State {
                    key,
                    value: Some(current),
                }],
            )
        })
    }

    /// Flip a boolean state variable; a missing or non-boolean value
    /// is treated by truthiness. Returns the new value.
    pub fn toggle(&self, key: &str) -> bool {
        let key = key.to_string();
        self.apply(|inner| {
            let current = inner.state.get(&key).map(value::is_truthy).unwrap_or(false);
            let next = !current;
            inner.state.insert(key.clone(), Value::Bool(next));
            (
                next,
                vec![StoreChange::State {
                    key,
                    value: Some(Value::Bool(next)),
                }],
            )
        })
    }

    /// Add `by` to a numeric state variable (missing counts as zero).
    ///
    /// Strings are not coerced; incrementing a non-number fails.
    pub fn increment(&self, key: &str, by: f64) -> Result<f64> {
        let key = key.to_string();
        self.apply(|inner| {
            let current = match inner.state.get(&key) {
                None | Some(Value::Null) => 0.0,
                Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                Some(other) => {
                    let err = CueError::script(format!(
                        "cannot increment '{}': value {} is not a number",
                        key, other
                    ));
                    return (Err(err), Vec::new());
                }
            };
            let next = current + by;
            let stored = value::number(next);
            inner.state.insert(key.clone(), stored.clone());
            (
                Ok(next),
                vec![StoreChange::State {
                    key,
                    value: Some(stored),
                }],
            )
        })
    }

    /// Remove a state variable.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let key = key.to_string();
        self.apply(|inner| match inner.state.remove(&key) {
            Some(old) => (Some(old), vec![StoreChange::State { key, value: None }]),
            None => (None, Vec::new()),
        })
    }

    /// All state variables as one object.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.inner.read().state.clone())
    }

    /// Clear every state variable.
    pub fn reset_state(&self) {
        self.apply(|inner| {
            inner.state.clear();
            ((), vec![StoreChange::Reset])
        })
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Record a move to `screen`, optionally clearing state.
    pub fn navigate(&self, screen: &str, reset_state: bool) {
        let to = screen.to_string();
        self.apply(|inner| {
            let from = inner.screen.replace(to.clone());
            if let Some(ref prev) = from {
                inner.history.push(prev.clone());
            }
            let mut changes = vec![StoreChange::Navigated {
                from,
                to,
            }];
            if reset_state {
                inner.state.clear();
                changes.push(StoreChange::Reset);
            }
            ((), changes)
        })
    }

    /// Return to the previous screen. Returns it, or `None` with no history.
    pub fn back(&self) -> Option<String> {
        self.apply(|inner| {
            let Some(previous) = inner.history.pop() else {
                return (None, Vec::new());
            };
            let from = inner.screen.replace(previous.clone());
            (
                Some(previous.clone()),
                vec![StoreChange::Navigated { from, to: previous }],
            )
        })
    }

    /// The current screen.
    pub fn current_screen(&self) -> Option<String> {
        self.inner.read().screen.clone()
    }

    /// Previously visited screens, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.inner.read().history.clone()
    }

    // ---------------------------------------------------------------------
    // Forms
    // ---------------------------------------------------------------------

    /// Set one form field.
    pub fn set_form_value(&self, form: &str, field: &str, value: Value) {
        let form = form.to_string();
        let field = field.to_string();
        self.apply(|inner| {
            inner
                .forms
                .entry(form.clone())
                .or_default()
                .values
                .insert(field, value);
            ((), vec![StoreChange::Form { form }])
        })
    }

    /// A form's field values.
    pub fn form_values(&self, form: &str) -> Map<String, Value> {
        self.inner
            .read()
            .forms
            .get(form)
            .map(|f| f.values.clone())
            .unwrap_or_default()
    }

    /// Replace a form's errors.
    pub fn set_form_errors(&self, form: &str, errors: BTreeMap<String, String>) {
        let form = form.to_string();
        self.apply(|inner| {
            inner.forms.entry(form.clone()).or_default().errors = errors;
            ((), vec![StoreChange::Form { form }])
        })
    }

    /// A form's errors.
    pub fn form_errors(&self, form: &str) -> BTreeMap<String, String> {
        self.inner
            .read()
            .forms
            .get(form)
            .map(|f| f.errors.clone())
            .unwrap_or_default()
    }

    /// Flag a form as submitted.
    pub fn mark_submitted(&self, form: &str) {
        let form = form.to_string();
        self.apply(|inner| {
            inner.forms.entry(form.clone()).or_default().submitted = true;
            ((), vec![StoreChange::Form { form }])
        })
    }

    /// Whether a form has been submitted.
    pub fn is_submitted(&self, form: &str) -> bool {
        self.inner
            .read()
            .forms
            .get(form)
            .is_some_and(|f| f.submitted)
    }

    /// Clear a form's values, errors and submission flag.
    pub fn reset_form(&self, form: &str) {
        let form = form.to_string();
        self.apply(|inner| {
            inner.forms.remove(&form);
            ((), vec![StoreChange::Form { form }])
        })
    }

    /// All forms as one object for scripts and field paths.
    pub fn forms_snapshot(&self) -> Value {
        let inner = self.inner.read();
        let forms: Map<String, Value> = inner
            .forms
            .iter()
            .map(|(id, form)| {
                (
                    id.clone(),
                    serde_json::to_value(form).unwrap_or(Value::Null),
                )
            })
            .collect();
        Value::Object(forms)
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Clear state, navigation and forms.
    pub fn reset_session(&self) {
        self.apply(|inner| {
            *inner = StoreInner::default();
            ((), vec![StoreChange::Reset])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn set_and_get_paths() {
        let store = RuntimeStore::new();
        store.set("score", json!({"home": 1}));
        store.set_path("score.away", json!(3)).unwrap();

        assert_eq!(store.get_path("score.home"), Some(json!(1)));
        assert_eq!(store.get("score"), Some(json!({"home": 1, "away": 3})));
        assert_eq!(store.get_path("score.missing"), None);
    }

    #[test]
    fn toggle_and_increment() {
        let store = RuntimeStore::new();
        assert!(store.toggle("open"));
        assert!(!store.toggle("open"));

        assert_eq!(store.increment("count", 1.0).unwrap(), 1.0);
        assert_eq!(store.increment("count", 2.5).unwrap(), 3.5);
        assert_eq!(store.get("count"), Some(json!(3.5)));
    }

    #[test]
    fn increment_does_not_coerce_strings() {
        let store = RuntimeStore::new();
        store.set("count", json!("5"));
        assert!(store.increment("count", 1.0).is_err());
        assert_eq!(store.get("count"), Some(json!("5")));
    }

    #[test]
    fn navigation_history_and_reset() {
        let store = RuntimeStore::new();
        store.set("x", json!(1));
        store.navigate("home", false);
        store.navigate("scores", true);

        assert_eq!(store.current_screen().as_deref(), Some("scores"));
        assert_eq!(store.history(), vec!["home".to_string()]);
        assert_eq!(store.get("x"), None);

        assert_eq!(store.back().as_deref(), Some("home"));
        assert_eq!(store.back(), None);
    }

    #[test]
    fn forms() {
        let store = RuntimeStore::new();
        store.set_form_value("signup", "email", json!("a@b.c"));
        store.set_form_errors(
            "signup",
            BTreeMap::from([("name".to_string(), "required".to_string())]),
        );
        store.mark_submitted("signup");

        assert_eq!(store.form_values("signup")["email"], json!("a@b.c"));
        assert!(store.is_submitted("signup"));
        assert_eq!(
            store.forms_snapshot()["signup"]["errors"]["name"],
            json!("required")
        );

        store.reset_form("signup");
        assert!(store.form_values("signup").is_empty());
    }

    #[test]
    fn subscribers_may_write_reentrantly() {
        let store = Arc::new(RuntimeStore::new());
        let inner = store.clone();
        store.subscribe(move |change| {
            if let StoreChange::State { key, .. } = change {
                if key == "trigger" {
                    inner.set("echo", json!(true));
                }
            }
        });

        store.set("trigger", json!(1));
        assert_eq!(store.get("echo"), Some(json!(true)));
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = RuntimeStore::new();
        let seen = Arc::new(Mutex::new(0));
        let counter = seen.clone();
        let id = store.subscribe(move |_| *counter.lock() += 1);

        store.set("a", json!(1));
        store.unsubscribe(id);
        store.set("a", json!(2));
        assert_eq!(*seen.lock(), 1);
    }
}
