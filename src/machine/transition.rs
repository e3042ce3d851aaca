use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::events::Kind;

/// Predicate deciding whether a guarded transition applies.
///
/// Receives the current state name and the trigger payload. Guards must be
/// pure and fast: every guard declared for a `(state, trigger)` pair runs on
/// every matching event, even after another guard already passed, so that
/// ambiguity is detected instead of resolved by declaration order.
#[derive(Clone)]
pub struct Guard(Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>);

impl Guard {
    /// Wraps a predicate closure.
    pub fn new(check: impl Fn(&str, &Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }

    /// Evaluates the predicate against a state name and payload.
    ///
    /// ```rust
    /// use eventum::Guard;
    /// use serde_json::json;
    ///
    /// let paid = Guard::new(|_, payload| payload["amount"].as_u64().unwrap_or(0) > 0);
    /// assert!(paid.check("pending", &json!({ "amount": 42 })));
    /// assert!(!paid.check("pending", &json!({ "amount": 0 })));
    /// ```
    pub fn check(&self, state: &str, payload: &Value) -> bool {
        (self.0)(state, payload)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

/// Directed edge of a definition: `(from, trigger) → to`, optionally guarded.
#[derive(Debug, Clone)]
pub struct Transition {
    from: Arc<str>,
    to: Arc<str>,
    trigger: Kind,
    guard: Option<Guard>,
    /// Index of `to` in the definition's state list.
    pub(crate) to_idx: usize,
}

impl Transition {
    pub(crate) fn new(
        from: Arc<str>,
        to: Arc<str>,
        trigger: Kind,
        guard: Option<Guard>,
        to_idx: usize,
    ) -> Self {
        Self {
            from,
            to,
            trigger,
            guard,
            to_idx,
        }
    }

    /// Source state name.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Target state name.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Event kind that triggers this transition.
    pub fn trigger(&self) -> &Kind {
        &self.trigger
    }

    /// Returns `true` when this transition carries a guard.
    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    pub(crate) fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    pub(crate) fn to_arc(&self) -> Arc<str> {
        Arc::clone(&self.to)
    }
}
