//! # Closure-backed schema registry.
//!
//! [`SchemaSet`] maps event kinds to check closures. It is assembled before
//! the bus is built and is immutable afterwards, so validation needs no
//! locking on the publish path.
//!
//! ## Example
//! ```rust
//! use eventum::SchemaSet;
//!
//! let schemas = SchemaSet::new().with("order.created", |payload| {
//!     if payload.get("order_id").is_some() {
//!         Ok(())
//!     } else {
//!         Err("missing field 'order_id'".to_string())
//!     }
//! });
//! assert_eq!(schemas.len(), 1);
//! ```

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ValidationError;
use crate::events::Kind;
use crate::schema::Validate;

/// Per-kind payload check.
type Check = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Closure-backed validator: one check per registered kind.
///
/// A kind with no registered check is not validated here; whether it may be
/// published at all is decided by [`BusConfig::strict`](crate::BusConfig::strict).
#[derive(Default)]
pub struct SchemaSet {
    checks: HashMap<Kind, Check>,
}

impl SchemaSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a check for `kind`, replacing any previous one.
    ///
    /// The check returns `Err(reason)` to reject a payload; the reason ends
    /// up verbatim in [`ValidationError::Schema`].
    pub fn register(
        &mut self,
        kind: impl Into<Kind>,
        check: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> &mut Self {
        self.checks.insert(kind.into(), Box::new(check));
        self
    }

    /// Chainable form of [`register`](Self::register).
    pub fn with(
        mut self,
        kind: impl Into<Kind>,
        check: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.register(kind, check);
        self
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` when no kind is registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Validate for SchemaSet {
    fn validate(&self, kind: &Kind, payload: &Value) -> Result<(), ValidationError> {
        match self.checks.get(kind) {
            Some(check) => check(payload).map_err(|reason| ValidationError::Schema {
                kind: kind.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn has_schema(&self, kind: &Kind) -> bool {
        self.checks.contains_key(kind)
    }
}
