use std::sync::Arc;

use super::bus::EventBus;
use super::config::BusConfig;
use crate::schema::{SchemaSet, Validate};

/// Builder for constructing an [`EventBus`] with optional payload validation.
///
/// ## Example
/// ```rust
/// use eventum::{BusConfig, EventBus, SchemaSet};
///
/// let bus = EventBus::builder(BusConfig::default())
///     .with_schemas(SchemaSet::new().with("order.created", |payload| {
///         payload
///             .get("order_id")
///             .map(|_| ())
///             .ok_or_else(|| "missing field 'order_id'".to_string())
///     }))
///     .build();
///
/// assert!(!bus.is_closed());
/// ```
pub struct BusBuilder {
    cfg: BusConfig,
    validator: Option<Arc<dyn Validate>>,
}

impl BusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            validator: None,
        }
    }

    /// Installs a custom validator.
    ///
    /// The validator is consulted synchronously on every publish, before the
    /// subscriber snapshot is taken.
    pub fn with_validator(mut self, validator: Arc<dyn Validate>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Installs a [`SchemaSet`] as the validator.
    ///
    /// Shorthand for [`with_validator`](Self::with_validator) over the
    /// closure-backed set.
    pub fn with_schemas(self, schemas: SchemaSet) -> Self {
        self.with_validator(Arc::new(schemas))
    }

    /// Builds the bus.
    pub fn build(self) -> EventBus {
        EventBus::assemble(self.cfg, self.validator)
    }
}
