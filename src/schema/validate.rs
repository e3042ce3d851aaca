//! # Validation capability injected into the bus.
//!
//! The bus does not define a schema language. It accepts any [`Validate`]
//! implementation at build time and consults it synchronously on every
//! publish, before the subscriber snapshot is taken.
//!
//! ## Contract
//! - `validate` runs for every published kind; kinds the implementation has
//!   no schema for must pass. `has_schema` separately drives the bus's
//!   strict-mode rejection of unknown kinds.
//! - Implementations must be cheap and side-effect free: they run inline on
//!   the publisher's path.

use serde_json::Value;

use crate::error::ValidationError;
use crate::events::Kind;

/// Contract for payload validators.
///
/// Implemented by [`SchemaSet`](crate::SchemaSet); applications may provide
/// their own (e.g. backed by generated schemas) and hand it to
/// [`BusBuilder::with_validator`](crate::BusBuilder::with_validator).
pub trait Validate: Send + Sync + 'static {
    /// Checks a payload against the schema registered for `kind`.
    fn validate(&self, kind: &Kind, payload: &Value) -> Result<(), ValidationError>;

    /// Reports whether a schema is registered for `kind`.
    ///
    /// Drives strict-mode rejection of unknown kinds.
    fn has_schema(&self, kind: &Kind) -> bool;
}
