//! Payload validation: the injected capability and its stock implementation.
//!
//! ## Contents
//! - [`Validate`] — the capability the bus consults before every dispatch
//! - [`SchemaSet`] — closure-backed per-kind checks
//!
//! Validation is a hard gate: a rejected payload aborts the publish before
//! any handler observes the event. What "schema" means is up to the
//! implementation; this crate ships closures, nothing more.

mod set;
mod validate;

pub use set::SchemaSet;
pub use validate::Validate;
