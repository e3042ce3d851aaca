//! Guarded state machines driven by bus events.
//!
//! This module groups the immutable **graph** side (definitions built and
//! validated up front) and the mutable **instance** side (cursors stepping
//! over a shared definition).
//!
//! ## Contents
//! - [`Definition`], [`DefinitionBuilder`] validated state/transition graph
//! - [`State`], [`Transition`], [`Guard`] graph vocabulary
//! - [`Machine`], [`Step`] runtime instance, subscribes to trigger kinds
//!
//! ## Quick reference
//! - **Build**: `Definition::builder(..) … .build()?` fails fast on
//!   structural problems ([`DefinitionError`](crate::DefinitionError)).
//! - **Run**: `Arc::new(Machine::new(def)).attach(&bus)`; the instance steps
//!   on every published trigger and optionally announces applied transitions.

mod definition;
mod instance;
mod state;
mod transition;

pub use definition::{Definition, DefinitionBuilder};
pub use instance::{Machine, Step};
pub use state::State;
pub use transition::{Guard, Transition};
