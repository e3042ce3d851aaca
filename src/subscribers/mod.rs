//! # Event handlers: the trait and its stock implementations.
//!
//! This module provides the [`Subscribe`] trait and function-backed
//! adapters for handling events dispatched by the
//! [`EventBus`](crate::EventBus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   publish(Event) ──► validate ──► snapshot subscriptions for kind
//!                                       │
//!                                       ├──► Subscribe::on_event(&Event, ctx)
//!                                       │         │
//!                                       │    ┌────┴─────┬──────────┬───────┐
//!                                       │    ▼          ▼          ▼       ▼
//!                                       │  HandlerFn  PayloadFn  Machine  ...
//!                                       │
//!                                       └──► outcomes → DispatchResult
//! ```
//!
//! ## Handler types
//! - [`HandlerFn`] - closure over the raw event
//! - [`PayloadFn`] - closure over a deserialized, typed payload
//! - [`Machine`](crate::Machine) - state machine instances are handlers too
//! - [`LogWriter`] - stdout tracing (feature `logging`)

mod handler_fn;
mod subscribe;

pub use handler_fn::{HandlerFn, PayloadFn};
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
