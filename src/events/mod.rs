//! Event data model: kinds, occurrences, and dispatch outcomes.
//!
//! This module groups what flows *through* the bus (events) and what flows
//! *back* from a dispatch (outcomes).
//!
//! ## Contents
//! - [`Kind`], [`Event`] — classification, payload, and metadata
//! - [`HandlerStatus`], [`HandlerOutcome`], [`DispatchResult`] — per-handler
//!   records and the aggregate result of one publish
//!
//! ## Quick reference
//! - **Producers**: application code building [`Event`]s; machine instances
//!   building follow-up events and the bus building dead-letter events.
//! - **Consumers**: [`Subscribe`](crate::Subscribe) handlers receive events;
//!   publishers receive [`DispatchResult`]s.

mod event;
mod outcome;

pub use event::{Event, Kind};
pub use outcome::{DispatchResult, HandlerOutcome, HandlerStatus};
