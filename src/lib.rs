//! # eventum
//!
//! **Eventum** is an in-process event bus with schema-validated payloads and
//! event-driven, guarded state machines.
//!
//! It provides primitives to publish typed events to ordered subscribers,
//! isolate handler failures, and run finite-state machines that step on the
//! same events. The crate is designed as a building block for event-driven
//! services and workflow engines.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  publish(event)                          subscribe(kind, handler)
//!        │                                           │
//!        ▼                                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  EventBus                                                       │
//! │  - gate: closed check + payload validation (Validate/SchemaSet) │
//! │  - Registry (kind → ordered subscriptions, snapshot-on-publish) │
//! │  - dispatch loop (awaited in order / spawned on tracked tasks)  │
//! │  - dead letters for failures nobody observes                    │
//! └──────┬──────────────────────┬──────────────────────┬────────────┘
//!        ▼                      ▼                      ▼
//!  ┌────────────┐        ┌────────────┐      ┌──────────────────┐
//!  │ handler 1  │        │ handler 2  │      │ Machine (FSM)    │
//!  │ (awaited)  │        │ (spawned)  │      │ guarded stepping │
//!  └────────────┘        └────────────┘      └────────┬─────────┘
//!                                                     │ announce
//!                                                     ▼
//!                                          bus.publish_detached(
//!                                            "…state_changed" event)
//! ```
//!
//! ### Dispatch lifecycle
//! ```text
//! publish(event)
//!   ├─► gate: bus closed?        ──► Err(Closed)
//!   ├─► validate payload         ──► Err(Validation)   (no handler ran)
//!   ├─► snapshot subscriptions   (ordered; later changes can't leak in)
//!   └─► for each subscription, in registration order:
//!         ├─ Awaited ─► run under catch_unwind + cancellation token
//!         │               ├─ Ok        ─► Succeeded  ┐
//!         │               ├─ Err(..)   ─► Failed     │ outcomes listed in
//!         │               ├─ panic     ─► Panicked   │ DispatchResult
//!         │               └─ cancelled ─► Canceled   ┘
//!         └─ Spawned ─► tracked background task
//!                         └─ failure ─► dead-letter event
//! ```
//!
//! ## Features
//! | Area               | Description                                                      | Key types / traits                         |
//! |--------------------|------------------------------------------------------------------|--------------------------------------------|
//! | **Events**         | Typed kinds, payloads, ids, sequence numbers, correlation.       | [`Event`], [`Kind`]                        |
//! | **Bus**            | Validated publish, ordered fan-out, graceful shutdown.           | [`EventBus`], [`BusBuilder`], [`BusConfig`]|
//! | **Subscribers**    | Async handler trait plus closure/typed-payload adapters.         | [`Subscribe`], [`HandlerFn`], [`PayloadFn`]|
//! | **Validation**     | Injected per-kind payload checks; strict mode.                   | [`Validate`], [`SchemaSet`]                |
//! | **State machines** | Validated definitions, guarded event-driven instances.           | [`Definition`], [`Machine`], [`Step`]      |
//! | **Errors**         | Typed rejection/failure surface for every stage.                 | [`PublishError`], [`MachineError`]         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use eventum::{
//!     BusConfig, Definition, Event, EventBus, HandlerError, HandlerFn, Machine, SchemaSet,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Validate payloads before any handler runs.
//!     let schemas = SchemaSet::new().with("payment.received", |payload| {
//!         payload
//!             .get("amount")
//!             .map(|_| ())
//!             .ok_or_else(|| "missing field 'amount'".to_string())
//!     });
//!     let bus = EventBus::builder(BusConfig::default())
//!         .with_schemas(schemas)
//!         .build();
//!
//!     // A plain handler...
//!     let audit = HandlerFn::arc("audit", |event: Event, _ctx: CancellationToken| async move {
//!         println!("[audit] kind={} seq={}", event.kind, event.seq);
//!         Ok::<_, HandlerError>(())
//!     });
//!     bus.subscribe("payment.received", audit);
//!
//!     // ...and a state machine stepping on the same events.
//!     let def = Definition::builder("order")
//!         .states(["NEW", "PAID"])
//!         .initial("NEW")
//!         .transition("NEW", "payment.received", "PAID")
//!         .build()?;
//!     let order = Arc::new(Machine::new(def));
//!     order.attach(&bus);
//!
//!     let result = bus
//!         .publish(Event::new("payment.received", json!({"amount": 99})))
//!         .await?;
//!     assert!(result.all_succeeded());
//!     assert_eq!(order.current().await.as_ref(), "PAID");
//!
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod machine;
mod schema;
mod subscribers;

// ---- Public re-exports ----

pub use core::{BusBuilder, BusConfig, DeliveryMode, EventBus, SubscriptionHandle};
pub use error::{
    DefinitionError, DispatchError, HandlerError, MachineError, PublishError, ValidationError,
};
pub use events::{DispatchResult, Event, HandlerOutcome, HandlerStatus, Kind};
pub use machine::{Definition, DefinitionBuilder, Guard, Machine, State, Step, Transition};
pub use schema::{SchemaSet, Validate};
pub use subscribers::{HandlerFn, PayloadFn, Subscribe};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
