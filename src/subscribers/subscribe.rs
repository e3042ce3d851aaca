//! # Core handler trait
//!
//! `Subscribe` is the extension point for plugging event handlers into the
//! bus. A subscription binds one implementation to one event kind; the same
//! instance may be subscribed to any number of kinds.
//!
//! ## Contract
//! - `on_event` runs once per dispatched event. In awaited mode the
//!   publisher waits for it and records the outcome; in spawned mode it runs
//!   on a background task and failures surface as dead-letter events.
//! - Implementations never take down the dispatch: errors and panics are
//!   captured into the invocation's outcome, siblings keep running.
//! - `ctx` fires when the bus shuts down; long-running handlers should
//!   check it and return early (returning [`HandlerError::Canceled`] is
//!   recorded as a cancellation, not a failure).
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use eventum::{Event, HandlerError, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, event: &Event, _ctx: CancellationToken) -> Result<(), HandlerError> {
//!         // write audit record...
//!         let _ = event;
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "audit" }
//! }
//! ```

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::events::Event;

/// Contract for event handlers.
///
/// Called from the dispatch path (awaited mode) or a dedicated background
/// task (spawned mode). Implementations should avoid blocking the async
/// runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    ///
    /// # Parameters
    /// - `event`: the dispatched event (shared, immutable)
    /// - `ctx`: cancellation signal for this invocation; fires on bus shutdown
    async fn on_event(&self, event: &Event, ctx: CancellationToken) -> Result<(), HandlerError>;

    /// Human-readable name recorded in outcomes and dead letters.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
