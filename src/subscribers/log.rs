//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [event] kind=order.created seq=12 payload={"order_id":7}
//! [event] kind=order.state seq=13 source=order payload={"machine":"order","state":"PAID",...}
//! ```
//!
//! Subscribe it to the kinds you want traced, including the dead-letter
//! kind to surface fire-and-forget failures during development.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints one line per received event.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
#[derive(Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event, _ctx: CancellationToken) -> Result<(), HandlerError> {
        match &e.source {
            Some(source) => println!(
                "[event] kind={} seq={} source={} payload={}",
                e.kind, e.seq, source, e.payload
            ),
            None => println!("[event] kind={} seq={} payload={}", e.kind, e.seq, e.payload),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
