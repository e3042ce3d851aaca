//! # Example: custom_subscriber
//!
//! Demonstrates how to build a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait on your own type.
//! - Keep per-subscriber state (a counter) across invocations.
//! - Honor the cancellation token for long-running work.
//! - Fail an invocation and watch the outcome the publisher sees.
//!
//! ## Flow
//! ```text
//! publish("sensor.reading")
//!     ├─► Stats.on_event()     ── counts readings, rejects negatives
//!     └─► outcome list ──► publisher decides what a failure means
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use eventum::{Event, EventBus, HandlerError, Subscribe};

/// Counts readings and rejects physically impossible ones.
/// In real life, you could export metrics, ship logs, or trigger alerts.
struct Stats {
    seen: AtomicU64,
}

#[async_trait]
impl Subscribe for Stats {
    async fn on_event(&self, event: &Event, ctx: CancellationToken) -> Result<(), HandlerError> {
        // Simulate slow processing that stays responsive to shutdown.
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            _ = ctx.cancelled() => return Err(HandlerError::Canceled),
        }

        let celsius = event.payload["celsius"].as_f64().unwrap_or(f64::NAN);
        if celsius < -273.15 {
            return Err(HandlerError::Fail {
                error: format!("reading below absolute zero: {celsius}"),
            });
        }

        let n = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        println!("[stats] reading #{n}: {celsius}°C");
        Ok(())
    }

    fn name(&self) -> &str {
        "stats"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = EventBus::default();
    let stats = Arc::new(Stats {
        seen: AtomicU64::new(0),
    });
    bus.subscribe("sensor.reading", stats);

    // A valid reading succeeds...
    let ok = bus
        .publish(Event::new("sensor.reading", json!({ "celsius": 21.5 })))
        .await?;
    println!("[main] valid reading: {}", ok.outcomes[0].status.as_label());

    // ...an impossible one is recorded as a failed outcome, not a crash.
    let bad = bus
        .publish(Event::new("sensor.reading", json!({ "celsius": -400.0 })))
        .await?;
    println!("[main] bogus reading: {}", bad.outcomes[0].status.as_message());

    bus.shutdown().await;
    Ok(())
}
