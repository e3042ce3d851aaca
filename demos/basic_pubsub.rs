//! # Example: basic_pubsub
//!
//! Minimal publish/subscribe round trip on a single bus.
//!
//! Demonstrates how to:
//! - Build an [`EventBus`] with the default configuration.
//! - Register closure handlers with [`HandlerFn`].
//! - Publish an [`Event`] and inspect the per-handler outcomes.
//! - Unsubscribe with the returned handle.
//!
//! ## Flow
//! ```text
//! publish("order.created")
//!     ├─► gate (no validator, open kind set)
//!     ├─► snapshot: [billing, audit]        (registration order)
//!     ├─► billing.on_event() ──► Succeeded
//!     ├─► audit.on_event()   ──► Succeeded
//!     └─► DispatchResult { outcomes: [billing, audit] }
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_pubsub
//! ```

use serde_json::json;
use tokio_util::sync::CancellationToken;

use eventum::{Event, EventBus, HandlerError, HandlerFn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Build a bus (default config: open kinds, dead letters on)
    let bus = EventBus::default();

    // 2. Register two handlers; they will run in this order
    let billing = HandlerFn::arc("billing", |event: Event, _ctx: CancellationToken| async move {
        println!("[billing] charging order {}", event.payload["order_id"]);
        Ok::<_, HandlerError>(())
    });
    let audit = HandlerFn::arc("audit", |event: Event, _ctx: CancellationToken| async move {
        println!("[audit] kind={} seq={} id={}", event.kind, event.seq, event.id);
        Ok::<_, HandlerError>(())
    });
    bus.subscribe("order.created", billing);
    let audit_handle = bus.subscribe("order.created", audit);

    // 3. Publish and await ordered delivery
    let result = bus
        .publish(Event::new("order.created", json!({ "order_id": 7 })))
        .await?;
    println!(
        "[main] delivered to {} handlers, all ok: {}",
        result.delivered(),
        result.all_succeeded()
    );
    for outcome in &result.outcomes {
        println!("[main]   {} -> {}", outcome.handler, outcome.status.as_label());
    }

    // 4. Unsubscribe the audit handler; only billing remains
    bus.unsubscribe(&audit_handle);
    let result = bus
        .publish(Event::new("order.created", json!({ "order_id": 8 })))
        .await?;
    println!("[main] after unsubscribe: {} handler(s)", result.delivered());

    // 5. Graceful shutdown
    bus.shutdown().await;
    Ok(())
}
