//! # Example: dead_letters
//!
//! Surfacing failures nobody awaits.
//!
//! Demonstrates how to:
//! - Subscribe a handler in [`DeliveryMode::Spawned`] (fire-and-forget).
//! - Collect its failures on the dead-letter kind instead of losing them.
//! - Read the failure context (handler, original kind, error) from the
//!   dead-letter payload.
//!
//! ## Flow
//! ```text
//! publish("import.row")
//!     ├─► importer (spawned) ──► background task ──► Err
//!     │                                │
//!     │                                └─► publish("bus.dead_letter", {
//!     │                                       handler, kind, event_id,
//!     │                                       error, message })
//!     └─► DispatchResult { spawned: 1 }        │
//!                                              ▼
//!                                      collector handler
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example dead_letters
//! ```

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use eventum::{BusConfig, DeliveryMode, Event, EventBus, HandlerError, HandlerFn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = EventBus::default();

    // 1. Watch the dead-letter kind (default "bus.dead_letter")
    bus.subscribe(
        BusConfig::DEAD_LETTER_KIND,
        HandlerFn::arc("collector", |event: Event, _ctx: CancellationToken| async move {
            println!(
                "[collector] handler '{}' failed on '{}': {}",
                event.payload["handler"], event.payload["kind"], event.payload["message"],
            );
            Ok::<_, HandlerError>(())
        }),
    );

    // 2. A flaky importer, subscribed fire-and-forget: the publisher never
    //    awaits it, so its failures have no outcome to land in
    let importer = HandlerFn::arc("importer", |event: Event, _ctx: CancellationToken| async move {
        let row = &event.payload["row"];
        if row["sku"].is_null() {
            return Err(HandlerError::Fail {
                error: format!("row {} has no sku", row["n"]),
            });
        }
        println!("[importer] imported row {}", row["n"]);
        Ok(())
    });
    bus.subscribe_with("import.row", importer, DeliveryMode::Spawned);

    // 3. Publish one good and one broken row
    let result = bus
        .publish(Event::new(
            "import.row",
            json!({ "row": { "n": 1, "sku": "A-100" } }),
        ))
        .await?;
    println!("[main] spawned {} background invocation(s)", result.spawned);

    bus.publish(Event::new("import.row", json!({ "row": { "n": 2 } }))).await?;

    // 4. Give the background invocations time to finish; shutdown cancels
    //    whatever is still pending
    tokio::time::sleep(Duration::from_millis(100)).await;
    bus.shutdown().await;
    Ok(())
}
