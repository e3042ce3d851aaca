//! # Example: validated_payloads
//!
//! Payload validation as a hard gate in front of dispatch.
//!
//! Demonstrates how to:
//! - Register per-kind checks with [`SchemaSet`].
//! - Observe a rejected publish: the error is returned, no handler runs.
//! - Enable strict mode so kinds without a schema are rejected too.
//!
//! ## Flow
//! ```text
//! publish(event)
//!     ├─► strict? kind must have a schema ──► Err(UnknownKind)
//!     ├─► schema check for kind            ──► Err(Schema { reason })
//!     └─► pass ──► dispatch as usual
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example validated_payloads
//! ```

use serde_json::json;
use tokio_util::sync::CancellationToken;

use eventum::{BusConfig, Event, EventBus, HandlerError, HandlerFn, SchemaSet};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. One check per kind: reject transfers without a positive amount
    let schemas = SchemaSet::new().with("funds.transfer", |payload| {
        match payload["amount"].as_f64() {
            Some(amount) if amount > 0.0 => Ok(()),
            Some(amount) => Err(format!("amount must be positive, got {amount}")),
            None => Err("missing field 'amount'".to_string()),
        }
    });

    // 2. Strict mode: only kinds with a registered schema may be published
    let bus = EventBus::builder(BusConfig {
        strict: true,
        ..BusConfig::default()
    })
    .with_schemas(schemas)
    .build();

    bus.subscribe(
        "funds.transfer",
        HandlerFn::arc("ledger", |event: Event, _ctx: CancellationToken| async move {
            println!("[ledger] booked {}", event.payload["amount"]);
            Ok::<_, HandlerError>(())
        }),
    );

    // 3. Valid payload passes the gate and reaches the ledger
    bus.publish(Event::new("funds.transfer", json!({ "amount": 250.0 }))).await?;

    // 4. Invalid payload: the publish fails, the ledger never sees it
    let err = bus
        .publish(Event::new("funds.transfer", json!({ "amount": -5.0 })))
        .await
        .expect_err("negative amount is rejected");
    println!("[main] rejected: {err}");

    // 5. Unknown kind in strict mode: rejected before any lookup
    let err = bus
        .publish(Event::new("funds.displace", json!({ "amount": 1.0 })))
        .await
        .expect_err("unregistered kind is rejected in strict mode");
    println!("[main] rejected: {err}");

    bus.shutdown().await;
    Ok(())
}
