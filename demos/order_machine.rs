//! # Example: order_machine
//!
//! An order lifecycle as an event-driven state machine.
//!
//! Demonstrates how to:
//! - Declare a [`Definition`] with states, guards, and a terminal state.
//! - Attach a [`Machine`] instance to the bus as a regular subscriber.
//! - Publish trigger events and watch guarded transitions apply or not.
//! - Receive follow-up announcements for every applied transition.
//!
//! ## Flow
//! ```text
//! Definition: NEW ──payment.received──► PAID ──shipment.dispatched──► SHIPPED
//!                                              (guard: payload has a carrier)
//!
//! publish(trigger) ──► Machine.on_event ──► step()
//!                          └─ applied? ──► publish_detached("order.state_changed")
//!                                                └─► watcher handler
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example order_machine
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use eventum::{Definition, Event, EventBus, HandlerError, HandlerFn, Machine};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Declare the lifecycle graph; build() validates it
    let def = Definition::builder("order")
        .states(["NEW", "PAID", "SHIPPED"])
        .initial("NEW")
        .terminal("SHIPPED")
        .transition("NEW", "payment.received", "PAID")
        .transition_if("PAID", "shipment.dispatched", "SHIPPED", |_state, payload| {
            payload["carrier"].as_str().is_some_and(|c| !c.is_empty())
        })
        .build()?;

    // 2. Watch the announcements the machine publishes after each transition
    let bus = EventBus::default();
    bus.subscribe(
        "order.state_changed",
        HandlerFn::arc("watcher", |event: Event, _ctx: CancellationToken| async move {
            println!(
                "[watcher] {} moved {} -> {} (trigger: {})",
                event.payload["machine"],
                event.payload["previous_state"],
                event.payload["state"],
                event.payload["trigger"],
            );
            Ok::<_, HandlerError>(())
        }),
    );

    // 3. Instantiate and attach; the machine subscribes to its trigger kinds
    let order = Arc::new(
        Machine::new(def)
            .named("order-42")
            .announce("order.state_changed"),
    );
    order.attach(&bus);

    // 4. Drive the lifecycle with events
    bus.publish(Event::new("payment.received", json!({ "amount": 99 }))).await?;
    println!("[main] after payment: {}", order.current().await);

    // Guard fails: empty carrier, the machine stays in PAID
    bus.publish(Event::new("shipment.dispatched", json!({ "carrier": "" }))).await?;
    println!("[main] empty carrier ignored: {}", order.current().await);

    bus.publish(Event::new("shipment.dispatched", json!({ "carrier": "UPS" }))).await?;
    println!(
        "[main] shipped: {} (terminal: {}, steps: {})",
        order.current().await,
        order.at_terminal().await,
        order.steps().await,
    );

    // 5. Let the detached announcement dispatches deliver, then stop
    tokio::time::sleep(Duration::from_millis(100)).await;
    bus.shutdown().await;
    Ok(())
}
