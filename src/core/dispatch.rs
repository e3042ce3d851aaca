//! # Dispatch loop - ordered fan-out with failure isolation.
//!
//! Drives one event through a snapshot of its subscriptions and produces the
//! [`DispatchResult`]. Awaited handlers run strictly one after another in
//! registration order; spawned handlers are handed to background tasks and
//! only counted.
//!
//! ## Architecture
//! ```text
//! publish(event)
//!     │ snapshot (ordered)
//!     ▼
//!   run() ──► sub 1 (awaited) ─ await ──► outcome ┐
//!         ──► sub 2 (awaited) ─ await ──► outcome ┼──► DispatchResult
//!         ──► sub 3 (spawned) ─ spawn ─┐  counted ┘
//!                                      ▼
//!                             background task ──► dead letter on failure
//! ```
//!
//! ## Rules
//! - **Isolation**: a handler error, panic, or cancellation is recorded and
//!   the loop moves on; later handlers always run.
//! - **Panic safety**: handler futures run under `catch_unwind`; the panic
//!   payload is captured as text.
//! - **Cancellation**: each invocation gets a child token of its
//!   subscription's token; bus shutdown cancels the whole tree. A cancelled
//!   invocation yields [`HandlerStatus::Canceled`], never a dead letter.
//! - Failures of invocations nobody awaits (spawned mode, detached publish)
//!   are reported as dead-letter events.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use super::bus::EventBus;
use super::registry::{DeliveryMode, Subscription};
use crate::error::HandlerError;
use crate::events::{DispatchResult, Event, HandlerOutcome, HandlerStatus};

/// Dispatches `event` to `subs` in order.
///
/// `observed` tells whether the caller will see the returned result; when it
/// will not, awaited failures are dead-lettered here instead.
pub(crate) async fn run(
    bus: &EventBus,
    event: &Arc<Event>,
    subs: Vec<Subscription>,
    observed: bool,
) -> DispatchResult {
    let mut outcomes = Vec::with_capacity(subs.len());
    let mut spawned = 0usize;

    for sub in subs {
        match sub.mode {
            DeliveryMode::Spawned => {
                spawn_detached(bus, sub, event);
                spawned += 1;
            }
            DeliveryMode::Awaited => {
                let status = execute(&sub, event).await;
                if !observed {
                    report(bus, &sub, event, &status);
                }
                outcomes.push(HandlerOutcome {
                    handler: sub.name,
                    id: sub.id,
                    status,
                });
            }
        }
    }

    DispatchResult {
        kind: event.kind.clone(),
        event_id: event.id,
        seq: event.seq,
        outcomes,
        spawned,
    }
}

/// Runs one handler invocation to a terminal [`HandlerStatus`].
///
/// The invocation token is a child of the subscription token, so bus shutdown
/// reaches every in-flight handler. `biased` makes an already-cancelled token
/// win deterministically without polling the handler.
pub(crate) async fn execute(sub: &Subscription, event: &Event) -> HandlerStatus {
    let token = sub.cancel.child_token();
    let fut = sub.handler.on_event(event, token.clone());

    tokio::select! {
        biased;
        _ = token.cancelled() => HandlerStatus::Canceled,
        res = AssertUnwindSafe(fut).catch_unwind() => match res {
            Ok(Ok(())) => HandlerStatus::Succeeded,
            Ok(Err(HandlerError::Canceled)) => HandlerStatus::Canceled,
            Ok(Err(err)) => HandlerStatus::Failed(err),
            Err(panic_err) => HandlerStatus::Panicked {
                info: panic_message(panic_err),
            },
        },
    }
}

/// Moves one invocation onto a tracked background task.
///
/// The task re-reports its own failures as dead letters since no caller will
/// ever observe them.
fn spawn_detached(bus: &EventBus, sub: Subscription, event: &Arc<Event>) {
    let worker_bus = bus.clone();
    let event = Arc::clone(event);
    bus.tracker().spawn(async move {
        let status = execute(&sub, &event).await;
        report(&worker_bus, &sub, &event, &status);
    });
}

/// Emits a dead-letter event for failed or panicked invocations.
///
/// Cancellations are deliberate (shutdown) and are never dead-lettered.
fn report(bus: &EventBus, sub: &Subscription, event: &Event, status: &HandlerStatus) {
    if matches!(
        status,
        HandlerStatus::Failed(_) | HandlerStatus::Panicked { .. }
    ) {
        bus.dead_letter(&sub.name, event, status.as_label(), status.as_message());
    }
}

fn panic_message(panic_err: Box<dyn Any + Send>) -> String {
    let any = &*panic_err;
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use crate::subscribers::Subscribe;

    enum Behavior {
        Succeed,
        Fail,
        Panic,
        Bail,
    }

    struct Scripted {
        behavior: Behavior,
        ran: Arc<AtomicBool>,
    }

    impl Scripted {
        fn new(behavior: Behavior) -> (Arc<Self>, Arc<AtomicBool>) {
            let ran = Arc::new(AtomicBool::new(false));
            let this = Arc::new(Self {
                behavior,
                ran: Arc::clone(&ran),
            });
            (this, ran)
        }
    }

    #[async_trait]
    impl Subscribe for Scripted {
        async fn on_event(
            &self,
            _event: &Event,
            _ctx: CancellationToken,
        ) -> Result<(), HandlerError> {
            self.ran.store(true, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(HandlerError::Fail {
                    error: "scripted failure".into(),
                }),
                Behavior::Panic => panic!("scripted panic"),
                Behavior::Bail => Err(HandlerError::Canceled),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn subscription(handler: Arc<dyn Subscribe>, root: &CancellationToken) -> Subscription {
        Subscription {
            id: 7,
            name: Arc::from(handler.name()),
            handler,
            mode: DeliveryMode::Awaited,
            cancel: root.child_token(),
        }
    }

    fn event() -> Event {
        Event::new("t.dispatch", json!({}))
    }

    #[tokio::test]
    async fn test_execute_success() {
        let root = CancellationToken::new();
        let (handler, _) = Scripted::new(Behavior::Succeed);
        let sub = subscription(handler, &root);

        let status = execute(&sub, &event()).await;
        assert!(status.is_success());
    }

    #[tokio::test]
    async fn test_execute_maps_errors_to_failed() {
        let root = CancellationToken::new();
        let (handler, _) = Scripted::new(Behavior::Fail);
        let sub = subscription(handler, &root);

        let status = execute(&sub, &event()).await;
        assert!(matches!(status, HandlerStatus::Failed(_)));
        assert_eq!(status.as_label(), "handler_failed");
    }

    #[tokio::test]
    async fn test_execute_catches_panics() {
        let root = CancellationToken::new();
        let (handler, _) = Scripted::new(Behavior::Panic);
        let sub = subscription(handler, &root);

        let status = execute(&sub, &event()).await;
        match status {
            HandlerStatus::Panicked { info } => {
                assert_eq!(info, "scripted panic", "panic payload must be captured")
            }
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_skips_handler_when_already_cancelled() {
        let root = CancellationToken::new();
        let (handler, ran) = Scripted::new(Behavior::Succeed);
        let sub = subscription(handler, &root);

        root.cancel();
        let status = execute(&sub, &event()).await;
        assert!(matches!(status, HandlerStatus::Canceled));
        assert!(!ran.load(Ordering::SeqCst), "handler must not run after cancel");
    }

    #[tokio::test]
    async fn test_execute_honors_handler_reported_cancellation() {
        let root = CancellationToken::new();
        let (handler, _) = Scripted::new(Behavior::Bail);
        let sub = subscription(handler, &root);

        let status = execute(&sub, &event()).await;
        assert!(matches!(status, HandlerStatus::Canceled));
    }

    #[test]
    fn test_panic_message_downcasts() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic");
    }
}
