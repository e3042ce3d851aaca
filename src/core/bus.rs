//! # Event bus: validated publish, ordered fan-out, graceful shutdown.
//!
//! [`EventBus`] owns the subscription [`Registry`], the optional payload
//! validator, and the cancellation/tracking machinery for background work.
//! It is cheap to clone (internally one `Arc`); clones share all state.
//!
//! ## Architecture
//! ```text
//!                  ┌──────────────┐  ValidationError / Closed
//! publish(event) ──► gate:        ├───────────────────────────► Err (no handler ran)
//!                  │  1. closed?  │
//!                  │  2. validate │
//!                  └──────┬───────┘
//!                         ▼
//!                  registry.snapshot(kind)          (ordered, isolated copy)
//!                         ▼
//!                  dispatch::run ──► awaited subs, one by one ──► DispatchResult
//!                         │
//!                         └───────► spawned subs ──► tracker tasks
//!                                        └─► failures ──► dead-letter events
//! ```
//!
//! ## Rules
//! - **Validation first**: a rejected or post-shutdown publish returns an
//!   error before the snapshot is taken; no handler observes the event.
//! - **Snapshot-on-publish**: subscribing or unsubscribing during a dispatch
//!   never changes that dispatch.
//! - **Ordered delivery**: awaited handlers run strictly in registration
//!   order; spawned handlers start in registration order but run overlapped.
//! - **Dead letters**: failures nobody observes are republished on
//!   [`BusConfig::dead_letter_kind`]. Dead letters skip validation and are
//!   never dead-lettered themselves.
//! - **Shutdown**: [`EventBus::shutdown`] cancels every subscription token,
//!   rejects further publishes, and waits for tracked background tasks.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use eventum::{BusConfig, Event, EventBus, HandlerError, HandlerFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new(BusConfig::default());
//!
//!     let audit = HandlerFn::arc("audit", |event: Event, _ctx: CancellationToken| async move {
//!         println!("[audit] kind={} seq={}", event.kind, event.seq);
//!         Ok::<_, HandlerError>(())
//!     });
//!     bus.subscribe("order.created", audit);
//!
//!     let result = bus.publish(Event::new("order.created", json!({"id": 7}))).await?;
//!     assert!(result.all_succeeded());
//!
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::builder::BusBuilder;
use super::config::BusConfig;
use super::dispatch;
use super::registry::{DeliveryMode, Registry, SubscriptionHandle};
use crate::error::{PublishError, ValidationError};
use crate::events::{DispatchResult, Event, Kind};
use crate::schema::Validate;
use crate::subscribers::Subscribe;

/// Shared bus state behind the [`EventBus`] handle.
struct BusInner {
    cfg: BusConfig,
    registry: Registry,
    validator: Option<Arc<dyn Validate>>,
    root: CancellationToken,
    tracker: TaskTracker,
}

/// In-process event bus with validated publish and ordered fan-out.
///
/// ### Properties
/// - **Cloneable**: clones share subscriptions, validator, and shutdown state.
/// - **Ordered**: handlers for a kind run in the order they subscribed.
/// - **Isolated**: one handler failing, panicking, or being cancelled never
///   stops the others.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Creates a bus with the given configuration and no validator.
    ///
    /// With [`BusConfig::strict`] enabled and no validator, every publish is
    /// rejected; attach one via [`EventBus::builder`].
    pub fn new(cfg: BusConfig) -> Self {
        Self::assemble(cfg, None)
    }

    /// Starts building a bus with optional payload validation.
    pub fn builder(cfg: BusConfig) -> BusBuilder {
        BusBuilder::new(cfg)
    }

    pub(crate) fn assemble(cfg: BusConfig, validator: Option<Arc<dyn Validate>>) -> Self {
        let root = CancellationToken::new();
        Self {
            inner: Arc::new(BusInner {
                registry: Registry::new(root.clone()),
                cfg,
                validator,
                root,
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Registers `handler` for `kind` in awaited mode.
    ///
    /// The returned handle is the only way to unsubscribe; the same handler
    /// instance may be registered any number of times.
    pub fn subscribe(&self, kind: impl Into<Kind>, handler: Arc<dyn Subscribe>) -> SubscriptionHandle {
        self.subscribe_with(kind, handler, DeliveryMode::Awaited)
    }

    /// Registers `handler` for `kind` with an explicit [`DeliveryMode`].
    pub fn subscribe_with(
        &self,
        kind: impl Into<Kind>,
        handler: Arc<dyn Subscribe>,
        mode: DeliveryMode,
    ) -> SubscriptionHandle {
        self.inner.registry.insert(kind.into(), handler, mode)
    }

    /// Removes the subscription behind `handle`.
    ///
    /// Idempotent: returns `false` when it was already gone. Removal does not
    /// cancel an invocation that is already in flight.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        self.inner.registry.remove(handle)
    }

    /// Publishes `event` and awaits ordered delivery to its subscribers.
    ///
    /// Validation happens before the subscriber snapshot is taken: on
    /// [`PublishError`] no handler has observed the event. A publish with no
    /// subscribers succeeds with an empty result.
    pub async fn publish(&self, event: Event) -> Result<DispatchResult, PublishError> {
        self.gate(&event)?;
        let subs = self.inner.registry.snapshot(&event.kind);
        let event = Arc::new(event);
        Ok(dispatch::run(self, &event, subs, true).await)
    }

    /// Publishes `event` without awaiting delivery.
    ///
    /// Validation and the subscriber snapshot still happen synchronously, so
    /// rejections surface to the caller and later subscription changes cannot
    /// leak into this dispatch. Delivery runs on a tracked background task;
    /// awaited-mode failures are reported as dead letters.
    pub fn publish_detached(&self, event: Event) -> Result<(), PublishError> {
        self.gate(&event)?;
        let subs = self.inner.registry.snapshot(&event.kind);
        if subs.is_empty() {
            return Ok(());
        }

        let bus = self.clone();
        let event = Arc::new(event);
        self.inner.tracker.spawn(async move {
            dispatch::run(&bus, &event, subs, false).await;
        });
        Ok(())
    }

    /// Number of live subscriptions for `kind`.
    pub fn subscriber_count(&self, kind: &Kind) -> usize {
        self.inner.registry.count(kind)
    }

    /// Kinds that currently have at least one subscription.
    pub fn kinds(&self) -> Vec<Kind> {
        self.inner.registry.kinds()
    }

    /// Bus configuration (read-only).
    pub fn config(&self) -> &BusConfig {
        &self.inner.cfg
    }

    /// Returns `true` once [`EventBus::shutdown`] has begun.
    pub fn is_closed(&self) -> bool {
        self.inner.root.is_cancelled()
    }

    /// Shuts the bus down.
    ///
    /// 1. Cancels the root token; in-flight handlers observe cancellation
    ///    through their invocation tokens.
    /// 2. Rejects subsequent publishes with [`PublishError::Closed`].
    /// 3. Waits for every tracked background task to finish.
    ///
    /// Idempotent: repeated calls return once the tracker is drained.
    pub async fn shutdown(&self) {
        self.inner.root.cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }

    /// Rejects publishes on a closed bus, then validates the payload.
    fn gate(&self, event: &Event) -> Result<(), PublishError> {
        if self.inner.root.is_cancelled() {
            return Err(PublishError::Closed {
                kind: event.kind.clone(),
            });
        }
        self.validate(event)?;
        Ok(())
    }

    /// Applies the injected validator under the configured policy.
    ///
    /// Strict mode requires a schema for every published kind; without a
    /// validator it therefore rejects everything.
    fn validate(&self, event: &Event) -> Result<(), ValidationError> {
        match &self.inner.validator {
            Some(v) => {
                if self.inner.cfg.strict && !v.has_schema(&event.kind) {
                    return Err(ValidationError::UnknownKind {
                        kind: event.kind.clone(),
                    });
                }
                v.validate(&event.kind, &event.payload)
            }
            None if self.inner.cfg.strict => Err(ValidationError::UnknownKind {
                kind: event.kind.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Republishes an unobserved handler failure on the dead-letter kind.
    ///
    /// No-op when dead letters are disabled, and for failures of dead-letter
    /// handlers themselves (the kind guard breaks the recursion). Dead
    /// letters bypass validation; they describe a failure, they are not part
    /// of the caller's schema surface.
    pub(crate) fn dead_letter(
        &self,
        handler: &str,
        failed: &Event,
        label: &'static str,
        message: String,
    ) {
        let Some(target) = self.inner.cfg.dead_letter_target() else {
            return;
        };
        if failed.kind == target {
            return;
        }
        self.publish_internal(Event::dead_letter(target, failed, handler, label, message));
    }

    /// Detached publish that skips the gate. Dead-letter delivery only.
    fn publish_internal(&self, event: Event) {
        let subs = self.inner.registry.snapshot(&event.kind);
        if subs.is_empty() {
            return;
        }

        let bus = self.clone();
        let event = Arc::new(event);
        self.inner.tracker.spawn(async move {
            dispatch::run(&bus, &event, subs, false).await;
        });
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.inner.tracker
    }
}

impl Default for EventBus {
    /// Bus with [`BusConfig::default`] and no validator.
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;

    use crate::error::ValidationError;
    use crate::schema::SchemaSet;
    use crate::subscribers::HandlerFn;

    fn recording_handler(
        name: &'static str,
        seen: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn Subscribe> {
        let seen = Arc::clone(seen);
        HandlerFn::arc(name, move |_event: Event, _ctx: CancellationToken| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().unwrap().push(name);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_handlers_run_in_registration_order() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("t.order", recording_handler("first", &seen));
        bus.subscribe("t.order", recording_handler("second", &seen));
        bus.subscribe("t.order", recording_handler("third", &seen));

        let result = bus
            .publish(Event::new("t.order", json!({})))
            .await
            .expect("publish must succeed");

        assert!(result.all_succeeded());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_validation_failure_reaches_no_handler() {
        let mut schemas = SchemaSet::new();
        schemas.register("t.strict", |payload| {
            payload
                .get("id")
                .map(|_| ())
                .ok_or_else(|| "missing id".to_string())
        });
        let bus = EventBus::builder(BusConfig::default())
            .with_schemas(schemas)
            .build();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        bus.subscribe(
            "t.strict",
            HandlerFn::arc("witness", move |_event: Event, _ctx: CancellationToken| {
                let flag = Arc::clone(&flag);
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        let err = bus
            .publish(Event::new("t.strict", json!({"name": "no id"})))
            .await
            .expect_err("invalid payload must be rejected");

        assert!(matches!(
            err,
            PublishError::Validation(ValidationError::Schema { .. })
        ));
        assert!(!ran.load(Ordering::SeqCst), "handler must not observe rejected event");
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_unknown_kind() {
        let cfg = BusConfig {
            strict: true,
            ..BusConfig::default()
        };
        let bus = EventBus::builder(cfg)
            .with_schemas(SchemaSet::new().with("t.known", |_| Ok(())))
            .build();

        assert!(bus.publish(Event::new("t.known", json!({}))).await.is_ok());

        let err = bus
            .publish(Event::new("t.unknown", json!({})))
            .await
            .expect_err("strict mode must reject kinds without a schema");
        assert!(matches!(
            err,
            PublishError::Validation(ValidationError::UnknownKind { .. })
        ));
    }

    #[tokio::test]
    async fn test_strict_mode_without_validator_rejects_everything() {
        let bus = EventBus::new(BusConfig {
            strict: true,
            ..BusConfig::default()
        });

        let err = bus
            .publish(Event::new("t.any", json!({})))
            .await
            .expect_err("strict bus without validator must reject");
        assert!(matches!(err, PublishError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = bus.subscribe("t.once", recording_handler("h", &seen));

        assert!(bus.unsubscribe(&handle));
        assert!(!bus.unsubscribe(&handle), "second unsubscribe is a no-op");

        let result = bus
            .publish(Event::new("t.once", json!({})))
            .await
            .expect("publish succeeds with zero subscribers");
        assert_eq!(result.delivered(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_after_shutdown_is_closed() {
        let bus = EventBus::default();
        bus.shutdown().await;
        assert!(bus.is_closed());

        let err = bus
            .publish(Event::new("t.late", json!({})))
            .await
            .expect_err("closed bus must reject publishes");
        assert!(matches!(err, PublishError::Closed { .. }));
    }

    #[tokio::test]
    async fn test_detached_publish_validates_synchronously() {
        let bus = EventBus::builder(BusConfig::default())
            .with_schemas(SchemaSet::new().with("t.det", |_| Err("always".to_string())))
            .build();

        let err = bus
            .publish_detached(Event::new("t.det", json!({})))
            .expect_err("detached publish must validate before spawning");
        assert!(matches!(err, PublishError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_publish_is_success() {
        let bus = EventBus::default();
        let result = bus
            .publish(Event::new("t.nobody", json!({})))
            .await
            .expect("publish without subscribers succeeds");
        assert!(result.all_succeeded());
        assert_eq!(result.delivered(), 0);
        assert_eq!(bus.subscriber_count(&Kind::from("t.nobody")), 0);
    }
}
