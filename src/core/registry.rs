//! # Subscription registry - kind-keyed, order-preserving.
//!
//! Maps each event kind to the ordered list of its subscriptions. The order
//! of the list is exactly the order `subscribe` calls were made in, and it
//! is the invocation order during dispatch.
//!
//! ## Rules
//! - **Snapshot-on-dispatch**: every publish clones the list for its kind;
//!   mutations never affect an in-flight dispatch.
//! - **Idempotent removal**: removing by handle is a no-op when the
//!   subscription is already gone. There is no "unknown subscription" error.
//! - **Handles, not names**: a [`SubscriptionHandle`] is the only removal
//!   token; the same handler instance may be subscribed many times.
//! - Removal does not cancel in-flight invocations; only bus shutdown does.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::events::Kind;
use crate::subscribers::Subscribe;

/// How a subscription's handler is driven during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// The publisher awaits the handler and records its outcome.
    #[default]
    Awaited,
    /// The handler runs on a background task; failures surface as
    /// dead-letter events instead of outcomes.
    Spawned,
}

/// Removal token returned by [`EventBus::subscribe`](crate::EventBus::subscribe).
///
/// Identifies one subscription (kind + id). Cheap to clone.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    kind: Kind,
    id: u64,
}

impl SubscriptionHandle {
    /// Kind this subscription was registered for.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Registry-unique subscription id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One registered handler with its delivery mode and cancellation scope.
#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) id: u64,
    pub(crate) name: Arc<str>,
    pub(crate) handler: Arc<dyn Subscribe>,
    pub(crate) mode: DeliveryMode,
    pub(crate) cancel: CancellationToken,
}

/// Kind-keyed subscription store.
pub(crate) struct Registry {
    subs: DashMap<Kind, Vec<Subscription>>,
    next_id: AtomicU64,
    root: CancellationToken,
}

impl Registry {
    /// Creates an empty registry whose subscriptions descend from `root`.
    pub(crate) fn new(root: CancellationToken) -> Self {
        Self {
            subs: DashMap::new(),
            next_id: AtomicU64::new(1),
            root,
        }
    }

    /// Appends a subscription for `kind` and returns its handle.
    pub(crate) fn insert(
        &self,
        kind: Kind,
        handler: Arc<dyn Subscribe>,
        mode: DeliveryMode,
    ) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let sub = Subscription {
            id,
            name: Arc::from(handler.name()),
            handler,
            mode,
            cancel: self.root.child_token(),
        };
        self.subs.entry(kind.clone()).or_default().push(sub);
        SubscriptionHandle { kind, id }
    }

    /// Removes the subscription the handle points at.
    ///
    /// Returns `false` when it was already gone (idempotent).
    pub(crate) fn remove(&self, handle: &SubscriptionHandle) -> bool {
        let Some(mut entry) = self.subs.get_mut(&handle.kind) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|s| s.id != handle.id);
        let removed = entry.len() != before;
        let emptied = entry.is_empty();
        drop(entry);

        if emptied {
            self.subs.remove_if(&handle.kind, |_, subs| subs.is_empty());
        }
        removed
    }

    /// Clones the current subscription list for `kind`, in registration order.
    pub(crate) fn snapshot(&self, kind: &Kind) -> Vec<Subscription> {
        self.subs
            .get(kind)
            .map(|subs| subs.clone())
            .unwrap_or_default()
    }

    /// Number of live subscriptions for `kind`.
    pub(crate) fn count(&self, kind: &Kind) -> usize {
        self.subs.get(kind).map(|subs| subs.len()).unwrap_or(0)
    }

    /// Kinds with at least one live subscription.
    pub(crate) fn kinds(&self) -> Vec<Kind> {
        self.subs
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::error::HandlerError;
    use crate::events::Event;

    struct Noop;

    #[async_trait]
    impl Subscribe for Noop {
        async fn on_event(
            &self,
            _event: &Event,
            _ctx: CancellationToken,
        ) -> Result<(), HandlerError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "noop"
        }
    }

    fn registry() -> Registry {
        Registry::new(CancellationToken::new())
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let reg = registry();
        let kind = Kind::from("t.order");
        let first = reg.insert(kind.clone(), Arc::new(Noop), DeliveryMode::Awaited);
        let second = reg.insert(kind.clone(), Arc::new(Noop), DeliveryMode::Spawned);

        let snap = reg.snapshot(&kind);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].id, first.id(), "first registered must come first");
        assert_eq!(snap[1].id, second.id());
        assert_eq!(snap[1].mode, DeliveryMode::Spawned);
    }

    #[test]
    fn test_snapshot_is_isolated_from_mutations() {
        let reg = registry();
        let kind = Kind::from("t.snap");
        reg.insert(kind.clone(), Arc::new(Noop), DeliveryMode::Awaited);

        let snap = reg.snapshot(&kind);
        reg.insert(kind.clone(), Arc::new(Noop), DeliveryMode::Awaited);
        assert_eq!(snap.len(), 1, "snapshot must not see later inserts");
        assert_eq!(reg.count(&kind), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let reg = registry();
        let kind = Kind::from("t.rm");
        let handle = reg.insert(kind.clone(), Arc::new(Noop), DeliveryMode::Awaited);

        assert!(reg.remove(&handle));
        assert!(!reg.remove(&handle), "second removal must be a no-op");
        assert_eq!(reg.count(&kind), 0);
    }

    #[test]
    fn test_emptied_kind_disappears_from_listing() {
        let reg = registry();
        let keep = Kind::from("t.keep");
        let drop_kind = Kind::from("t.drop");
        reg.insert(keep.clone(), Arc::new(Noop), DeliveryMode::Awaited);
        let handle = reg.insert(drop_kind.clone(), Arc::new(Noop), DeliveryMode::Awaited);

        reg.remove(&handle);
        let kinds = reg.kinds();
        assert_eq!(kinds, vec![keep]);
    }

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let reg = registry();
        let a = reg.insert(Kind::from("t.a"), Arc::new(Noop), DeliveryMode::Awaited);
        let b = reg.insert(Kind::from("t.b"), Arc::new(Noop), DeliveryMode::Awaited);
        assert_ne!(a.id(), b.id());
    }
}
