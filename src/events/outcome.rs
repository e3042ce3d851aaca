//! # Dispatch outcomes: per-handler records and the aggregate result.
//!
//! Every awaited handler invocation produces a [`HandlerOutcome`]; a publish
//! collects them (in invocation order) into a [`DispatchResult`]. Nothing a
//! handler does disappears silently: errors, panics, and cancellations all
//! land here, and fire-and-forget invocations are accounted for by count.
//!
//! ## Rules
//! - `outcomes` holds awaited invocations only, in registration order.
//! - `spawned` counts fire-and-forget invocations launched for this publish;
//!   their failures surface as dead-letter events instead of outcomes.
//! - [`DispatchResult::ensure`] escalates failures into a [`DispatchError`]
//!   that carries the full outcome list.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{DispatchError, HandlerError};
use crate::events::Kind;

/// Terminal status of one handler invocation.
#[derive(Debug)]
pub enum HandlerStatus {
    /// Handler returned `Ok(())`.
    Succeeded,
    /// Handler returned an error.
    Failed(HandlerError),
    /// Handler panicked; the panic was caught and isolated.
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
    /// Invocation was cancelled (bus shutdown) before or during execution.
    Canceled,
}

impl HandlerStatus {
    /// Returns `true` only for [`HandlerStatus::Succeeded`].
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, HandlerStatus::Succeeded)
    }

    /// Returns a short stable label (snake_case) for use in logs/dead letters.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerStatus::Succeeded => "succeeded",
            HandlerStatus::Failed(err) => err.as_label(),
            HandlerStatus::Panicked { .. } => "handler_panicked",
            HandlerStatus::Canceled => "handler_canceled",
        }
    }

    /// Returns a human-readable message describing the status.
    pub fn as_message(&self) -> String {
        match self {
            HandlerStatus::Succeeded => "ok".to_string(),
            HandlerStatus::Failed(err) => err.as_message(),
            HandlerStatus::Panicked { info } => format!("panic: {info}"),
            HandlerStatus::Canceled => "context cancelled".to_string(),
        }
    }
}

/// Record of one awaited handler invocation.
#[derive(Debug)]
pub struct HandlerOutcome {
    /// Handler name as reported by [`Subscribe::name`](crate::Subscribe::name).
    pub handler: Arc<str>,
    /// Id of the subscription this invocation belongs to.
    pub id: u64,
    /// How the invocation ended.
    pub status: HandlerStatus,
}

/// Aggregate result of one publish.
///
/// Returned by [`EventBus::publish`](crate::EventBus::publish). Identifies
/// the event and lists every awaited outcome in invocation order.
#[derive(Debug)]
pub struct DispatchResult {
    /// Kind of the dispatched event.
    pub kind: Kind,
    /// Id of the dispatched event.
    pub event_id: Uuid,
    /// Sequence number of the dispatched event.
    pub seq: u64,
    /// Awaited outcomes, in invocation (= registration) order.
    pub outcomes: Vec<HandlerOutcome>,
    /// Number of fire-and-forget invocations launched for this publish.
    pub spawned: usize,
}

impl DispatchResult {
    /// Returns `true` when every awaited handler succeeded.
    ///
    /// A publish with zero subscribers is a success.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    /// Iterates over the outcomes that did not succeed.
    pub fn failures(&self) -> impl Iterator<Item = &HandlerOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    /// Total invocations accounted for: awaited outcomes plus spawned.
    pub fn delivered(&self) -> usize {
        self.outcomes.len() + self.spawned
    }

    /// Escalates failures: returns the result unchanged when everything
    /// succeeded, otherwise a [`DispatchError`] carrying every outcome.
    pub fn ensure(self) -> Result<Self, DispatchError> {
        let failed = self.failures().count();
        if failed == 0 {
            Ok(self)
        } else {
            Err(DispatchError {
                kind: self.kind,
                total: self.outcomes.len(),
                failed,
                outcomes: self.outcomes,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, id: u64, status: HandlerStatus) -> HandlerOutcome {
        HandlerOutcome {
            handler: Arc::from(name),
            id,
            status,
        }
    }

    fn result(outcomes: Vec<HandlerOutcome>, spawned: usize) -> DispatchResult {
        DispatchResult {
            kind: Kind::from("t.kind"),
            event_id: Uuid::new_v4(),
            seq: 0,
            outcomes,
            spawned,
        }
    }

    #[test]
    fn test_empty_dispatch_is_success() {
        let res = result(vec![], 0);
        assert!(res.all_succeeded());
        assert_eq!(res.delivered(), 0);
        assert!(res.ensure().is_ok());
    }

    #[test]
    fn test_failures_are_filtered_in_order() {
        let res = result(
            vec![
                outcome("h1", 1, HandlerStatus::Succeeded),
                outcome(
                    "h2",
                    2,
                    HandlerStatus::Failed(HandlerError::Fail {
                        error: "boom".into(),
                    }),
                ),
                outcome("h3", 3, HandlerStatus::Panicked { info: "oops".into() }),
            ],
            2,
        );
        assert!(!res.all_succeeded());
        assert_eq!(res.delivered(), 5);

        let failed: Vec<&str> = res.failures().map(|o| o.handler.as_ref()).collect();
        assert_eq!(failed, vec!["h2", "h3"], "failures must keep invocation order");
    }

    #[test]
    fn test_ensure_carries_every_outcome() {
        let res = result(
            vec![
                outcome("h1", 1, HandlerStatus::Succeeded),
                outcome("h2", 2, HandlerStatus::Canceled),
            ],
            0,
        );
        let err = res.ensure().expect_err("cancelled outcome must escalate");
        assert_eq!(err.total, 2);
        assert_eq!(err.failed, 1);
        assert_eq!(err.outcomes.len(), 2, "escalation keeps successes too");
        assert_eq!(err.to_string(), "1 of 2 handlers failed for kind 't.kind'");
    }

    #[test]
    fn test_status_labels_are_stable() {
        assert_eq!(HandlerStatus::Succeeded.as_label(), "succeeded");
        assert_eq!(
            HandlerStatus::Failed(HandlerError::Canceled).as_label(),
            "handler_canceled"
        );
        assert_eq!(
            HandlerStatus::Panicked { info: "x".into() }.as_label(),
            "handler_panicked"
        );
        assert_eq!(HandlerStatus::Canceled.as_label(), "handler_canceled");
    }
}
