//! # Event model: kinds, payloads, and metadata.
//!
//! [`Kind`] classifies events by an open-ended dotted name (`"order.created"`),
//! rather than a closed enum, so applications can introduce kinds without
//! touching this crate. [`Event`] carries the payload plus delivery metadata:
//! a unique id, a global sequence number, a wall-clock timestamp, an optional
//! source, and an optional correlation id linking follow-up events to the
//! occurrence that caused them.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically with construction order. Use `seq` to restore the exact
//! order when events are observed out of order.
//!
//! ## Example
//! ```rust
//! use eventum::{Event, Kind};
//! use serde_json::json;
//!
//! let ev = Event::new("order.created", json!({ "order_id": 7 }))
//!     .with_source("checkout");
//!
//! assert_eq!(ev.kind, Kind::from("order.created"));
//! assert_eq!(ev.source.as_deref(), Some("checkout"));
//! assert!(ev.correlation.is_none());
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use serde_json::Value;
use uuid::Uuid;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of an event by name.
///
/// Cheap to clone (interned string), hashable, and comparable. Kinds are
/// conventionally dotted lowercase: `"payment.received"`, `"bus.dead_letter"`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Kind(Arc<str>);

impl Kind {
    /// Creates a kind from any string-like value.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the kind as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Arc<str>> for Kind {
    fn from(name: Arc<str>) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Kind {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One published occurrence with payload and metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `id`: unique per event, usable as a correlation root
/// - `at`: wall-clock timestamp (for logs)
///
/// Events are treated as immutable once published: dispatch shares a single
/// `Arc<Event>` across all handlers.
#[derive(Clone, Debug)]
pub struct Event {
    /// Event classification.
    pub kind: Kind,
    /// Structured payload; validated before dispatch when a schema exists.
    pub payload: Value,
    /// Unique event id.
    pub id: Uuid,
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Logical origin of the event (component or machine name).
    pub source: Option<Arc<str>>,
    /// Groups this event with the occurrence that caused it.
    pub correlation: Option<Uuid>,
}

impl Event {
    /// Creates a new event of the given kind with a fresh id, the next
    /// sequence number, and the current timestamp.
    pub fn new(kind: impl Into<Kind>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            id: Uuid::new_v4(),
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            source: None,
            correlation: None,
        }
    }

    /// Attaches the logical origin of the event.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a correlation id.
    #[inline]
    pub fn with_correlation(mut self, correlation: Uuid) -> Self {
        self.correlation = Some(correlation);
        self
    }

    /// Returns the correlation root for follow-ups caused by this event:
    /// its own correlation when set, otherwise its id.
    #[inline]
    pub fn correlation_root(&self) -> Uuid {
        self.correlation.unwrap_or(self.id)
    }

    /// Creates a dead-letter event describing a failed handler invocation.
    ///
    /// Correlated with the event whose handling failed.
    pub(crate) fn dead_letter(
        kind: Kind,
        failed: &Event,
        handler: &str,
        label: &'static str,
        message: String,
    ) -> Self {
        Event::new(
            kind,
            serde_json::json!({
                "handler": handler,
                "kind": failed.kind.as_str(),
                "event_id": failed.id.to_string(),
                "error": label,
                "message": message,
            }),
        )
        .with_source("bus")
        .with_correlation(failed.correlation_root())
    }
}
