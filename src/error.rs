//! Error types used by the event bus and the state machine layer.
//!
//! This module defines the error surface of the crate:
//!
//! - [`ValidationError`] — a payload was rejected before dispatch.
//! - [`PublishError`] — a publish could not be started at all.
//! - [`HandlerError`] — a single handler invocation failed.
//! - [`DispatchError`] — aggregate escalation of a dispatch with failures.
//! - [`DefinitionError`] — a state machine definition failed build-time validation.
//! - [`MachineError`] — a state machine instance rejected a trigger.
//!
//! The bus-facing types provide helper methods (`as_label`, `as_message`)
//! for logging and dead-letter payloads.
//!
//! There is deliberately no "unknown subscription" error: unsubscribing is
//! idempotent and removing an absent subscription is a no-op.

use std::sync::Arc;

use thiserror::Error;

use crate::events::{HandlerOutcome, Kind};

/// # Payload rejection raised before any handler runs.
///
/// Validation is synchronous and happens inside `publish` before the
/// subscriber snapshot is taken; a rejected event is never observed by
/// any handler.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The registered schema check for this kind rejected the payload.
    #[error("payload rejected for kind '{kind}': {reason}")]
    Schema {
        /// Kind of the rejected event.
        kind: Kind,
        /// Reason reported by the schema check.
        reason: String,
    },

    /// Strict mode is enabled and no schema is registered for this kind.
    #[error("no schema registered for kind '{kind}'")]
    UnknownKind {
        /// Kind of the rejected event.
        kind: Kind,
    },
}

impl ValidationError {
    /// Returns a short stable label (snake_case) for use in logs/dead letters.
    ///
    /// # Example
    /// ```
    /// use eventum::{Kind, ValidationError};
    ///
    /// let err = ValidationError::UnknownKind { kind: Kind::from("order.created") };
    /// assert_eq!(err.as_label(), "unknown_kind");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ValidationError::Schema { .. } => "schema_rejected",
            ValidationError::UnknownKind { .. } => "unknown_kind",
        }
    }

    /// Returns a human-readable message with details about the rejection.
    pub fn as_message(&self) -> String {
        match self {
            ValidationError::Schema { kind, reason } => {
                format!("kind={kind} rejected: {reason}")
            }
            ValidationError::UnknownKind { kind } => format!("kind={kind} has no schema"),
        }
    }

    /// Returns the kind of the rejected event.
    pub fn kind(&self) -> &Kind {
        match self {
            ValidationError::Schema { kind, .. } => kind,
            ValidationError::UnknownKind { kind } => kind,
        }
    }
}

/// # Reasons a publish never reached the dispatch stage.
///
/// Either the payload failed validation, or the bus has already been shut
/// down. In both cases no handler was invoked.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// The payload was rejected by the injected validator.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The bus was shut down before this publish.
    #[error("bus is shut down; dropped event '{kind}'")]
    Closed {
        /// Kind of the dropped event.
        kind: Kind,
    },
}

/// # Failure of a single handler invocation.
///
/// Returned by [`Subscribe::on_event`](crate::Subscribe::on_event)
/// implementations and recorded in the per-subscriber
/// [`HandlerOutcome`](crate::HandlerOutcome). One handler failing never
/// prevents sibling handlers from running.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Handler execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler was cancelled due to bus shutdown.
    #[error("context cancelled")]
    Canceled,
}

impl HandlerError {
    /// Returns a short stable label (snake_case) for use in logs/dead letters.
    ///
    /// # Example
    /// ```
    /// use eventum::HandlerError;
    ///
    /// let err = HandlerError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Canceled => "handler_canceled",
        }
    }

    /// Returns a human-readable message with details about the failure.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Canceled => "context cancelled".to_string(),
        }
    }
}

/// # Aggregate escalation of a dispatch that had failures.
///
/// Produced by [`DispatchResult::ensure`](crate::DispatchResult::ensure)
/// when at least one awaited handler did not succeed. Carries the full
/// outcome list so callers can inspect exactly which subscribers failed.
#[derive(Error, Debug)]
#[error("{failed} of {total} handlers failed for kind '{kind}'")]
pub struct DispatchError {
    /// Kind of the dispatched event.
    pub kind: Kind,
    /// Number of awaited handlers invoked.
    pub total: usize,
    /// Number of handlers that did not succeed.
    pub failed: usize,
    /// Every awaited outcome of the dispatch, in invocation order.
    pub outcomes: Vec<HandlerOutcome>,
}

/// # Build-time rejection of a state machine definition.
///
/// Returned by [`DefinitionBuilder::build`](crate::DefinitionBuilder::build).
/// A definition that builds successfully is structurally sound: all state
/// references resolve, exactly one state is initial, and no
/// `(from, trigger)` pair carries more than one unconditional transition.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// The definition declares no states at all.
    #[error("definition '{definition}' declares no states")]
    NoStates {
        /// Definition name.
        definition: String,
    },

    /// The same state name was declared twice.
    #[error("duplicate state '{state}'")]
    DuplicateState {
        /// The duplicated state name.
        state: String,
    },

    /// No state was marked initial.
    #[error("definition '{definition}' has no initial state")]
    NoInitialState {
        /// Definition name.
        definition: String,
    },

    /// Two different states were marked initial.
    #[error("initial state declared twice: '{first}' and '{second}'")]
    DuplicateInitial {
        /// First state marked initial.
        first: String,
        /// Second state marked initial.
        second: String,
    },

    /// A marker or transition references a state that was never declared.
    #[error("reference to unknown state '{state}'")]
    UnknownState {
        /// The unresolved state name.
        state: String,
    },

    /// More than one unconditional transition shares a `(from, trigger)` pair.
    #[error("multiple unconditional transitions from '{state}' on '{kind}'")]
    ConflictingTransitions {
        /// Source state of the conflicting transitions.
        state: String,
        /// Trigger kind of the conflicting transitions.
        kind: Kind,
    },
}

/// # Trigger rejection raised by a state machine instance.
///
/// [`MachineError::AmbiguousTransition`] leaves the instance state
/// unchanged. [`MachineError::NotifyRejected`] is raised **after** the
/// transition was applied: the state change stands, only its follow-up
/// announcement was dropped.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MachineError {
    /// More than one transition matched the trigger for the current state.
    ///
    /// Every guard for the `(state, kind)` pair is evaluated; when two or
    /// more pass, the conflict is reported instead of being resolved by
    /// declaration order. The instance state is unchanged.
    #[error("ambiguous transitions from '{state}' on '{kind}': candidates {candidates:?}")]
    AmbiguousTransition {
        /// State the instance was in when the trigger arrived.
        state: Arc<str>,
        /// Kind of the trigger event.
        kind: Kind,
        /// Target states of every matching transition, in declaration order.
        candidates: Vec<Arc<str>>,
    },

    /// A state name does not exist in the definition.
    #[error("unknown state '{state}'")]
    UnknownState {
        /// The unresolved state name.
        state: String,
    },

    /// The follow-up state-change event was rejected by the bus.
    #[error("state change notification rejected for '{kind}': {source}")]
    NotifyRejected {
        /// Kind of the dropped announcement.
        kind: Kind,
        /// Why the bus refused it.
        #[source]
        source: PublishError,
    },
}
