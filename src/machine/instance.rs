//! # Machine instances: event-driven stepping over a shared definition.
//!
//! A [`Machine`] holds the mutable side of a state machine: which state it
//! is in, how it got there, and for how long. The immutable graph lives in
//! the shared [`Definition`]; any number of instances can run over one
//! definition and one bus.
//!
//! ## Architecture
//! ```text
//! bus.publish(trigger)                    (instance subscribed to every
//!        │                                 trigger kind of its definition)
//!        ▼
//! Machine::on_event ──► step():
//!        lock cursor
//!          ├─ transitions for (state, kind)
//!          │      evaluate ALL guards
//!          │        ├─ 0 matched ──────────────► Step::Ignored
//!          │        ├─ 1 matched ─► apply ─────► Step::Transitioned
//!          │        └─ 2+ matched ─────────────► AmbiguousTransition
//!        unlock
//!          └─ applied? ─► publish_detached(announce event)
//! ```
//!
//! ## Rules
//! - **Serialized**: the whole read-evaluate-write sequence runs under the
//!   instance lock; concurrent triggers queue up, they never interleave.
//! - **Detected ambiguity**: every guard for the pair is evaluated even
//!   after one passed. Two or more matches raise
//!   [`MachineError::AmbiguousTransition`] and the state stays unchanged.
//! - **Ignored is not an error**: zero matches leave the machine where it
//!   is. A terminal state without declared outgoing transitions therefore
//!   ignores every trigger; declaring one keeps it leavable (terminal is a
//!   marker, not a block).
//! - **Announcements**: with [`Machine::announce`] configured, every applied
//!   transition publishes a detached follow-up event carrying
//!   `{machine, state, previous_state, trigger}`; correlation is propagated
//!   from the trigger. A rejected announcement surfaces as
//!   [`MachineError::NotifyRejected`] while the transition stays applied.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use eventum::{BusConfig, Definition, Event, EventBus, Machine};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let def = Definition::builder("order")
//!         .states(["NEW", "PAID", "SHIPPED"])
//!         .initial("NEW")
//!         .terminal("SHIPPED")
//!         .transition("NEW", "payment.received", "PAID")
//!         .transition_if("PAID", "shipment.dispatched", "SHIPPED", |_state, payload| {
//!             payload.get("carrier").is_some()
//!         })
//!         .build()?;
//!
//!     let bus = EventBus::new(BusConfig::default());
//!     let order = Arc::new(Machine::new(def).announce("order.state_changed"));
//!     let _handles = order.attach(&bus);
//!
//!     bus.publish(Event::new("payment.received", json!({"amount": 99}))).await?;
//!     assert_eq!(order.current().await.as_ref(), "PAID");
//!
//!     // No carrier in the payload: the guard fails, the machine stays in PAID.
//!     bus.publish(Event::new("shipment.dispatched", json!({}))).await?;
//!     assert_eq!(order.current().await.as_ref(), "PAID");
//!
//!     bus.publish(Event::new("shipment.dispatched", json!({"carrier": "dhl"}))).await?;
//!     assert!(order.at_terminal().await);
//!
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::definition::Definition;
use crate::core::{EventBus, SubscriptionHandle};
use crate::error::{HandlerError, MachineError};
use crate::events::{Event, Kind};
use crate::subscribers::Subscribe;

/// Outcome of one [`Machine::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Exactly one transition matched and was applied.
    Transitioned {
        /// State the machine left.
        from: Arc<str>,
        /// State the machine entered.
        to: Arc<str>,
    },
    /// No transition matched; the state is unchanged.
    Ignored,
}

/// Mutable instance state, guarded by the instance lock.
struct Cursor {
    at: usize,
    prev: Option<usize>,
    entered: Instant,
    steps: u64,
}

/// Runtime state machine instance driven by bus events.
///
/// ### Properties
/// - **Per-instance mutual exclusion**: steps serialize on an async lock.
/// - **Shareable definition**: instances hold an `Arc<Definition>`.
/// - **Bus subscriber**: [`Machine::attach`] registers the instance for
///   every distinct trigger kind; a failed step becomes a failed handler
///   outcome for the publisher while sibling subscribers still run.
pub struct Machine {
    def: Arc<Definition>,
    name: Arc<str>,
    announce: Option<Kind>,
    bus: OnceLock<EventBus>,
    cursor: Mutex<Cursor>,
}

impl Machine {
    /// Creates an instance in the definition's initial state.
    ///
    /// The instance name defaults to the definition name; override it with
    /// [`named`](Self::named) when running several instances side by side.
    pub fn new(def: Arc<Definition>) -> Self {
        let cursor = Cursor {
            at: def.initial_idx(),
            prev: None,
            entered: Instant::now(),
            steps: 0,
        };
        Self {
            name: def.name_arc(),
            announce: None,
            bus: OnceLock::new(),
            cursor: Mutex::new(cursor),
            def,
        }
    }

    /// Overrides the instance name (used as handler name and event source).
    #[inline]
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Configures the kind published after every applied transition.
    #[inline]
    pub fn announce(mut self, kind: impl Into<Kind>) -> Self {
        self.announce = Some(kind.into());
        self
    }

    /// Moves the (not yet attached) instance into `state` instead of the
    /// initial one.
    pub fn start_in(mut self, state: &str) -> Result<Self, MachineError> {
        let idx = self
            .def
            .state_idx(state)
            .ok_or_else(|| MachineError::UnknownState {
                state: state.to_string(),
            })?;
        let cursor = self.cursor.get_mut();
        cursor.at = idx;
        cursor.prev = None;
        cursor.entered = Instant::now();
        Ok(self)
    }

    /// Subscribes the instance to every distinct trigger kind of its
    /// definition (awaited mode) and wires the bus for announcements.
    ///
    /// Returns the subscription handles; dropping them does nothing, pass
    /// them to [`EventBus::unsubscribe`] to detach. The first attached bus
    /// receives the announcements.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) -> Vec<SubscriptionHandle> {
        let _ = self.bus.set(bus.clone());
        self.def
            .trigger_kinds()
            .into_iter()
            .map(|kind| bus.subscribe(kind, Arc::clone(self) as Arc<dyn Subscribe>))
            .collect()
    }

    /// The shared definition this instance runs over.
    pub fn definition(&self) -> &Arc<Definition> {
        &self.def
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the current state.
    pub async fn current(&self) -> Arc<str> {
        let cursor = self.cursor.lock().await;
        self.def.state_at(cursor.at).name_arc()
    }

    /// Name of the previous state, if any transition was applied yet.
    pub async fn previous(&self) -> Option<Arc<str>> {
        let cursor = self.cursor.lock().await;
        cursor.prev.map(|idx| self.def.state_at(idx).name_arc())
    }

    /// Returns `true` when the current state is terminal.
    pub async fn at_terminal(&self) -> bool {
        let cursor = self.cursor.lock().await;
        self.def.state_at(cursor.at).is_terminal()
    }

    /// Time spent in the current state so far.
    pub async fn state_uptime(&self) -> Duration {
        let cursor = self.cursor.lock().await;
        cursor.entered.elapsed()
    }

    /// Number of applied transitions since construction.
    pub async fn steps(&self) -> u64 {
        self.cursor.lock().await.steps
    }

    /// Applies `event` to the instance.
    ///
    /// Runs the full read-evaluate-write sequence under the instance lock:
    /// collect the transitions declared for `(current_state, event.kind)`,
    /// evaluate every guard, then apply if exactly one matched. See the
    /// module docs for the zero/one/many rules.
    pub async fn step(&self, event: &Event) -> Result<Step, MachineError> {
        let mut cursor = self.cursor.lock().await;
        let state = self.def.state_at(cursor.at);

        let mut matched: Vec<usize> = Vec::new();
        for &t_idx in self.def.transitions_from(cursor.at, &event.kind) {
            let transition = self.def.transition_at(t_idx);
            let passes = match transition.guard() {
                Some(guard) => guard.check(state.name(), &event.payload),
                None => true,
            };
            if passes {
                matched.push(t_idx);
            }
        }

        match matched.as_slice() {
            &[] => Ok(Step::Ignored),
            &[t_idx] => {
                let transition = self.def.transition_at(t_idx);
                let from = state.name_arc();
                let to = transition.to_arc();

                cursor.prev = Some(cursor.at);
                cursor.at = transition.to_idx;
                cursor.entered = Instant::now();
                cursor.steps += 1;

                // Built under the lock so announcement seq matches step order.
                let pending = self.pending_announce(&from, &to, event);
                drop(cursor);

                if let Some((bus, announce)) = pending {
                    let kind = announce.kind.clone();
                    bus.publish_detached(announce)
                        .map_err(|source| MachineError::NotifyRejected { kind, source })?;
                }
                Ok(Step::Transitioned { from, to })
            }
            candidates => Err(MachineError::AmbiguousTransition {
                state: state.name_arc(),
                kind: event.kind.clone(),
                candidates: candidates
                    .iter()
                    .map(|&idx| self.def.transition_at(idx).to_arc())
                    .collect(),
            }),
        }
    }

    fn pending_announce(
        &self,
        from: &Arc<str>,
        to: &Arc<str>,
        trigger: &Event,
    ) -> Option<(EventBus, Event)> {
        let kind = self.announce.as_ref()?;
        let bus = self.bus.get()?;
        let announce = Event::new(
            kind.clone(),
            json!({
                "machine": self.name.as_ref(),
                "state": to.as_ref(),
                "previous_state": from.as_ref(),
                "trigger": trigger.kind.as_str(),
            }),
        )
        .with_source(Arc::clone(&self.name))
        .with_correlation(trigger.correlation_root());
        Some((bus.clone(), announce))
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("definition", &self.def.name())
            .field("announce", &self.announce)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Subscribe for Machine {
    async fn on_event(&self, event: &Event, _ctx: CancellationToken) -> Result<(), HandlerError> {
        self.step(event)
            .await
            .map(|_| ())
            .map_err(|err| HandlerError::Fail {
                error: err.to_string(),
            })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_def() -> Arc<Definition> {
        Definition::builder("order")
            .states(["NEW", "PAID", "SHIPPED"])
            .initial("NEW")
            .terminal("SHIPPED")
            .transition("NEW", "payment.received", "PAID")
            .transition_if("PAID", "shipment.dispatched", "SHIPPED", |_, payload| {
                payload.get("carrier").is_some()
            })
            .build()
            .expect("valid definition")
    }

    #[tokio::test]
    async fn test_single_match_is_applied() {
        let machine = Machine::new(order_def());
        assert_eq!(machine.current().await.as_ref(), "NEW");

        let step = machine
            .step(&Event::new("payment.received", json!({"amount": 10})))
            .await
            .expect("unambiguous step");

        assert_eq!(
            step,
            Step::Transitioned {
                from: Arc::from("NEW"),
                to: Arc::from("PAID"),
            }
        );
        assert_eq!(machine.current().await.as_ref(), "PAID");
        assert_eq!(machine.previous().await.as_deref(), Some("NEW"));
        assert_eq!(machine.steps().await, 1);
    }

    #[tokio::test]
    async fn test_unrouted_kind_is_ignored() {
        let machine = Machine::new(order_def());

        let step = machine
            .step(&Event::new("shipment.dispatched", json!({"carrier": "dhl"})))
            .await
            .expect("nothing to do is not an error");

        assert_eq!(step, Step::Ignored);
        assert_eq!(machine.current().await.as_ref(), "NEW");
        assert_eq!(machine.steps().await, 0);
    }

    #[tokio::test]
    async fn test_failed_guard_is_ignored() {
        let machine = Machine::new(order_def())
            .start_in("PAID")
            .expect("PAID is declared");

        let step = machine
            .step(&Event::new("shipment.dispatched", json!({"note": "no carrier"})))
            .await
            .expect("failed guard is not an error");
        assert_eq!(step, Step::Ignored);
        assert_eq!(machine.current().await.as_ref(), "PAID");

        let step = machine
            .step(&Event::new("shipment.dispatched", json!({"carrier": "dhl"})))
            .await
            .expect("guard passes with carrier");
        assert!(matches!(step, Step::Transitioned { .. }));
        assert!(machine.at_terminal().await);
    }

    #[tokio::test]
    async fn test_terminal_without_outgoing_transitions_ignores_triggers() {
        let machine = Machine::new(order_def())
            .start_in("SHIPPED")
            .expect("SHIPPED is declared");

        let step = machine
            .step(&Event::new("payment.received", json!({})))
            .await
            .expect("nothing is declared out of SHIPPED");
        assert_eq!(step, Step::Ignored);
        assert!(machine.at_terminal().await);
    }

    #[tokio::test]
    async fn test_declared_transition_out_of_terminal_is_honored() {
        let def = Definition::builder("returns")
            .states(["NEW", "SHIPPED", "RETURNED"])
            .initial("NEW")
            .terminal("SHIPPED")
            .transition("NEW", "shipment.dispatched", "SHIPPED")
            .transition("SHIPPED", "return.requested", "RETURNED")
            .build()
            .expect("terminal states may declare outgoing transitions");
        let machine = Machine::new(def).start_in("SHIPPED").expect("declared");
        assert!(machine.at_terminal().await);

        let step = machine
            .step(&Event::new("return.requested", json!({})))
            .await
            .expect("declared transition applies even from a terminal state");
        assert!(matches!(step, Step::Transitioned { .. }));
        assert_eq!(machine.current().await.as_ref(), "RETURNED");
    }

    #[tokio::test]
    async fn test_ambiguity_is_detected_not_resolved() {
        let def = Definition::builder("routing")
            .states(["IN", "A", "B"])
            .initial("IN")
            .transition_if("IN", "route", "A", |_, payload| {
                payload.get("weight").is_some()
            })
            .transition_if("IN", "route", "B", |_, payload| {
                payload.get("priority").is_some()
            })
            .build()
            .expect("valid definition");
        let machine = Machine::new(def);

        let err = machine
            .step(&Event::new("route", json!({"weight": 3, "priority": 1})))
            .await
            .expect_err("both guards pass");

        match err {
            MachineError::AmbiguousTransition {
                state, candidates, ..
            } => {
                assert_eq!(state.as_ref(), "IN");
                let names: Vec<&str> = candidates.iter().map(|c| c.as_ref()).collect();
                assert_eq!(names, vec!["A", "B"], "candidates keep declaration order");
            }
            other => panic!("expected AmbiguousTransition, got {other:?}"),
        }
        assert_eq!(machine.current().await.as_ref(), "IN", "state must be unchanged");
        assert_eq!(machine.steps().await, 0);
    }

    #[tokio::test]
    async fn test_state_uptime_resets_when_a_transition_applies() {
        let machine = Machine::new(order_def());
        tokio::time::sleep(Duration::from_millis(30)).await;
        let in_new = machine.state_uptime().await;
        assert!(
            in_new >= Duration::from_millis(25),
            "uptime must accumulate while the state is held: {in_new:?}"
        );

        machine
            .step(&Event::new("payment.received", json!({"amount": 10})))
            .await
            .expect("unambiguous step");

        let in_paid = machine.state_uptime().await;
        assert!(
            in_paid < in_new,
            "entering a state must reset its uptime: {in_paid:?} not below {in_new:?}"
        );
    }

    #[tokio::test]
    async fn test_start_in_unknown_state_is_rejected() {
        let err = Machine::new(order_def())
            .start_in("LIMBO")
            .expect_err("undeclared state");
        assert!(matches!(err, MachineError::UnknownState { state } if state == "LIMBO"));
    }

    #[tokio::test]
    async fn test_instance_naming() {
        let def = order_def();
        let default_name = Machine::new(Arc::clone(&def));
        assert_eq!(default_name.name(), "order");

        let named = Machine::new(def).named("order-42");
        assert_eq!(named.name(), "order-42");
    }

    #[test]
    fn test_debug_render_identifies_the_instance() {
        let machine = Machine::new(order_def()).named("order-42");
        let rendered = format!("{machine:?}");
        assert!(rendered.contains("order-42"), "instance name must show: {rendered}");
        assert!(rendered.contains("announce"), "got: {rendered}");
    }
}
