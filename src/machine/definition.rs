//! # Machine definitions: the validated state/transition graph.
//!
//! A [`Definition`] is immutable and shared: build it once, run any number
//! of [`Machine`](crate::Machine) instances over it. All structural rules
//! are enforced by [`DefinitionBuilder::build`]; a definition that builds
//! is sound at runtime.
//!
//! ## Rules
//! - at least one state, no duplicate names;
//! - exactly one state marked initial (marking the same state twice is fine);
//! - every `initial`/`terminal`/transition reference resolves to a declared
//!   state;
//! - per `(from, trigger)` pair at most one *unconditional* transition;
//!   guarded transitions are unrestricted - overlapping guards are a runtime
//!   ambiguity, not a build error.
//!
//! ## Example
//! ```rust
//! use eventum::Definition;
//!
//! let def = Definition::builder("order")
//!     .states(["NEW", "PAID", "SHIPPED"])
//!     .initial("NEW")
//!     .terminal("SHIPPED")
//!     .transition("NEW", "payment.received", "PAID")
//!     .transition_if("PAID", "shipment.dispatched", "SHIPPED", |_state, payload| {
//!         payload.get("carrier").is_some()
//!     })
//!     .build()
//!     .expect("definition is structurally sound");
//!
//! assert_eq!(def.initial().name(), "NEW");
//! assert_eq!(def.trigger_kinds().len(), 2);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::state::State;
use super::transition::{Guard, Transition};
use crate::error::DefinitionError;
use crate::events::Kind;

/// Immutable state/transition graph shared by machine instances.
#[derive(Debug)]
pub struct Definition {
    name: Arc<str>,
    states: Vec<State>,
    index: HashMap<Arc<str>, usize>,
    transitions: Vec<Transition>,
    /// Per state index: trigger kind → transition indices in declaration order.
    routes: Vec<HashMap<Kind, Vec<usize>>>,
    initial: usize,
}

impl Definition {
    /// Starts building a definition with the given name.
    pub fn builder(name: impl Into<Arc<str>>) -> DefinitionBuilder {
        DefinitionBuilder::new(name)
    }

    /// Definition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared states, in declaration order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The state new instances start in.
    pub fn initial(&self) -> &State {
        &self.states[self.initial]
    }

    /// Looks up a state by name.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.state_idx(name).map(|idx| &self.states[idx])
    }

    /// Declared transitions, in declaration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Distinct trigger kinds, in first-declaration order.
    ///
    /// [`Machine::attach`](crate::Machine::attach) subscribes to exactly
    /// these kinds.
    pub fn trigger_kinds(&self) -> Vec<Kind> {
        let mut kinds: Vec<Kind> = Vec::new();
        for transition in &self.transitions {
            if !kinds.contains(transition.trigger()) {
                kinds.push(transition.trigger().clone());
            }
        }
        kinds
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub(crate) fn initial_idx(&self) -> usize {
        self.initial
    }

    pub(crate) fn state_idx(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn state_at(&self, idx: usize) -> &State {
        &self.states[idx]
    }

    pub(crate) fn transition_at(&self, idx: usize) -> &Transition {
        &self.transitions[idx]
    }

    /// Transition indices declared for `(state, kind)`, in declaration order.
    pub(crate) fn transitions_from(&self, state: usize, kind: &Kind) -> &[usize] {
        self.routes[state]
            .get(kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

struct PendingTransition {
    from: String,
    to: String,
    trigger: Kind,
    guard: Option<Guard>,
}

/// Builder for [`Definition`]; validation happens in [`build`](Self::build).
pub struct DefinitionBuilder {
    name: Arc<str>,
    states: Vec<String>,
    initials: Vec<String>,
    terminals: Vec<String>,
    transitions: Vec<PendingTransition>,
}

impl DefinitionBuilder {
    fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            initials: Vec::new(),
            terminals: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Declares one state.
    pub fn state(mut self, name: impl Into<String>) -> Self {
        self.states.push(name.into());
        self
    }

    /// Declares several states at once, keeping the given order.
    pub fn states<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states.extend(names.into_iter().map(Into::into));
        self
    }

    /// Marks a declared state as the initial one.
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initials.push(name.into());
        self
    }

    /// Marks a declared state as terminal. Repeatable.
    ///
    /// The mark is advisory: it feeds [`State::is_terminal`] and
    /// [`Machine::at_terminal`](crate::Machine::at_terminal), it does not
    /// forbid declaring transitions out of the state.
    pub fn terminal(mut self, name: impl Into<String>) -> Self {
        self.terminals.push(name.into());
        self
    }

    /// Declares an unconditional transition `(from, trigger) → to`.
    pub fn transition(
        self,
        from: impl Into<String>,
        trigger: impl Into<Kind>,
        to: impl Into<String>,
    ) -> Self {
        self.push_transition(from.into(), trigger.into(), to.into(), None)
    }

    /// Declares a guarded transition `(from, trigger) → to`.
    ///
    /// The guard receives the current state name and the trigger payload.
    pub fn transition_if(
        self,
        from: impl Into<String>,
        trigger: impl Into<Kind>,
        to: impl Into<String>,
        guard: impl Fn(&str, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.push_transition(from.into(), trigger.into(), to.into(), Some(Guard::new(guard)))
    }

    /// Declares a guarded transition with a prebuilt [`Guard`].
    ///
    /// Guards are cheap to clone, so one predicate can back several
    /// transitions; [`transition_if`](Self::transition_if) is the closure
    /// shorthand for the one-off case.
    pub fn transition_guarded(
        self,
        from: impl Into<String>,
        trigger: impl Into<Kind>,
        to: impl Into<String>,
        guard: Guard,
    ) -> Self {
        self.push_transition(from.into(), trigger.into(), to.into(), Some(guard))
    }

    fn push_transition(
        mut self,
        from: String,
        trigger: Kind,
        to: String,
        guard: Option<Guard>,
    ) -> Self {
        self.transitions.push(PendingTransition {
            from,
            to,
            trigger,
            guard,
        });
        self
    }

    /// Validates and freezes the definition.
    pub fn build(self) -> Result<Arc<Definition>, DefinitionError> {
        if self.states.is_empty() {
            return Err(DefinitionError::NoStates {
                definition: self.name.to_string(),
            });
        }

        let mut index: HashMap<Arc<str>, usize> = HashMap::with_capacity(self.states.len());
        let mut names: Vec<Arc<str>> = Vec::with_capacity(self.states.len());
        for name in &self.states {
            let arc: Arc<str> = Arc::from(name.as_str());
            if index.insert(Arc::clone(&arc), names.len()).is_some() {
                return Err(DefinitionError::DuplicateState {
                    state: name.clone(),
                });
            }
            names.push(arc);
        }

        let mut initial: Option<usize> = None;
        for mark in &self.initials {
            let idx = *index
                .get(mark.as_str())
                .ok_or_else(|| DefinitionError::UnknownState { state: mark.clone() })?;
            match initial {
                None => initial = Some(idx),
                Some(existing) if existing == idx => {}
                Some(existing) => {
                    return Err(DefinitionError::DuplicateInitial {
                        first: names[existing].to_string(),
                        second: mark.clone(),
                    });
                }
            }
        }
        let initial = initial.ok_or_else(|| DefinitionError::NoInitialState {
            definition: self.name.to_string(),
        })?;

        let mut terminal = vec![false; names.len()];
        for mark in &self.terminals {
            let idx = *index
                .get(mark.as_str())
                .ok_or_else(|| DefinitionError::UnknownState { state: mark.clone() })?;
            terminal[idx] = true;
        }

        let states: Vec<State> = names
            .iter()
            .enumerate()
            .map(|(i, name)| State::new(Arc::clone(name), i == initial, terminal[i]))
            .collect();

        let mut transitions: Vec<Transition> = Vec::with_capacity(self.transitions.len());
        let mut routes: Vec<HashMap<Kind, Vec<usize>>> = vec![HashMap::new(); names.len()];
        for pending in self.transitions {
            let from_idx = *index.get(pending.from.as_str()).ok_or_else(|| {
                DefinitionError::UnknownState {
                    state: pending.from.clone(),
                }
            })?;
            let to_idx = *index.get(pending.to.as_str()).ok_or_else(|| {
                DefinitionError::UnknownState {
                    state: pending.to.clone(),
                }
            })?;

            let t_idx = transitions.len();
            transitions.push(Transition::new(
                Arc::clone(&names[from_idx]),
                Arc::clone(&names[to_idx]),
                pending.trigger.clone(),
                pending.guard,
                to_idx,
            ));
            routes[from_idx]
                .entry(pending.trigger)
                .or_default()
                .push(t_idx);
        }

        for (state_idx, kinds) in routes.iter().enumerate() {
            for (kind, t_idxs) in kinds {
                let unconditional = t_idxs
                    .iter()
                    .filter(|&&i| !transitions[i].is_guarded())
                    .count();
                if unconditional > 1 {
                    return Err(DefinitionError::ConflictingTransitions {
                        state: names[state_idx].to_string(),
                        kind: kind.clone(),
                    });
                }
            }
        }

        Ok(Arc::new(Definition {
            name: self.name,
            states,
            index,
            transitions,
            routes,
            initial,
        }))
    }
}
