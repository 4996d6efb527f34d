//! Logic-labelled finite state machine entity model
//!
//! An [`Llfsm`] owns its states and transitions and keeps both in insertion
//! order. Order matters in exactly two places: the default initial state is
//! the first inserted state, and code generation emits states and per-state
//! transitions in this order. Transition labels are opaque guard expressions;
//! nothing in this crate parses or validates them.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::id::{StateId, TransitionId};

/// Name given to the state synthesized when an initial state is assigned to
/// an empty machine.
pub const SYNTHESIZED_INITIAL_NAME: &str = "Initial";

/// A named state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub id: StateId,
    pub name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: StateId::fresh(),
            name: name.into(),
        }
    }
}

/// A directed edge between two states, labelled with an opaque guard
/// expression consumed verbatim by the code emitters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: TransitionId,
    pub label: String,
    pub source: StateId,
    pub target: StateId,
}

/// A logic-labelled finite state machine.
#[derive(Debug, Clone, Default)]
pub struct Llfsm {
    states: Vec<StateId>,
    transitions: Vec<TransitionId>,
    state_map: HashMap<StateId, State>,
    transition_map: HashMap<TransitionId, Transition>,
    initial_state: Option<StateId>,
    suspend_state: Option<StateId>,
}

impl Llfsm {
    /// An empty machine. Assigning an initial state synthesizes one state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Construct a machine from an ordered list of state names.
    ///
    /// The first state becomes the initial state.
    pub fn from_state_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fsm = Self::empty();
        for name in names {
            fsm.add_state(name);
        }
        fsm
    }

    /// Ordered state identifiers.
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    /// Ordered transition identifiers (attachment order).
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.state_map.get(&id)
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transition_map.get(&id)
    }

    /// Name of a member state.
    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.state_map.get(&id).map(|s| s.name.as_str())
    }

    /// Look up a state by name (first match in insertion order).
    pub fn state_named(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .copied()
            .find(|id| self.state_name(*id) == Some(name))
    }

    /// Ordinal of a state within the canonical ordering.
    pub fn state_index(&self, id: StateId) -> Option<usize> {
        self.states.iter().position(|s| *s == id)
    }

    /// Append a fresh state.
    pub fn add_state(&mut self, name: impl Into<String>) -> StateId {
        let state = State::new(name);
        let id = state.id;
        self.states.push(id);
        self.state_map.insert(id, state);
        id
    }

    /// Attach a transition between two member states.
    ///
    /// Fails if either endpoint is not a member of this machine.
    pub fn attach_transition(
        &mut self,
        label: impl Into<String>,
        source: StateId,
        target: StateId,
    ) -> Result<TransitionId> {
        for endpoint in [source, target] {
            if !self.state_map.contains_key(&endpoint) {
                return Err(Error::UnknownState(endpoint.to_string()));
            }
        }
        let transition = Transition {
            id: TransitionId::fresh(),
            label: label.into(),
            source,
            target,
        };
        let id = transition.id;
        self.transitions.push(id);
        self.transition_map.insert(id, transition);
        Ok(id)
    }

    /// The designated initial state: explicitly set, or the first state.
    pub fn initial_state(&self) -> Option<StateId> {
        self.initial_state.or_else(|| self.states.first().copied())
    }

    /// Designate the initial state.
    ///
    /// On an empty machine this synthesizes exactly one state carrying the
    /// given identifier. On a non-empty machine the identifier must already
    /// be a member.
    pub fn set_initial_state(&mut self, id: StateId) -> Result<()> {
        if self.states.is_empty() {
            self.states.push(id);
            self.state_map.insert(
                id,
                State {
                    id,
                    name: SYNTHESIZED_INITIAL_NAME.to_string(),
                },
            );
        } else if !self.state_map.contains_key(&id) {
            return Err(Error::UnknownState(id.to_string()));
        }
        self.initial_state = Some(id);
        Ok(())
    }

    pub fn suspend_state(&self) -> Option<StateId> {
        self.suspend_state
    }

    /// Designate (or clear) the suspend state; must be a member when set.
    pub fn set_suspend_state(&mut self, id: Option<StateId>) -> Result<()> {
        if let Some(id) = id {
            if !self.state_map.contains_key(&id) {
                return Err(Error::UnknownState(id.to_string()));
            }
        }
        self.suspend_state = id;
        Ok(())
    }

    /// Outgoing transitions of a state, in attachment order.
    pub fn transitions_from(&self, state: StateId) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter_map(|id| self.transition_map.get(id))
            .filter(|t| t.source == state)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_initial_state_is_first() {
        let fsm = Llfsm::from_state_names(["Red", "Green"]);
        assert_eq!(fsm.initial_state(), Some(fsm.states()[0]));
        assert_eq!(fsm.state_name(fsm.states()[0]), Some("Red"));
    }

    #[test]
    fn empty_machine_synthesizes_initial_state() {
        let mut fsm = Llfsm::empty();
        let id = StateId::fresh();
        fsm.set_initial_state(id).unwrap();
        assert_eq!(fsm.states(), &[id]);
        assert_eq!(fsm.initial_state(), Some(id));
        assert_eq!(fsm.state_name(id), Some(SYNTHESIZED_INITIAL_NAME));
    }

    #[test]
    fn set_initial_state_rejects_non_member() {
        let mut fsm = Llfsm::from_state_names(["Only"]);
        assert!(fsm.set_initial_state(StateId::fresh()).is_err());
    }

    #[test]
    fn transitions_from_preserves_attachment_order() {
        let mut fsm = Llfsm::from_state_names(["A", "B", "C"]);
        let (a, b, c) = (fsm.states()[0], fsm.states()[1], fsm.states()[2]);
        fsm.attach_transition("second", a, c).unwrap();
        fsm.attach_transition("noise", b, a).unwrap();
        fsm.attach_transition("first", a, b).unwrap();

        let from_a: Vec<&str> = fsm
            .transitions_from(a)
            .iter()
            .map(|t| t.label.as_str())
            .collect();
        assert_eq!(from_a, ["second", "first"]);
    }

    #[test]
    fn attach_transition_rejects_foreign_states() {
        let mut fsm = Llfsm::from_state_names(["A"]);
        let a = fsm.states()[0];
        assert!(fsm.attach_transition("x", a, StateId::fresh()).is_err());
    }

    #[test]
    fn suspend_state_must_be_member() {
        let mut fsm = Llfsm::from_state_names(["A", "B"]);
        let b = fsm.states()[1];
        fsm.set_suspend_state(Some(b)).unwrap();
        assert_eq!(fsm.suspend_state(), Some(b));
        assert!(fsm.set_suspend_state(Some(StateId::fresh())).is_err());
        fsm.set_suspend_state(None).unwrap();
        assert_eq!(fsm.suspend_state(), None);
    }
}
