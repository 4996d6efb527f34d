//! The `Machine` aggregate
//!
//! A [`Machine`] owns one [`Llfsm`] plus everything the editor format stores
//! alongside it: the language binding tag, layout maps, the opaque window
//! layout blob, an optional include search path, and the user-editable
//! boilerplate sections. Machines have no implicit persistence; the codec
//! serializes them on demand.

use std::collections::{BTreeMap, HashMap};

use crate::binding::Format;
use crate::fsm::Llfsm;
use crate::id::{StateId, TransitionId};
use crate::layout::{StateLayout, TransitionLayout};

/// User-editable free-text insertion points, machine-level and per-state.
///
/// Sections are keyed by the section names the language binding declares.
/// A missing section reads as empty text, never as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boilerplate {
    /// Machine-level sections, keyed by section name.
    pub machine: BTreeMap<String, String>,
    /// Per-state sections, keyed by state, then section name.
    pub states: HashMap<StateId, BTreeMap<String, String>>,
}

impl Boilerplate {
    /// Text of a machine-level section (empty if absent).
    pub fn machine_section(&self, section: &str) -> &str {
        self.machine.get(section).map(String::as_str).unwrap_or("")
    }

    /// Text of a per-state section (empty if absent).
    pub fn state_section(&self, state: StateId, section: &str) -> &str {
        self.states
            .get(&state)
            .and_then(|sections| sections.get(section))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_machine_section(&mut self, section: impl Into<String>, text: impl Into<String>) {
        self.machine.insert(section.into(), text.into());
    }

    pub fn set_state_section(
        &mut self,
        state: StateId,
        section: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.states
            .entry(state)
            .or_default()
            .insert(section.into(), text.into());
    }
}

/// A machine: one LLFSM plus its presentation and boilerplate payload.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    pub name: String,
    pub llfsm: Llfsm,
    /// Language binding this machine was last (or will next be) serialized in.
    pub format: Format,
    pub state_layouts: HashMap<StateId, StateLayout>,
    pub transition_layouts: HashMap<TransitionId, TransitionLayout>,
    /// Opaque editor window-layout blob, written back verbatim when present.
    pub window_layout: Option<Vec<u8>>,
    /// Extra include search path (`IncludePath` member), verbatim.
    pub include_path: Option<String>,
    pub boilerplate: Boilerplate,
}

impl Machine {
    /// A fresh, empty machine in the given format.
    pub fn new(name: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            format,
            ..Self::default()
        }
    }

    /// A machine wrapping an existing LLFSM.
    pub fn with_llfsm(name: impl Into<String>, format: Format, llfsm: Llfsm) -> Self {
        Self {
            name: name.into(),
            format,
            llfsm,
            ..Self::default()
        }
    }
}
