//! Language bindings — the pluggable code emitters
//!
//! An [`OutputLanguage`] converts machines and arrangements into generated
//! source members and owns the binding-specific parts of the directory
//! format (boilerplate section names, transition-line encoding). Operations
//! a binding does not implement are no-ops by contract, never a failure:
//! callers must not assume an operation produces output.

mod c;
mod objcpp;
mod vhdl;

pub use c::CBinding;
pub use objcpp::ObjCppBinding;
pub use vhdl::VhdlBinding;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::arrangement::Arrangement;
use crate::error::{Error, Result};
use crate::filetree::FileTree;
use crate::fsm::{Llfsm, Transition};
use crate::id::StateId;
use crate::machine::Machine;

/// The known output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    C,
    ObjCpp,
    Vhdl,
}

impl Format {
    /// Lowercase identifier, as written to the `Language` member.
    pub fn name(&self) -> &'static str {
        match self {
            Format::C => "c",
            Format::ObjCpp => "objc++",
            Format::Vhdl => "vhdl",
        }
    }

    pub fn all() -> &'static [Format] {
        &[Format::C, Format::ObjCpp, Format::Vhdl]
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "c" => Ok(Format::C),
            "objc++" | "objcpp" | "objcxx" => Ok(Format::ObjCpp),
            "vhdl" => Ok(Format::Vhdl),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Options a caller passes down to the emitters.
#[derive(Debug, Clone, Copy)]
pub struct EmitOptions {
    /// Emit suspend/resume plumbing.
    pub suspensible: bool,
    /// Emit state-name introspection data.
    pub introspectable: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            suspensible: true,
            introspectable: false,
        }
    }
}

/// Target-state lookup tables offered to transition decoders.
///
/// The generic codec resolves targets by state name; the VHDL binding
/// resolves by persisted UUID.
#[derive(Debug, Default)]
pub struct StateRefs {
    pub by_name: BTreeMap<String, StateId>,
    pub by_uuid: BTreeMap<Uuid, StateId>,
}

impl StateRefs {
    /// Reference table over a machine's current states and identifiers.
    pub fn from_llfsm(fsm: &Llfsm) -> Self {
        let mut refs = Self::default();
        for &id in fsm.states() {
            if let Some(name) = fsm.state_name(id) {
                refs.by_name.insert(name.to_string(), id);
            }
            refs.by_uuid.insert(id.as_uuid(), id);
        }
        refs
    }
}

/// Why a transition line failed to decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionParseError {
    #[error("missing ',' separator")]
    MissingSeparator,
    #[error("unknown target state '{0}'")]
    UnknownTarget(String),
    #[error("invalid target UUID '{0}'")]
    InvalidUuid(String),
}

/// Capability interface implemented by each target language.
pub trait OutputLanguage: Sync {
    fn format(&self) -> Format;

    /// Lowercase identifier written to the `Language` member.
    fn name(&self) -> &'static str {
        self.format().name()
    }

    /// Machine-level boilerplate section names, in declaration order.
    fn machine_sections(&self) -> &'static [&'static str] {
        &[]
    }

    /// Per-state boilerplate section names, in declaration order.
    fn state_sections(&self) -> &'static [&'static str] {
        &[]
    }

    /// File name persisting a machine-level boilerplate section.
    fn machine_section_file(&self, machine: &str, section: &str) -> String {
        format!("Machine_{machine}_{section}")
    }

    /// File name persisting a per-state boilerplate section.
    fn state_section_file(&self, state: &str, section: &str) -> String {
        format!("STATE_{state}_{section}")
    }

    /// Encode one line of a `STATE_<Name>_Transitions` member.
    ///
    /// The generic form is `expression,targetName`; bindings may override
    /// (the VHDL binding writes `expression,targetUUID`).
    fn encode_transition(&self, transition: &Transition, fsm: &Llfsm) -> String {
        let target = fsm.state_name(transition.target).unwrap_or_default();
        format!("{},{}", transition.label, target)
    }

    /// Decode one transition line into its label and resolved target.
    fn decode_transition(
        &self,
        line: &str,
        refs: &StateRefs,
    ) -> std::result::Result<(String, StateId), TransitionParseError> {
        // The expression is opaque and may itself contain commas; the target
        // reference is everything after the last one.
        let (label, target) = line
            .rsplit_once(',')
            .ok_or(TransitionParseError::MissingSeparator)?;
        let target = target.trim();
        let id = refs
            .by_name
            .get(target)
            .ok_or_else(|| TransitionParseError::UnknownTarget(target.to_string()))?;
        Ok((label.trim().to_string(), *id))
    }

    /// Whether this binding persists state identifiers alongside the state
    /// list. UUID-addressed transition targets need them on re-read.
    fn persists_state_ids(&self) -> bool {
        false
    }

    /// Add generated per-machine source members to the machine directory.
    fn add_machine_code(
        &self,
        _tree: &mut FileTree,
        _machine: &Machine,
        _options: &EmitOptions,
    ) -> Result<()> {
        Ok(())
    }

    /// Add arrangement-level interface/implementation/build members.
    fn add_arrangement_code(
        &self,
        _tree: &mut FileTree,
        _arrangement: &Arrangement,
        _options: &EmitOptions,
    ) -> Result<()> {
        Ok(())
    }
}

static C_BINDING: CBinding = CBinding;
static OBJCPP_BINDING: ObjCppBinding = ObjCppBinding;
static VHDL_BINDING: VhdlBinding = VhdlBinding;

/// The registered emitter for a format.
pub fn binding_for(format: Format) -> &'static dyn OutputLanguage {
    match format {
        Format::C => &C_BINDING,
        Format::ObjCpp => &OBJCPP_BINDING,
        Format::Vhdl => &VHDL_BINDING,
    }
}
