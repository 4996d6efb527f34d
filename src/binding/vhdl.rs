//! VHDL-oriented language binding
//!
//! The VHDL toolchain keeps transitions purely as external per-state files
//! it interprets itself: `expression,targetUUID` lines, resolved against the
//! persisted state identifiers rather than state names. The binding
//! therefore overrides the transition-line codec and asks the directory
//! codec to persist state identifiers alongside the state list. It emits no
//! generated code members.

use std::str::FromStr;

use uuid::Uuid;

use crate::fsm::{Llfsm, Transition};
use crate::id::StateId;

use super::{Format, OutputLanguage, StateRefs, TransitionParseError};

pub struct VhdlBinding;

impl OutputLanguage for VhdlBinding {
    fn format(&self) -> Format {
        Format::Vhdl
    }

    fn encode_transition(&self, transition: &Transition, _fsm: &Llfsm) -> String {
        format!("{},{}", transition.label, transition.target)
    }

    fn decode_transition(
        &self,
        line: &str,
        refs: &StateRefs,
    ) -> Result<(String, StateId), TransitionParseError> {
        let (label, target) = line
            .rsplit_once(',')
            .ok_or(TransitionParseError::MissingSeparator)?;
        let target = target.trim();
        let uuid = Uuid::from_str(target)
            .map_err(|_| TransitionParseError::InvalidUuid(target.to_string()))?;
        let id = refs
            .by_uuid
            .get(&uuid)
            .ok_or_else(|| TransitionParseError::UnknownTarget(target.to_string()))?;
        Ok((label.trim().to_string(), *id))
    }

    fn persists_state_ids(&self) -> bool {
        true
    }
}
