//! Objective-C++ language binding
//!
//! Covers the MiCASE editor format: the binding owns the boilerplate section
//! set (`<Name>_Variables.h`, `<Name>_Methods.h`, per-state action `.mm`
//! files) so hand-written sections survive conversion. Code emission is a
//! deliberate no-op — the CLMachine runtime sources that accompany this
//! format are pre-existing artifacts, not produced here.

use crate::names::sanitize_identifier;

use super::{Format, OutputLanguage};

pub struct ObjCppBinding;

impl OutputLanguage for ObjCppBinding {
    fn format(&self) -> Format {
        Format::ObjCpp
    }

    fn machine_sections(&self) -> &'static [&'static str] {
        &["Variables", "Methods"]
    }

    fn state_sections(&self) -> &'static [&'static str] {
        &[
            "Variables",
            "Methods",
            "OnEntry",
            "OnExit",
            "Internal",
            "OnSuspend",
            "OnResume",
        ]
    }

    fn machine_section_file(&self, machine: &str, section: &str) -> String {
        format!("{}_{section}.h", sanitize_identifier(machine))
    }

    fn state_section_file(&self, state: &str, section: &str) -> String {
        let extension = match section {
            "Variables" | "Methods" => "h",
            _ => "mm",
        };
        format!("State_{}_{section}.{extension}", sanitize_identifier(state))
    }
}
