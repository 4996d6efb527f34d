//! Conversion orchestration
//!
//! Resolves and validates a set of input machine directories, then drives
//! the codec and the selected binding to produce either a re-serialized
//! single machine or an arrangement. All validation happens before any
//! output is written; a bad format or a missing input never leaves a
//! partial tree behind.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::arrangement::{Arrangement, Instance};
use crate::binding::{binding_for, EmitOptions, Format};
use crate::codec::{load_machine, machine_name_of, save_arrangement, save_machine};
use crate::error::{Error, Result};
use crate::machine::Machine;

pub const MACHINE_SUFFIX: &str = ".machine";

/// What a conversion run should produce, and where.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Requested output format; `None` keeps the first input's language.
    pub format: Option<Format>,
    /// Force arrangement output even for a single input.
    pub arrangement: bool,
    pub suspensible: bool,
    pub introspectable: bool,
    pub output: PathBuf,
}

/// Totals over everything a conversion run consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub machines: usize,
    pub states: usize,
    pub transitions: usize,
}

/// Resolve an input path, retrying with the `.machine` suffix appended.
fn resolve_input(input: &Path) -> Result<PathBuf> {
    if input.is_dir() {
        return Ok(input.to_path_buf());
    }
    let mut with_suffix = input.as_os_str().to_owned();
    with_suffix.push(MACHINE_SUFFIX);
    let with_suffix = PathBuf::from(with_suffix);
    if with_suffix.is_dir() {
        return Ok(with_suffix);
    }
    Err(Error::MissingInput(input.display().to_string()))
}

/// Directory name an input is embedded under inside an arrangement.
fn type_file_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("Machine{MACHINE_SUFFIX}"))
}

/// Disambiguate a type-file name against those already taken, suffixing
/// `_1`, `_2`, … before the `.machine` extension in encounter order.
fn disambiguate(type_file: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(type_file) {
        return type_file.to_string();
    }
    let stem = type_file
        .strip_suffix(MACHINE_SUFFIX)
        .unwrap_or(type_file);
    let mut n = 1usize;
    loop {
        let candidate = format!("{stem}_{n}{MACHINE_SUFFIX}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Convert one or more machine directories per the requested options.
///
/// A single input without the arrangement flag is re-serialized as a lone
/// machine; anything else becomes an arrangement with one named instance
/// per input. Inputs resolving to the same directory share one loaded
/// machine, so identical type files are embedded once.
pub fn convert(inputs: &[PathBuf], options: &ConversionOptions) -> Result<Summary> {
    if inputs.is_empty() {
        return Err(Error::MissingInput("no input machines given".to_string()));
    }
    let resolved: Vec<PathBuf> = inputs
        .iter()
        .map(|input| resolve_input(input))
        .collect::<Result<_>>()?;

    let emit = EmitOptions {
        suspensible: options.suspensible,
        introspectable: options.introspectable,
    };

    // Inputs naming the same directory load once and share the machine.
    let mut loaded: Vec<(PathBuf, String, Arc<Machine>)> = Vec::new();
    let mut taken = BTreeSet::new();
    for path in &resolved {
        if let Some((_, type_file, machine)) = loaded.iter().find(|(p, _, _)| p == path) {
            let (type_file, machine) = (type_file.clone(), Arc::clone(machine));
            loaded.push((path.clone(), type_file, machine));
            continue;
        }
        let machine = Arc::new(load_machine(path, options.format)?);
        let type_file = disambiguate(&type_file_of(path), &taken);
        taken.insert(type_file.clone());
        loaded.push((path.clone(), type_file, machine));
    }

    let format = options
        .format
        .unwrap_or_else(|| loaded[0].2.format);
    let binding = binding_for(format);

    let mut summary = Summary::default();
    let mut counted: BTreeSet<&str> = BTreeSet::new();
    for (_, type_file, machine) in &loaded {
        if counted.insert(type_file.as_str()) {
            summary.machines += 1;
            summary.states += machine.llfsm.states().len();
            summary.transitions += machine.llfsm.transitions().len();
        }
    }

    if loaded.len() == 1 && !options.arrangement {
        let (_, _, machine) = &loaded[0];
        let mut machine = Machine::clone(machine.as_ref());
        machine.format = format;
        save_machine(&machine, &options.output, &emit)?;
        info!(output = %options.output.display(), format = %format, "wrote machine");
        return Ok(summary);
    }

    let instances: Vec<Instance> = loaded
        .into_iter()
        .map(|(path, type_file, machine)| {
            Instance::new(machine_name_of(&path), type_file, machine)
        })
        .collect();
    let arrangement = Arrangement::new(instances);
    save_arrangement(&arrangement, binding, &options.output, &emit)?;
    info!(
        output = %options.output.display(),
        format = %format,
        instances = arrangement.instances.len(),
        "wrote arrangement"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::codec::load_arrangement;
    use crate::fsm::Llfsm;

    fn write_fixture(dir: &Path, name: &str) -> PathBuf {
        let mut fsm = Llfsm::from_state_names(["Red", "Green"]);
        let (red, green) = (fsm.states()[0], fsm.states()[1]);
        fsm.attach_transition("timer", red, green).unwrap();
        fsm.attach_transition("timer", green, red).unwrap();
        let machine = Machine::with_llfsm(name, Format::C, fsm);
        let path = dir.join(format!("{name}{MACHINE_SUFFIX}"));
        save_machine(&machine, &path, &EmitOptions::default()).unwrap();
        path
    }

    fn options(output: PathBuf) -> ConversionOptions {
        ConversionOptions {
            format: None,
            arrangement: false,
            suspensible: true,
            introspectable: false,
            output,
        }
    }

    #[test]
    fn missing_input_fails_before_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.machine");
        let result = convert(&[dir.path().join("Nowhere")], &options(output.clone()));
        assert!(matches!(result, Err(Error::MissingInput(_))));
        assert!(!output.exists());
    }

    #[test]
    fn machine_suffix_is_retried() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path(), "Traffic");
        let output = dir.path().join("out.machine");

        // Input path without the .machine suffix.
        let summary = convert(&[dir.path().join("Traffic")], &options(output.clone())).unwrap();
        assert_eq!(
            summary,
            Summary {
                machines: 1,
                states: 2,
                transitions: 2,
            }
        );
        assert!(output.join("States").exists());
    }

    #[test]
    fn single_input_reserializes_one_machine() {
        let dir = TempDir::new().unwrap();
        let input = write_fixture(dir.path(), "Traffic");
        let output = dir.path().join("out.machine");

        convert(&[input], &options(output.clone())).unwrap();
        let machine = load_machine(&output, None).unwrap();
        assert_eq!(machine.llfsm.states().len(), 2);
        assert!(!output.join("Machines").exists());
    }

    #[test]
    fn multiple_inputs_become_an_arrangement() {
        let dir = TempDir::new().unwrap();
        let a = write_fixture(dir.path(), "Traffic");
        let b = write_fixture(dir.path(), "Signals");
        let output = dir.path().join("out.arrangement");

        let summary = convert(&[a, b], &options(output.clone())).unwrap();
        assert_eq!(summary.machines, 2);

        let arrangement = load_arrangement(&output, None).unwrap();
        let names: Vec<&str> = arrangement
            .instances
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, ["Traffic", "Signals"]);
    }

    #[test]
    fn repeated_input_is_embedded_once() {
        let dir = TempDir::new().unwrap();
        let input = write_fixture(dir.path(), "Traffic");
        let output = dir.path().join("out.arrangement");

        let summary = convert(&[input.clone(), input], &options(output.clone())).unwrap();
        assert_eq!(summary.machines, 1);
        assert_eq!(summary.states, 2);

        let arrangement = load_arrangement(&output, None).unwrap();
        assert_eq!(arrangement.instances.len(), 2);
        assert!(Arc::ptr_eq(
            &arrangement.instances[0].machine,
            &arrangement.instances[1].machine
        ));
    }

    #[test]
    fn arrangement_flag_forces_arrangement_for_one_input() {
        let dir = TempDir::new().unwrap();
        let input = write_fixture(dir.path(), "Traffic");
        let output = dir.path().join("out.arrangement");

        let mut opts = options(output.clone());
        opts.arrangement = true;
        convert(&[input], &opts).unwrap();
        assert!(output.join("Machines").exists());
    }

    #[test]
    fn name_collisions_on_distinct_inputs_are_suffixed() {
        let dir = TempDir::new().unwrap();
        let left = dir.path().join("left");
        let right = dir.path().join("right");
        std::fs::create_dir_all(&left).unwrap();
        std::fs::create_dir_all(&right).unwrap();
        let a = write_fixture(&left, "Traffic");
        let b = write_fixture(&right, "Traffic");
        let output = dir.path().join("out.arrangement");

        convert(&[a, b], &options(output.clone())).unwrap();
        let arrangement = load_arrangement(&output, None).unwrap();
        let type_files: Vec<&str> = arrangement
            .instances
            .iter()
            .map(|i| i.type_file.as_str())
            .collect();
        assert_eq!(type_files, ["Traffic.machine", "Traffic_1.machine"]);
    }

    #[test]
    fn requested_format_overrides_input_language() {
        let dir = TempDir::new().unwrap();
        let input = write_fixture(dir.path(), "Traffic");
        let output = dir.path().join("out.machine");

        let mut opts = options(output.clone());
        opts.format = Some(Format::ObjCpp);
        convert(&[input], &opts).unwrap();
        assert_eq!(
            std::fs::read_to_string(output.join("Language")).unwrap(),
            "objc++"
        );
    }
}
