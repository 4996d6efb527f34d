//! Machine directory codec
//!
//! Bidirectional mapping between a [`Machine`] and a directory tree. State
//! names are the durable on-disk key; identifiers are assigned fresh, in
//! `States` file order, on every read. Reads are best-effort: a malformed
//! transition line is reported and dropped rather than failing the whole
//! machine, because hand-edited directories are expected to be occasionally
//! inconsistent.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::binding::{binding_for, EmitOptions, Format, OutputLanguage, StateRefs};
use crate::error::{Error, Result};
use crate::filetree::FileTree;
use crate::fsm::Llfsm;
use crate::id::TransitionId;
use crate::layout::{transition_key, LayoutDocument};
use crate::machine::Machine;

use super::{
    transitions_file, FORMAT_VERSION, INCLUDE_PATH_FILE, LANGUAGE_FILE, LAYOUT_FILE,
    STATES_FILE, STATE_IDS_FILE, SUSPEND_STATE_FILE, VERSION_FILE, WINDOW_LAYOUT_FILE,
};

/// Serialize a machine into a directory tree under the given binding.
pub fn encode_machine(
    machine: &Machine,
    binding: &dyn OutputLanguage,
    options: &EmitOptions,
) -> Result<FileTree> {
    let fsm = &machine.llfsm;
    let mut tree = FileTree::new();

    tree.insert_text(VERSION_FILE, FORMAT_VERSION);
    tree.insert_text(LANGUAGE_FILE, binding.name());

    let state_names: Vec<&str> = fsm
        .states()
        .iter()
        .filter_map(|&id| fsm.state_name(id))
        .collect();
    if let Some(duplicate) = first_duplicate(&state_names) {
        return Err(Error::MalformedMachine {
            path: machine.name.clone(),
            reason: format!("duplicate state name '{duplicate}'"),
        });
    }
    tree.insert_text(STATES_FILE, format!("{}\n", state_names.join("\n")));

    if let Some(suspend) = fsm.suspend_state().and_then(|id| fsm.state_name(id)) {
        tree.insert_text(SUSPEND_STATE_FILE, format!("{suspend}\n"));
    }

    if binding.persists_state_ids() {
        let ids: Vec<String> = fsm.states().iter().map(|id| id.to_string()).collect();
        tree.insert_text(STATE_IDS_FILE, format!("{}\n", ids.join("\n")));
    }

    for &state_id in fsm.states() {
        let Some(name) = fsm.state_name(state_id) else {
            continue;
        };
        let lines: Vec<String> = fsm
            .transitions_from(state_id)
            .iter()
            .map(|transition| binding.encode_transition(transition, fsm))
            .collect();
        let content = if lines.is_empty() {
            String::new()
        } else {
            format!("{}\n", lines.join("\n"))
        };
        tree.insert_text(transitions_file(name), content);
    }

    let layout = layout_document(machine);
    if !layout.is_empty() {
        tree.insert_file(LAYOUT_FILE, layout.to_plist_bytes()?);
    }
    if let Some(window_layout) = &machine.window_layout {
        tree.insert_file(WINDOW_LAYOUT_FILE, window_layout.clone());
    }
    if let Some(include_path) = &machine.include_path {
        tree.insert_text(INCLUDE_PATH_FILE, include_path.clone());
    }

    write_boilerplate(&mut tree, machine, binding);
    binding.add_machine_code(&mut tree, machine, options)?;
    Ok(tree)
}

/// Reconstruct a machine from a directory tree.
///
/// `origin` is the path the tree came from, used only for error context.
/// A missing `Language` member falls back to `default_format`, or errors
/// when none is supplied.
pub fn decode_machine(
    tree: &FileTree,
    name: &str,
    origin: &str,
    default_format: Option<Format>,
) -> Result<Machine> {
    let format = match tree.text(LANGUAGE_FILE) {
        Some(language) => Format::from_str(language.trim())?,
        None => default_format.ok_or_else(|| Error::MissingLanguage(origin.to_string()))?,
    };
    let binding = binding_for(format);

    let states_text = tree.text(STATES_FILE).ok_or_else(|| Error::MalformedMachine {
        path: origin.to_string(),
        reason: format!("missing {STATES_FILE} member"),
    })?;
    let state_names: Vec<String> = states_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if state_names.is_empty() {
        return Err(Error::MalformedMachine {
            path: origin.to_string(),
            reason: format!("{STATES_FILE} member lists no states"),
        });
    }
    if let Some(duplicate) = first_duplicate(&state_names) {
        return Err(Error::MalformedMachine {
            path: origin.to_string(),
            reason: format!("duplicate state name '{duplicate}'"),
        });
    }

    let mut fsm = Llfsm::from_state_names(state_names.iter().cloned());
    let refs = state_refs(&fsm, tree, binding);

    for state_name in &state_names {
        let Some(source) = fsm.state_named(state_name) else {
            continue;
        };
        let Some(content) = tree.text(&transitions_file(state_name)) else {
            continue;
        };
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match binding.decode_transition(line, &refs) {
                Ok((label, target)) => {
                    fsm.attach_transition(label, source, target)?;
                }
                Err(parse_error) => {
                    let error = Error::MalformedTransition {
                        state: state_name.clone(),
                        path: origin.to_string(),
                        line: line.to_string(),
                    };
                    warn!(%error, %parse_error, "dropping malformed transition");
                }
            }
        }
    }

    if let Some(suspend_name) = tree.text(SUSPEND_STATE_FILE) {
        let suspend_name = suspend_name.trim().to_string();
        match fsm.state_named(&suspend_name) {
            Some(id) => fsm.set_suspend_state(Some(id))?,
            None => warn!(
                state = %suspend_name,
                path = origin,
                "suspend state not in state list; ignoring"
            ),
        }
    }

    let mut machine = Machine::with_llfsm(name, format, fsm);
    read_layout(&mut machine, tree, origin)?;
    machine.window_layout = tree.file(WINDOW_LAYOUT_FILE).map(<[u8]>::to_vec);
    machine.include_path = tree.text(INCLUDE_PATH_FILE);
    read_boilerplate(&mut machine, tree, binding);

    debug!(
        machine = name,
        states = machine.llfsm.states().len(),
        transitions = machine.llfsm.transitions().len(),
        "loaded machine"
    );
    Ok(machine)
}

/// Serialize a machine to a directory on disk.
pub fn save_machine(machine: &Machine, path: &Path, options: &EmitOptions) -> Result<()> {
    let binding = binding_for(machine.format);
    encode_machine(machine, binding, options)?.write_to(path)
}

/// Load a machine from a directory on disk. The machine's name is the
/// directory's base name without its `.machine` extension.
pub fn load_machine(path: &Path, default_format: Option<Format>) -> Result<Machine> {
    let name = machine_name_of(path);
    let tree = FileTree::read_from(path)?;
    decode_machine(&tree, &name, &path.display().to_string(), default_format)
}

/// Base name of a machine directory, without the `.machine` extension.
pub fn machine_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Machine".to_string())
}

/// First name appearing more than once. State names derive member file
/// names, so two states sharing a name would silently collapse onto one
/// `STATE_<Name>_Transitions` member.
fn first_duplicate<S: AsRef<str>>(names: &[S]) -> Option<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.as_ref())
        .find(|&name| !seen.insert(name))
}

fn state_refs(fsm: &Llfsm, tree: &FileTree, binding: &dyn OutputLanguage) -> StateRefs {
    let mut refs = StateRefs::from_llfsm(fsm);
    if binding.persists_state_ids() {
        if let Some(ids_text) = tree.text(STATE_IDS_FILE) {
            // Persisted identifiers line up with the States member; map each
            // onto the freshly assigned identifier at the same position.
            for (line, &fresh) in ids_text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .zip(fsm.states())
            {
                if let Ok(uuid) = Uuid::from_str(line) {
                    refs.by_uuid.insert(uuid, fresh);
                }
            }
        }
    }
    refs
}

/// Transitions in the order a decoder reconstructs them: for each state in
/// canonical order, its outgoing transitions in attachment order. Layout
/// keys are ordinal, so writer and reader must enumerate identically.
fn canonical_transition_order(fsm: &Llfsm) -> Vec<TransitionId> {
    fsm.states()
        .iter()
        .flat_map(|&state| {
            fsm.transitions_from(state)
                .into_iter()
                .map(|transition| transition.id)
        })
        .collect()
}

fn layout_document(machine: &Machine) -> LayoutDocument {
    let fsm = &machine.llfsm;
    let mut document = LayoutDocument::default();
    for (&state_id, layout) in &machine.state_layouts {
        if let Some(name) = fsm.state_name(state_id) {
            document.states.insert(name.to_string(), *layout);
        }
    }
    for (index, transition_id) in canonical_transition_order(fsm).into_iter().enumerate() {
        if let Some(layout) = machine.transition_layouts.get(&transition_id) {
            document.transitions.insert(transition_key(index), *layout);
        }
    }
    document
}

fn read_layout(machine: &mut Machine, tree: &FileTree, origin: &str) -> Result<()> {
    let Some(bytes) = tree.file(LAYOUT_FILE) else {
        return Ok(());
    };
    let document = match LayoutDocument::from_plist_bytes(bytes) {
        Ok(document) => document,
        Err(error) => {
            warn!(%error, path = origin, "unreadable layout; using defaults");
            return Ok(());
        }
    };
    for (name, layout) in &document.states {
        if let Some(id) = machine.llfsm.state_named(name) {
            machine.state_layouts.insert(id, *layout);
        } else {
            warn!(state = %name, path = origin, "layout for unknown state; ignoring");
        }
    }
    let ordered = canonical_transition_order(&machine.llfsm);
    for (index, transition_id) in ordered.into_iter().enumerate() {
        if let Some(layout) = document.transitions.get(&transition_key(index)) {
            machine
                .transition_layouts
                .insert(transition_id, *layout);
        }
    }
    Ok(())
}

fn write_boilerplate(tree: &mut FileTree, machine: &Machine, binding: &dyn OutputLanguage) {
    for section in binding.machine_sections() {
        tree.insert_text(
            binding.machine_section_file(&machine.name, section),
            machine.boilerplate.machine_section(section).to_string(),
        );
    }
    for &state_id in machine.llfsm.states() {
        let Some(state_name) = machine.llfsm.state_name(state_id) else {
            continue;
        };
        for section in binding.state_sections() {
            tree.insert_text(
                binding.state_section_file(state_name, section),
                machine
                    .boilerplate
                    .state_section(state_id, section)
                    .to_string(),
            );
        }
    }
}

fn read_boilerplate(machine: &mut Machine, tree: &FileTree, binding: &dyn OutputLanguage) {
    for section in binding.machine_sections() {
        if let Some(text) = tree.text(&binding.machine_section_file(&machine.name, section)) {
            machine.boilerplate.set_machine_section(*section, text);
        }
    }
    let state_ids: Vec<_> = machine.llfsm.states().to_vec();
    for state_id in state_ids {
        let Some(state_name) = machine.llfsm.state_name(state_id).map(str::to_string) else {
            continue;
        };
        for section in binding.state_sections() {
            if let Some(text) = tree.text(&binding.state_section_file(&state_name, section)) {
                machine
                    .boilerplate
                    .set_state_section(state_id, *section, text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::geometry::{BezierPath, Point2D, Rect};
    use crate::layout::{StateLayout, TransitionLayout};

    fn traffic_machine(format: Format) -> Machine {
        let mut fsm = Llfsm::from_state_names(["Red", "Green"]);
        let (red, green) = (fsm.states()[0], fsm.states()[1]);
        fsm.attach_transition("timer", red, green).unwrap();
        fsm.attach_transition("timer", green, red).unwrap();
        let mut machine = Machine::with_llfsm("Traffic", format, fsm);
        machine.state_layouts.insert(
            red,
            StateLayout {
                frame: Rect::new(10.0, 20.0, 120.0, 60.0),
                ..StateLayout::default()
            },
        );
        machine
    }

    fn roundtrip(machine: &Machine, options: &EmitOptions) -> Machine {
        let binding = binding_for(machine.format);
        let tree = encode_machine(machine, binding, options).unwrap();
        decode_machine(&tree, &machine.name, "test://Traffic.machine", None).unwrap()
    }

    #[test]
    fn encode_writes_fixed_members() {
        let machine = traffic_machine(Format::C);
        let tree =
            encode_machine(&machine, binding_for(Format::C), &EmitOptions::default()).unwrap();

        assert_eq!(tree.text(VERSION_FILE).unwrap(), FORMAT_VERSION);
        assert_eq!(tree.text(LANGUAGE_FILE).unwrap(), "c");
        assert_eq!(tree.text(STATES_FILE).unwrap(), "Red\nGreen\n");
        assert_eq!(tree.text("STATE_Red_Transitions").unwrap(), "timer,Green\n");
        assert_eq!(tree.text("STATE_Green_Transitions").unwrap(), "timer,Red\n");
        assert!(tree.contains(LAYOUT_FILE));
        assert!(!tree.contains(WINDOW_LAYOUT_FILE));
        assert!(!tree.contains(SUSPEND_STATE_FILE));
    }

    #[test]
    fn roundtrip_preserves_graph_and_layout() {
        let machine = traffic_machine(Format::C);
        let read = roundtrip(&machine, &EmitOptions::default());

        let names: Vec<&str> = read
            .llfsm
            .states()
            .iter()
            .filter_map(|&id| read.llfsm.state_name(id))
            .collect();
        assert_eq!(names, ["Red", "Green"]);
        assert_eq!(read.llfsm.transitions().len(), 2);

        let red = read.llfsm.state_named("Red").unwrap();
        let from_red = read.llfsm.transitions_from(red);
        assert_eq!(from_red.len(), 1);
        assert_eq!(from_red[0].label, "timer");
        assert_eq!(read.llfsm.state_name(from_red[0].target), Some("Green"));

        let layout = read.state_layouts.get(&red).unwrap();
        assert_eq!(layout.frame, Rect::new(10.0, 20.0, 120.0, 60.0));
    }

    #[test]
    fn suspend_state_name_roundtrips() {
        let mut machine = traffic_machine(Format::C);
        let green = machine.llfsm.state_named("Green").unwrap();
        machine.llfsm.set_suspend_state(Some(green)).unwrap();

        let read = roundtrip(&machine, &EmitOptions::default());
        let suspend = read.llfsm.suspend_state().unwrap();
        assert_eq!(read.llfsm.state_name(suspend), Some("Green"));
    }

    #[test]
    fn missing_states_member_is_a_malformed_machine() {
        let mut tree = FileTree::new();
        tree.insert_text(LANGUAGE_FILE, "c");
        let result = decode_machine(&tree, "Broken", "test://Broken.machine", None);
        assert!(matches!(result, Err(Error::MalformedMachine { .. })));
    }

    #[test]
    fn missing_language_falls_back_to_default_or_errors() {
        let mut tree = FileTree::new();
        tree.insert_text(STATES_FILE, "Only\n");

        let machine =
            decode_machine(&tree, "M", "test://M.machine", Some(Format::ObjCpp)).unwrap();
        assert_eq!(machine.format, Format::ObjCpp);

        assert!(matches!(
            decode_machine(&tree, "M", "test://M.machine", None),
            Err(Error::MissingLanguage(_))
        ));
    }

    #[test]
    fn malformed_transition_is_dropped_not_fatal() {
        let machine = traffic_machine(Format::C);
        let binding = binding_for(Format::C);
        let mut tree = encode_machine(&machine, binding, &EmitOptions::default()).unwrap();
        tree.insert_text(
            "STATE_Red_Transitions",
            "timer,Green\nbroken,Nowhere\n",
        );

        let read = decode_machine(&tree, "Traffic", "test://Traffic.machine", None).unwrap();
        assert_eq!(read.llfsm.states().len(), 2);
        let red = read.llfsm.state_named("Red").unwrap();
        assert_eq!(read.llfsm.transitions_from(red).len(), 1);
    }

    #[test]
    fn serialization_is_deterministic() {
        let machine = traffic_machine(Format::C);
        let binding = binding_for(Format::C);
        let options = EmitOptions::default();
        let first = encode_machine(&machine, binding, &options).unwrap();
        let second = encode_machine(&machine, binding, &options).unwrap();
        assert_eq!(
            first.text(STATES_FILE).unwrap(),
            second.text(STATES_FILE).unwrap()
        );
        assert_eq!(
            first.text(LANGUAGE_FILE).unwrap(),
            second.text(LANGUAGE_FILE).unwrap()
        );
        assert_eq!(
            first.text("STATE_Red_Transitions").unwrap(),
            second.text("STATE_Red_Transitions").unwrap()
        );
    }

    #[test]
    fn vhdl_machines_roundtrip_uuid_transition_targets() {
        let machine = traffic_machine(Format::Vhdl);
        let binding = binding_for(Format::Vhdl);
        let tree = encode_machine(&machine, binding, &EmitOptions::default()).unwrap();
        assert!(tree.contains(STATE_IDS_FILE));
        let transitions = tree.text("STATE_Red_Transitions").unwrap();
        assert!(transitions.starts_with("timer,"));
        assert!(!transitions.contains("Green"));

        let read = decode_machine(&tree, "Traffic", "test://Traffic.machine", None).unwrap();
        let red = read.llfsm.state_named("Red").unwrap();
        let from_red = read.llfsm.transitions_from(red);
        assert_eq!(from_red.len(), 1);
        assert_eq!(read.llfsm.state_name(from_red[0].target), Some("Green"));
    }

    #[test]
    fn include_path_and_window_layout_roundtrip() {
        let mut machine = traffic_machine(Format::C);
        machine.include_path = Some("../Common\n".to_string());
        machine.window_layout = Some(vec![0x62, 0x70, 0x6c, 0x00]);

        let read = roundtrip(&machine, &EmitOptions::default());
        assert_eq!(read.include_path.as_deref(), Some("../Common\n"));
        assert_eq!(read.window_layout, Some(vec![0x62, 0x70, 0x6c, 0x00]));
    }

    #[test]
    fn boilerplate_sections_roundtrip() {
        let mut machine = traffic_machine(Format::C);
        let red = machine.llfsm.state_named("Red").unwrap();
        machine
            .boilerplate
            .set_machine_section("Includes", "#include <timer.h>\n");
        machine
            .boilerplate
            .set_state_section(red, "OnEntry", "start_timer();\n");

        let binding = binding_for(Format::C);
        let tree = encode_machine(&machine, binding, &EmitOptions::default()).unwrap();
        assert_eq!(
            tree.text("Machine_Traffic_Includes.h").unwrap(),
            "#include <timer.h>\n"
        );
        assert_eq!(
            tree.text("State_Red_OnEntry.mm").unwrap(),
            "start_timer();\n"
        );
        // Declared sections without text are still written, empty.
        assert_eq!(tree.text("State_Green_OnExit.mm").unwrap(), "");

        let read = decode_machine(&tree, "Traffic", "test://Traffic.machine", None).unwrap();
        let red = read.llfsm.state_named("Red").unwrap();
        assert_eq!(
            read.boilerplate.machine_section("Includes"),
            "#include <timer.h>\n"
        );
        assert_eq!(
            read.boilerplate.state_section(red, "OnEntry"),
            "start_timer();\n"
        );
    }

    #[test]
    fn interleaved_attachment_keeps_transition_layouts() {
        // Attachment order differs from the per-state order the decoder
        // rebuilds; each layout must stay with its own transition.
        let mut fsm = Llfsm::from_state_names(["Red", "Green"]);
        let (red, green) = (fsm.states()[0], fsm.states()[1]);
        let green_to_red = fsm.attach_transition("timer", green, red).unwrap();
        let red_to_green = fsm.attach_transition("timer", red, green).unwrap();
        let mut machine = Machine::with_llfsm("Traffic", Format::C, fsm);
        machine.transition_layouts.insert(
            green_to_red,
            TransitionLayout {
                path: BezierPath::straight(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)),
            },
        );
        machine.transition_layouts.insert(
            red_to_green,
            TransitionLayout {
                path: BezierPath::straight(Point2D::new(0.0, 0.0), Point2D::new(20.0, 0.0)),
            },
        );

        let read = roundtrip(&machine, &EmitOptions::default());
        let read_green = read.llfsm.state_named("Green").unwrap();
        let read_green_to_red = read.llfsm.transitions_from(read_green)[0].id;
        assert_eq!(
            read.transition_layouts
                .get(&read_green_to_red)
                .unwrap()
                .path
                .end,
            Point2D::new(10.0, 0.0)
        );
        let read_red = read.llfsm.state_named("Red").unwrap();
        let read_red_to_green = read.llfsm.transitions_from(read_red)[0].id;
        assert_eq!(
            read.transition_layouts
                .get(&read_red_to_green)
                .unwrap()
                .path
                .end,
            Point2D::new(20.0, 0.0)
        );
    }

    #[test]
    fn duplicate_state_names_are_rejected_on_encode() {
        let fsm = Llfsm::from_state_names(["X", "X"]);
        let machine = Machine::with_llfsm("Dup", Format::C, fsm);
        let result = encode_machine(&machine, binding_for(Format::C), &EmitOptions::default());
        assert!(matches!(result, Err(Error::MalformedMachine { .. })));
    }

    #[test]
    fn duplicate_state_names_are_rejected_on_decode() {
        let mut tree = FileTree::new();
        tree.insert_text(LANGUAGE_FILE, "c");
        tree.insert_text(STATES_FILE, "X\nX\n");
        let result = decode_machine(&tree, "Dup", "test://Dup.machine", None);
        assert!(matches!(result, Err(Error::MalformedMachine { .. })));
    }

    #[test]
    fn transition_layouts_roundtrip_by_ordinal() {
        let mut machine = traffic_machine(Format::C);
        let first_transition = machine.llfsm.transitions()[0];
        machine.transition_layouts.insert(
            first_transition,
            TransitionLayout {
                path: BezierPath::straight(Point2D::new(0.0, 0.0), Point2D::new(60.0, 0.0)),
            },
        );

        let read = roundtrip(&machine, &EmitOptions::default());
        let read_first = read.llfsm.transitions()[0];
        let layout = read.transition_layouts.get(&read_first).unwrap();
        assert_eq!(layout.path.end, Point2D::new(60.0, 0.0));
    }
}
