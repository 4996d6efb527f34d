//! Arrangement directory codec
//!
//! An arrangement directory embeds one machine directory per distinct type
//! file and lists them in its `Machines` member. Instances sharing a type
//! file share the loaded [`Machine`](crate::machine::Machine) by handle, so
//! deduplication survives a write/read cycle.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::arrangement::{Arrangement, Instance};
use crate::binding::{EmitOptions, Format, OutputLanguage};
use crate::error::{Error, Result};
use crate::filetree::FileTree;

use super::machine::{decode_machine, encode_machine, machine_name_of};
use super::MACHINES_FILE;

/// Serialize an arrangement, embedding each distinct member machine once.
///
/// The `Machines` member lists one line per instance: the type-file name,
/// followed by a tab and the instance name when that name differs from the
/// type-file stem. Lines naming the same type file share one embedded
/// machine directory.
pub fn encode_arrangement(
    arrangement: &Arrangement,
    binding: &dyn OutputLanguage,
    options: &EmitOptions,
) -> Result<FileTree> {
    let mut tree = FileTree::new();
    let lines: Vec<String> = arrangement
        .instances
        .iter()
        .map(|instance| {
            if machine_name_of(Path::new(&instance.type_file)) == instance.name {
                instance.type_file.clone()
            } else {
                format!("{}\t{}", instance.type_file, instance.name)
            }
        })
        .collect();
    tree.insert_text(MACHINES_FILE, format!("{}\n", lines.join("\n")));

    let type_files = arrangement.distinct_type_files();
    for type_file in &type_files {
        let machine = arrangement
            .machine_for(type_file)
            .ok_or_else(|| Error::Other(format!("no machine loaded for type file {type_file}")))?;
        tree.insert_dir(
            type_file.to_string(),
            encode_machine(machine.as_ref(), binding, options)?,
        );
    }

    binding.add_arrangement_code(&mut tree, arrangement, options)?;
    Ok(tree)
}

/// Reconstruct an arrangement from a directory tree.
///
/// One instance is produced per `Machines` line; lines naming the same type
/// file share one loaded machine.
pub fn decode_arrangement(
    tree: &FileTree,
    origin: &str,
    default_format: Option<Format>,
) -> Result<Arrangement> {
    let machines_text = tree.text(MACHINES_FILE).ok_or_else(|| Error::MalformedMachine {
        path: origin.to_string(),
        reason: format!("missing {MACHINES_FILE} member"),
    })?;

    let mut loaded: BTreeMap<String, Arc<crate::machine::Machine>> = BTreeMap::new();
    let mut instances = Vec::new();
    for line in machines_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
    {
        let (type_file, instance_name) = match line.split_once('\t') {
            Some((type_file, name)) => (type_file, Some(name)),
            None => (line, None),
        };
        let machine = match loaded.get(type_file) {
            Some(machine) => Arc::clone(machine),
            None => {
                let sub_tree = tree.dir(type_file).ok_or_else(|| Error::MalformedMachine {
                    path: format!("{origin}/{type_file}"),
                    reason: "listed in Machines but not embedded".to_string(),
                })?;
                let name = machine_name_of(Path::new(type_file));
                let machine = Arc::new(decode_machine(
                    sub_tree,
                    &name,
                    &format!("{origin}/{type_file}"),
                    default_format,
                )?);
                loaded.insert(type_file.to_string(), Arc::clone(&machine));
                machine
            }
        };
        let name = instance_name
            .map(str::to_string)
            .unwrap_or_else(|| machine_name_of(Path::new(type_file)));
        instances.push(Instance::new(name, type_file, machine));
    }

    debug!(origin, instances = instances.len(), "loaded arrangement");
    Ok(Arrangement::new(instances))
}

/// Serialize an arrangement to a directory on disk.
pub fn save_arrangement(
    arrangement: &Arrangement,
    binding: &dyn OutputLanguage,
    path: &Path,
    options: &EmitOptions,
) -> Result<()> {
    encode_arrangement(arrangement, binding, options)?.write_to(path)
}

/// Load an arrangement from a directory on disk.
pub fn load_arrangement(path: &Path, default_format: Option<Format>) -> Result<Arrangement> {
    let tree = FileTree::read_from(path)?;
    decode_arrangement(&tree, &path.display().to_string(), default_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::binding::binding_for;
    use crate::fsm::Llfsm;
    use crate::machine::Machine;

    fn counter_machine(name: &str) -> Arc<Machine> {
        let mut fsm = Llfsm::from_state_names(["Initial", "CountUp"]);
        let (initial, count_up) = (fsm.states()[0], fsm.states()[1]);
        fsm.attach_transition("true", initial, count_up).unwrap();
        Arc::new(Machine::with_llfsm(name, Format::C, fsm))
    }

    #[test]
    fn shared_type_files_are_embedded_once() {
        let machine = counter_machine("Counter");
        let arrangement = Arrangement::new(vec![
            Instance::new("left", "Counter.machine", Arc::clone(&machine)),
            Instance::new("right", "Counter.machine", machine),
        ]);
        let tree = encode_arrangement(
            &arrangement,
            binding_for(Format::C),
            &EmitOptions::default(),
        )
        .unwrap();

        assert_eq!(
            tree.text(MACHINES_FILE).unwrap(),
            "Counter.machine\tleft\nCounter.machine\tright\n"
        );
        assert!(tree.dir("Counter.machine").is_some());
        let embedded: Vec<&str> = tree
            .entries()
            .filter(|(_, node)| matches!(node, crate::filetree::FileNode::Directory(_)))
            .map(|(name, _)| name)
            .collect();
        assert_eq!(embedded, ["Counter.machine"]);
    }

    #[test]
    fn dedup_survives_roundtrip() {
        let machine = counter_machine("Counter");
        let arrangement = Arrangement::new(vec![
            Instance::new("left", "Counter.machine", Arc::clone(&machine)),
            Instance::new("right", "Counter.machine", machine),
        ]);
        let tree = encode_arrangement(
            &arrangement,
            binding_for(Format::C),
            &EmitOptions::default(),
        )
        .unwrap();

        let read = decode_arrangement(&tree, "test://arrangement", None).unwrap();
        assert_eq!(read.instances.len(), 2);
        let names: Vec<&str> = read.instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["left", "right"]);
        assert!(Arc::ptr_eq(
            &read.instances[0].machine,
            &read.instances[1].machine
        ));
    }

    #[test]
    fn distinct_types_load_as_distinct_machines() {
        let arrangement = Arrangement::new(vec![
            Instance::new("a", "A.machine", counter_machine("A")),
            Instance::new("b", "B.machine", counter_machine("B")),
        ]);
        let tree = encode_arrangement(
            &arrangement,
            binding_for(Format::C),
            &EmitOptions::default(),
        )
        .unwrap();

        let read = decode_arrangement(&tree, "test://arrangement", None).unwrap();
        assert_eq!(read.instances.len(), 2);
        assert_eq!(read.instances[0].machine.name, "A");
        assert_eq!(read.instances[1].machine.name, "B");
        assert!(!Arc::ptr_eq(
            &read.instances[0].machine,
            &read.instances[1].machine
        ));
    }

    #[test]
    fn missing_embedded_machine_is_malformed() {
        let mut tree = FileTree::new();
        tree.insert_text(MACHINES_FILE, "Ghost.machine\n");
        let result = decode_arrangement(&tree, "test://arrangement", None);
        assert!(matches!(result, Err(Error::MalformedMachine { .. })));
    }

    #[test]
    fn repeated_machines_lines_share_one_loaded_machine() {
        // A hand-edited Machines member may list a type twice; both
        // resulting instances must share the same loaded machine.
        let machine = counter_machine("Counter");
        let arrangement = Arrangement::new(vec![Instance::new(
            "only",
            "Counter.machine",
            machine,
        )]);
        let mut tree = encode_arrangement(
            &arrangement,
            binding_for(Format::C),
            &EmitOptions::default(),
        )
        .unwrap();
        tree.insert_text(MACHINES_FILE, "Counter.machine\nCounter.machine\n");

        let read = decode_arrangement(&tree, "test://arrangement", None).unwrap();
        assert_eq!(read.instances.len(), 2);
        assert!(Arc::ptr_eq(
            &read.instances[0].machine,
            &read.instances[1].machine
        ));
        let names: Vec<&str> = read.instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Counter", "Counter_1"]);
    }
}
