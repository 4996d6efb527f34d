//! Arrangements: named collections of machine instances
//!
//! Several instances may share one machine type. The sharing is by handle
//! (`Arc`), never by deep copy; arrangement serialization relies on it to
//! embed each distinct type exactly once.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::machine::Machine;

/// One named occurrence of a machine type within an arrangement.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Runtime name, unique within the arrangement.
    pub name: String,
    /// File name of the machine directory this instance refers to.
    pub type_file: String,
    /// The shared machine value backing this instance.
    pub machine: Arc<Machine>,
}

impl Instance {
    pub fn new(name: impl Into<String>, type_file: impl Into<String>, machine: Arc<Machine>) -> Self {
        Self {
            name: name.into(),
            type_file: type_file.into(),
            machine,
        }
    }
}

/// A fixed, ordered collection of named machine instances.
#[derive(Debug, Clone, Default)]
pub struct Arrangement {
    pub instances: Vec<Instance>,
}

impl Arrangement {
    /// Build an arrangement, resolving instance-name collisions by suffixing
    /// `_1`, `_2`, … in encounter order.
    pub fn new(instances: Vec<Instance>) -> Self {
        let mut taken = BTreeSet::new();
        let mut resolved = Vec::with_capacity(instances.len());
        for mut instance in instances {
            if taken.contains(&instance.name) {
                let mut n = 1usize;
                let mut candidate = format!("{}_{n}", instance.name);
                while taken.contains(&candidate) {
                    n += 1;
                    candidate = format!("{}_{n}", instance.name);
                }
                instance.name = candidate;
            }
            taken.insert(instance.name.clone());
            resolved.push(instance);
        }
        Self {
            instances: resolved,
        }
    }

    /// Distinct type-file names in first-encounter order (the `Machines`
    /// member's contents).
    pub fn distinct_type_files(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for instance in &self.instances {
            if seen.insert(instance.type_file.as_str()) {
                out.push(instance.type_file.as_str());
            }
        }
        out
    }

    /// The machine backing a given type file, if any instance uses it.
    pub fn machine_for(&self, type_file: &str) -> Option<&Arc<Machine>> {
        self.instances
            .iter()
            .find(|i| i.type_file == type_file)
            .map(|i| &i.machine)
    }
}
