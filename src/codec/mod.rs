//! Directory-backed persistence for machines and arrangements
//!
//! A machine directory holds a fixed set of member files (`Language`,
//! `States`, `Layout.plist`, …) plus binding-specific boilerplate sections
//! and generated code. An arrangement directory holds a `Machines` member
//! listing its instances by type file, one embedded machine directory per
//! distinct type, and arrangement-level generated code. All format logic
//! operates
//! on [`FileTree`](crate::filetree::FileTree) values; disk I/O happens only
//! at the tree edge.

pub mod arrangement;
pub mod machine;

pub use arrangement::{
    decode_arrangement, encode_arrangement, load_arrangement, save_arrangement,
};
pub use machine::{decode_machine, encode_machine, load_machine, machine_name_of, save_machine};

/// Lowercase language identifier of the binding that wrote the directory.
pub const LANGUAGE_FILE: &str = "Language";

/// Newline-separated state names; defines the canonical on-disk state order.
pub const STATES_FILE: &str = "States";

/// Property-list layout dictionary, keyed by state/transition name.
pub const LAYOUT_FILE: &str = "Layout.plist";

/// Opaque editor window-layout blob.
pub const WINDOW_LAYOUT_FILE: &str = "WindowLayout.plist";

/// Optional extra include-search-path text.
pub const INCLUDE_PATH_FILE: &str = "IncludePath";

/// Format version marker.
pub const VERSION_FILE: &str = "Version";

/// Value written to [`VERSION_FILE`].
pub const FORMAT_VERSION: &str = "1.3";

/// Name of the suspend state, written iff one is designated.
pub const SUSPEND_STATE_FILE: &str = "SuspendState";

/// Persisted state identifiers, one per `States` line, written by bindings
/// whose transition files address targets by UUID.
pub const STATE_IDS_FILE: &str = "StateUUIDs";

/// Newline-separated instance list of an arrangement: one `typeFile` line
/// per instance, with a tab-separated instance name when it differs from
/// the type-file stem.
pub const MACHINES_FILE: &str = "Machines";

/// Name of the outgoing-transitions member for a state.
pub fn transitions_file(state: &str) -> String {
    format!("STATE_{state}_Transitions")
}
