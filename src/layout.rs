//! Per-state and per-transition layout records
//!
//! Layout is presentation metadata keyed by identifier in memory and by name
//! on disk (identifiers are not stable across serialization boundaries).
//! [`LayoutDocument`] is the property-list face of the layout data: a
//! `States` dictionary keyed by state name and a `Transitions` dictionary
//! keyed `Transition_<n>` in serialization order, since transitions carry no
//! user-visible name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{BezierPath, Rect};

/// Geometry of one state in the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateLayout {
    /// Bounding frame of the closed (collapsed) state.
    pub frame: Rect,
    /// Whether the state is drawn expanded with visible action sections.
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub on_entry_height: f64,
    #[serde(default)]
    pub on_exit_height: f64,
    #[serde(default)]
    pub internal_height: f64,
    #[serde(default)]
    pub on_suspend_height: f64,
    #[serde(default)]
    pub on_resume_height: f64,
}

impl Default for StateLayout {
    fn default() -> Self {
        Self {
            frame: Rect::new(0.0, 0.0, 100.0, 50.0),
            expanded: false,
            on_entry_height: 0.0,
            on_exit_height: 0.0,
            internal_height: 0.0,
            on_suspend_height: 0.0,
            on_resume_height: 0.0,
        }
    }
}

/// Geometry of one transition: a bezier path from source to target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionLayout {
    pub path: BezierPath,
}

/// The on-disk shape of `Layout.plist`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(rename = "States", default)]
    pub states: BTreeMap<String, StateLayout>,
    #[serde(rename = "Transitions", default)]
    pub transitions: BTreeMap<String, TransitionLayout>,
}

impl LayoutDocument {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.transitions.is_empty()
    }

    /// Serialize as an XML property list.
    pub fn to_plist_bytes(&self) -> crate::error::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        plist::to_writer_xml(&mut bytes, self)?;
        Ok(bytes)
    }

    /// Parse from property-list bytes (XML or binary).
    pub fn from_plist_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        Ok(plist::from_bytes(bytes)?)
    }
}

/// Key under which transition number `index` is stored in the layout plist.
pub fn transition_key(index: usize) -> String {
    format!("Transition_{index}")
}
