//! Error types for fsmconvert

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// fsmconvert errors
#[derive(Error, Debug)]
pub enum Error {
    /// The machine directory is structurally unusable (e.g. no `States` member).
    #[error("Malformed machine at {path}: {reason}")]
    MalformedMachine { path: String, reason: String },

    /// A single transition line could not be decoded. The codec reports these
    /// and keeps loading the remaining states.
    #[error("Malformed transition for state '{state}' in {path}: {line}")]
    MalformedTransition {
        state: String,
        path: String,
        line: String,
    },

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Machine not found: {0}")]
    MissingInput(String),

    #[error("No language recorded in {0} and no default format supplied")]
    MissingLanguage(String),

    #[error("State '{0}' is not a member of this machine")]
    UnknownState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Property list error: {0}")]
    Plist(#[from] plist::Error),

    #[error("{0}")]
    Other(String),
}
