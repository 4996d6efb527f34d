// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # fsmconvert — LLFSM model, persistence, and code generation
//!
//! Logic-Labelled Finite State Machines (LLFSMs) are state/transition
//! graphs whose transitions carry opaque guard expressions. This crate
//! models them, round-trips them through their directory-based on-disk
//! format, and emits source code for several target languages.
//!
//! ## Core Concept
//!
//! A machine on disk is a *directory*: a `States` member fixes the
//! canonical state order, `STATE_<Name>_Transitions` members carry the
//! outgoing edges, `Layout.plist` carries the editor geometry, and a
//! pluggable [`OutputLanguage`](binding::OutputLanguage) binding adds
//! generated headers, implementations, and build fragments. Arrangements
//! compose named machine instances, sharing each machine type by handle.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use fsmconvert::binding::{EmitOptions, Format};
//! use fsmconvert::codec::{load_machine, save_machine};
//!
//! let mut machine = load_machine(Path::new("Traffic.machine"), None)?;
//! machine.format = Format::C;
//! save_machine(&machine, Path::new("out/Traffic.machine"), &EmitOptions::default())?;
//! ```
//!
//! The graph model ([`fsm`]), layout model ([`layout`], [`geometry`]),
//! and directory codec ([`codec`]) are pure data transformations; only
//! [`filetree::FileTree::read_from`] and [`filetree::FileTree::write_to`]
//! touch the filesystem.

pub mod arrangement;
pub mod binding;
pub mod codec;
pub mod codegen;
pub mod convert;
pub mod error;
pub mod filetree;
pub mod fsm;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod machine;
pub mod names;

pub use arrangement::{Arrangement, Instance};
pub use binding::{binding_for, EmitOptions, Format, OutputLanguage};
pub use codec::{load_arrangement, load_machine, save_arrangement, save_machine};
pub use convert::{convert, ConversionOptions, Summary};
pub use error::{Error, Result};
pub use fsm::Llfsm;
pub use machine::Machine;

/// Crate version, from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
