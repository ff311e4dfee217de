//! # Domain Module
//!
//! Core types for the bootstrap pipeline: staged artifacts, keypairs,
//! errors, and the pure slot-extraction and keypair-file logic.

pub mod entities;
pub mod errors;
pub mod keyfile;
pub mod slot;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use keyfile::KeypairFileError;
pub use slot::{is_snapshot_candidate, parse_snapshot_slot, select_snapshot};
pub use value_objects::*;
