//! # Pipeline Stages
//!
//! One module per stage, run strictly in this order:
//!
//! 1. `fetch` - stage genesis and snapshot archives
//! 2. `slot` - pin the slot encoded in the snapshot name
//! 3. `keys` - provision faucet, identity, vote and stake keypairs
//! 4. `genesis` - rewrite genesis to sleep tick mode
//! 5. `snapshot` - emit the bootstrap snapshot at the pinned slot

pub mod fetch;
pub mod genesis;
pub mod keys;
pub mod slot;
pub mod snapshot;

pub use fetch::fetch_artifacts;
pub use genesis::mutate_genesis;
pub use keys::KeyProvisioner;
pub use slot::extract_slot;
pub use snapshot::build_snapshot;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::domain::{BootstrapError, Stage};

/// Remove `dir` if present and recreate it empty.
pub(crate) fn reset_dir(dir: &Path, stage: Stage) -> Result<(), BootstrapError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(BootstrapError::io(
                stage,
                format!("removing {}", dir.display()),
                e,
            ))
        }
    }
    fs::create_dir_all(dir)
        .map_err(|e| BootstrapError::io(stage, format!("creating {}", dir.display()), e))
}

/// File names of the regular files in `dir`.
pub(crate) fn list_file_names(dir: &Path, stage: Stage) -> Result<Vec<String>, BootstrapError> {
    let context = || format!("listing {}", dir.display());
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| BootstrapError::io(stage, context(), e))? {
        let entry = entry.map_err(|e| BootstrapError::io(stage, context(), e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| BootstrapError::io(stage, context(), e))?
            .is_file();
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
