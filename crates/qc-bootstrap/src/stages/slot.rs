//! Slot extraction: pin the slot encoded in the staged snapshot name.

use tracing::info;

use super::list_file_names;
use crate::domain::{
    parse_snapshot_slot, select_snapshot, BootstrapError, SlotParseError, SnapshotArchive, Stage,
};

/// Pin `archive.slot` from the single snapshot in its ledger directory.
///
/// The directory is listed rather than trusting `archive.snapshot_path`, so a
/// stray second snapshot is reported as ambiguous. When nothing in the
/// directory matches, the fetched snapshot file itself is named in the error.
pub fn extract_slot(mut archive: SnapshotArchive) -> Result<SnapshotArchive, BootstrapError> {
    let dir = archive
        .ledger_dir()
        .map(|d| d.to_path_buf())
        .ok_or_else(|| {
            BootstrapError::Config(format!(
                "snapshot path {} has no parent directory",
                archive.snapshot_path.display()
            ))
        })?;

    let names = list_file_names(&dir, Stage::SlotExtraction)?;
    let file_name = match select_snapshot(&dir, &names) {
        Ok(name) => name,
        Err(SlotParseError::NoCandidates { dir }) => {
            return Err(unmatched_snapshot(&archive, dir).into());
        }
        Err(e) => return Err(e.into()),
    };
    let slot = parse_snapshot_slot(&file_name)?;

    info!(stage = %Stage::SlotExtraction, slot, file = %file_name, "Snapshot slot pinned");

    archive.snapshot_path = dir.join(file_name);
    archive.slot = Some(slot);
    Ok(archive)
}

/// Error for a staging dir with no matching snapshot name. Names the fetched
/// snapshot when it exists under a name that does not parse.
fn unmatched_snapshot(archive: &SnapshotArchive, dir: std::path::PathBuf) -> SlotParseError {
    let fetched = archive
        .snapshot_path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|_| archive.snapshot_path != archive.genesis_path && archive.snapshot_path.is_file());

    match fetched.map(parse_snapshot_slot) {
        Some(Err(e)) => e,
        _ => SlotParseError::NoCandidates { dir },
    }
}
