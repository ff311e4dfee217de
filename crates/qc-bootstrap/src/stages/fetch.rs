//! Artifact fetch: stage genesis and snapshot archives into a clean
//! `latest-snapshot/` directory.

use std::fs;
use std::path::Path;

use tracing::info;

use super::reset_dir;
use crate::config::WorkspaceConfig;
use crate::domain::{BootstrapError, SnapshotArchive, Stage};
use crate::ports::ArtifactSource;

/// Remote name of the genesis archive.
pub const GENESIS_REMOTE: &str = "genesis.tar.bz2";

/// Remote name of the snapshot archive. The server answers with the real
/// `snapshot-<slot>-<hash>.tar.bz2` name.
pub const SNAPSHOT_REMOTE: &str = "snapshot.tar.bz2";

/// Reset the staging directory and download both archives into it.
///
/// # Errors
///
/// `BootstrapError::Fetch` if either download fails or leaves an empty file.
pub async fn fetch_artifacts<S>(
    source: &S,
    workspace: &WorkspaceConfig,
) -> Result<SnapshotArchive, BootstrapError>
where
    S: ArtifactSource + ?Sized,
{
    let staging = workspace.staging_dir();
    reset_dir(&staging, Stage::Fetch)?;

    info!(
        stage = %Stage::Fetch,
        endpoint = %source.endpoint(),
        dir = %staging.display(),
        "Fetching genesis and snapshot"
    );

    let genesis_path = source.fetch(GENESIS_REMOTE, &staging).await?;
    ensure_non_empty(&genesis_path, GENESIS_REMOTE)?;

    let snapshot_path = source.fetch(SNAPSHOT_REMOTE, &staging).await?;
    ensure_non_empty(&snapshot_path, SNAPSHOT_REMOTE)?;

    info!(
        genesis = %genesis_path.display(),
        snapshot = %snapshot_path.display(),
        "Artifacts staged"
    );

    Ok(SnapshotArchive::new(genesis_path, snapshot_path))
}

fn ensure_non_empty(path: &Path, artifact: &str) -> Result<(), BootstrapError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        Ok(_) => Err(BootstrapError::fetch(
            artifact,
            format!("{} is empty", path.display()),
        )),
        Err(e) => Err(BootstrapError::fetch(
            artifact,
            format!("{} missing after download: {}", path.display(), e),
        )),
    }
}
