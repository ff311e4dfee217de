//! # Snapshot Build
//!
//! Emits the bootstrap snapshot at the pinned slot.
//!
//! The ledger tool writes into `bootstrap-validator.staging/`. Only after it
//! exits cleanly and the single archive it wrote encodes the pinned slot is
//! that archive moved into `bootstrap-validator/`. The staging directory is
//! removed whatever the outcome, so a failed build leaves no output behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{list_file_names, reset_dir};
use crate::config::WorkspaceConfig;
use crate::domain::{
    parse_snapshot_slot, select_snapshot, BootstrapError, BootstrapSnapshot, ProvisionedKeys,
    Slot, SlotParseError, SnapshotArchive, SnapshotParams, Stage, TickMode, FAUCET_LAMPORTS,
};
use crate::ports::LedgerTool;

const TOOL_LABEL: &str = "create-snapshot";

/// Build the bootstrap snapshot from the staged ledger and cached keys.
///
/// # Errors
///
/// `BootstrapError::ToolInvocation` if the tool fails, writes no snapshot,
/// writes more than one, or writes one at a different slot.
pub async fn build_snapshot<L>(
    tool: &L,
    workspace: &WorkspaceConfig,
    archive: &SnapshotArchive,
    keys: &ProvisionedKeys,
) -> Result<BootstrapSnapshot, BootstrapError>
where
    L: LedgerTool + ?Sized,
{
    let slot = archive.slot.ok_or_else(|| {
        BootstrapError::Config("snapshot slot must be extracted before building".to_string())
    })?;

    let output_dir = workspace.snapshot_staging_dir();
    reset_dir(&output_dir, Stage::SnapshotBuild)?;

    let params = SnapshotParams {
        ledger_dir: workspace.staging_dir(),
        slot,
        faucet_keypair_path: keys.faucet.file_path.clone(),
        faucet_pubkey: keys.faucet.public_key,
        faucet_lamports: FAUCET_LAMPORTS,
        bootstrap: keys.bootstrap_pubkeys(),
        tick_mode: TickMode::Sleep,
        output_dir,
    };

    info!(
        stage = %Stage::SnapshotBuild,
        slot,
        faucet = %params.faucet_pubkey,
        lamports = params.faucet_lamports,
        identity = %params.bootstrap.identity,
        vote = %params.bootstrap.vote,
        stake = %params.bootstrap.stake,
        "Creating bootstrap snapshot"
    );

    let built = match tool.create_snapshot(&params).await {
        Ok(()) => promote(&params.output_dir, slot, &workspace.bootstrap_dir()),
        Err(e) => Err(e),
    };
    discard_staging(&params.output_dir);
    let snapshot_path = built?;

    info!(snapshot = %snapshot_path.display(), slot, "Bootstrap snapshot ready");

    Ok(BootstrapSnapshot {
        ledger_dir: workspace.bootstrap_dir(),
        slot,
        faucet_pubkey: params.faucet_pubkey,
        faucet_lamports: params.faucet_lamports,
        bootstrap_pubkeys: params.bootstrap,
        snapshot_path,
        genesis_path: workspace.genesis_output_path(),
    })
}

/// Verify the single staged snapshot and move it into `dest_dir`.
fn promote(staging: &Path, slot: Slot, dest_dir: &Path) -> Result<PathBuf, BootstrapError> {
    let names = list_file_names(staging, Stage::SnapshotBuild)?;
    let file_name = select_snapshot(staging, &names).map_err(|e| match e {
        SlotParseError::NoCandidates { dir } => BootstrapError::tool(
            Stage::SnapshotBuild,
            TOOL_LABEL,
            format!("exited successfully but wrote no snapshot to {}", dir.display()),
        ),
        other => BootstrapError::tool(Stage::SnapshotBuild, TOOL_LABEL, other.to_string()),
    })?;

    let produced = parse_snapshot_slot(&file_name)
        .map_err(|e| BootstrapError::tool(Stage::SnapshotBuild, TOOL_LABEL, e.to_string()))?;
    if produced != slot {
        return Err(BootstrapError::tool(
            Stage::SnapshotBuild,
            TOOL_LABEL,
            format!("wrote {} but slot {} was requested", file_name, slot),
        ));
    }

    let from = staging.join(&file_name);
    let to = dest_dir.join(&file_name);
    fs::rename(&from, &to).map_err(|e| {
        BootstrapError::io(
            Stage::SnapshotBuild,
            format!("moving {} to {}", from.display(), to.display()),
            e,
        )
    })?;
    Ok(to)
}

fn discard_staging(dir: &Path) {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to remove snapshot staging directory"),
    }
}
