//! # Outbound Ports
//!
//! Capabilities the pipeline needs from the outside world. The pipeline
//! depends only on these traits; whether an implementation shells out to a
//! binary, calls a library, or talks to an RPC is its own business.
//!
//! Production: `HttpArtifactSource`, `ExternalLedgerTool`, `ExternalKeygen` /
//! `NativeKeygen` (see `adapters/`).
//! Testing: `MockArtifactSource`, `MockLedgerTool` (below).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{BootstrapError, GenesisConfig, KeyRole, SnapshotParams, Slot, Stage};

/// Remote source of genesis and snapshot archives.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Download `remote_name` into `dest_dir`.
    ///
    /// Returns the staged path. The file name is the one the server
    /// provided, which may differ from `remote_name`.
    async fn fetch(&self, remote_name: &str, dest_dir: &Path) -> Result<PathBuf, BootstrapError>;

    /// Endpoint description for logs.
    fn endpoint(&self) -> String;
}

/// External ledger tool.
#[async_trait]
pub trait LedgerTool: Send + Sync {
    /// Rewrite the staged genesis with the configured tick mode.
    async fn modify_genesis(&self, config: &GenesisConfig) -> Result<(), BootstrapError>;

    /// Emit a snapshot at `params.slot` into `params.output_dir`.
    async fn create_snapshot(&self, params: &SnapshotParams) -> Result<(), BootstrapError>;
}

/// Keypair generator.
#[async_trait]
pub trait KeyGenerator: Send + Sync {
    /// Write a new passphrase-less keypair file for `role` at `path`.
    async fn generate(&self, role: KeyRole, path: &Path) -> Result<(), BootstrapError>;
}

#[async_trait]
impl<T: KeyGenerator + ?Sized> KeyGenerator for Box<T> {
    async fn generate(&self, role: KeyRole, path: &Path) -> Result<(), BootstrapError> {
        (**self).generate(role, path).await
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Serves fixed archives from memory.
///
/// Keys are the requested remote names; values are the server-provided file
/// name and body.
#[derive(Default)]
pub struct MockArtifactSource {
    /// Served artifacts.
    pub artifacts: HashMap<String, (String, Vec<u8>)>,
    /// Requested names, in order.
    pub requests: Mutex<Vec<String>>,
}

impl MockArtifactSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as `served_name` when `remote_name` is requested.
    pub fn with_artifact(
        mut self,
        remote_name: &str,
        served_name: &str,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.artifacts
            .insert(remote_name.to_string(), (served_name.to_string(), body.into()));
        self
    }

    /// Genesis plus a snapshot at `slot`.
    pub fn mainnet_like(slot: Slot, hash: &str) -> Self {
        Self::new()
            .with_artifact("genesis.tar.bz2", "genesis.tar.bz2", b"genesis".to_vec())
            .with_artifact(
                "snapshot.tar.bz2",
                &format!("snapshot-{}-{}.tar.bz2", slot, hash),
                b"snapshot".to_vec(),
            )
    }
}

#[async_trait]
impl ArtifactSource for MockArtifactSource {
    async fn fetch(&self, remote_name: &str, dest_dir: &Path) -> Result<PathBuf, BootstrapError> {
        self.requests.lock().push(remote_name.to_string());

        let (served_name, body) = self
            .artifacts
            .get(remote_name)
            .ok_or_else(|| BootstrapError::fetch(remote_name, "HTTP 404 Not Found"))?;

        let path = dest_dir.join(served_name);
        fs::write(&path, body)
            .map_err(|e| BootstrapError::io(Stage::Fetch, format!("writing {}", path.display()), e))?;
        Ok(path)
    }

    fn endpoint(&self) -> String {
        "mock://artifacts".to_string()
    }
}

/// Call recorded by [`MockLedgerTool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerToolCall {
    ModifyGenesis(GenesisConfig),
    CreateSnapshot(SnapshotParams),
}

/// Ledger tool double that writes the files a real tool would.
///
/// `modify_genesis` writes `genesis.tar.bz2` into the output directory;
/// `create_snapshot` writes `snapshot-<slot>-<hash>.tar.bz2`.
pub struct MockLedgerTool {
    /// Fail `modify_genesis` with a non-zero exit.
    pub fail_modify_genesis: bool,
    /// Fail `create_snapshot` with a non-zero exit.
    pub fail_create_snapshot: bool,
    /// Write the snapshot at this slot instead of the requested one.
    pub emit_slot: Option<Slot>,
    /// Skip writing output files while still reporting success.
    pub skip_output: bool,
    /// Hash segment used in emitted snapshot names.
    pub snapshot_hash: String,
    /// Every call, in order.
    pub calls: Mutex<Vec<LedgerToolCall>>,
}

impl Default for MockLedgerTool {
    fn default() -> Self {
        Self {
            fail_modify_genesis: false,
            fail_create_snapshot: false,
            emit_slot: None,
            skip_output: false,
            snapshot_hash: "BootstrapHash".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockLedgerTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded calls.
    pub fn calls(&self) -> Vec<LedgerToolCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LedgerTool for MockLedgerTool {
    async fn modify_genesis(&self, config: &GenesisConfig) -> Result<(), BootstrapError> {
        self.calls
            .lock()
            .push(LedgerToolCall::ModifyGenesis(config.clone()));

        if self.fail_modify_genesis {
            return Err(BootstrapError::tool(
                Stage::GenesisMutation,
                "mock-ledger-tool modify-genesis",
                "exit status: 1",
            ));
        }
        if self.skip_output {
            return Ok(());
        }

        let path = config.output_dir.join("genesis.tar.bz2");
        fs::write(&path, config.tick_mode.as_arg()).map_err(|e| {
            BootstrapError::io(Stage::GenesisMutation, format!("writing {}", path.display()), e)
        })
    }

    async fn create_snapshot(&self, params: &SnapshotParams) -> Result<(), BootstrapError> {
        self.calls
            .lock()
            .push(LedgerToolCall::CreateSnapshot(params.clone()));

        if self.fail_create_snapshot {
            return Err(BootstrapError::tool(
                Stage::SnapshotBuild,
                "mock-ledger-tool create-snapshot",
                "exit status: 1",
            ));
        }
        if self.skip_output {
            return Ok(());
        }

        let slot = self.emit_slot.unwrap_or(params.slot);
        let path = params
            .output_dir
            .join(format!("snapshot-{}-{}.tar.bz2", slot, self.snapshot_hash));
        let body = format!(
            "faucet={} lamports={} identity={} vote={} stake={}",
            params.faucet_pubkey,
            params.faucet_lamports,
            params.bootstrap.identity,
            params.bootstrap.vote,
            params.bootstrap.stake
        );
        fs::write(&path, body).map_err(|e| {
            BootstrapError::io(Stage::SnapshotBuild, format!("writing {}", path.display()), e)
        })
    }
}
