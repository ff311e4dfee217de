//! # Bootstrap Pipeline Service
//!
//! Runs the stages strictly in order under the workspace lock:
//!
//! ```text
//! fetch -> slot extraction -> key provisioning -> genesis mutation -> snapshot build
//! ```
//!
//! Every failure aborts the run; nothing is retried.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::adapters::WorkspaceLock;
use crate::config::BootstrapConfig;
use crate::domain::{BootstrapError, BootstrapSnapshot};
use crate::ports::{ArtifactSource, BootstrapApi, KeyGenerator, LedgerTool};
use crate::stages::{build_snapshot, extract_slot, fetch_artifacts, mutate_genesis, KeyProvisioner};

/// Bootstrap pipeline over its three outbound ports.
pub struct BootstrapPipeline<S, L, K> {
    config: BootstrapConfig,
    source: S,
    ledger_tool: L,
    keygen: K,
}

impl<S, L, K> BootstrapPipeline<S, L, K>
where
    S: ArtifactSource,
    L: LedgerTool,
    K: KeyGenerator,
{
    /// Create a pipeline after validating `config`.
    pub fn new(
        config: BootstrapConfig,
        source: S,
        ledger_tool: L,
        keygen: K,
    ) -> Result<Self, BootstrapError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            ledger_tool,
            keygen,
        })
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn ledger_tool(&self) -> &L {
        &self.ledger_tool
    }

    #[instrument(skip(self), fields(root = %self.config.workspace.root.display()))]
    async fn run_stages(&self) -> Result<BootstrapSnapshot, BootstrapError> {
        let workspace = &self.config.workspace;

        let archive = fetch_artifacts(&self.source, workspace).await?;
        let archive = extract_slot(archive)?;
        let keys = KeyProvisioner::new(&self.keygen, workspace)
            .provision(&self.config.overrides)
            .await?;
        mutate_genesis(&self.ledger_tool, workspace).await?;
        build_snapshot(&self.ledger_tool, workspace, &archive, &keys).await
    }
}

#[async_trait]
impl<S, L, K> BootstrapApi for BootstrapPipeline<S, L, K>
where
    S: ArtifactSource,
    L: LedgerTool,
    K: KeyGenerator,
{
    async fn run(&self) -> Result<BootstrapSnapshot, BootstrapError> {
        let started = Instant::now();
        let lock = WorkspaceLock::acquire(&self.config.workspace.lock_path())?;
        info!(lock = %lock.path().display(), pid = lock.pid(), "Bootstrap run started");

        let result = self.run_stages().await;
        drop(lock);

        match &result {
            Ok(snapshot) => info!(
                slot = snapshot.slot,
                snapshot = %snapshot.snapshot_path.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Bootstrap run complete"
            ),
            Err(e) => error!(stage = %e.stage(), error = %e, "Bootstrap run failed"),
        }
        result
    }
}
