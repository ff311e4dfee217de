//! # QC Bootstrap
//!
//! Prepares a single bootstrap validator from a remote ledger.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Fetch a genesis archive and a snapshot from a running cluster, then
//! rebuild them locally so one validator can boot a private cluster at the
//! same slot:
//!
//! - genesis rewritten to sleep tick mode
//! - faucet, identity, vote and stake keypairs reused or generated
//! - a fresh snapshot at the fetched slot, crediting the faucet and
//!   registering the bootstrap validator
//!
//! ## Module Structure
//!
//! ```text
//! qc-bootstrap/
//! ├── domain/        # Slot parsing, keypair codec, stage artifacts, errors
//! ├── ports/         # BootstrapApi (inbound) + ArtifactSource/LedgerTool/KeyGenerator (outbound)
//! ├── adapters/      # HTTP, external tools, native keygen, workspace lock
//! ├── stages/        # fetch, slot, keys, genesis, snapshot
//! ├── application/   # BootstrapPipeline orchestrating the stages
//! ├── config.rs      # BootstrapConfig, WorkspaceConfig
//! ├── cli.rs         # clap arguments
//! └── telemetry.rs   # tracing-subscriber setup
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;
pub mod stages;
pub mod telemetry;

// Re-exports
pub use adapters::{ExternalKeygen, ExternalLedgerTool, HttpArtifactSource, NativeKeygen, WorkspaceLock};
pub use application::BootstrapPipeline;
pub use config::{BootstrapConfig, HttpConfig, KeyOverrides, ToolCommand, WorkspaceConfig};
pub use domain::{
    parse_snapshot_slot, BootstrapError, BootstrapPubkeys, BootstrapSnapshot, KeyRole, Keypair,
    ProvisionedKeys, Provenance, Pubkey, Slot, SlotParseError, SnapshotArchive, Stage, TickMode,
    FAUCET_LAMPORTS,
};
pub use ports::{ArtifactSource, BootstrapApi, KeyGenerator, LedgerTool};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
