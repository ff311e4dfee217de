//! Command-line arguments for the `qc-bootstrap` binary.
//!
//! Every option that locates an input has an environment fallback so the
//! binary can run unattended in a container.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    BootstrapConfig, HttpConfig, KeyOverrides, ToolCommand, WorkspaceConfig, DEFAULT_LEDGER_TOOL,
    DEFAULT_SNAPSHOT_URL,
};
use crate::telemetry::LogConfig;

/// Rebuild a bootstrap validator genesis and snapshot from a remote ledger.
#[derive(Parser, Debug, Clone)]
#[command(name = "qc-bootstrap", version)]
#[command(about = "Prepare a bootstrap validator genesis and snapshot from a remote ledger")]
pub struct Args {
    /// Config root holding faucet.json, latest-snapshot/ and bootstrap-validator/
    #[arg(long, value_name = "DIR", env = "QC_CONFIG_DIR", default_value = "./config")]
    pub config_dir: PathBuf,

    /// Base URL serving genesis.tar.bz2 and snapshot.tar.bz2
    #[arg(long, value_name = "URL", env = "QC_SNAPSHOT_URL", default_value = DEFAULT_SNAPSHOT_URL)]
    pub snapshot_url: String,

    /// Existing faucet keypair to reuse (empty means generate)
    #[arg(long, value_name = "PATH", env = "QC_FAUCET_KEYPAIR")]
    pub faucet_keypair: Option<String>,

    /// Existing bootstrap validator identity keypair to reuse (empty means generate)
    #[arg(long, value_name = "PATH", env = "QC_BOOTSTRAP_IDENTITY_KEYPAIR")]
    pub identity_keypair: Option<String>,

    /// Ledger tool binary
    #[arg(long, value_name = "PATH", env = "QC_LEDGER_TOOL", default_value = DEFAULT_LEDGER_TOOL)]
    pub ledger_tool: PathBuf,

    /// Keygen binary; keys are generated in-process when unset
    #[arg(long, value_name = "PATH", env = "QC_KEYGEN")]
    pub keygen: Option<PathBuf>,

    /// HTTP connect timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// HTTP read timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub read_timeout_secs: u64,

    /// Print the resulting snapshot description as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Log filter directive (falls back to RUST_LOG, then "info")
    #[arg(long, value_name = "FILTER", env = "QC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "QC_JSON_LOGS")]
    pub json_logs: bool,
}

impl Args {
    /// Pipeline configuration described by these arguments.
    pub fn to_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            workspace: WorkspaceConfig::new(self.config_dir.clone()),
            snapshot_url: self.snapshot_url.clone(),
            overrides: KeyOverrides {
                faucet: non_empty_path(self.faucet_keypair.as_deref()),
                identity: non_empty_path(self.identity_keypair.as_deref()),
            },
            ledger_tool: ToolCommand::new(self.ledger_tool.clone()),
            keygen: self.keygen.clone().map(ToolCommand::new),
            http: HttpConfig {
                connect_timeout_secs: self.connect_timeout_secs,
                read_timeout_secs: self.read_timeout_secs,
            },
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            json: self.json_logs,
        }
    }
}

fn non_empty_path(value: Option<&str>) -> Option<PathBuf> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
