//! # Bootstrap Configuration
//!
//! Everything a run needs is carried in an explicit [`BootstrapConfig`]; no
//! stage reads global paths. All working directories are derived from the
//! [`WorkspaceConfig`] root:
//!
//! ```text
//! {root}/
//! ├── .bootstrap.lock
//! ├── faucet.json
//! ├── latest-snapshot/              # fetched genesis + snapshot
//! ├── bootstrap-validator/          # keys, patched genesis, rebuilt snapshot
//! └── bootstrap-validator.staging/  # create-snapshot output, transient
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{BootstrapError, KeyRole};

/// Remote endpoint used when none is configured.
pub const DEFAULT_SNAPSHOT_URL: &str = "http://api.mainnet-beta.solana.com";

/// Ledger tool binary used when none is configured.
pub const DEFAULT_LEDGER_TOOL: &str = "solana-ledger-tool";

/// Root of all working directories for one pipeline instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Config root directory.
    pub root: PathBuf,
}

impl WorkspaceConfig {
    /// Staging directory name for fetched archives.
    pub const STAGING_DIR: &'static str = "latest-snapshot";
    /// Bootstrap validator directory name.
    pub const BOOTSTRAP_DIR: &'static str = "bootstrap-validator";
    /// Transient snapshot build directory name.
    pub const SNAPSHOT_STAGING_DIR: &'static str = "bootstrap-validator.staging";
    /// Advisory lock file name.
    pub const LOCK_FILE: &'static str = ".bootstrap.lock";
    /// Genesis archive name, both fetched and patched.
    pub const GENESIS_ARCHIVE: &'static str = "genesis.tar.bz2";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(Self::STAGING_DIR)
    }

    pub fn bootstrap_dir(&self) -> PathBuf {
        self.root.join(Self::BOOTSTRAP_DIR)
    }

    pub fn snapshot_staging_dir(&self) -> PathBuf {
        self.root.join(Self::SNAPSHOT_STAGING_DIR)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(Self::LOCK_FILE)
    }

    /// Patched genesis written by genesis mutation.
    pub fn genesis_output_path(&self) -> PathBuf {
        self.bootstrap_dir().join(Self::GENESIS_ARCHIVE)
    }

    /// Default keypair location for a role.
    ///
    /// The faucet lives at the root; validator keys live in the
    /// bootstrap-validator directory.
    pub fn keypair_path(&self, role: KeyRole) -> PathBuf {
        match role {
            KeyRole::Faucet => self.root.join(role.file_name()),
            _ => self.bootstrap_dir().join(role.file_name()),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self::new("./config")
    }
}

/// Caller-supplied keypairs. Only faucet and identity can be overridden.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOverrides {
    pub faucet: Option<PathBuf>,
    pub identity: Option<PathBuf>,
}

impl KeyOverrides {
    /// Override path for a role, if one was given.
    ///
    /// Empty paths count as absent.
    pub fn get(&self, role: KeyRole) -> Option<&Path> {
        let path = match role {
            KeyRole::Faucet => self.faucet.as_deref(),
            KeyRole::Identity => self.identity.as_deref(),
            KeyRole::Vote | KeyRole::Stake => None,
        };
        path.filter(|p| !p.as_os_str().is_empty())
    }
}

/// How to launch an external tool.
///
/// `prefix_args` are inserted before the subcommand, which lets the tool be
/// a wrapper such as `cargo run --bin solana-ledger-tool --`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: PathBuf,
    #[serde(default)]
    pub prefix_args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full argv after the program: prefix args then `args`.
    pub fn argv(&self, args: Vec<OsString>) -> Vec<OsString> {
        self.prefix_args
            .iter()
            .map(OsString::from)
            .chain(args)
            .collect()
    }

    /// Program name for logs and errors.
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// HTTP client timeouts for archive downloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum idle time between body reads in seconds.
    pub read_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 60,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Working directory root.
    pub workspace: WorkspaceConfig,
    /// Base URL serving `genesis.tar.bz2` and `snapshot.tar.bz2`.
    pub snapshot_url: String,
    /// Existing faucet / identity keypairs to reuse.
    pub overrides: KeyOverrides,
    /// Ledger tool used for genesis mutation and snapshot creation.
    pub ledger_tool: ToolCommand,
    /// Keygen tool. `None` generates keys in-process.
    pub keygen: Option<ToolCommand>,
    /// Download timeouts.
    pub http: HttpConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            snapshot_url: DEFAULT_SNAPSHOT_URL.to_string(),
            overrides: KeyOverrides::default(),
            ledger_tool: ToolCommand::new(DEFAULT_LEDGER_TOOL),
            keygen: None,
            http: HttpConfig::default(),
        }
    }
}

impl BootstrapConfig {
    /// Create a config rooted at `root` with defaults elsewhere.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            workspace: WorkspaceConfig::new(root),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Config`] if:
    /// - the config root is empty
    /// - the snapshot URL is not http(s)
    /// - a tool program is empty
    /// - a timeout is zero
    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.workspace.root.as_os_str().is_empty() {
            return Err(BootstrapError::Config(
                "config directory must not be empty".to_string(),
            ));
        }

        let url = self.snapshot_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(BootstrapError::Config(format!(
                "snapshot URL must be http(s): {:?}",
                self.snapshot_url
            )));
        }

        if self.ledger_tool.program.as_os_str().is_empty() {
            return Err(BootstrapError::Config(
                "ledger tool program must not be empty".to_string(),
            ));
        }

        if let Some(keygen) = &self.keygen {
            if keygen.program.as_os_str().is_empty() {
                return Err(BootstrapError::Config(
                    "keygen program must not be empty".to_string(),
                ));
            }
        }

        if self.http.connect_timeout_secs == 0 || self.http.read_timeout_secs == 0 {
            return Err(BootstrapError::Config(
                "HTTP timeouts must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_layout() {
        let ws = WorkspaceConfig::new("/cfg");
        assert_eq!(ws.staging_dir(), PathBuf::from("/cfg/latest-snapshot"));
        assert_eq!(ws.bootstrap_dir(), PathBuf::from("/cfg/bootstrap-validator"));
        assert_eq!(
            ws.genesis_output_path(),
            PathBuf::from("/cfg/bootstrap-validator/genesis.tar.bz2")
        );
        assert_eq!(ws.lock_path(), PathBuf::from("/cfg/.bootstrap.lock"));
    }

    #[test]
    fn test_keypair_paths() {
        let ws = WorkspaceConfig::new("/cfg");
        assert_eq!(ws.keypair_path(KeyRole::Faucet), PathBuf::from("/cfg/faucet.json"));
        assert_eq!(
            ws.keypair_path(KeyRole::Identity),
            PathBuf::from("/cfg/bootstrap-validator/identity.json")
        );
        assert_eq!(
            ws.keypair_path(KeyRole::Vote),
            PathBuf::from("/cfg/bootstrap-validator/vote-account.json")
        );
        assert_eq!(
            ws.keypair_path(KeyRole::Stake),
            PathBuf::from("/cfg/bootstrap-validator/stake-account.json")
        );
    }

    #[test]
    fn test_overrides_ignore_empty_and_non_overridable() {
        let overrides = KeyOverrides {
            faucet: Some(PathBuf::new()),
            identity: Some(PathBuf::from("/keys/id.json")),
        };
        assert_eq!(overrides.get(KeyRole::Faucet), None);
        assert_eq!(overrides.get(KeyRole::Identity), Some(Path::new("/keys/id.json")));
        assert_eq!(overrides.get(KeyRole::Vote), None);
        assert_eq!(overrides.get(KeyRole::Stake), None);
    }

    #[test]
    fn test_tool_argv_prefix() {
        let tool = ToolCommand::new("cargo").with_prefix_args(["run", "--"]);
        let argv = tool.argv(vec![OsString::from("create-snapshot")]);
        assert_eq!(argv, vec!["run", "--", "create-snapshot"]);
        assert_eq!(tool.display_name(), "cargo");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(BootstrapConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = BootstrapConfig {
            snapshot_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BootstrapError::Config(_))));
    }

    #[test]
    fn test_rejects_empty_root() {
        let config = BootstrapConfig::for_root("");
        assert!(matches!(config.validate(), Err(BootstrapError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = BootstrapConfig::default();
        config.http.read_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
