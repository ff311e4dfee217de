//! # External Ledger Tool
//!
//! `LedgerTool` backed by the ledger tool binary.
//!
//! ```text
//! modify-genesis  --ledger <staging> --hashes-per-tick sleep <bootstrap-validator>
//! create-snapshot --hashes-per-tick sleep --ledger <staging>
//!                 --faucet-pubkey <faucet.json> --faucet-lamports <N>
//!                 --bootstrap-validator <identity> <vote> <stake>
//!                 <slot> <output-dir>
//! ```

use std::ffi::OsString;

use async_trait::async_trait;

use super::process::run_tool;
use crate::config::ToolCommand;
use crate::domain::{BootstrapError, GenesisConfig, SnapshotParams, Stage};
use crate::ports::LedgerTool;

/// Ledger tool invoked as a child process.
#[derive(Clone, Debug)]
pub struct ExternalLedgerTool {
    command: ToolCommand,
}

impl ExternalLedgerTool {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &ToolCommand {
        &self.command
    }
}

/// Arguments for `modify-genesis`.
pub fn modify_genesis_args(config: &GenesisConfig) -> Vec<OsString> {
    vec![
        "modify-genesis".into(),
        "--ledger".into(),
        config.ledger_dir.clone().into_os_string(),
        "--hashes-per-tick".into(),
        config.tick_mode.as_arg().into(),
        config.output_dir.clone().into_os_string(),
    ]
}

/// Arguments for `create-snapshot`.
pub fn create_snapshot_args(params: &SnapshotParams) -> Vec<OsString> {
    vec![
        "create-snapshot".into(),
        "--hashes-per-tick".into(),
        params.tick_mode.as_arg().into(),
        "--ledger".into(),
        params.ledger_dir.clone().into_os_string(),
        "--faucet-pubkey".into(),
        params.faucet_keypair_path.clone().into_os_string(),
        "--faucet-lamports".into(),
        params.faucet_lamports.to_string().into(),
        "--bootstrap-validator".into(),
        params.bootstrap.identity.to_base58().into(),
        params.bootstrap.vote.to_base58().into(),
        params.bootstrap.stake.to_base58().into(),
        params.slot.to_string().into(),
        params.output_dir.clone().into_os_string(),
    ]
}

#[async_trait]
impl LedgerTool for ExternalLedgerTool {
    async fn modify_genesis(&self, config: &GenesisConfig) -> Result<(), BootstrapError> {
        run_tool(
            &self.command,
            "modify-genesis",
            modify_genesis_args(config),
            Stage::GenesisMutation,
        )
        .await
    }

    async fn create_snapshot(&self, params: &SnapshotParams) -> Result<(), BootstrapError> {
        run_tool(
            &self.command,
            "create-snapshot",
            create_snapshot_args(params),
            Stage::SnapshotBuild,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BootstrapPubkeys, Pubkey, TickMode, FAUCET_LAMPORTS};
    use std::path::PathBuf;

    fn params(output_dir: PathBuf) -> SnapshotParams {
        SnapshotParams {
            ledger_dir: PathBuf::from("/cfg/latest-snapshot"),
            slot: 12345,
            faucet_keypair_path: PathBuf::from("/cfg/faucet.json"),
            faucet_pubkey: Pubkey::new([1; 32]),
            faucet_lamports: FAUCET_LAMPORTS,
            bootstrap: BootstrapPubkeys {
                identity: Pubkey::new([2; 32]),
                vote: Pubkey::new([3; 32]),
                stake: Pubkey::new([4; 32]),
            },
            tick_mode: TickMode::Sleep,
            output_dir,
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_modify_genesis_args() {
        let config = GenesisConfig {
            ledger_dir: PathBuf::from("/cfg/latest-snapshot"),
            output_dir: PathBuf::from("/cfg/bootstrap-validator"),
            tick_mode: TickMode::Sleep,
        };
        assert_eq!(
            strings(modify_genesis_args(&config)),
            vec![
                "modify-genesis",
                "--ledger",
                "/cfg/latest-snapshot",
                "--hashes-per-tick",
                "sleep",
                "/cfg/bootstrap-validator",
            ]
        );
    }

    #[test]
    fn test_create_snapshot_args() {
        let p = params(PathBuf::from("/cfg/out"));
        let args = strings(create_snapshot_args(&p));

        assert_eq!(args[0], "create-snapshot");
        assert_eq!(&args[1..3], ["--hashes-per-tick", "sleep"]);
        assert_eq!(&args[3..5], ["--ledger", "/cfg/latest-snapshot"]);
        assert_eq!(&args[5..7], ["--faucet-pubkey", "/cfg/faucet.json"]);
        assert_eq!(&args[7..9], ["--faucet-lamports", "500000000000000000"]);
        assert_eq!(args[9], "--bootstrap-validator");
        assert_eq!(args[10], Pubkey::new([2; 32]).to_base58());
        assert_eq!(args[11], Pubkey::new([3; 32]).to_base58());
        assert_eq!(args[12], Pubkey::new([4; 32]).to_base58());
        assert_eq!(args[13], "12345");
        assert_eq!(args[14], "/cfg/out");
        assert_eq!(args.len(), 15);
    }

    /// Shell stand-in that writes a snapshot named after its slot argument.
    #[cfg(unix)]
    fn fake_ledger_tool() -> ExternalLedgerTool {
        let script = r#"
            for last; do :; done
            n=0
            for arg; do
                n=$((n + 1))
                if [ "$n" -eq $(($# - 1)) ]; then slot="$arg"; fi
            done
            case "$1" in
                create-snapshot) : > "$last/snapshot-$slot-FakeHash.tar.bz2" ;;
                modify-genesis) : > "$last/genesis.tar.bz2" ;;
                *) exit 2 ;;
            esac
        "#;
        ExternalLedgerTool::new(ToolCommand::new("sh").with_prefix_args(["-c", script, "sh"]))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_create_snapshot_runs_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_ledger_tool();

        tool.create_snapshot(&params(dir.path().to_path_buf()))
            .await
            .unwrap();

        assert!(dir.path().join("snapshot-12345-FakeHash.tar.bz2").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_modify_genesis_runs_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_ledger_tool();
        let config = GenesisConfig {
            ledger_dir: dir.path().to_path_buf(),
            output_dir: dir.path().to_path_buf(),
            tick_mode: TickMode::Sleep,
        };

        tool.modify_genesis(&config).await.unwrap();

        assert!(dir.path().join("genesis.tar.bz2").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_is_tool_invocation_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ExternalLedgerTool::new(
            ToolCommand::new("sh").with_prefix_args(["-c", "exit 1", "sh"]),
        );

        let result = tool.create_snapshot(&params(dir.path().to_path_buf())).await;

        match result {
            Err(err @ BootstrapError::ToolInvocation { .. }) => {
                assert_eq!(err.stage(), Stage::SnapshotBuild);
            }
            other => panic!("expected ToolInvocation, got {:?}", other),
        }
    }
}
