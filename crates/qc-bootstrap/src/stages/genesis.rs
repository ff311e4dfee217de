//! Genesis mutation: rewrite the staged genesis to sleep tick mode.

use tracing::info;

use crate::config::WorkspaceConfig;
use crate::domain::{BootstrapError, GenesisConfig, Stage, TickMode};
use crate::ports::LedgerTool;

/// Run `modify-genesis` and check that the patched archive was written.
pub async fn mutate_genesis<L>(
    tool: &L,
    workspace: &WorkspaceConfig,
) -> Result<GenesisConfig, BootstrapError>
where
    L: LedgerTool + ?Sized,
{
    let config = GenesisConfig {
        ledger_dir: workspace.staging_dir(),
        output_dir: workspace.bootstrap_dir(),
        tick_mode: TickMode::Sleep,
    };

    info!(
        stage = %Stage::GenesisMutation,
        ledger = %config.ledger_dir.display(),
        tick_mode = config.tick_mode.as_arg(),
        "Rewriting genesis"
    );

    tool.modify_genesis(&config).await?;

    let output = workspace.genesis_output_path();
    if !output.is_file() {
        return Err(BootstrapError::tool(
            Stage::GenesisMutation,
            "modify-genesis",
            format!("exited successfully but {} is missing", output.display()),
        ));
    }

    info!(genesis = %output.display(), "Genesis rewritten");
    Ok(config)
}
