//! External process invocation shared by the tool adapters.

use std::ffi::OsString;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ToolCommand;
use crate::domain::{BootstrapError, Stage};

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Run `command` with `args`, waiting for it to exit.
///
/// `subcommand` only labels logs and errors. A non-zero exit or a spawn
/// failure becomes `BootstrapError::ToolInvocation` for `stage`.
pub async fn run_tool(
    command: &ToolCommand,
    subcommand: &str,
    args: Vec<OsString>,
    stage: Stage,
) -> Result<(), BootstrapError> {
    let label = format!("{} {}", command.display_name(), subcommand);
    let argv = command.argv(args);

    info!(%stage, tool = %label, "Invoking external tool");
    debug!(program = %command.program.display(), ?argv, "Tool argv");

    let output = Command::new(&command.program)
        .args(&argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| BootstrapError::tool(stage, &label, format!("failed to spawn: {}", e)))?;

    if !output.stdout.is_empty() {
        debug!(tool = %label, stdout = %String::from_utf8_lossy(&output.stdout), "Tool output");
    }

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let tail = stderr_tail(&stderr, STDERR_TAIL_LINES);
    let reason = if tail.is_empty() {
        output.status.to_string()
    } else {
        format!("{}: {}", output.status, tail)
    };
    Err(BootstrapError::tool(stage, label, reason))
}

/// Last `lines` non-empty lines of `stderr`, joined with ` | `.
fn stderr_tail(stderr: &str, lines: usize) -> String {
    let kept: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let start = kept.len().saturating_sub(lines);
    kept[start..].join(" | ")
}
