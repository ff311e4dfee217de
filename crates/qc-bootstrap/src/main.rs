//! `qc-bootstrap`: prepare a bootstrap validator genesis and snapshot.
//!
//! Exit code 0 on success, 1 on any stage failure.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use qc_bootstrap::cli::Args;
use qc_bootstrap::telemetry::init_logging;
use qc_bootstrap::{
    BootstrapApi, BootstrapConfig, BootstrapPipeline, ExternalKeygen, ExternalLedgerTool,
    HttpArtifactSource, KeyGenerator, NativeKeygen, VERSION,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_config()) {
        eprintln!("qc-bootstrap: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("qc-bootstrap: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.to_config();
    info!(
        version = VERSION,
        root = %config.workspace.root.display(),
        snapshot_url = %config.snapshot_url,
        "Starting qc-bootstrap"
    );

    let pipeline = build_pipeline(config)?;
    let snapshot = pipeline.run().await.map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!("{} stage failed", stage))
    })?;

    if args.json {
        let report = serde_json::to_string_pretty(&snapshot).context("serializing snapshot report")?;
        println!("{}", report);
    } else {
        println!(
            "bootstrap snapshot at slot {}: {}",
            snapshot.slot,
            snapshot.snapshot_path.display()
        );
    }
    Ok(())
}

fn build_pipeline(
    config: BootstrapConfig,
) -> anyhow::Result<BootstrapPipeline<HttpArtifactSource, ExternalLedgerTool, Box<dyn KeyGenerator>>>
{
    let source = HttpArtifactSource::new(&config.snapshot_url, &config.http)
        .context("configuring artifact source")?;
    let ledger_tool = ExternalLedgerTool::new(config.ledger_tool.clone());
    let keygen: Box<dyn KeyGenerator> = match &config.keygen {
        Some(command) => Box::new(ExternalKeygen::new(command.clone())),
        None => Box::new(NativeKeygen),
    };

    BootstrapPipeline::new(config, source, ledger_tool, keygen).context("invalid configuration")
}
