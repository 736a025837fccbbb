use std::process::ExitCode;
use std::sync::Arc;

use barista_core::utils::logging::init_logging;
use barista_engine::SpecScheduler;
use barista_isolation::ScriptHost;
use clap::Parser;
use tracing::info;

mod discovery;
mod options;
mod reporter;

use options::Cli;

/// Exit status for configuration and usage errors
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("barista: {:#}", err);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = cli.resolve_config()?;
    // A subscriber may already be installed when embedded; keep going.
    let _ = init_logging(config.log_level);

    let specs = discovery::collect_specs(&cli.spec_paths())?;
    info!(count = specs.len(), "spec files collected");

    let scheduler = SpecScheduler::new(config, Arc::new(ScriptHost::new()))?;
    if !cli.json {
        reporter::attach(scheduler.events());
    }

    let summary = scheduler.run(specs).await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary.report)?);
    }

    Ok(if summary.exit_code() == 0 { 0 } else { 1 })
}
