//! Binary entry point: arguments, logging, broker, relay, shutdown

use super::cli::args::Args;
use super::relay::{Relay, RelayError, RelayStats};
use crate::broker::{MessageBroker, ShutdownOutcome};
use crate::core::logging::init_logging;
use crate::core::version::long_version;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use std::thread;

/// Parse the process arguments and run
pub fn startup() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Relay standard input through a freshly installed broker
pub fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let log_file = args.log_file();
    init_logging(
        args.log_level.as_deref(),
        args.log_format(),
        log_file.as_deref(),
        args.color_override().unwrap_or(false),
    )?;
    log::info!("msgbroker {} starting", long_version());

    let config = args.resolve_config()?;
    log::debug!("broker configuration: {:?}", config);

    let guard = MessageBroker::init_stderr(config)?;
    let broker = guard.broker();

    // Reading happens on a producer thread like any other client of the broker
    let producer = thread::Builder::new()
        .name("msgbroker-stdin".to_string())
        .spawn(move || -> Result<RelayStats, RelayError> {
            Relay::new(broker)?.run(io::stdin().lock())
        })?;
    let relayed = producer
        .join()
        .map_err(|_| "stdin relay thread panicked")?;

    let outcome = guard.shutdown()?;
    if outcome == ShutdownOutcome::TimedOut {
        log::warn!("broker output may be incomplete: shutdown timed out");
    }

    let stats = relayed?;
    log::info!(
        "relayed {} lines ({} shown, {} filtered)",
        stats.lines,
        stats.queued,
        stats.filtered
    );
    Ok(())
}
