use std::process;

use clap::Parser;

mod cli;
mod commands;
mod config;
mod exit_codes;

use cli::Cli;
use commands::CliContext;
use config::FormsmithConfig;
use exit_codes::EXIT_ERROR;

/// Load configuration for CLI usage, falling back to defaults when the
/// files are unreadable.
fn load_cli_configuration() -> FormsmithConfig {
    match FormsmithConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load configuration: {}", e);
            eprintln!("Warning: Configuration loading failed: {}", e);
            eprintln!("Continuing with default configuration...");
            FormsmithConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    configure_logging(cli.verbose, cli.debug, cli.quiet);

    let config = load_cli_configuration();
    tracing::debug!(?config, "configuration ready");

    let mut context = CliContext::new(config, cli.format, cli.verbose);
    if let Some(store) = cli.store {
        context = context.with_store_dir(store);
    }

    let exit_code = match commands::dispatch(cli.command, &context).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!("command failed: {e:?}");
            eprintln!("Error: {e:#}");
            EXIT_ERROR
        }
    };
    process::exit(exit_code);
}

fn configure_logging(verbose: bool, debug: bool, quiet: bool) {
    use tracing::Level;
    use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

    let log_level = if quiet {
        Level::ERROR
    } else if debug {
        Level::DEBUG
    } else if verbose {
        Level::TRACE
    } else {
        Level::WARN
    };

    registry()
        .with(EnvFilter::new(log_level.to_string()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
