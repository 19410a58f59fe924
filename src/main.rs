//! subctl - diagnostics for Submariner multi-cluster connectivity

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use subctl::cli::{Cli, Command};
use subctl::commands;
use subctl::config::load_config;
use subctl::reporter::Reporter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    setup_tracing(cli.verbose);

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable config file");
            Default::default()
        }
    };

    // Handle color settings
    if cli.no_color || !config.colors {
        owo_colors::set_override(false);
    }

    let result = match cli.command {
        Command::Diagnose(ref args) => {
            let mut status = Reporter::new(std::io::stdout().is_terminal());
            commands::run_diagnose(
                &args.command,
                &cli.selection(),
                &config,
                cli.verbose > 0,
                &mut status,
            )
            .await
        }
        Command::Version => {
            commands::run_version();
            Ok(true)
        }
        Command::Completions(ref args) => {
            generate_completions(args.shell);
            Ok(true)
        }
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "subctl", &mut std::io::stdout());
}
