//! Negotiator CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use molt_negotiator_cli::cli::{Cli, Commands};
use molt_negotiator_cli::output::OutputFormat;
use molt_negotiator_cli::{Scenario, curve, simulate};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Simulate(args) => {
            let scenario = Scenario::load(&args.scenario)
                .with_context(|| format!("loading scenario {}", args.scenario.display()))?;
            let report = simulate::run(&scenario, args.seed).context("simulation failed")?;
            format.write(&mut stdout, &report)?;
        }
        Commands::Curve(args) => {
            let report = curve::compute(&args).context("invalid curve parameters")?;
            format.write(&mut stdout, &report)?;
        }
    }
    Ok(())
}
