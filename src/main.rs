use anyhow::Context;
use chrono::Local;
use clap::Parser;
use datetidy::cli::{Cli, run_cli};
use datetidy::output::OutputFormatter;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "datetidy=warn",
        1 => "datetidy=info",
        _ => "datetidy=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    // Fixed once per run; embedded in every destination path
    let started_at = Local::now().naive_local();

    OutputFormatter::notice();

    let (source, destination) = cli
        .resolve_paths(&mut io::stdin().lock(), &mut io::stdout())
        .context("Could not read paths")?;

    if let Err(e) = run_cli(&cli, &source, &destination, started_at) {
        OutputFormatter::error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
