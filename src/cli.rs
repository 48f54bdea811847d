//! Command-line interface for datetidy.
//!
//! This module handles:
//! - Argument parsing
//! - Prompting for paths that weren't given on the command line
//! - Merging command-line flags over the configuration file
//! - Running the organizer (or a dry run) and printing the results

use crate::config::{Config, ConfigError};
use crate::date_key::RunMarker;
use crate::error::OrganizeError;
use crate::file_organizer::{FileOrganizer, MovePlan, ProgressReporter, RunSummary};
use crate::output::{ConsoleReporter, OutputFormatter, ProgressBarReporter};
use chrono::NaiveDateTime;
use clap::{ArgAction, Parser};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Move photos and videos into YYYY/MM/DD folders by modification time.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "datetidy", version, about)]
pub struct Cli {
    /// Directory holding the files to move. Prompted for if omitted.
    pub source: Option<PathBuf>,

    /// Directory containing the year folders. Prompted for if omitted.
    pub destination: Option<PathBuf>,

    /// Configuration file (defaults to .datetidyrc.toml, then ~/.config/datetidy/config.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show where files would go without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Keep videos next to the photos instead of in a Videos folder.
    #[arg(long)]
    pub no_video_folder: bool,

    /// Show a progress bar instead of one line per file.
    #[arg(long)]
    pub progress: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Errors that stop a run before or instead of moving files.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),
}

/// What a run did.
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing was moved; this is what would have happened.
    DryRun(MovePlan),
    /// Moves were attempted.
    Completed(RunSummary),
}

impl Cli {
    /// Returns the source and destination, prompting for any that are missing.
    pub fn resolve_paths<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> io::Result<(PathBuf, PathBuf)> {
        let source = match &self.source {
            Some(path) => path.clone(),
            None => prompt_path(input, output, "Absolute source path: ")?,
        };
        let destination = match &self.destination {
            Some(path) => path.clone(),
            None => prompt_path(input, output, "Absolute destination path: ")?,
        };
        Ok((source, destination))
    }

    /// Loads configuration and applies command-line overrides.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load(self.config.as_deref())?;
        if self.no_video_folder {
            config.organize.separate_videos = false;
        }
        if self.progress {
            config.organize.progress_bar = true;
        }
        Ok(config)
    }
}

/// Reads one path from `input` after writing `label` to `output`.
///
/// Surrounding whitespace and quotes (as left by drag-and-drop into a
/// terminal) are stripped. An empty answer is an error.
pub fn prompt_path<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<PathBuf> {
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no path entered",
        ));
    }

    let trimmed = line.trim().trim_matches(|c| c == '"' || c == '\'');
    if trimmed.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "no path entered"));
    }
    Ok(PathBuf::from(trimmed))
}

/// Runs datetidy on `source`, writing into `destination`.
///
/// `started_at` is the clock value captured when the process started; it
/// becomes the run marker in every destination path.
///
/// # Examples
///
/// ```no_run
/// use chrono::Local;
/// use datetidy::cli::{run_cli, Cli, RunOutcome};
/// use std::path::Path;
///
/// let cli = Cli::default();
/// let started_at = Local::now().naive_local();
/// let outcome = run_cli(&cli, Path::new("/mnt/card"), Path::new("/photos"), started_at);
/// if let Ok(RunOutcome::Completed(summary)) = outcome {
///     println!("{} moved", summary.moved());
/// }
/// ```
pub fn run_cli(
    cli: &Cli,
    source: &Path,
    destination: &Path,
    started_at: NaiveDateTime,
) -> Result<RunOutcome, CliError> {
    let config = cli.load_config()?;
    let filters = config.compile_filters()?;

    let organizer = FileOrganizer::new(destination, RunMarker::new(started_at))
        .separate_videos(config.organize.separate_videos)
        .with_filters(filters);

    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        marker = %organizer.marker(),
        dry_run = cli.dry_run,
        "starting run"
    );

    let entries = FileOrganizer::scan(source)?;
    let plan = organizer.plan(entries);

    if cli.dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", source.display()));
        if plan.is_empty() {
            OutputFormatter::plain("No files found to move.");
        } else {
            OutputFormatter::plan(&plan);
        }
        OutputFormatter::success("Dry run complete. No files were moved.");
        return Ok(RunOutcome::DryRun(plan));
    }

    OutputFormatter::info(&format!("Organizing contents of: {}", source.display()));
    if plan.is_empty() && plan.skipped().is_empty() {
        OutputFormatter::plain("No files found to move.");
    }

    let mut reporter: Box<dyn ProgressReporter> = if config.organize.progress_bar {
        Box::new(ProgressBarReporter::default())
    } else {
        Box::new(ConsoleReporter)
    };
    let summary = FileOrganizer::execute(&plan, reporter.as_mut());
    OutputFormatter::summary(&summary);

    Ok(RunOutcome::Completed(summary))
}
