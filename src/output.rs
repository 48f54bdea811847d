//! Output formatting and progress display.
//!
//! Everything the user sees on the console goes through here: styled messages,
//! the two [`ProgressReporter`] implementations (one line per file, or a live
//! progress bar) and the end-of-run summary.

use crate::config::Exclusion;
use crate::date_key::DateKey;
use crate::error::OrganizeResult;
use crate::file_organizer::{
    FileProgress, MoveFailure, MoveMethod, MovePlan, ProgressReporter, RunSummary,
};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;

/// Manages CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for `total` moves.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the banner shown before prompting for paths.
    pub fn notice() {
        Self::header("datetidy: sort photos and videos into YYYY/MM/DD folders");
        Self::plain("Dates come from each file's modification time, not EXIF capture time.");
        Self::plain("Timestamps are read as UTC; results may differ between operating systems.");
        Self::plain("Edits kept outside the files (catalogs, sidecars) may lose track of them.");
        Self::plain("The destination contains the year folders; it is not a year folder.");
        Self::warning("Test on a small set first and back up your files before use.");
        println!();
    }

    /// Prints a table of file counts per day.
    pub fn day_table(counts: &BTreeMap<DateKey, usize>, total_files: usize) {
        println!("{:<10} | {}", "Day".bold(), "Files".bold());
        println!("{}", "-".repeat(20));

        for (day, count) in counts {
            println!(
                "{:<10} | {} {}",
                day.to_string(),
                count.to_string().green(),
                plural(*count)
            );
        }

        println!("{}", "-".repeat(20));
        println!(
            "{:<10} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files)
        );
    }

    /// Prints what a dry run would do.
    pub fn plan(plan: &MovePlan) {
        for pending in plan.iter() {
            Self::plain(&format!(
                " - {}\n   → {}",
                pending.source.display(),
                pending.destination.display()
            ));
        }
        Self::print_skipped(plan.skipped());

        let counts: BTreeMap<DateKey, usize> = plan
            .groups()
            .iter()
            .map(|(day, moves)| (*day, moves.len()))
            .collect();
        Self::header("DRY RUN SUMMARY");
        Self::day_table(&counts, plan.len());
    }

    /// Prints the end-of-run summary, including every failure.
    pub fn summary(summary: &RunSummary) {
        Self::header("SUMMARY");
        Self::day_table(&summary.moved_per_day, summary.moved());
        Self::print_skipped(&summary.skipped);

        if summary.failures.is_empty() {
            Self::success(&format!("{} moved, no failures.", summary.moved()));
            return;
        }

        if let Err(err) = Self::write_failures(&mut io::stdout().lock(), &summary.failures) {
            tracing::warn!(error = %err, "could not print failure list");
        }
        Self::warning("Some files could not be moved. Please move them manually.");
    }

    /// Writes the `FAILED` header and one entry per failure to `out`.
    pub fn write_failures<W: Write>(out: &mut W, failures: &[MoveFailure]) -> io::Result<()> {
        writeln!(out, "\n{}", format!("FAILED ({})", failures.len()).bold())?;
        for failure in failures {
            writeln!(
                out,
                "  {} {}\n    → {}\n    {}",
                "✗".red(),
                failure.source.display(),
                failure.destination.display(),
                failure.error.to_string().red()
            )?;
        }
        Ok(())
    }

    fn print_skipped(skipped: &[(PathBuf, Exclusion)]) {
        if skipped.is_empty() {
            return;
        }
        Self::header(&format!("Left in place ({})", skipped.len()));
        for (path, reason) in skipped {
            Self::plain(&format!("  - {}: {}", path.display(), reason));
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Prints one line per file: `Moving <src> -> <dest> ... SUCCESS`.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn start(&mut self, total: usize) {
        OutputFormatter::info(&format!("Moving {} {}", total, plural(total)));
    }

    fn file_started(&mut self, progress: &FileProgress<'_>) {
        print!(
            "[{}/{}] Moving {} -> {} ... ",
            progress.index,
            progress.total,
            progress.pending.source.display(),
            progress.pending.destination.display()
        );
        let _ = io::stdout().flush();
    }

    fn file_finished(&mut self, _progress: &FileProgress<'_>, result: &OrganizeResult<MoveMethod>) {
        match result {
            Ok(_) => println!("{}", "SUCCESS".green()),
            Err(e) => println!("{} {}", "FAILURE".red(), e),
        }
    }
}

/// Shows a live counter instead of per-file lines; failures are still printed.
#[derive(Default)]
pub struct ProgressBarReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter for ProgressBarReporter {
    fn start(&mut self, total: usize) {
        self.bar = Some(OutputFormatter::create_progress_bar(total as u64));
    }

    fn file_started(&mut self, progress: &FileProgress<'_>) {
        if let Some(bar) = &self.bar {
            let name = progress
                .pending
                .source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            bar.set_message(name);
        }
    }

    fn file_finished(&mut self, progress: &FileProgress<'_>, result: &OrganizeResult<MoveMethod>) {
        if let Some(bar) = &self.bar {
            if let Err(e) = result {
                bar.println(format!(
                    "{} {}: {}",
                    "✗".red(),
                    progress.pending.source.display(),
                    e
                ));
            }
            bar.inc(1);
        }
    }

    fn finish(&mut self, summary: &RunSummary) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(format!(
                "{} moved, {} failed",
                summary.moved(),
                summary.failed()
            ));
        }
    }
}
