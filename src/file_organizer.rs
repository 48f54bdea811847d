//! Date-based file organization.
//!
//! This module scans a flat source directory, buckets every regular file by the
//! UTC day of its modification time and moves it under
//! `<destination>/<YYYY>/<MM>/<DD> - MOVED <run marker>/`, with videos optionally
//! placed in a further `Videos/` folder. A failed move never aborts the batch;
//! it is recorded in the [`RunSummary`].

use crate::config::{CompiledFilters, Exclusion};
use crate::date_key::{DateKey, RunMarker};
use crate::error::{OrganizeError, OrganizeResult};
use crate::media::{MediaClassifier, MediaKind};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A regular file found in the source directory.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Full path of the file.
    pub path: PathBuf,
    /// File name component, kept as-is for the destination.
    pub file_name: OsString,
    /// Filesystem modification time.
    pub modified: SystemTime,
    /// UTC day of `modified`.
    pub date: DateKey,
}

impl SourceEntry {
    /// Builds an entry, rejecting paths without a file name and modification
    /// times that don't map to a calendar day.
    pub fn new(path: PathBuf, modified: SystemTime) -> OrganizeResult<Self> {
        let invalid = |reason: &str| OrganizeError::EntryUnreadable {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, reason.to_string()),
        };
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| invalid("path has no file name"))?;
        let date = DateKey::from_system_time(modified)
            .ok_or_else(|| invalid("modification time out of range"))?;
        Ok(Self {
            path,
            file_name,
            modified,
            date,
        })
    }
}

/// A file and the place it will be moved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub date: DateKey,
    pub kind: MediaKind,
}

/// All pending moves of a run, grouped by day.
///
/// Days iterate chronologically; within a day, moves keep the order in which
/// the source directory listed them.
#[derive(Debug, Default)]
pub struct MovePlan {
    groups: BTreeMap<DateKey, Vec<PendingMove>>,
    skipped: Vec<(PathBuf, Exclusion)>,
}

impl MovePlan {
    fn push(&mut self, pending: PendingMove) {
        self.groups.entry(pending.date).or_default().push(pending);
    }

    /// Number of files that will be moved.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Moves in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingMove> {
        self.groups.values().flatten()
    }

    /// Moves grouped by day.
    pub fn groups(&self) -> &BTreeMap<DateKey, Vec<PendingMove>> {
        &self.groups
    }

    /// Files left in place by the filter rules.
    pub fn skipped(&self) -> &[(PathBuf, Exclusion)] {
        &self.skipped
    }
}

/// How a successful move was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMethod {
    /// Same volume, atomic rename.
    Renamed,
    /// Different volume, copied then source removed.
    Copied,
}

/// A move that could not be completed.
#[derive(Debug)]
pub struct MoveFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: OrganizeError,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files moved per day.
    pub moved_per_day: BTreeMap<DateKey, usize>,
    /// Every move that failed, in execution order.
    pub failures: Vec<MoveFailure>,
    /// Files left in place by the filter rules.
    pub skipped: Vec<(PathBuf, Exclusion)>,
}

impl RunSummary {
    pub fn moved(&self) -> usize {
        self.moved_per_day.values().sum()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Files that a move was attempted for.
    pub fn attempted(&self) -> usize {
        self.moved() + self.failed()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Position of a file within the run, handed to a [`ProgressReporter`].
#[derive(Debug, Clone, Copy)]
pub struct FileProgress<'a> {
    pub pending: &'a PendingMove,
    /// 1-based index.
    pub index: usize,
    pub total: usize,
}

/// Receives per-file progress while a plan executes.
///
/// The organizer doesn't care how progress is shown; see
/// [`crate::output`] for the console implementations.
pub trait ProgressReporter {
    fn start(&mut self, _total: usize) {}

    fn file_started(&mut self, _progress: &FileProgress<'_>) {}

    fn file_finished(&mut self, progress: &FileProgress<'_>, result: &OrganizeResult<MoveMethod>);

    fn finish(&mut self, _summary: &RunSummary) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn file_finished(
        &mut self,
        _progress: &FileProgress<'_>,
        _result: &OrganizeResult<MoveMethod>,
    ) {
    }
}

/// Computes destinations and carries out moves for one run.
#[derive(Debug)]
pub struct FileOrganizer {
    destination: PathBuf,
    marker: RunMarker,
    separate_videos: bool,
    classifier: MediaClassifier,
    filters: CompiledFilters,
}

impl FileOrganizer {
    /// Creates an organizer writing under `destination`, the directory that
    /// contains (or will contain) the year folders.
    pub fn new(destination: impl Into<PathBuf>, marker: RunMarker) -> Self {
        Self {
            destination: destination.into(),
            marker,
            separate_videos: true,
            classifier: MediaClassifier::default(),
            filters: CompiledFilters::default(),
        }
    }

    /// Enables or disables the `Videos` subfolder.
    pub fn separate_videos(mut self, enabled: bool) -> Self {
        self.separate_videos = enabled;
        self
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn marker(&self) -> &RunMarker {
        &self.marker
    }

    /// Lists the regular files of `source`, without descending into subdirectories.
    ///
    /// Directories, symlinks and special files are skipped. Any error while
    /// listing is returned as-is: nothing has been moved at this point. A file
    /// whose modification time has no calendar date is reported as
    /// [`OrganizeError::EntryUnreadable`].
    pub fn scan(source: &Path) -> OrganizeResult<Vec<SourceEntry>> {
        let read_error = |err| OrganizeError::SourceUnreadable {
            path: source.to_path_buf(),
            source: err,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(source).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            let path = entry.path();
            let entry_error = |err| OrganizeError::EntryUnreadable {
                path: path.clone(),
                source: err,
            };

            let file_type = entry.file_type().map_err(entry_error)?;
            if !file_type.is_file() {
                tracing::trace!(path = %path.display(), "skipping non-regular entry");
                continue;
            }

            let modified = entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .map_err(entry_error)?;

            entries.push(SourceEntry::new(path, modified)?);
        }

        tracing::debug!(source = %source.display(), count = entries.len(), "scanned source");
        Ok(entries)
    }

    /// Destination of a file with the given name and date.
    pub fn destination_for(
        &self,
        file_name: &OsString,
        date: &DateKey,
        kind: MediaKind,
    ) -> PathBuf {
        let mut path = self
            .destination
            .join(date.year_dir())
            .join(date.month_dir())
            .join(self.marker.day_folder(date));
        if self.separate_videos
            && let Some(subfolder) = kind.subfolder()
        {
            path.push(subfolder);
        }
        path.join(file_name)
    }

    /// Groups the scanned files by day and computes every destination.
    pub fn plan(&self, entries: Vec<SourceEntry>) -> MovePlan {
        let mut plan = MovePlan::default();

        for entry in entries {
            if let Some(reason) = self.filters.exclusion(&entry.path) {
                tracing::debug!(path = %entry.path.display(), %reason, "excluded by filters");
                plan.skipped.push((entry.path, reason));
                continue;
            }

            let date = entry.date;
            let kind = self.classifier.classify(&entry.path);
            let destination = self.destination_for(&entry.file_name, &date, kind);
            plan.push(PendingMove {
                source: entry.path,
                destination,
                date,
                kind,
            });
        }

        plan
    }

    /// Attempts every move of the plan, continuing past failures.
    pub fn execute(plan: &MovePlan, reporter: &mut dyn ProgressReporter) -> RunSummary {
        let total = plan.len();
        let mut summary = RunSummary {
            skipped: plan.skipped.clone(),
            ..Default::default()
        };

        tracing::info!(total, "moving files");
        reporter.start(total);

        for (i, pending) in plan.iter().enumerate() {
            let progress = FileProgress {
                pending,
                index: i + 1,
                total,
            };
            reporter.file_started(&progress);

            let result = move_file(&pending.source, &pending.destination);
            reporter.file_finished(&progress, &result);

            match result {
                Ok(method) => {
                    tracing::debug!(
                        from = %pending.source.display(),
                        to = %pending.destination.display(),
                        ?method,
                        "moved"
                    );
                    *summary.moved_per_day.entry(pending.date).or_insert(0) += 1;
                }
                Err(error) => {
                    tracing::warn!(from = %pending.source.display(), %error, "move failed");
                    summary.failures.push(MoveFailure {
                        source: pending.source.clone(),
                        destination: pending.destination.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            moved = summary.moved(),
            failed = summary.failed(),
            "run finished"
        );
        reporter.finish(&summary);
        summary
    }
}

/// Organizes `source` into `destination` with default options.
///
/// `started_at` is the wall-clock time the run began; it becomes the run
/// marker embedded in every destination path.
///
/// # Examples
///
/// ```no_run
/// use chrono::Local;
/// use datetidy::file_organizer::organize;
/// use std::path::Path;
///
/// let summary = organize(
///     Path::new("/mnt/card/DCIM"),
///     Path::new("/photos"),
///     Local::now().naive_local(),
/// )?;
/// println!("moved {} files, {} failed", summary.moved(), summary.failed());
/// # Ok::<(), datetidy::OrganizeError>(())
/// ```
pub fn organize(
    source: &Path,
    destination: &Path,
    started_at: NaiveDateTime,
) -> OrganizeResult<RunSummary> {
    let organizer = FileOrganizer::new(destination, RunMarker::new(started_at));
    let plan = organizer.plan(FileOrganizer::scan(source)?);
    Ok(FileOrganizer::execute(&plan, &mut SilentReporter))
}

/// Moves a single file, creating the destination's parent directory if needed.
///
/// If the first attempt fails because the parent directory is missing, the
/// directory tree is created and the move retried exactly once. An existing
/// destination is never overwritten.
pub fn move_file(source: &Path, destination: &Path) -> OrganizeResult<MoveMethod> {
    let first = try_move(source, destination);

    let missing_parent = destination.parent().filter(|parent| !parent.exists());
    let parent_is_cause = matches!(
        &first,
        Err(OrganizeError::MoveFailed { source: err, .. }) if err.kind() == io::ErrorKind::NotFound
    );

    // A vanished source also reports NotFound; don't leave empty folders for it
    let source_present = fs::symlink_metadata(source).is_ok();

    match missing_parent {
        Some(parent) if parent_is_cause && source_present => {
            fs::create_dir_all(parent).map_err(|err| OrganizeError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: err,
            })?;
            tracing::debug!(path = %parent.display(), "created directory");
            try_move(source, destination)
        }
        _ => first,
    }
}

fn try_move(source: &Path, destination: &Path) -> OrganizeResult<MoveMethod> {
    let move_error = |err| OrganizeError::MoveFailed {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: err,
    };

    // rename() replaces existing files on Unix
    if destination.try_exists().map_err(move_error)? {
        return Err(OrganizeError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(MoveMethod::Renamed),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(source, destination)
        }
        Err(err) => Err(move_error(err)),
    }
}

/// Moves across filesystems: copies the contents and timestamps, then removes
/// the source.
///
/// On any failure the copy is deleted again so the file only exists at its
/// source. If that deletion fails too, the error says so.
pub(crate) fn copy_then_remove(source: &Path, destination: &Path) -> OrganizeResult<MoveMethod> {
    if let Err(err) = copy_with_times(source, destination) {
        return Err(discard_copy(source, destination, err));
    }
    if let Err(err) = fs::remove_file(source) {
        return Err(discard_copy(source, destination, err));
    }
    Ok(MoveMethod::Copied)
}

fn copy_with_times(source: &Path, destination: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    fs::copy(source, destination)?;

    // fs::copy doesn't carry timestamps over
    let times = FileTimes::new()
        .set_modified(metadata.modified()?)
        .set_accessed(metadata.accessed()?);
    fs::File::options()
        .write(true)
        .open(destination)?
        .set_times(times)
}

fn discard_copy(source: &Path, destination: &Path, err: io::Error) -> OrganizeError {
    match fs::remove_file(destination) {
        Ok(()) => {}
        Err(cleanup) if cleanup.kind() == io::ErrorKind::NotFound => {}
        Err(cleanup) => {
            tracing::error!(
                path = %destination.display(),
                error = %cleanup,
                "could not remove incomplete copy"
            );
            return OrganizeError::CopyLeftBehind {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
                source: err,
                cleanup,
            };
        }
    }
    OrganizeError::MoveFailed {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: err,
    }
}
