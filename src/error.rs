//! Error types for scanning the source directory and moving files.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for organizer operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Errors that can occur while organizing a directory.
///
/// `SourceUnreadable` and `EntryUnreadable` are fatal: they are raised while
/// scanning, before any file has been touched. The remaining variants are
/// per-file and end up in the run summary instead of aborting the batch.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The source directory could not be listed.
    #[error("Error reading directory {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An entry of the source directory could not be inspected.
    #[error("Error reading entry {}: {source}", .path.display())]
    EntryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Something already lives at the computed destination.
    #[error("Destination already exists: {}", .path.display())]
    DestinationExists { path: PathBuf },

    /// The destination's parent directory could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The move itself failed (permissions, full disk, ...).
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// A cross-device move failed and the copy at the destination could not
    /// be removed either, so the file now exists in both places.
    #[error(
        "Failed to move {} to {}: {source} (copy left behind, removal failed: {cleanup})",
        .from.display(),
        .to.display()
    )]
    CopyLeftBehind {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
        cleanup: std::io::Error,
    },
}
