//! datetidy - sort a flat folder of photos and videos into a date tree
//!
//! This library scans a source directory, buckets every regular file by the
//! UTC calendar day of its modification time and moves it to
//! `<destination>/<YYYY>/<MM>/<DD> - MOVED <run start>/`, optionally with a
//! `Videos/` folder for video files. Failed moves are collected and reported
//! at the end instead of stopping the run.

pub mod cli;
pub mod config;
pub mod date_key;
pub mod error;
pub mod file_organizer;
pub mod media;
pub mod output;

pub use config::{CompiledFilters, Config, ConfigError};
pub use date_key::{DateKey, RunMarker};
pub use error::{OrganizeError, OrganizeResult};
pub use file_organizer::{FileOrganizer, MovePlan, ProgressReporter, RunSummary, organize};
pub use media::{MediaClassifier, MediaKind};

pub use cli::{Cli, RunOutcome, run_cli};
