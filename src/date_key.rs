//! Calendar bucketing of modification times and the per-run marker.
//!
//! Modification times are always interpreted as UTC so that the same file
//! lands in the same bucket regardless of the machine's local timezone.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use datetidy::date_key::DateKey;
//! use std::time::SystemTime;
//!
//! let mtime = SystemTime::from(Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 59).unwrap());
//! let key = DateKey::from_system_time(mtime).unwrap();
//! assert_eq!((key.year, key.month, key.day), (2024, 5, 3));
//! assert_eq!(key.month_dir(), "05");
//! ```

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Format of the run marker embedded in destination paths.
pub const RUN_MARKER_FORMAT: &str = "%Y.%m.%d %H.%M.%S";

/// A UTC calendar day used to group files.
///
/// Ordering is chronological (year, then month, then day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// 1-31
    pub day: u32,
}

impl DateKey {
    /// Buckets a modification time by its UTC calendar date.
    ///
    /// Returns `None` when the time lies outside the range chrono can
    /// represent; some filesystems accept such mtimes.
    pub fn from_system_time(time: SystemTime) -> Option<Self> {
        let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => (i64::try_from(after.as_secs()).ok()?, after.subsec_nanos()),
            Err(err) => {
                let before = err.duration();
                let secs = i64::try_from(before.as_secs()).ok()?;
                match before.subsec_nanos() {
                    0 => (-secs, 0),
                    nanos => (-secs - 1, 1_000_000_000 - nanos),
                }
            }
        };
        DateTime::<Utc>::from_timestamp(secs, nanos).map(Self::from_utc)
    }

    pub fn from_utc(time: DateTime<Utc>) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
            day: time.day(),
        }
    }

    /// Name of the year directory, e.g. `2024`.
    pub fn year_dir(&self) -> String {
        self.year.to_string()
    }

    /// Name of the month directory, zero padded, e.g. `05`.
    pub fn month_dir(&self) -> String {
        format!("{:02}", self.month)
    }

    /// Zero padded day, e.g. `03`.
    pub fn day_label(&self) -> String {
        format!("{:02}", self.day)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// The timestamp fixed once per run and embedded in every destination path.
///
/// Two runs started at different seconds never produce the same marker, so
/// a later run can't land on a path created by an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMarker(String);

impl RunMarker {
    /// Builds the marker from the clock value captured at process start.
    pub fn new(started_at: NaiveDateTime) -> Self {
        Self(started_at.format(RUN_MARKER_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the per-day folder: `<DD> - MOVED <marker>`.
    pub fn day_folder(&self, key: &DateKey) -> String {
        format!("{} - MOVED {}", key.day_label(), self.0)
    }
}

impl fmt::Display for RunMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
