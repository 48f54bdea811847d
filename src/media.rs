//! Media classification for deciding whether a file goes into a `Videos` folder.
//!
//! Classification is purely extension based and case-insensitive; file content
//! is never inspected.
//!
//! # Examples
//!
//! ```
//! use datetidy::media::{MediaClassifier, MediaKind};
//! use std::path::Path;
//!
//! let classifier = MediaClassifier::default();
//! assert_eq!(classifier.classify(Path::new("clip.MOV")), MediaKind::Video);
//! assert_eq!(classifier.classify(Path::new("DSC_0001.NEF")), MediaKind::Other);
//! ```

use std::collections::HashSet;
use std::path::Path;

/// Extensions treated as video, lowercase and without the leading dot.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "wmv", "webm"];

/// Name of the subfolder that receives videos when separation is enabled.
pub const VIDEO_DIR: &str = "Videos";

/// Broad kind of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Video files (MP4, MOV, MKV, etc.)
    Video,
    /// Anything else: RAW images, JPEGs, sidecars...
    Other,
}

impl MediaKind {
    /// Returns the extra path segment for this kind, if any.
    pub fn subfolder(&self) -> Option<&'static str> {
        match self {
            MediaKind::Video => Some(VIDEO_DIR),
            MediaKind::Other => None,
        }
    }
}

/// Maps file extensions to a [`MediaKind`].
#[derive(Debug, Clone)]
pub struct MediaClassifier {
    video_extensions: HashSet<String>,
}

impl MediaClassifier {
    /// Creates a classifier with the standard video extensions.
    pub fn new() -> Self {
        Self {
            video_extensions: VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    /// Classifies a path by its extension.
    pub fn classify(&self, path: &Path) -> MediaKind {
        match path.extension() {
            Some(ext) if self.is_video_extension(&ext.to_string_lossy()) => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }

    /// Checks an extension (with or without leading dot) against the video set.
    pub fn is_video_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.video_extensions.contains(&ext)
    }
}

impl Default for MediaClassifier {
    fn default() -> Self {
        Self::new()
    }
}
