//! Run options and file filtering loaded from TOML.
//!
//! Every field is optional. With no configuration file at all, every regular
//! file in the source directory is moved and videos get their own folder.
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! separate_videos = true
//! progress_bar = false
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db", ".DS_Store"]
//! patterns = ["*.tmp"]
//! extensions = ["xmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".datetidyrc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration in {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organize: OrganizeOptions,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Options controlling destination layout and presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOptions {
    /// Put video files in a `Videos` folder inside the day folder.
    #[serde(default = "default_true")]
    pub separate_videos: bool,

    /// Show a live progress bar instead of one line per file.
    #[serde(default)]
    pub progress_bar: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            separate_videos: true,
            progress_bar: false,
        }
    }
}

/// Rules deciding which regular files are left in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether files starting with "." are moved. Defaults to true.
    #[serde(default = "default_true")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names, e.g. "Thumbs.db".
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name, e.g. "*.tmp".
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Loads configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (must exist)
    /// 2. `.datetidyrc.toml` in the current directory
    /// 3. `~/.config/datetidy/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("datetidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Loads configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration");

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Compiles the filter rules for matching.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Why a file was left in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Hidden,
    Filename,
    Extension(String),
    Pattern(String),
    Regex(String),
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::Hidden => write!(f, "hidden file"),
            Exclusion::Filename => write!(f, "excluded file name"),
            Exclusion::Extension(ext) => write!(f, "excluded extension '{}'", ext),
            Exclusion::Pattern(pattern) => write!(f, "matches pattern '{}'", pattern),
            Exclusion::Regex(regex) => write!(f, "matches regex '{}'", regex),
        }
    }
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes: rules
                .exclude
                .regex
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Returns the first rule that keeps this file in place, if any.
    ///
    /// Include patterns win over everything; otherwise hidden files,
    /// exact names, extensions, globs and regexes are checked in that order.
    pub fn exclusion(&self, file_path: &Path) -> Option<Exclusion> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return None;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return Some(Exclusion::Hidden);
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return Some(Exclusion::Filename);
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return Some(Exclusion::Extension(ext_lower));
            }
        }

        if let Some(pattern) = self
            .exclude_patterns
            .iter()
            .find(|pattern| pattern.matches(&file_name))
        {
            return Some(Exclusion::Pattern(pattern.as_str().to_string()));
        }

        self.exclude_regexes
            .iter()
            .find(|regex| regex.is_match(&file_name))
            .map(|regex| Exclusion::Regex(regex.as_str().to_string()))
    }

    pub fn should_include(&self, file_path: &Path) -> bool {
        self.exclusion(file_path).is_none()
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}
