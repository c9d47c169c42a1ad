//! Run configuration.
//!
//! Thresholds, directory roles, intake ignore rules and logging settings are
//! loaded once from a TOML file and passed by reference into a run. Every key
//! is optional; a missing file yields the defaults shown below.
//!
//! ```toml
//! base_dir = "/srv/intake"
//! on_file_error = "abort"          # or "isolate"
//!
//! [thresholds]
//! max_age_days = 7
//! max_size_mb = 50
//! allowed_extensions = [".csv", ".txt", ".log"]
//!
//! [directories]
//! intake = "watch"
//! output = "output"
//! archive = "archive"
//! quarantine = "quarantine"
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part"]
//! regex = ['^~\$']
//!
//! [filters.include]
//! patterns = []
//!
//! [logging]
//! file = "watcher.log"
//! level = "info"
//! ```

use crate::classifier::{Destination, Thresholds};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".sortwatch.toml";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("IO error reading configuration: {0}")]
    IoError(String),
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    #[error("max_size_mb must be a finite, non-negative number (got {0})")]
    InvalidSizeLimit(f64),
    #[error("Unknown log level '{0}'")]
    InvalidLogLevel(String),
    #[error("Directories '{first}' and '{second}' resolve to the same path {}", path.display())]
    DuplicateDirectory {
        first: &'static str,
        second: &'static str,
        path: PathBuf,
    },
}

/// What to do when a single file cannot be inspected or moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileErrorPolicy {
    /// Log the failure and end the run.
    #[default]
    Abort,
    /// Log the failure, leave the file in place and continue.
    Isolate,
}

/// Directory roles, relative to the base directory unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryNames {
    pub intake: PathBuf,
    pub output: PathBuf,
    pub archive: PathBuf,
    pub quarantine: PathBuf,
}

impl Default for DirectoryNames {
    fn default() -> Self {
        Self {
            intake: PathBuf::from("watch"),
            output: PathBuf::from("output"),
            archive: PathBuf::from("archive"),
            quarantine: PathBuf::from("quarantine"),
        }
    }
}

/// Rules deciding which intake files are left alone entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreRules {
    /// Whether dotfiles are candidates. Defaults to true.
    pub enable_hidden_files: bool,
    pub exclude: ExcludeRules,
    pub include: IncludeRules,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Files matching any of these stay in the intake directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact file names.
    pub filenames: Vec<String>,
    /// Glob patterns matched against the file name.
    pub patterns: Vec<String>,
    /// Regular expressions matched against the file name.
    pub regex: Vec<String>,
}

/// Patterns that make a file a candidate even when an exclude rule matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeRules {
    pub patterns: Vec<String>,
}

/// Where and how verbosely the run log is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file name inside the base directory.
    pub file: String,
    /// One of trace, debug, info, warn, error, off.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "watcher.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parses the configured level.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))
    }
}

/// Complete configuration for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory holding the role directories, reports and the log file.
    pub base_dir: PathBuf,
    pub on_file_error: FileErrorPolicy,
    pub thresholds: Thresholds,
    pub directories: DirectoryNames,
    pub filters: IgnoreRules,
    pub logging: LoggingConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            on_file_error: FileErrorPolicy::default(),
            thresholds: Thresholds::default(),
            directories: DirectoryNames::default(),
            filters: IgnoreRules::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_dir: Option<PathBuf>,
    pub max_age_days: Option<u32>,
    pub max_size_mb: Option<f64>,
    pub allowed_extensions: Vec<String>,
}

impl WatchConfig {
    /// Loads configuration, falling back to defaults.
    ///
    /// Sources are tried in order:
    /// 1. `config_path`, if given (it must exist)
    /// 2. `.sortwatch.toml` in the current directory
    /// 3. `~/.config/sortwatch/config.toml`
    /// 4. Built-in defaults
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
                .join("sortwatch")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Applies command-line overrides on top of loaded values.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(base_dir) = overrides.base_dir {
            self.base_dir = base_dir;
        }
        if let Some(days) = overrides.max_age_days {
            self.thresholds.max_age_days = days;
        }
        if let Some(size) = overrides.max_size_mb {
            self.thresholds.max_size_mb = size;
        }
        if !overrides.allowed_extensions.is_empty() {
            self.thresholds.allowed_extensions =
                overrides.allowed_extensions.into_iter().collect();
        }
    }

    /// Normalizes extensions and checks the invariants a run depends on.
    ///
    /// Extensions are lower-cased and given a leading dot. The four directory
    /// roles must resolve to distinct paths, none of them the base directory.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        let max_size = self.thresholds.max_size_mb;
        if !max_size.is_finite() || max_size < 0.0 {
            return Err(ConfigError::InvalidSizeLimit(max_size));
        }

        self.thresholds.allowed_extensions = self
            .thresholds
            .allowed_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| ext.len() > 1)
            .collect();

        self.logging.level_filter()?;

        let dirs = self.resolved_dirs();
        let base = normalize(&self.base_dir);
        let roles = dirs.roles();
        for (i, &(first, first_path)) in roles.iter().enumerate() {
            let first_norm = normalize(first_path);
            if first_norm == base {
                return Err(ConfigError::DuplicateDirectory {
                    first,
                    second: "base_dir",
                    path: first_path.to_path_buf(),
                });
            }
            for &(second, second_path) in &roles[i + 1..] {
                if first_norm == normalize(second_path) {
                    return Err(ConfigError::DuplicateDirectory {
                        first,
                        second,
                        path: second_path.to_path_buf(),
                    });
                }
            }
        }

        Ok(self)
    }

    /// Role directories joined onto the base directory.
    pub fn resolved_dirs(&self) -> ResolvedDirs {
        let join = |p: &Path| self.base_dir.join(p);
        ResolvedDirs {
            intake: join(&self.directories.intake),
            output: join(&self.directories.output),
            archive: join(&self.directories.archive),
            quarantine: join(&self.directories.quarantine),
        }
    }

    /// Path of the persistent log file.
    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join(&self.logging.file)
    }
}

/// The four directory roles as concrete paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDirs {
    pub intake: PathBuf,
    pub output: PathBuf,
    pub archive: PathBuf,
    pub quarantine: PathBuf,
}

impl ResolvedDirs {
    /// The directory receiving files routed to `destination`.
    pub fn dir_for(&self, destination: Destination) -> &Path {
        match destination {
            Destination::Output => &self.output,
            Destination::Archive => &self.archive,
            Destination::Quarantine => &self.quarantine,
        }
    }

    /// Every role with its name, intake first.
    pub fn roles(&self) -> [(&'static str, &Path); 4] {
        [
            ("intake", &self.intake),
            ("output", &self.output),
            ("archive", &self.archive),
            ("quarantine", &self.quarantine),
        ]
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Lexically removes `.` components and resolves `..` where possible.
///
/// A `..` only cancels a preceding named component. Leading `..` components
/// are kept, and `..` directly under the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Ignore rules compiled once per run.
#[derive(Debug)]
pub struct CompiledIgnore {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledIgnore {
    /// Compiles glob and regex rules.
    pub fn compile(rules: &IgnoreRules) -> Result<Self, ConfigError> {
        let globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_patterns: globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: globs(&rules.include.patterns)?,
        })
    }

    /// Whether a file with this name should be swept.
    ///
    /// Include patterns win over everything else. After that a file is skipped
    /// if it is hidden (and hidden files are disabled), named exactly, or
    /// matched by an exclude glob or regex.
    pub fn is_candidate(&self, file_name: &str) -> bool {
        if self.include_patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }
}
