//! Disposition rules for intake files.
//!
//! This module decides where a file belongs from nothing but its observed
//! attributes: age, size and extension. It performs no I/O, so every rule can
//! be exercised without touching a filesystem.
//!
//! # Examples
//!
//! ```
//! use chrono::{Local, TimeDelta};
//! use sortwatch::classifier::{Disposition, FileCandidate, Thresholds, classify};
//! use std::path::PathBuf;
//!
//! let now = Local::now();
//! let candidate = FileCandidate {
//!     name: "a.csv".to_string(),
//!     path: PathBuf::from("watch/a.csv"),
//!     modified_at: now - TimeDelta::days(2),
//!     size_bytes: 1024 * 1024,
//!     extension: ".csv".to_string(),
//! };
//! assert_eq!(classify(&candidate, &Thresholds::default(), now), Disposition::Ok);
//! ```

use chrono::{DateTime, Local, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Extensions accepted when no configuration overrides them.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = [".csv", ".txt", ".log"];

/// A regular file observed in the intake directory.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCandidate {
    /// Base name within the intake directory.
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// Last modification time.
    pub modified_at: DateTime<Local>,
    /// Size on disk.
    pub size_bytes: u64,
    /// Lower-cased extension including the leading dot, empty if none.
    pub extension: String,
}

/// The outcome of classifying a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Disposition {
    #[serde(rename = "OK")]
    Ok,
    TooOld,
    TooLarge,
    InvalidExtension,
}

impl Disposition {
    /// Label written to logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Disposition::Ok => "OK",
            Disposition::TooOld => "TooOld",
            Disposition::TooLarge => "TooLarge",
            Disposition::InvalidExtension => "InvalidExtension",
        }
    }

    /// The directory role that receives files with this disposition.
    pub fn destination(&self) -> Destination {
        match self {
            Disposition::Ok => Destination::Output,
            Disposition::TooOld => Destination::Archive,
            Disposition::TooLarge | Disposition::InvalidExtension => Destination::Quarantine,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Destination directory roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Output,
    Archive,
    Quarantine,
}

/// Limits a file must stay within to be accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Files older than this many days are archived.
    pub max_age_days: u32,
    /// Files larger than this many mebibytes are quarantined.
    pub max_size_mb: f64,
    /// Accepted extensions, lower-cased with a leading dot.
    pub allowed_extensions: BTreeSet<String>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_age_days: 7,
            max_size_mb: 50.0,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Classifies a candidate against the thresholds as of `now`.
///
/// Rules are checked in a fixed order and the first match wins:
/// 1. Age strictly greater than `max_age_days` → `TooOld`
/// 2. Size strictly greater than `max_size_mb` → `TooLarge`
/// 3. Extension not in the allowed set → `InvalidExtension`
/// 4. Otherwise → `Ok`
pub fn classify(
    candidate: &FileCandidate,
    thresholds: &Thresholds,
    now: DateTime<Local>,
) -> Disposition {
    let age = age_of(candidate.modified_at, now);
    if age > TimeDelta::days(i64::from(thresholds.max_age_days)) {
        return Disposition::TooOld;
    }

    if size_mb(candidate.size_bytes) > thresholds.max_size_mb {
        return Disposition::TooLarge;
    }

    if !thresholds.allowed_extensions.contains(&candidate.extension) {
        return Disposition::InvalidExtension;
    }

    Disposition::Ok
}

/// Elapsed time since `modified_at`. Modification times in the future count as zero.
pub fn age_of(modified_at: DateTime<Local>, now: DateTime<Local>) -> TimeDelta {
    now.signed_duration_since(modified_at)
        .max(TimeDelta::zero())
}

/// Number of whole days in `age`, truncated.
pub fn whole_days(age: TimeDelta) -> i64 {
    age.num_days()
}

/// Size in mebibytes.
pub fn size_mb(size_bytes: u64) -> f64 {
    size_bytes as f64 / BYTES_PER_MB
}

/// Size in mebibytes rounded to two decimals, ties to even.
pub fn rounded_mb(size_bytes: u64) -> f64 {
    (size_mb(size_bytes) * 100.0).round_ties_even() / 100.0
}

/// Lower-cased extension of `path` with its leading dot, or an empty string.
///
/// ```
/// use sortwatch::classifier::extension_of;
/// use std::path::Path;
///
/// assert_eq!(extension_of(Path::new("DATA.CSV")), ".csv");
/// assert_eq!(extension_of(Path::new("backup.tar.gz")), ".gz");
/// assert_eq!(extension_of(Path::new(".bashrc")), "");
/// ```
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn candidate(name: &str, age: TimeDelta, size_bytes: u64, now: DateTime<Local>) -> FileCandidate {
        FileCandidate {
            name: name.to_string(),
            path: PathBuf::from(name),
            modified_at: now - age,
            size_bytes,
            extension: extension_of(Path::new(name)),
        }
    }

    #[test]
    fn test_fresh_small_allowed_file_is_ok() {
        let now = Local::now();
        let file = candidate("a.csv", TimeDelta::days(2), MB, now);
        assert_eq!(classify(&file, &Thresholds::default(), now), Disposition::Ok);
    }

    #[test]
    fn test_old_file_is_archived() {
        let now = Local::now();
        let file = candidate("b.log", TimeDelta::days(10), MB, now);
        let disposition = classify(&file, &Thresholds::default(), now);
        assert_eq!(disposition, Disposition::TooOld);
        assert_eq!(disposition.destination(), Destination::Archive);
    }

    #[test]
    fn test_large_file_is_quarantined() {
        let now = Local::now();
        let file = candidate("c.csv", TimeDelta::days(1), 80 * MB, now);
        let disposition = classify(&file, &Thresholds::default(), now);
        assert_eq!(disposition, Disposition::TooLarge);
        assert_eq!(disposition.destination(), Destination::Quarantine);
    }

    #[test]
    fn test_unknown_extension_is_quarantined() {
        let now = Local::now();
        let file = candidate("d.exe", TimeDelta::days(1), MB, now);
        let disposition = classify(&file, &Thresholds::default(), now);
        assert_eq!(disposition, Disposition::InvalidExtension);
        assert_eq!(disposition.destination(), Destination::Quarantine);
    }

    #[test]
    fn test_age_wins_over_size_and_extension() {
        let now = Local::now();
        let file = candidate("e.exe", TimeDelta::days(30), 500 * MB, now);
        assert_eq!(
            classify(&file, &Thresholds::default(), now),
            Disposition::TooOld
        );
    }

    #[test]
    fn test_size_wins_over_extension() {
        let now = Local::now();
        let file = candidate("f.exe", TimeDelta::hours(1), 500 * MB, now);
        assert_eq!(
            classify(&file, &Thresholds::default(), now),
            Disposition::TooLarge
        );
    }

    #[test]
    fn test_age_threshold_is_exclusive() {
        let now = Local::now();
        let thresholds = Thresholds::default();

        let at_limit = candidate("g.txt", TimeDelta::days(7), MB, now);
        assert_eq!(classify(&at_limit, &thresholds, now), Disposition::Ok);

        let just_over = candidate("h.txt", TimeDelta::days(7) + TimeDelta::seconds(1), MB, now);
        assert_eq!(classify(&just_over, &thresholds, now), Disposition::TooOld);
    }

    #[test]
    fn test_size_threshold_is_exclusive() {
        let now = Local::now();
        let thresholds = Thresholds::default();

        let at_limit = candidate("i.txt", TimeDelta::zero(), 50 * MB, now);
        assert_eq!(classify(&at_limit, &thresholds, now), Disposition::Ok);

        let one_byte_over = candidate("j.txt", TimeDelta::zero(), 50 * MB + 1, now);
        assert_eq!(
            classify(&one_byte_over, &thresholds, now),
            Disposition::TooLarge
        );
    }

    #[test]
    fn test_future_modification_time_counts_as_fresh() {
        let now = Local::now();
        let file = candidate("k.csv", TimeDelta::days(-3), MB, now);
        assert_eq!(classify(&file, &Thresholds::default(), now), Disposition::Ok);
        assert_eq!(age_of(file.modified_at, now), TimeDelta::zero());
    }

    #[test]
    fn test_file_without_extension_is_invalid() {
        let now = Local::now();
        let file = candidate("README", TimeDelta::zero(), 10, now);
        assert_eq!(file.extension, "");
        assert_eq!(
            classify(&file, &Thresholds::default(), now),
            Disposition::InvalidExtension
        );
    }

    #[test]
    fn test_custom_extensions_replace_defaults() {
        let now = Local::now();
        let thresholds = Thresholds {
            allowed_extensions: [".json".to_string()].into_iter().collect(),
            ..Thresholds::default()
        };
        let json = candidate("l.json", TimeDelta::zero(), 10, now);
        let csv = candidate("m.csv", TimeDelta::zero(), 10, now);
        assert_eq!(classify(&json, &thresholds, now), Disposition::Ok);
        assert_eq!(
            classify(&csv, &thresholds, now),
            Disposition::InvalidExtension
        );
    }

    #[test]
    fn test_whole_days_truncates() {
        assert_eq!(whole_days(TimeDelta::hours(47)), 1);
        assert_eq!(whole_days(TimeDelta::hours(48)), 2);
        assert_eq!(whole_days(TimeDelta::zero()), 0);
    }

    #[test]
    fn test_rounded_mb() {
        assert_eq!(rounded_mb(MB), 1.0);
        assert_eq!(rounded_mb(MB + MB / 4), 1.25);
        assert_eq!(rounded_mb(1), 0.0);
        assert_eq!(rounded_mb(1_234_567), 1.18);
    }

    #[test]
    fn test_rounded_mb_ties_go_to_even() {
        // 128 KiB and 640 KiB sit exactly on a half hundredth
        assert_eq!(rounded_mb(128 * 1024), 0.12);
        assert_eq!(rounded_mb(640 * 1024), 0.62);
        assert_eq!(rounded_mb(384 * 1024), 0.38);
    }

    #[test]
    fn test_extension_is_lower_cased() {
        assert_eq!(extension_of(Path::new("Report.TXT")), ".txt");
        assert_eq!(extension_of(Path::new("noext")), "");
    }

    #[test]
    fn test_labels() {
        assert_eq!(Disposition::Ok.label(), "OK");
        assert_eq!(Disposition::TooOld.to_string(), "TooOld");
        assert_eq!(Disposition::TooLarge.label(), "TooLarge");
        assert_eq!(Disposition::InvalidExtension.label(), "InvalidExtension");
    }
}
