//! Per-run outcome records and the CSV report artifact.

use crate::classifier::{Disposition, FileCandidate, age_of, rounded_mb, whole_days};
use crate::error::{WatchError, WatchResult};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Status written for a file left in the intake directory because its
/// destination already held a file of the same name.
pub const CONFLICT_STATUS: &str = "RelocationConflict";

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub filename: String,
    pub status: String,
    pub size_mb: f64,
    pub age_days: i64,
    pub moved_to: String,
}

impl OutcomeRecord {
    /// Record for a file that now lives in `dir`.
    pub fn new(
        candidate: &FileCandidate,
        status: &str,
        dir: &Path,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            filename: candidate.name.clone(),
            status: status.to_string(),
            size_mb: rounded_mb(candidate.size_bytes),
            age_days: whole_days(age_of(candidate.modified_at, now)),
            moved_to: dir.display().to_string(),
        }
    }

    /// Record for a file that was relocated with `disposition`.
    pub fn moved(
        candidate: &FileCandidate,
        disposition: Disposition,
        dir: &Path,
        now: DateTime<Local>,
    ) -> Self {
        Self::new(candidate, disposition.label(), dir, now)
    }

    /// Record for a file whose destination name was already taken.
    pub fn conflict(candidate: &FileCandidate, intake: &Path, now: DateTime<Local>) -> Self {
        Self::new(candidate, CONFLICT_STATUS, intake, now)
    }

    /// Whether the file actually left the intake directory.
    pub fn is_moved(&self) -> bool {
        self.status != CONFLICT_STATUS
    }
}

/// Report file name for a run started at `started_at`.
///
/// ```
/// use chrono::{Local, TimeZone};
/// use sortwatch::report::report_file_name;
///
/// let started = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
/// assert_eq!(report_file_name(started), "report_20240309_070501.csv");
/// ```
pub fn report_file_name(started_at: DateTime<Local>) -> String {
    format!("report_{}.csv", started_at.format("%Y%m%d_%H%M%S"))
}

/// Writes `records` as CSV into `dir`, returning the report path.
///
/// The header is always written, followed by one row per record in order.
/// An existing report with the same name is replaced.
pub fn write_report(
    dir: &Path,
    started_at: DateTime<Local>,
    records: &[OutcomeRecord],
) -> WatchResult<PathBuf> {
    let path = dir.join(report_file_name(started_at));
    let moved = records.iter().filter(|r| r.is_moved()).count();
    let failure = |source: csv::Error| WatchError::ReportWriteFailure {
        path: path.clone(),
        moved,
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(failure)?;
    for record in records {
        writer.serialize(record).map_err(failure)?;
    }
    writer.flush().map_err(|e| failure(e.into()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::extension_of;
    use chrono::{TimeDelta, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    fn candidate(name: &str, age: TimeDelta, size_bytes: u64, now: DateTime<Local>) -> FileCandidate {
        FileCandidate {
            name: name.to_string(),
            path: PathBuf::from("watch").join(name),
            modified_at: now - age,
            size_bytes,
            extension: extension_of(Path::new(name)),
        }
    }

    #[test]
    fn test_record_fields() {
        let now = Local::now();
        let file = candidate("a.csv", TimeDelta::days(2) + TimeDelta::hours(5), 1024 * 1024, now);
        let record = OutcomeRecord::moved(&file, Disposition::Ok, Path::new("/base/output"), now);

        assert_eq!(record.filename, "a.csv");
        assert_eq!(record.status, "OK");
        assert_eq!(record.size_mb, 1.0);
        assert_eq!(record.age_days, 2);
        assert_eq!(record.moved_to, "/base/output");
        assert!(record.is_moved());
    }

    #[test]
    fn test_conflict_record_points_at_intake() {
        let now = Local::now();
        let file = candidate("a.csv", TimeDelta::zero(), 10, now);
        let record = OutcomeRecord::conflict(&file, Path::new("/base/watch"), now);

        assert_eq!(record.status, CONFLICT_STATUS);
        assert_eq!(record.moved_to, "/base/watch");
        assert!(!record.is_moved());
    }

    #[test]
    fn test_report_name_uses_start_time() {
        let started = Local.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(report_file_name(started), "report_20231231_235958.csv");
    }

    #[test]
    fn test_write_report() {
        let temp_dir = TempDir::new().unwrap();
        let now = Local::now();
        let records = vec![
            OutcomeRecord::moved(
                &candidate("a.csv", TimeDelta::days(2), 1024 * 1024, now),
                Disposition::Ok,
                Path::new("output"),
                now,
            ),
            OutcomeRecord::moved(
                &candidate("d.exe", TimeDelta::days(1), 1_234_567, now),
                Disposition::InvalidExtension,
                Path::new("quarantine"),
                now,
            ),
        ];

        let path = write_report(temp_dir.path(), now, &records).unwrap();

        assert_eq!(path, temp_dir.path().join(report_file_name(now)));
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "filename,status,size_mb,age_days,moved_to");
        assert_eq!(lines[1], "a.csv,OK,1.0,2,output");
        assert_eq!(lines[2], "d.exe,InvalidExtension,1.18,1,quarantine");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_report_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let result = write_report(&missing, Local::now(), &[]);

        assert!(matches!(
            result,
            Err(WatchError::ReportWriteFailure { moved: 0, .. })
        ));
    }
}
