//! One sweep over the intake directory.
//!
//! A run prepares the role directories, lists the intake directory, then for
//! each regular file reads its metadata, classifies it, moves it and records
//! the outcome. When at least one outcome was recorded a CSV report is written
//! into the base directory. Any fatal failure is logged at error level before
//! it is returned.

use crate::classifier::{Disposition, FileCandidate, classify};
use crate::config::{CompiledIgnore, FileErrorPolicy, ResolvedDirs, WatchConfig};
use crate::error::{WatchError, WatchResult};
use crate::relocate::Relocator;
use crate::report::{OutcomeRecord, write_report};
use crate::scan::{inspect, list_intake};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A file that was left in place because of a per-file failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsolatedFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    /// Report rows in processing order, including conflict rows.
    pub outcomes: Vec<OutcomeRecord>,
    /// Files skipped under the isolate policy.
    pub isolated_failures: Vec<IsolatedFailure>,
    /// Path of the written report, `None` when there was nothing to process.
    pub report_path: Option<PathBuf>,
}

impl RunSummary {
    /// Number of files that left the intake directory.
    pub fn moved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_moved()).count()
    }

    /// Number of files left in the intake directory because of a name conflict.
    pub fn conflicts(&self) -> usize {
        self.outcomes.len() - self.moved()
    }
}

/// What a run would do with one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedMove {
    pub filename: String,
    pub disposition: Disposition,
    pub destination: PathBuf,
}

/// Drives a run against a validated configuration.
pub struct RunCoordinator<'a> {
    config: &'a WatchConfig,
    dirs: ResolvedDirs,
}

impl<'a> RunCoordinator<'a> {
    pub fn new(config: &'a WatchConfig) -> Self {
        Self {
            dirs: config.resolved_dirs(),
            config,
        }
    }

    /// The directories this coordinator operates on.
    pub fn dirs(&self) -> &ResolvedDirs {
        &self.dirs
    }

    /// Runs one pass using the current local time.
    pub fn run(&self) -> WatchResult<RunSummary> {
        self.run_at(Local::now())
    }

    /// Runs one pass as of `now`.
    ///
    /// `now` is both the reference time for file ages and the timestamp in the
    /// report name.
    pub fn run_at(&self, now: DateTime<Local>) -> WatchResult<RunSummary> {
        Self::logged(self.sweep(now))
    }

    fn logged<T>(result: WatchResult<T>) -> WatchResult<T> {
        result.inspect_err(|e| error!("An error occurred: {}", e))
    }

    fn sweep(&self, now: DateTime<Local>) -> WatchResult<RunSummary> {
        info!("Watcher started.");

        let ignore = CompiledIgnore::compile(&self.config.filters)?;
        self.ensure_directories()?;

        let files = list_intake(&self.dirs.intake, &ignore)?;
        debug!("{} candidate file(s) in {}", files.len(), self.dirs.intake.display());

        self.sweep_files(files, now)
    }

    /// Processes `files` in order and writes the report.
    fn sweep_files(&self, files: Vec<PathBuf>, now: DateTime<Local>) -> WatchResult<RunSummary> {
        let mut summary = RunSummary {
            started_at: now,
            outcomes: Vec::new(),
            isolated_failures: Vec::new(),
            report_path: None,
        };

        let isolate = self.config.on_file_error == FileErrorPolicy::Isolate;
        for path in files {
            match self.process(&path, now) {
                Ok(record) => summary.outcomes.push(record),
                Err(e) if isolate && e.is_per_file() => {
                    error!("Skipping {}: {}", path.display(), e);
                    summary.isolated_failures.push(IsolatedFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if summary.outcomes.is_empty() {
            info!("No files to process.");
            return Ok(summary);
        }

        let report_path = write_report(&self.config.base_dir, now, &summary.outcomes)?;
        info!("Report generated at {}", report_path.display());
        summary.report_path = Some(report_path);

        Ok(summary)
    }

    /// Inspects, classifies and moves one file.
    ///
    /// A name conflict at the destination is not an error here: the file stays
    /// in the intake directory and a conflict record is returned.
    fn process(&self, path: &Path, now: DateTime<Local>) -> WatchResult<OutcomeRecord> {
        let candidate = inspect(path, now)?;
        let disposition = classify(&candidate, &self.config.thresholds, now);
        let target_dir = self.dirs.dir_for(disposition.destination());

        match Relocator::relocate(&candidate.path, target_dir) {
            Ok(_) => {
                info!(
                    "Moved {} to {} - Status: {}",
                    candidate.name,
                    target_dir.display(),
                    disposition
                );
                Ok(OutcomeRecord::moved(&candidate, disposition, target_dir, now))
            }
            Err(e @ WatchError::RelocationConflict { .. }) => {
                warn!("{} - Status: {}", e, disposition);
                Ok(OutcomeRecord::conflict(&candidate, &self.dirs.intake, now))
            }
            Err(e) => Err(e),
        }
    }

    /// Creates every role directory that does not exist yet.
    fn ensure_directories(&self) -> WatchResult<()> {
        for (role, dir) in self.dirs.roles() {
            fs::create_dir_all(dir).map_err(|e| WatchError::DirectorySetupFailure {
                path: dir.to_path_buf(),
                source: e,
            })?;
            debug!("{} directory ready at {}", role, dir.display());
        }
        Ok(())
    }

    /// Classifies the intake directory without moving anything.
    pub fn plan(&self) -> WatchResult<Vec<PlannedMove>> {
        self.plan_at(Local::now())
    }

    /// Classifies the intake directory as of `now` without touching the filesystem.
    ///
    /// A missing intake directory yields an empty plan.
    pub fn plan_at(&self, now: DateTime<Local>) -> WatchResult<Vec<PlannedMove>> {
        let ignore = CompiledIgnore::compile(&self.config.filters)?;
        if !self.dirs.intake.is_dir() {
            return Ok(Vec::new());
        }

        list_intake(&self.dirs.intake, &ignore)?
            .iter()
            .map(|path| {
                let candidate = inspect(path, now)?;
                Ok(self.planned(&candidate, now))
            })
            .collect()
    }

    fn planned(&self, candidate: &FileCandidate, now: DateTime<Local>) -> PlannedMove {
        let disposition = classify(candidate, &self.config.thresholds, now);
        PlannedMove {
            filename: candidate.name.clone(),
            disposition,
            destination: self.dirs.dir_for(disposition.destination()).to_path_buf(),
        }
    }
}
