//! Error types shared by every stage of a sweep.
//!
//! Classification never fails; every variant here originates from physical I/O
//! or from configuration that could not be loaded.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running a pass over the intake directory.
#[derive(Debug, Error)]
pub enum WatchError {
    /// One of the required directories could not be created or is not a directory.
    #[error("Failed to prepare directory {}: {source}", path.display())]
    DirectorySetupFailure { path: PathBuf, source: io::Error },

    /// The intake directory listing could not be read.
    #[error("Failed to read intake directory {}: {source}", path.display())]
    IntakeReadFailure { path: PathBuf, source: io::Error },

    /// Metadata for a candidate file could not be read.
    #[error("Failed to read metadata for {}: {source}", path.display())]
    StatFailure { path: PathBuf, source: io::Error },

    /// The destination already holds a file with the same name.
    #[error(
        "Refusing to move {}: {} already exists",
        source_path.display(),
        destination.display()
    )]
    RelocationConflict {
        source_path: PathBuf,
        destination: PathBuf,
    },

    /// The file could not be moved to its destination.
    #[error(
        "Failed to move {} to {}: {source}",
        source_path.display(),
        destination.display()
    )]
    RelocationFailure {
        source_path: PathBuf,
        destination: PathBuf,
        source: io::Error,
    },

    /// The report could not be written after files were already moved.
    #[error("Failed to write report {} after moving {moved} file(s): {source}", path.display())]
    ReportWriteFailure {
        path: PathBuf,
        moved: usize,
        source: csv::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WatchError {
    /// Whether the error concerns a single file rather than the whole pass.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::StatFailure { .. }
                | Self::RelocationConflict { .. }
                | Self::RelocationFailure { .. }
        )
    }
}

/// Result type for sweep operations.
pub type WatchResult<T> = Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_both_paths() {
        let err = WatchError::RelocationConflict {
            source_path: PathBuf::from("/base/watch/a.csv"),
            destination: PathBuf::from("/base/output/a.csv"),
        };
        let message = err.to_string();
        assert!(message.contains("/base/watch/a.csv"));
        assert!(message.contains("/base/output/a.csv"));
    }

    #[test]
    fn test_per_file_classification() {
        let stat = WatchError::StatFailure {
            path: PathBuf::from("x"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let setup = WatchError::DirectorySetupFailure {
            path: PathBuf::from("x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(stat.is_per_file());
        assert!(!setup.is_per_file());
    }
}
