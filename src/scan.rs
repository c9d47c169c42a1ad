/// Intake enumeration and per-file inspection.
use crate::classifier::{FileCandidate, extension_of};
use crate::config::CompiledIgnore;
use crate::error::{WatchError, WatchResult};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lists the regular files directly inside `intake` that pass `ignore`.
///
/// Directories, symlinks and other special entries are skipped. The order is
/// whatever the directory listing yields.
pub fn list_intake(intake: &Path, ignore: &CompiledIgnore) -> WatchResult<Vec<PathBuf>> {
    let entries = fs::read_dir(intake).map_err(|e| WatchError::IntakeReadFailure {
        path: intake.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| WatchError::IntakeReadFailure {
            path: intake.to_path_buf(),
            source: e,
        })?;

        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let name = entry.file_name();
        if ignore.is_candidate(&name.to_string_lossy()) {
            files.push(entry.path());
        } else {
            debug!("ignoring {}", entry.path().display());
        }
    }

    Ok(files)
}

/// Reads size and modification time for `path`.
///
/// A file whose modification time cannot be read is treated as modified at `now`.
pub fn inspect(path: &Path, now: DateTime<Local>) -> WatchResult<FileCandidate> {
    let metadata = fs::metadata(path).map_err(|e| WatchError::StatFailure {
        path: path.to_path_buf(),
        source: e,
    })?;

    let modified_at = match metadata.modified() {
        Ok(time) => DateTime::<Local>::from(time),
        Err(e) => {
            debug!("no modification time for {}: {}", path.display(), e);
            now
        }
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(FileCandidate {
        name,
        path: path.to_path_buf(),
        modified_at,
        size_bytes: metadata.len(),
        extension: extension_of(path),
    })
}
