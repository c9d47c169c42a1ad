//! Physical relocation of intake files into their destination directories.
//!
//! Moves keep the original file name and never overwrite: if the destination
//! already holds an entry of that name the move is refused and the source is
//! left untouched.

use crate::error::{WatchError, WatchResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Moves files from the intake directory into destination directories.
pub struct Relocator;

impl Relocator {
    /// Moves `file_path` into `dest_dir`, returning the new path.
    ///
    /// The destination directory must already exist. The file is hard-linked
    /// into place and then unlinked from the intake directory, so an existing
    /// entry at the destination is never replaced, even one that appears after
    /// the move started. When source and destination live on different
    /// filesystems the file is copied into a newly created file instead. If the
    /// source cannot be removed afterwards the new copy is deleted again, so
    /// the file is never left in both places.
    ///
    /// # Errors
    ///
    /// * `RelocationConflict` if `dest_dir` already contains an entry with the same name
    /// * `RelocationFailure` for any other I/O failure
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortwatch::relocate::Relocator;
    /// use std::path::Path;
    ///
    /// match Relocator::relocate(Path::new("watch/a.csv"), Path::new("output")) {
    ///     Ok(new_path) => println!("now at {}", new_path.display()),
    ///     Err(e) => eprintln!("move failed: {}", e),
    /// }
    /// ```
    pub fn relocate(file_path: &Path, dest_dir: &Path) -> WatchResult<PathBuf> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| WatchError::RelocationFailure {
                source_path: file_path.to_path_buf(),
                destination: dest_dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
            })?;

        let destination = dest_dir.join(file_name);

        let moved = match fs::hard_link(file_path, &destination) {
            Ok(()) => Self::discard_on_err(fs::remove_file(file_path), &destination),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::CrossesDevices | io::ErrorKind::Unsupported
                ) =>
            {
                debug!(
                    "cannot hard link ({}), copying {} instead",
                    e,
                    file_path.display()
                );
                Self::copy_then_remove(file_path, &destination)
            }
            Err(e) => Err(e),
        };

        match moved {
            Ok(()) => Ok(destination),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(WatchError::RelocationConflict {
                    source_path: file_path.to_path_buf(),
                    destination,
                })
            }
            Err(e) => Err(WatchError::RelocationFailure {
                source_path: file_path.to_path_buf(),
                destination,
                source: e,
            }),
        }
    }

    fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
        let mut source = fs::File::open(from)?;
        let mut target = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(to)?;

        let copied = io::copy(&mut source, &mut target).and_then(|_| target.sync_all());
        Self::discard_on_err(copied, to)?;

        match source.metadata().and_then(|m| m.modified()) {
            Ok(modified) => {
                if let Err(e) = target.set_modified(modified) {
                    debug!("could not keep modification time on {}: {}", to.display(), e);
                }
            }
            Err(e) => debug!("no modification time for {}: {}", from.display(), e),
        }

        Self::discard_on_err(fs::remove_file(from), to)
    }

    /// Deletes `copy` when `result` is an error, then passes `result` through.
    fn discard_on_err(result: io::Result<()>, copy: &Path) -> io::Result<()> {
        if result.is_err()
            && let Err(e) = fs::remove_file(copy)
        {
            debug!("could not remove partial copy {}: {}", copy.display(), e);
        }
        result
    }
}
