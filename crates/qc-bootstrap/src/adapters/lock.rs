//! # Workspace Locking
//!
//! Prevents two pipeline runs from sharing a config root.
//!
//! Every stage resets its working directory, so a second run against the
//! same root would delete the first run's staged archives and keys mid-way.
//! The lock is advisory and scoped to the whole run.
//!
//! The lock file is never unlinked. Removing it would let a waiter lock the
//! orphaned inode while a later run locks a fresh one at the same path.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on
//! Windows).

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::{BootstrapError, Stage};

/// Exclusive lock on a workspace root.
///
/// Acquired before the first stage, released on drop. The file itself
/// stays behind holding the last holder's PID.
pub struct WorkspaceLock {
    /// Open handle; the flock lives as long as it does.
    file: File,
    path: PathBuf,
    /// PID written into the lock file.
    pid: u32,
}

impl WorkspaceLock {
    /// Acquire the lock at `lock_path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::WorkspaceLocked` if another run holds it.
    pub fn acquire(lock_path: &Path) -> Result<Self, BootstrapError> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BootstrapError::io(
                    Stage::WorkspaceLock,
                    format!("creating {}", parent.display()),
                    e,
                )
            })?;
        }

        // Not truncated: the holder's PID must survive a failed attempt.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|e| {
                BootstrapError::io(
                    Stage::WorkspaceLock,
                    format!("opening {}", lock_path.display()),
                    e,
                )
            })?;

        if file.try_lock_exclusive().is_err() {
            return Err(BootstrapError::WorkspaceLocked {
                pid: Self::read_existing_pid(lock_path),
                path: lock_path.to_path_buf(),
            });
        }

        let pid = std::process::id();
        let mut locked_file = file;
        let write_pid = |f: &mut File| -> std::io::Result<()> {
            f.set_len(0)?;
            writeln!(f, "{}", pid)?;
            f.sync_all()
        };
        write_pid(&mut locked_file).map_err(|e| {
            BootstrapError::io(
                Stage::WorkspaceLock,
                format!("writing PID to {}", lock_path.display()),
                e,
            )
        })?;

        tracing::debug!(path = %lock_path.display(), pid, "Workspace lock acquired");

        Ok(Self {
            file: locked_file,
            path: lock_path.to_path_buf(),
            pid,
        })
    }

    /// PID of the process holding the lock
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Lock file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
