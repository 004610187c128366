//! File-based baseline store.
//!
//! [`FileBaselineStore`] keeps one pretty-printed JSON file per snapshot kind
//! in the state directory, next to a lock file:
//!
//! ```text
//! {dir}/
//! +-- results.json       # last results snapshot
//! +-- results.lock       # exclusive OS lock while a run compares/writes
//! +-- attendance.json
//! +-- attendance.lock
//! ```
//!
//! Writes go to a temporary file in the same directory that is renamed over
//! the baseline, so a crash mid-write leaves the previous baseline intact.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gw_snapshot::SnapshotKind;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{BaselineSlot, BaselineStore, StateError};

/// [`BaselineStore`] rooted at a state directory.
pub struct FileBaselineStore {
    dir: PathBuf,
}

impl FileBaselineStore {
    /// Create a store; the directory is created on first lock.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// State directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the baseline file for `kind`.
    #[must_use]
    pub fn baseline_path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.file_stem()))
    }

    /// Path of the lock file for `kind`.
    #[must_use]
    pub fn lock_path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(format!("{}.lock", kind.file_stem()))
    }
}

impl BaselineStore for FileBaselineStore {
    fn lock(&self, kind: SnapshotKind) -> Result<Box<dyn BaselineSlot + '_>, StateError> {
        fs::create_dir_all(&self.dir).map_err(|e| StateError::io("create", &self.dir, e))?;

        let lock_path = self.lock_path(kind);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StateError::io("open", &lock_path, e))?;
        lock.lock().map_err(|e| StateError::io("lock", &lock_path, e))?;
        debug!(path = %lock_path.display(), "Baseline locked");

        Ok(Box::new(FileBaselineSlot {
            kind,
            dir: &self.dir,
            path: self.baseline_path(kind),
            _lock: lock,
        }))
    }
}

/// A baseline file held under its lock. Dropping the slot closes the lock
/// file, which releases the lock.
struct FileBaselineSlot<'a> {
    kind: SnapshotKind,
    dir: &'a Path,
    path: PathBuf,
    _lock: File,
}

impl BaselineSlot for FileBaselineSlot<'_> {
    fn kind(&self) -> SnapshotKind {
        self.kind
    }

    fn read(&self) -> Result<Option<Vec<u8>>, StateError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StateError::io("read", &self.path, e)),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StateError> {
        let write_err = |e| StateError::io("write", &self.path, e);

        let mut tmp = NamedTempFile::new_in(self.dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Baseline written");
        Ok(())
    }
}
