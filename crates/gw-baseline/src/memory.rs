//! In-memory baseline store for testing.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use gw_snapshot::SnapshotKind;

use crate::{BaselineSlot, BaselineStore, StateError};

/// In-memory [`BaselineStore`] that counts writes per kind.
///
/// # Example
///
/// ```ignore
/// use gw_baseline::{BaselineStore, MemoryBaselineStore};
/// use gw_snapshot::SnapshotKind;
///
/// let store = MemoryBaselineStore::new();
/// store.lock(SnapshotKind::Results)?.write(b"{}")?;
/// assert_eq!(store.writes(SnapshotKind::Results), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBaselineStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    baselines: HashMap<SnapshotKind, Vec<u8>>,
    writes: HashMap<SnapshotKind, usize>,
    failing_locks: HashSet<SnapshotKind>,
    failing_writes: HashSet<SnapshotKind>,
}

impl MemoryBaselineStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw baseline (does not count as a write).
    #[must_use]
    pub fn with_bytes(self, kind: SnapshotKind, bytes: impl Into<Vec<u8>>) -> Self {
        self.guard().baselines.insert(kind, bytes.into());
        self
    }

    /// Make every `lock` of `kind` fail.
    #[must_use]
    pub fn with_failing_lock(self, kind: SnapshotKind) -> Self {
        self.guard().failing_locks.insert(kind);
        self
    }

    /// Make every write to `kind` fail (reads still work).
    #[must_use]
    pub fn with_failing_write(self, kind: SnapshotKind) -> Self {
        self.guard().failing_writes.insert(kind);
        self
    }

    /// Raw baseline of `kind`, if any.
    #[must_use]
    pub fn bytes(&self, kind: SnapshotKind) -> Option<Vec<u8>> {
        self.guard().baselines.get(&kind).cloned()
    }

    /// Number of writes to `kind` so far.
    #[must_use]
    pub fn writes(&self, kind: SnapshotKind) -> usize {
        self.guard().writes.get(&kind).copied().unwrap_or_default()
    }

    fn guard(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn lock(&self, kind: SnapshotKind) -> Result<Box<dyn BaselineSlot + '_>, StateError> {
        if self.guard().failing_locks.contains(&kind) {
            return Err(unavailable("lock", kind));
        }
        Ok(Box::new(MemorySlot { kind, store: self }))
    }
}

struct MemorySlot<'a> {
    kind: SnapshotKind,
    store: &'a MemoryBaselineStore,
}

impl BaselineSlot for MemorySlot<'_> {
    fn kind(&self) -> SnapshotKind {
        self.kind
    }

    fn read(&self) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.store.bytes(self.kind))
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StateError> {
        let mut state = self.store.guard();
        if state.failing_writes.contains(&self.kind) {
            return Err(unavailable("write", self.kind));
        }
        state.baselines.insert(self.kind, bytes.to_vec());
        *state.writes.entry(self.kind).or_default() += 1;
        Ok(())
    }
}

fn unavailable(action: &'static str, kind: SnapshotKind) -> StateError {
    StateError::io(
        action,
        format!("memory/{}", kind.file_stem()),
        io::Error::from(io::ErrorKind::PermissionDenied),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_write_then_read() {
        let store = MemoryBaselineStore::new();
        {
            let slot = store.lock(SnapshotKind::Results).unwrap();
            assert_eq!(slot.read().unwrap(), None);
            slot.write(b"[1]").unwrap();
            assert_eq!(slot.read().unwrap(), Some(b"[1]".to_vec()));
        }
        assert_eq!(store.writes(SnapshotKind::Results), 1);
        assert_eq!(store.writes(SnapshotKind::Attendance), 0);
        assert_eq!(store.bytes(SnapshotKind::Results), Some(b"[1]".to_vec()));
    }

    #[test]
    fn test_seeded_bytes() {
        let store = MemoryBaselineStore::new().with_bytes(SnapshotKind::Attendance, "{}");
        let slot = store.lock(SnapshotKind::Attendance).unwrap();
        assert_eq!(slot.read().unwrap(), Some(b"{}".to_vec()));
        drop(slot);
        assert_eq!(store.writes(SnapshotKind::Attendance), 0);
    }

    #[test]
    fn test_failing_kinds() {
        let store = MemoryBaselineStore::new()
            .with_failing_lock(SnapshotKind::Attendance)
            .with_failing_write(SnapshotKind::Results);

        let err = store.lock(SnapshotKind::Attendance).err().unwrap();
        assert!(matches!(err, StateError::Io { action: "lock", .. }));

        let slot = store.lock(SnapshotKind::Results).unwrap();
        assert!(matches!(slot.write(b"{}"), Err(StateError::Io { action: "write", .. })));
        assert_eq!(slot.read().unwrap(), None);
        drop(slot);
        assert_eq!(store.writes(SnapshotKind::Results), 0);
    }
}
