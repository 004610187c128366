//! Baseline persistence for gradewatch.
//!
//! A baseline is the last successfully parsed
//! [`Snapshot`](gw_snapshot::Snapshot) of one kind. Two traits form the core
//! API:
//!
//! - [`BaselineStore`]: hands out locked slots, one per snapshot kind
//! - [`BaselineSlot`]: raw read and write of one baseline while locked
//!
//! [`BaselineSlotExt`] adds typed JSON `load`/`store` on top of any slot.
//!
//! # Implementations
//!
//! - [`FileBaselineStore`]: JSON files with an OS lock file per kind
//! - [`MemoryBaselineStore`]: in-memory store for tests (behind `mock`)
//!
//! # Example
//!
//! ```ignore
//! use gw_baseline::{BaselineSlotExt, BaselineStore, FileBaselineStore};
//! use gw_snapshot::{ResultRecord, SnapshotKind, diff};
//!
//! let store = FileBaselineStore::new(state_dir);
//! let slot = store.lock(SnapshotKind::Results)?;
//! let previous = slot.load::<ResultRecord>()?;
//! let report = diff(previous.as_ref(), &current);
//! slot.store(&current)?;
//! ```

use gw_snapshot::SnapshotKind;

mod error;
mod ext;
mod file;
#[cfg(any(test, feature = "mock"))]
mod memory;

pub use error::StateError;
pub use ext::BaselineSlotExt;
pub use file::FileBaselineStore;
#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryBaselineStore;

/// Exclusive access to the baseline of one snapshot kind.
///
/// The lock is held until the slot is dropped, so a read-compare-write
/// cycle done through one slot cannot interleave with another process.
pub trait BaselineSlot {
    /// Kind this slot stores.
    fn kind(&self) -> SnapshotKind;

    /// Read the raw persisted baseline.
    ///
    /// Returns `Ok(None)` if no baseline was ever written.
    fn read(&self) -> Result<Option<Vec<u8>>, StateError>;

    /// Replace the persisted baseline.
    ///
    /// Readers see either the old or the new content, never a mix.
    fn write(&self, bytes: &[u8]) -> Result<(), StateError>;
}

/// Factory for locked [`BaselineSlot`]s.
pub trait BaselineStore {
    /// Lock the baseline of `kind`, blocking while another holder has it.
    fn lock(&self, kind: SnapshotKind) -> Result<Box<dyn BaselineSlot + '_>, StateError>;
}
