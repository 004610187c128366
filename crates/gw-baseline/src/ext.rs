//! Typed snapshot access for [`BaselineSlot`].

use gw_snapshot::{Record, Snapshot};
use tracing::warn;

use crate::{BaselineSlot, StateError};

/// Extension trait adding JSON snapshot load/store to [`BaselineSlot`].
///
/// Automatically implemented for all `BaselineSlot` types, including
/// `dyn BaselineSlot`.
pub trait BaselineSlotExt: BaselineSlot {
    /// Load the persisted snapshot.
    ///
    /// Returns `Ok(None)` when there is no baseline yet, and also when the
    /// stored file cannot be decoded or carries another kind tag: such a
    /// baseline is logged and re-seeded by the next [`store`](Self::store).
    fn load<R: Record>(&self) -> Result<Option<Snapshot<R>>, StateError> {
        let Some(bytes) = self.read()? else {
            return Ok(None);
        };

        match serde_json::from_slice::<Snapshot<R>>(&bytes) {
            Ok(snapshot) if snapshot.kind == R::KIND => Ok(Some(snapshot)),
            Ok(snapshot) => {
                warn!(
                    expected = %R::KIND,
                    found = %snapshot.kind,
                    "Baseline has the wrong kind tag, treating as first run"
                );
                Ok(None)
            }
            Err(e) => {
                warn!(kind = %self.kind(), "Baseline is unreadable ({e}), treating as first run");
                Ok(None)
            }
        }
    }

    /// Persist a snapshot as the new baseline.
    fn store<R: Record>(&self, snapshot: &Snapshot<R>) -> Result<(), StateError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write(&bytes)
    }
}

impl<S: BaselineSlot + ?Sized> BaselineSlotExt for S {}
