use super::{Semilattice, TablesMetadata};
use crate::core::Result;
use std::sync::{Arc, RwLock};

/// Process-wide view of the tables metadata.
///
/// Readers get an owned snapshot; writers hand back a modified snapshot that
/// is joined into the current state, so concurrent edits are never lost to a
/// blind overwrite. The lock is only held for the copy and for the join.
#[derive(Debug, Clone, Default)]
pub struct SharedMetadata {
    inner: Arc<RwLock<TablesMetadata>>,
}

impl SharedMetadata {
    pub fn new(initial: TablesMetadata) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn get(&self) -> Result<TablesMetadata> {
        let guard = self.inner.read()?;
        Ok(guard.clone())
    }

    pub fn join(&self, change: &TablesMetadata) -> Result<()> {
        let mut guard = self.inner.write()?;
        let merged = guard.join(change);
        *guard = merged;
        Ok(())
    }
}
