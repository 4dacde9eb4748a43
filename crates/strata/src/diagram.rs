//! Cached diagram artifacts and their invalidation.
//!
//! A diagram is derived state: it depicts the interfaces attached to one
//! business process. Any mutation that changes that interface set, or removes
//! the process, calls [`invalidate`] inside the same transaction so a stored
//! diagram never shows a stale interface set. Regeneration happens lazily on
//! the next read, outside this crate.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::EntityStore;
use crate::types::{Diagram, ProcessId};

/// Drop the cached diagrams of `processes`. Duplicate ids are ignored.
///
/// Returns the number of diagrams removed.
///
/// # Errors
///
/// Propagates store failures.
pub fn invalidate<S: EntityStore + ?Sized>(store: &mut S, processes: &[ProcessId]) -> Result<usize> {
    let mut affected = processes.to_vec();
    affected.sort_unstable();
    affected.dedup();
    if affected.is_empty() {
        return Ok(0);
    }

    let removed = store.delete_diagrams(&affected)?;
    if removed > 0 {
        info!(processes = affected.len(), removed, "Invalidated cached diagrams");
    } else {
        debug!(processes = affected.len(), "No cached diagrams to invalidate");
    }
    Ok(removed)
}

/// Read/write access to cached diagrams.
pub struct DiagramCache<'a, S: EntityStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: EntityStore + ?Sized> DiagramCache<'a, S> {
    /// Wrap a store.
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Store a freshly rendered diagram for `process`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the process does not exist.
    pub fn save(&mut self, process: ProcessId, data: &str) -> Result<Diagram> {
        if self.store.process(process)?.is_none() {
            return Err(Error::process_not_found(process));
        }
        self.store.save_diagram(process, data)
    }

    /// Cached diagram of `process`, `None` when absent or invalidated.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn get(&self, process: ProcessId) -> Result<Option<Diagram>> {
        self.store.diagram(process)
    }

    /// Drop cached diagrams of `processes`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn invalidate(&mut self, processes: &[ProcessId]) -> Result<usize> {
        invalidate(&mut *self.store, processes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{Level, NewBusinessProcess};

    #[test]
    fn invalidate_removes_each_diagram_once() {
        let mut store = InMemoryStore::new();
        let a = store.create_process(NewBusinessProcess::named("a", Level::A)).expect("a");
        let b = store.create_process(NewBusinessProcess::named("b", Level::A)).expect("b");
        store.save_diagram(a.id, "{}").expect("save");
        store.save_diagram(b.id, "{}").expect("save");

        let removed = invalidate(&mut store, &[a.id, a.id, b.id]).expect("invalidate");

        assert_eq!(removed, 2);
        assert!(store.diagram(a.id).expect("get").is_none());
    }

    #[test]
    fn saving_for_unknown_process_is_not_found() {
        let mut store = InMemoryStore::new();
        let err = DiagramCache::new(&mut store)
            .save(ProcessId(9), "{}")
            .expect_err("missing process");
        assert!(err.is_rejected_precondition());
    }
}
