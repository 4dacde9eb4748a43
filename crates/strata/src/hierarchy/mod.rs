//! Hierarchy manager for the A/B/C business-process tree.
//!
//! The hierarchy is stored as relational edges (`Relationship` rows); nothing
//! here holds process references in memory between calls. Walks are iterative
//! with a visited set, mutations run inside one store transaction.
//!
//! ## Module Structure
//!
//! - `walk` - ancestor/descendant walks, display trees
//! - `sequence` - sibling ordering arithmetic
//! - `mutation` - move, duplicate, delete cascade, resequence
//! - `graph` - petgraph-based consistency audit
//!
//! ## Invariants
//!
//! - No process is reachable from itself over child edges.
//! - After a move, `level(child) == level(parent).child_level()` for every edge
//!   in the moved subtree.

mod graph;
mod mutation;
pub mod sequence;
pub(crate) mod walk;

pub use graph::{HierarchyAudit, LevelMismatch};
pub use walk::ProcessTree;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::{EntityStore, in_transaction};
use crate::types::{BusinessProcess, ProcessId, Relationship, SequencedProcess};
use walk::Direction;

/// What deleting a process would take with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionImpact {
    /// `false` only when the process does not exist.
    pub can_delete: bool,
    /// Children whose only parent is the process being deleted.
    pub orphaned_children: Vec<BusinessProcess>,
    /// Human-readable summary for a confirmation prompt.
    pub message: String,
}

/// Hierarchy operations over a store.
pub struct Hierarchy<'a, S: EntityStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: EntityStore + ?Sized> Hierarchy<'a, S> {
    /// Wrap a store.
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    // ========== Lookups ==========

    /// Parents of `child`, ordered by sequence number. Empty if none.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn parents(&self, child: ProcessId) -> Result<Vec<SequencedProcess>> {
        self.store.parents_of(child)
    }

    /// Children of `parent`, ordered by sequence number. Empty if none.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn children(&self, parent: ProcessId) -> Result<Vec<SequencedProcess>> {
        self.store.children_of(parent)
    }

    /// Every edge where `process` is parent or child.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn relationships(&self, process: ProcessId) -> Result<Vec<Relationship>> {
        self.store.relationships_of(process)
    }

    /// Every transitive parent of `id`, nearest first, each once.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn ancestors(&self, id: ProcessId) -> Result<Vec<BusinessProcess>> {
        walk::reachable(&*self.store, id, Direction::Up)
    }

    /// Every transitive child of `id`, nearest first, each once.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn descendants(&self, id: ProcessId) -> Result<Vec<BusinessProcess>> {
        walk::reachable(&*self.store, id, Direction::Down)
    }

    /// Whether `candidate` sits anywhere below `ancestor`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn is_descendant(&self, candidate: ProcessId, ancestor: ProcessId) -> Result<bool> {
        walk::is_descendant(&*self.store, candidate, ancestor)
    }

    /// Processes with no parent edge, ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn roots(&self) -> Result<Vec<BusinessProcess>> {
        let children: std::collections::HashSet<ProcessId> = self
            .store
            .all_relationships()?
            .into_iter()
            .map(|r| r.child_process_id)
            .collect();
        Ok(self
            .store
            .processes()?
            .into_iter()
            .filter(|bp| !children.contains(&bp.id))
            .collect())
    }

    /// The tree rooted at `id`, `None` if the process does not exist.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn tree(&self, id: ProcessId) -> Result<Option<ProcessTree>> {
        match self.store.process(id)? {
            Some(root) => walk::build_tree(&*self.store, root).map(Some),
            None => Ok(None),
        }
    }

    /// Check every edge for cycles and level consistency.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn audit(&self) -> Result<HierarchyAudit> {
        graph::audit(&*self.store)
    }

    /// What deleting `id` would orphan, without changing anything.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn preview_deletion(&self, id: ProcessId) -> Result<DeletionImpact> {
        mutation::preview_deletion(&*self.store, id)
    }

    // ========== Edge mutations ==========

    /// Attach `child` under `parent` at `sequence_number`.
    ///
    /// Duplicate edges are allowed and levels are not checked.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if either process does not exist
    /// - `Error::Cycle` if `child` is `parent` or one of its ancestors
    pub fn add_relationship(
        &mut self,
        parent: ProcessId,
        child: ProcessId,
        sequence_number: i64,
    ) -> Result<Relationship> {
        in_transaction(&mut *self.store, |tx| {
            mutation::add_relationship(tx, parent, child, sequence_number)
        })
    }

    /// Delete the `(parent, child)` edge. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn remove_relationship(&mut self, parent: ProcessId, child: ProcessId) -> Result<bool> {
        self.store.delete_relationship(parent, child)
    }

    /// Rewrite the sequence number of the `(parent, child)` edge.
    ///
    /// Returns whether any edge matched.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn update_relationship_sequence(
        &mut self,
        parent: ProcessId,
        child: ProcessId,
        sequence_number: i64,
    ) -> Result<bool> {
        in_transaction(&mut *self.store, |tx| {
            let mut updated = false;
            for edge in tx.children_of(parent)? {
                if edge.process.id == child {
                    updated |= tx.set_relationship_sequence(edge.relationship_id, sequence_number)?;
                }
            }
            Ok(updated)
        })
    }

    // ========== Process mutations ==========

    /// Move `id` under `new_parent`, or to the top level when `None`.
    ///
    /// The process loses every current parent edge, takes the level implied
    /// by its new parent, and the new level is pushed down its subtree.
    /// `position` is the index among the new siblings; `None` appends.
    ///
    /// # Errors
    ///
    /// - `Error::Cycle` if `new_parent` is the process or one of its descendants
    /// - `Error::NotFound` if the process or the new parent does not exist
    /// - `Error::InvalidLevel` if the new parent is level C, or the subtree
    ///   would extend below level C
    pub fn move_process(
        &mut self,
        id: ProcessId,
        new_parent: Option<ProcessId>,
        position: Option<usize>,
    ) -> Result<BusinessProcess> {
        in_transaction(&mut *self.store, |tx| {
            mutation::move_process(tx, id, new_parent, position)
        })
    }

    /// Normalize `parent`'s child edges to `10, 20, 30, ...` in current order.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if `parent` does not exist.
    pub fn resequence_children(&mut self, parent: ProcessId) -> Result<Vec<SequencedProcess>> {
        in_transaction(&mut *self.store, |tx| {
            if tx.process(parent)?.is_none() {
                return Err(Error::process_not_found(parent));
            }
            mutation::resequence(tx, parent)
        })
    }

    /// Duplicate `id` as a sibling named `"<name> (Copy)"`.
    ///
    /// Level A copies share the original's children; level B copies get
    /// their own copies of each child at the same sequence numbers.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the process does not exist.
    pub fn duplicate(&mut self, id: ProcessId) -> Result<BusinessProcess> {
        in_transaction(&mut *self.store, |tx| mutation::duplicate(tx, id))
    }

    /// Delete `id` and every descendant left without a parent.
    ///
    /// Returns `false` if the process did not exist.
    ///
    /// # Errors
    ///
    /// Propagates store failures; nothing is deleted in that case.
    pub fn delete(&mut self, id: ProcessId) -> Result<bool> {
        in_transaction(&mut *self.store, |tx| mutation::delete_cascade(tx, id))
    }
}
