//! Interface assignments: which interfaces take part in which business process.
//!
//! Every operation that changes the interface set of a process drops that
//! process's cached diagram in the same transaction. Reordering an
//! assignment leaves the set unchanged and keeps the diagram.

use std::collections::BTreeSet;

use tracing::info;

use crate::diagram;
use crate::error::{Error, Result};
use crate::store::{EntityStore, in_transaction};
use crate::types::{InterfaceId, NewProcessInterface, ProcessId, ProcessInterface};

/// One assignment in a bulk replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Process receiving the interface.
    pub business_process_id: ProcessId,
    /// Step of the interface within the process.
    pub sequence_number: i64,
    /// Free-form note on the step.
    pub description: Option<String>,
}

/// Interface assignment mutations over a store.
pub struct InterfaceAssignments<'a, S: EntityStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: EntityStore + ?Sized> InterfaceAssignments<'a, S> {
    /// Wrap a store.
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Assignments of `process`, ordered by sequence number.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn for_process(&self, process: ProcessId) -> Result<Vec<ProcessInterface>> {
        self.store.process_interfaces_for_process(process)
    }

    /// Attach `interface` to `process` at step `sequence_number`.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the process or the interface does not exist.
    pub fn assign(
        &mut self,
        process: ProcessId,
        interface: InterfaceId,
        sequence_number: i64,
        description: Option<String>,
    ) -> Result<ProcessInterface> {
        in_transaction(&mut *self.store, |tx| {
            if tx.process(process)?.is_none() {
                return Err(Error::process_not_found(process));
            }
            require_interface(&*tx, interface)?;
            let row = tx.insert_process_interface(NewProcessInterface {
                business_process_id: process,
                interface_id: interface,
                sequence_number,
                description: description.clone(),
            })?;
            diagram::invalidate(&mut *tx, &[process])?;
            info!(
                process_id = %process,
                interface_id = %interface,
                sequence_number,
                "Assigned interface to business process"
            );
            Ok(row)
        })
    }

    /// Remove one assignment. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn unassign(&mut self, assignment_id: i64) -> Result<bool> {
        in_transaction(&mut *self.store, |tx| {
            let Some(row) = tx.process_interface(assignment_id)? else {
                return Ok(false);
            };
            tx.delete_process_interface(assignment_id)?;
            diagram::invalidate(&mut *tx, &[row.business_process_id])?;
            info!(
                assignment_id,
                process_id = %row.business_process_id,
                interface_id = %row.interface_id,
                "Removed interface from business process"
            );
            Ok(true)
        })
    }

    /// Remove every assignment of `interface`.
    ///
    /// Always succeeds for an existing store, even when nothing was assigned.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn unassign_all(&mut self, interface: InterfaceId) -> Result<bool> {
        in_transaction(&mut *self.store, |tx| {
            let affected = assigned_processes(&*tx, interface)?;
            let removed = tx.delete_process_interfaces_for_interface(interface)?;
            diagram::invalidate(&mut *tx, &affected)?;
            info!(
                interface_id = %interface,
                removed,
                processes = affected.len(),
                "Removed interface from all business processes"
            );
            Ok(true)
        })
    }

    /// Replace the full process list of `interface`.
    ///
    /// Processes on either side of the change lose their cached diagram.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the interface or any listed process does not exist
    ///
    /// Nothing changes when an error is returned.
    pub fn replace_assignments(
        &mut self,
        interface: InterfaceId,
        assignments: Vec<Assignment>,
    ) -> Result<Vec<ProcessInterface>> {
        in_transaction(&mut *self.store, |tx| {
            require_interface(&*tx, interface)?;
            let mut affected: BTreeSet<ProcessId> =
                assigned_processes(&*tx, interface)?.into_iter().collect();

            tx.delete_process_interfaces_for_interface(interface)?;
            let mut rows = Vec::with_capacity(assignments.len());
            for assignment in &assignments {
                if tx.process(assignment.business_process_id)?.is_none() {
                    return Err(Error::process_not_found(assignment.business_process_id));
                }
                affected.insert(assignment.business_process_id);
                rows.push(tx.insert_process_interface(NewProcessInterface {
                    business_process_id: assignment.business_process_id,
                    interface_id: interface,
                    sequence_number: assignment.sequence_number,
                    description: assignment.description.clone(),
                })?);
            }

            let affected: Vec<ProcessId> = affected.into_iter().collect();
            diagram::invalidate(&mut *tx, &affected)?;
            info!(
                interface_id = %interface,
                assignments = rows.len(),
                processes = affected.len(),
                "Replaced interface assignments"
            );
            Ok(rows)
        })
    }

    /// Delete `interface` with its assignments and change-request impact rows.
    ///
    /// Returns `false` if the interface did not exist.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn delete_interface(&mut self, interface: InterfaceId) -> Result<bool> {
        in_transaction(&mut *self.store, |tx| {
            if tx.interface(interface)?.is_none() {
                return Ok(false);
            }
            let affected = assigned_processes(&*tx, interface)?;
            diagram::invalidate(&mut *tx, &affected)?;
            let deleted = tx.delete_interface(interface)?;
            info!(
                interface_id = %interface,
                processes = affected.len(),
                "Deleted interface"
            );
            Ok(deleted)
        })
    }

    /// Move one assignment to a different step. The interface set is
    /// unchanged, so cached diagrams are kept.
    ///
    /// Returns `false` if the assignment did not exist.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn resequence_assignment(&mut self, assignment_id: i64, sequence_number: i64) -> Result<bool> {
        self.store
            .set_process_interface_sequence(assignment_id, sequence_number)
    }
}

fn require_interface(store: &dyn EntityStore, id: InterfaceId) -> Result<()> {
    match store.interface(id)? {
        Some(_) => Ok(()),
        None => Err(Error::NotFound {
            entity: "interface",
            id: id.as_i64(),
        }),
    }
}

/// Distinct processes `interface` is assigned to, ordered by id.
fn assigned_processes(store: &dyn EntityStore, interface: InterfaceId) -> Result<Vec<ProcessId>> {
    let ids: BTreeSet<ProcessId> = store
        .process_interfaces_for_interfaces(&[interface])?
        .into_iter()
        .map(|row| row.business_process_id)
        .collect();
    Ok(ids.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{Level, NewBusinessProcess, NewInterface};

    struct Fixture {
        store: InMemoryStore,
        first: ProcessId,
        second: ProcessId,
        interface: InterfaceId,
    }

    fn fixture() -> Fixture {
        let mut store = InMemoryStore::new();
        let first = store
            .create_process(NewBusinessProcess::named("first", Level::A))
            .expect("process")
            .id;
        let second = store
            .create_process(NewBusinessProcess::named("second", Level::A))
            .expect("process")
            .id;
        let interface = store
            .create_interface(NewInterface {
                iml_number: "IML-1".into(),
                interface_type: "REST".into(),
                status: "active".into(),
                version: "1.0".into(),
                ..NewInterface::default()
            })
            .expect("interface")
            .id;
        store.save_diagram(first, "{\"nodes\":[]}").expect("diagram");
        store.save_diagram(second, "{\"nodes\":[]}").expect("diagram");
        Fixture {
            store,
            first,
            second,
            interface,
        }
    }

    #[test]
    fn assign_invalidates_only_that_process() {
        let mut f = fixture();
        InterfaceAssignments::new(&mut f.store)
            .assign(f.first, f.interface, 10, None)
            .expect("assign");

        assert!(f.store.diagram(f.first).expect("get").is_none());
        assert!(f.store.diagram(f.second).expect("get").is_some());
    }

    #[test]
    fn assign_to_missing_interface_changes_nothing() {
        let mut f = fixture();
        let err = InterfaceAssignments::new(&mut f.store)
            .assign(f.first, InterfaceId(404), 10, None)
            .expect_err("missing interface");

        assert!(matches!(err, Error::NotFound { entity: "interface", .. }));
        assert!(f.store.diagram(f.first).expect("get").is_some());
    }

    #[test]
    fn replace_invalidates_old_and_new_processes() {
        let mut f = fixture();
        let row = f
            .store
            .insert_process_interface(NewProcessInterface {
                business_process_id: f.first,
                interface_id: f.interface,
                sequence_number: 10,
                description: None,
            })
            .expect("row");
        f.store.save_diagram(f.first, "{}").expect("diagram");

        let rows = InterfaceAssignments::new(&mut f.store)
            .replace_assignments(
                f.interface,
                vec![Assignment {
                    business_process_id: f.second,
                    sequence_number: 20,
                    description: Some("handoff".into()),
                }],
            )
            .expect("replace");

        assert_eq!(rows.len(), 1);
        assert!(f.store.process_interface(row.id).expect("get").is_none());
        assert!(f.store.diagram(f.first).expect("get").is_none());
        assert!(f.store.diagram(f.second).expect("get").is_none());
    }

    #[test]
    fn resequence_keeps_diagram() {
        let mut f = fixture();
        let row = f
            .store
            .insert_process_interface(NewProcessInterface {
                business_process_id: f.first,
                interface_id: f.interface,
                sequence_number: 10,
                description: None,
            })
            .expect("row");

        assert!(
            InterfaceAssignments::new(&mut f.store)
                .resequence_assignment(row.id, 30)
                .expect("resequence")
        );
        assert!(f.store.diagram(f.first).expect("get").is_some());
        assert_eq!(
            f.store.process_interface(row.id).expect("get").map(|r| r.sequence_number),
            Some(30)
        );
    }

    #[test]
    fn delete_interface_invalidates_assigned_processes() {
        let mut f = fixture();
        let mut assignments = InterfaceAssignments::new(&mut f.store);
        assignments.assign(f.second, f.interface, 10, None).expect("assign");
        drop(assignments);
        f.store.save_diagram(f.second, "{}").expect("diagram");

        assert!(
            InterfaceAssignments::new(&mut f.store)
                .delete_interface(f.interface)
                .expect("delete")
        );
        assert!(f.store.diagram(f.second).expect("get").is_none());
        assert!(f.store.diagram(f.first).expect("get").is_some());
        assert!(
            !InterfaceAssignments::new(&mut f.store)
                .delete_interface(f.interface)
                .expect("delete again")
        );
    }
}
