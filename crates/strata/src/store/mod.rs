//! Entity store abstraction.
//!
//! The engine never touches storage directly: every read and write goes
//! through [`EntityStore`]. Two backends ship with the crate:
//!
//! - [`SqliteStore`]: persistent, `SQLite` with WAL and enforced foreign keys
//! - [`InMemoryStore`]: ephemeral tables in RAM, used by tests and short sessions
//!
//! # Transactions
//!
//! Mutations that must not be observed half-applied (delete + orphan cascade,
//! detach + attach + level propagation) run through [`in_transaction`]. A
//! backend commits when the body returns `Ok` and rolls back on `Err`. Nested
//! calls join the outer transaction.
//!
//! # Ordering
//!
//! Parent/child lookups are ordered by `(sequence_number, relationship id)`.
//! Bulk lookups by id list are ordered by row id.

use crate::error::{Error, Result};
use crate::types::{
    Application, ApplicationId, BusinessProcess, ChangeRequest, ChangeRequestId, Diagram,
    ImpactLink, Interface, InterfaceId, Level, NewApplication, NewBusinessProcess,
    NewChangeRequest, NewImpactLink, NewInterface, NewProcessInterface, NewRelationship,
    NewTechnicalProcess, ProcessId, ProcessInterface, Relationship, SequencedProcess,
    TechnicalProcess, TechnicalProcessId,
};

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Body of a store transaction.
pub type TransactionBody<'a> = dyn FnMut(&mut dyn EntityStore) -> Result<()> + 'a;

/// Transactional CRUD over every entity the engine reads or writes.
///
/// Reads take `&self`, writes take `&mut self`. Methods that take id lists
/// silently skip ids that do not resolve.
///
/// # Method Categories
///
/// - **Applications / Interfaces / Technical processes**: inventory rows
/// - **Processes / Relationships**: the A/B/C hierarchy
/// - **Process interfaces**: which interfaces run at which step of a process
/// - **Change requests**: requests plus their three impact-join tables
/// - **Diagrams**: cached renderings, one per process
/// - **Transactions**: [`EntityStore::atomically`]
pub trait EntityStore {
    // ========== Applications ==========

    /// Insert an application.
    fn create_application(&mut self, new: NewApplication) -> Result<Application>;

    /// Get an application by id.
    fn application(&self, id: ApplicationId) -> Result<Option<Application>>;

    /// Get every application in `ids` that exists.
    fn applications(&self, ids: &[ApplicationId]) -> Result<Vec<Application>>;

    // ========== Interfaces ==========

    /// Insert an interface. `last_change_date` is set to now.
    fn create_interface(&mut self, new: NewInterface) -> Result<Interface>;

    /// Get an interface by id.
    fn interface(&self, id: InterfaceId) -> Result<Option<Interface>>;

    /// Get every interface in `ids` that exists.
    fn interfaces(&self, ids: &[InterfaceId]) -> Result<Vec<Interface>>;

    /// Interfaces whose provider is one of `apps`.
    fn interfaces_provided_by(&self, apps: &[ApplicationId]) -> Result<Vec<Interface>>;

    /// Interfaces whose consumer is one of `apps`.
    fn interfaces_consumed_by(&self, apps: &[ApplicationId]) -> Result<Vec<Interface>>;

    /// Delete an interface row together with its process assignments and
    /// change-request links.
    ///
    /// Leaves cached diagrams alone; see [`crate::InterfaceAssignments`].
    fn delete_interface(&mut self, id: InterfaceId) -> Result<bool>;

    // ========== Business processes ==========

    /// Insert a business process.
    fn create_process(&mut self, new: NewBusinessProcess) -> Result<BusinessProcess>;

    /// Get a business process by id.
    fn process(&self, id: ProcessId) -> Result<Option<BusinessProcess>>;

    /// Every business process, ordered by id.
    fn processes(&self) -> Result<Vec<BusinessProcess>>;

    /// Overwrite a process's level and bump `updated_at`.
    fn set_process_level(&mut self, id: ProcessId, level: Level) -> Result<bool>;

    /// Delete a process row. Rows that reference it go with it.
    fn delete_process(&mut self, id: ProcessId) -> Result<bool>;

    // ========== Relationships ==========

    /// Insert a hierarchy edge. Both endpoints must exist.
    fn insert_relationship(&mut self, new: NewRelationship) -> Result<Relationship>;

    /// Delete the `(parent, child)` edge. Returns whether a row was removed.
    fn delete_relationship(&mut self, parent: ProcessId, child: ProcessId) -> Result<bool>;

    /// Delete every edge where `child` is the child.
    fn delete_parent_edges(&mut self, child: ProcessId) -> Result<usize>;

    /// Delete every edge touching `process` in either direction.
    fn delete_relationships_touching(&mut self, process: ProcessId) -> Result<usize>;

    /// Rewrite the sequence number of one edge.
    fn set_relationship_sequence(&mut self, relationship_id: i64, sequence: i64) -> Result<bool>;

    /// Parents of `child`, one entry per edge.
    fn parents_of(&self, child: ProcessId) -> Result<Vec<SequencedProcess>>;

    /// Children of `parent`, one entry per edge.
    fn children_of(&self, parent: ProcessId) -> Result<Vec<SequencedProcess>>;

    /// Every edge where `process` is parent or child, ordered by id.
    fn relationships_of(&self, process: ProcessId) -> Result<Vec<Relationship>>;

    /// Every edge, ordered by id.
    fn all_relationships(&self) -> Result<Vec<Relationship>>;

    // ========== Process interfaces ==========

    /// Assign an interface to a process step. Both rows must exist.
    ///
    /// Leaves cached diagrams alone; see [`crate::InterfaceAssignments`].
    fn insert_process_interface(&mut self, new: NewProcessInterface) -> Result<ProcessInterface>;

    /// Get an assignment by id.
    fn process_interface(&self, id: i64) -> Result<Option<ProcessInterface>>;

    /// Delete an assignment by id.
    ///
    /// Leaves cached diagrams alone; see [`crate::InterfaceAssignments`].
    fn delete_process_interface(&mut self, id: i64) -> Result<bool>;

    /// Delete every assignment of `process`.
    fn delete_process_interfaces_for_process(&mut self, process: ProcessId) -> Result<usize>;

    /// Delete every assignment of `interface`.
    fn delete_process_interfaces_for_interface(&mut self, interface: InterfaceId)
    -> Result<usize>;

    /// Assignments whose interface is one of `interfaces`, ordered by id.
    fn process_interfaces_for_interfaces(
        &self,
        interfaces: &[InterfaceId],
    ) -> Result<Vec<ProcessInterface>>;

    /// Assignments of `process`, ordered by sequence number.
    fn process_interfaces_for_process(&self, process: ProcessId) -> Result<Vec<ProcessInterface>>;

    /// Rewrite the sequence number of one assignment.
    fn set_process_interface_sequence(&mut self, id: i64, sequence: i64) -> Result<bool>;

    // ========== Change requests ==========

    /// Insert a change request.
    fn create_change_request(&mut self, new: NewChangeRequest) -> Result<ChangeRequest>;

    /// Get a change request by id.
    fn change_request(&self, id: ChangeRequestId) -> Result<Option<ChangeRequest>>;

    /// Get every change request in `ids` that exists.
    fn change_requests(&self, ids: &[ChangeRequestId]) -> Result<Vec<ChangeRequest>>;

    /// Delete a change request and its impact rows.
    fn delete_change_request(&mut self, id: ChangeRequestId) -> Result<bool>;

    /// Application impact rows declared by any of `change_requests`.
    fn change_request_applications(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<ApplicationId>>>;

    /// Interface impact rows declared by any of `change_requests`.
    fn change_request_interfaces(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<InterfaceId>>>;

    /// Technical-process impact rows declared by any of `change_requests`.
    fn change_request_technical_processes(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<TechnicalProcessId>>>;

    /// Application impact rows that point at any of `apps`.
    fn application_change_links(
        &self,
        apps: &[ApplicationId],
    ) -> Result<Vec<ImpactLink<ApplicationId>>>;

    /// Interface impact rows that point at any of `interfaces`.
    fn interface_change_links(
        &self,
        interfaces: &[InterfaceId],
    ) -> Result<Vec<ImpactLink<InterfaceId>>>;

    /// Replace a change request's application impact rows.
    fn replace_change_request_applications(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<ApplicationId>>,
    ) -> Result<Vec<ImpactLink<ApplicationId>>>;

    /// Replace a change request's interface impact rows.
    fn replace_change_request_interfaces(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<InterfaceId>>,
    ) -> Result<Vec<ImpactLink<InterfaceId>>>;

    /// Replace a change request's technical-process impact rows.
    fn replace_change_request_technical_processes(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<TechnicalProcessId>>,
    ) -> Result<Vec<ImpactLink<TechnicalProcessId>>>;

    // ========== Technical processes ==========

    /// Insert a technical process.
    fn create_technical_process(&mut self, new: NewTechnicalProcess) -> Result<TechnicalProcess>;

    /// Get every technical process in `ids` that exists.
    fn technical_processes(&self, ids: &[TechnicalProcessId]) -> Result<Vec<TechnicalProcess>>;

    // ========== Diagrams ==========

    /// Store (or overwrite) the cached diagram of `process`.
    fn save_diagram(&mut self, process: ProcessId, data: &str) -> Result<Diagram>;

    /// Cached diagram of `process`, if any.
    fn diagram(&self, process: ProcessId) -> Result<Option<Diagram>>;

    /// Drop cached diagrams of every process in `processes`.
    fn delete_diagrams(&mut self, processes: &[ProcessId]) -> Result<usize>;

    // ========== Transactions ==========

    /// Run `body` atomically: commit on `Ok`, roll back on `Err`.
    ///
    /// Prefer [`in_transaction`], which carries a return value.
    fn atomically(&mut self, body: &mut TransactionBody<'_>) -> Result<()>;
}

/// Run `f` inside one store transaction and return its value.
///
/// # Errors
///
/// Returns whatever `f` returns, or the backend's commit/rollback failure.
pub fn in_transaction<S, T, F>(store: &mut S, f: F) -> Result<T>
where
    S: EntityStore + ?Sized,
    F: FnOnce(&mut dyn EntityStore) -> Result<T>,
{
    let mut body = Some(f);
    let mut output = None;
    store.atomically(&mut |tx: &mut dyn EntityStore| {
        let f = body
            .take()
            .ok_or_else(|| Error::Internal("transaction body ran twice".to_string()))?;
        output = Some(f(tx)?);
        Ok(())
    })?;
    output.ok_or_else(|| Error::Internal("transaction committed without a result".to_string()))
}

/// Sort `(sequence, relationship id)` the same way in every backend.
pub(crate) fn sort_sequenced(rows: &mut [SequencedProcess]) {
    rows.sort_by_key(|r| (r.sequence_number, r.relationship_id));
}
