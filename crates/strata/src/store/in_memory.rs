//! In-memory entity store.
//!
//! All rows live in `BTreeMap`s keyed by id, so iteration order is id order
//! without extra sorting. Data is **lost when the store is dropped**.
//!
//! # Constraints
//!
//! The store mirrors the `SQLite` schema's constraints so both backends
//! behave the same under the engine:
//!
//! - foreign keys on relationship, assignment, impact and diagram inserts
//!   fail with `Error::Storage`
//! - deleting a process, interface or change request cascades to the rows
//!   that reference it
//! - `aml_number`, `iml_number` and `cr_number` are unique
//!
//! # Transactions
//!
//! [`EntityStore::atomically`] snapshots every table before running the body
//! and restores the snapshot if the body fails.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use tracing::debug;

use super::{EntityStore, TransactionBody, sort_sequenced};
use crate::error::{Error, Result};
use crate::types::{
    Application, ApplicationId, BusinessProcess, ChangeRequest, ChangeRequestId, Diagram,
    ImpactLink, Interface, InterfaceId, Level, NewApplication, NewBusinessProcess,
    NewChangeRequest, NewImpactLink, NewInterface, NewProcessInterface, NewRelationship,
    NewTechnicalProcess, ProcessId, ProcessInterface, Relationship, SequencedProcess,
    TechnicalProcess, TechnicalProcessId,
};

/// Every table plus its id sequence. Cloned wholesale for transactions.
#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i64,
    applications: BTreeMap<i64, Application>,
    interfaces: BTreeMap<i64, Interface>,
    processes: BTreeMap<i64, BusinessProcess>,
    relationships: BTreeMap<i64, Relationship>,
    process_interfaces: BTreeMap<i64, ProcessInterface>,
    change_requests: BTreeMap<i64, ChangeRequest>,
    cr_applications: BTreeMap<i64, ImpactLink<ApplicationId>>,
    cr_interfaces: BTreeMap<i64, ImpactLink<InterfaceId>>,
    cr_technical_processes: BTreeMap<i64, ImpactLink<TechnicalProcessId>>,
    technical_processes: BTreeMap<i64, TechnicalProcess>,
    diagrams: BTreeMap<i64, Diagram>,
}

impl Tables {
    /// Ids are drawn from one sequence shared by every table.
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Ephemeral [`EntityStore`] backed by ordered maps.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Tables,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn require_process(&self, id: ProcessId) -> Result<()> {
        if self.tables.processes.contains_key(&id.as_i64()) {
            Ok(())
        } else {
            Err(fk_violation("business process", id.as_i64()))
        }
    }

    fn require_interface(&self, id: InterfaceId) -> Result<()> {
        if self.tables.interfaces.contains_key(&id.as_i64()) {
            Ok(())
        } else {
            Err(fk_violation("interface", id.as_i64()))
        }
    }

    fn require_application(&self, id: Option<ApplicationId>) -> Result<()> {
        match id {
            Some(id) if !self.tables.applications.contains_key(&id.as_i64()) => {
                Err(fk_violation("application", id.as_i64()))
            }
            _ => Ok(()),
        }
    }

    fn require_change_request(&self, id: ChangeRequestId) -> Result<()> {
        if self.tables.change_requests.contains_key(&id.as_i64()) {
            Ok(())
        } else {
            Err(fk_violation("change request", id.as_i64()))
        }
    }

    fn sequenced(&self, rel: &Relationship, process: ProcessId) -> Option<SequencedProcess> {
        self.tables
            .processes
            .get(&process.as_i64())
            .map(|bp| SequencedProcess {
                process: bp.clone(),
                relationship_id: rel.id,
                sequence_number: rel.sequence_number,
            })
    }
}

fn fk_violation(entity: &str, id: i64) -> Error {
    Error::Storage(format!(
        "FOREIGN KEY constraint failed: {entity} {id} does not exist"
    ))
}

fn unique_violation(column: &str, value: &str) -> Error {
    Error::Storage(format!(
        "UNIQUE constraint failed: {column} '{value}' already exists"
    ))
}

/// Rows of `map` whose key (after `key`) is in `ids`, in id order.
fn select_by<T: Clone, K: Eq + std::hash::Hash + Copy>(
    map: &BTreeMap<i64, T>,
    ids: &[K],
    key: impl Fn(&T) -> Option<K>,
) -> Vec<T> {
    let wanted: HashSet<K> = ids.iter().copied().collect();
    map.values()
        .filter(|row| key(row).is_some_and(|k| wanted.contains(&k)))
        .cloned()
        .collect()
}

/// Remove every row matching `pred`, returning how many went.
fn remove_where<T>(map: &mut BTreeMap<i64, T>, pred: impl Fn(&T) -> bool) -> usize {
    let before = map.len();
    map.retain(|_, row| !pred(row));
    before - map.len()
}

fn replace_links<T: Copy + PartialEq>(
    next_id: &mut dyn FnMut() -> i64,
    map: &mut BTreeMap<i64, ImpactLink<T>>,
    change_request: ChangeRequestId,
    links: Vec<NewImpactLink<T>>,
) -> Vec<ImpactLink<T>> {
    remove_where(map, |row| row.change_request_id == change_request);
    links
        .into_iter()
        .map(|link| {
            let row = ImpactLink {
                id: next_id(),
                change_request_id: change_request,
                entity_id: link.entity_id,
                impact_type: link.impact_type,
                impact_description: link.impact_description,
            };
            map.insert(row.id, row.clone());
            row
        })
        .collect()
}

impl EntityStore for InMemoryStore {
    // ========== Applications ==========

    fn create_application(&mut self, new: NewApplication) -> Result<Application> {
        if self
            .tables
            .applications
            .values()
            .any(|a| a.aml_number == new.aml_number)
        {
            return Err(unique_violation("applications.aml_number", &new.aml_number));
        }
        let app = Application {
            id: ApplicationId(self.tables.next_id()),
            aml_number: new.aml_number,
            name: new.name,
            status: new.status,
            uptime: new.uptime,
            criticality: new.criticality,
        };
        self.tables.applications.insert(app.id.as_i64(), app.clone());
        Ok(app)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>> {
        Ok(self.tables.applications.get(&id.as_i64()).cloned())
    }

    fn applications(&self, ids: &[ApplicationId]) -> Result<Vec<Application>> {
        Ok(select_by(&self.tables.applications, ids, |a| Some(a.id)))
    }

    // ========== Interfaces ==========

    fn create_interface(&mut self, new: NewInterface) -> Result<Interface> {
        self.require_application(new.provider_application_id)?;
        self.require_application(new.consumer_application_id)?;
        if self
            .tables
            .interfaces
            .values()
            .any(|i| i.iml_number == new.iml_number)
        {
            return Err(unique_violation("interfaces.iml_number", &new.iml_number));
        }
        let interface = Interface {
            id: InterfaceId(self.tables.next_id()),
            iml_number: new.iml_number,
            description: new.description,
            provider_application_id: new.provider_application_id,
            consumer_application_id: new.consumer_application_id,
            interface_type: new.interface_type,
            status: new.status,
            version: new.version,
            last_change_date: Utc::now(),
        };
        self.tables
            .interfaces
            .insert(interface.id.as_i64(), interface.clone());
        Ok(interface)
    }

    fn interface(&self, id: InterfaceId) -> Result<Option<Interface>> {
        Ok(self.tables.interfaces.get(&id.as_i64()).cloned())
    }

    fn interfaces(&self, ids: &[InterfaceId]) -> Result<Vec<Interface>> {
        Ok(select_by(&self.tables.interfaces, ids, |i| Some(i.id)))
    }

    fn interfaces_provided_by(&self, apps: &[ApplicationId]) -> Result<Vec<Interface>> {
        Ok(select_by(&self.tables.interfaces, apps, |i| {
            i.provider_application_id
        }))
    }

    fn interfaces_consumed_by(&self, apps: &[ApplicationId]) -> Result<Vec<Interface>> {
        Ok(select_by(&self.tables.interfaces, apps, |i| {
            i.consumer_application_id
        }))
    }

    fn delete_interface(&mut self, id: InterfaceId) -> Result<bool> {
        let t = &mut self.tables;
        remove_where(&mut t.process_interfaces, |pi| pi.interface_id == id);
        remove_where(&mut t.cr_interfaces, |link| link.entity_id == id);
        Ok(t.interfaces.remove(&id.as_i64()).is_some())
    }

    // ========== Business processes ==========

    fn create_process(&mut self, new: NewBusinessProcess) -> Result<BusinessProcess> {
        let now = Utc::now();
        let bp = BusinessProcess {
            id: ProcessId(self.tables.next_id()),
            name: new.name,
            lob: new.lob,
            product: new.product,
            version: new.version,
            level: new.level,
            domain_owner: new.domain_owner,
            it_owner: new.it_owner,
            vendor_focal: new.vendor_focal,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.tables.processes.insert(bp.id.as_i64(), bp.clone());
        Ok(bp)
    }

    fn process(&self, id: ProcessId) -> Result<Option<BusinessProcess>> {
        Ok(self.tables.processes.get(&id.as_i64()).cloned())
    }

    fn processes(&self) -> Result<Vec<BusinessProcess>> {
        Ok(self.tables.processes.values().cloned().collect())
    }

    fn set_process_level(&mut self, id: ProcessId, level: Level) -> Result<bool> {
        Ok(match self.tables.processes.get_mut(&id.as_i64()) {
            Some(bp) => {
                bp.level = level;
                bp.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    fn delete_process(&mut self, id: ProcessId) -> Result<bool> {
        let t = &mut self.tables;
        remove_where(&mut t.relationships, |r| {
            r.parent_process_id == id || r.child_process_id == id
        });
        remove_where(&mut t.process_interfaces, |pi| pi.business_process_id == id);
        remove_where(&mut t.diagrams, |d| d.business_process_id == id);
        Ok(t.processes.remove(&id.as_i64()).is_some())
    }

    // ========== Relationships ==========

    fn insert_relationship(&mut self, new: NewRelationship) -> Result<Relationship> {
        self.require_process(new.parent)?;
        self.require_process(new.child)?;
        let rel = Relationship {
            id: self.tables.next_id(),
            parent_process_id: new.parent,
            child_process_id: new.child,
            relationship_type: new.relationship_type,
            sequence_number: new.sequence_number,
        };
        self.tables.relationships.insert(rel.id, rel.clone());
        Ok(rel)
    }

    fn delete_relationship(&mut self, parent: ProcessId, child: ProcessId) -> Result<bool> {
        let removed = remove_where(&mut self.tables.relationships, |r| {
            r.parent_process_id == parent && r.child_process_id == child
        });
        Ok(removed > 0)
    }

    fn delete_parent_edges(&mut self, child: ProcessId) -> Result<usize> {
        Ok(remove_where(&mut self.tables.relationships, |r| {
            r.child_process_id == child
        }))
    }

    fn delete_relationships_touching(&mut self, process: ProcessId) -> Result<usize> {
        Ok(remove_where(&mut self.tables.relationships, |r| {
            r.parent_process_id == process || r.child_process_id == process
        }))
    }

    fn set_relationship_sequence(&mut self, relationship_id: i64, sequence: i64) -> Result<bool> {
        Ok(match self.tables.relationships.get_mut(&relationship_id) {
            Some(rel) => {
                rel.sequence_number = sequence;
                true
            }
            None => false,
        })
    }

    fn parents_of(&self, child: ProcessId) -> Result<Vec<SequencedProcess>> {
        let mut rows: Vec<_> = self
            .tables
            .relationships
            .values()
            .filter(|r| r.child_process_id == child)
            .filter_map(|r| self.sequenced(r, r.parent_process_id))
            .collect();
        sort_sequenced(&mut rows);
        Ok(rows)
    }

    fn children_of(&self, parent: ProcessId) -> Result<Vec<SequencedProcess>> {
        let mut rows: Vec<_> = self
            .tables
            .relationships
            .values()
            .filter(|r| r.parent_process_id == parent)
            .filter_map(|r| self.sequenced(r, r.child_process_id))
            .collect();
        sort_sequenced(&mut rows);
        debug!(parent_id = %parent, count = rows.len(), "Loaded children");
        Ok(rows)
    }

    fn relationships_of(&self, process: ProcessId) -> Result<Vec<Relationship>> {
        Ok(self
            .tables
            .relationships
            .values()
            .filter(|r| r.parent_process_id == process || r.child_process_id == process)
            .cloned()
            .collect())
    }

    fn all_relationships(&self) -> Result<Vec<Relationship>> {
        Ok(self.tables.relationships.values().cloned().collect())
    }

    // ========== Process interfaces ==========

    fn insert_process_interface(&mut self, new: NewProcessInterface) -> Result<ProcessInterface> {
        self.require_process(new.business_process_id)?;
        self.require_interface(new.interface_id)?;
        let row = ProcessInterface {
            id: self.tables.next_id(),
            business_process_id: new.business_process_id,
            interface_id: new.interface_id,
            sequence_number: new.sequence_number,
            description: new.description,
        };
        self.tables.process_interfaces.insert(row.id, row.clone());
        Ok(row)
    }

    fn process_interface(&self, id: i64) -> Result<Option<ProcessInterface>> {
        Ok(self.tables.process_interfaces.get(&id).cloned())
    }

    fn delete_process_interface(&mut self, id: i64) -> Result<bool> {
        Ok(self.tables.process_interfaces.remove(&id).is_some())
    }

    fn delete_process_interfaces_for_process(&mut self, process: ProcessId) -> Result<usize> {
        Ok(remove_where(&mut self.tables.process_interfaces, |pi| {
            pi.business_process_id == process
        }))
    }

    fn delete_process_interfaces_for_interface(
        &mut self,
        interface: InterfaceId,
    ) -> Result<usize> {
        Ok(remove_where(&mut self.tables.process_interfaces, |pi| {
            pi.interface_id == interface
        }))
    }

    fn process_interfaces_for_interfaces(
        &self,
        interfaces: &[InterfaceId],
    ) -> Result<Vec<ProcessInterface>> {
        Ok(select_by(&self.tables.process_interfaces, interfaces, |pi| {
            Some(pi.interface_id)
        }))
    }

    fn process_interfaces_for_process(&self, process: ProcessId) -> Result<Vec<ProcessInterface>> {
        let mut rows: Vec<_> = self
            .tables
            .process_interfaces
            .values()
            .filter(|pi| pi.business_process_id == process)
            .cloned()
            .collect();
        rows.sort_by_key(|pi| (pi.sequence_number, pi.id));
        Ok(rows)
    }

    fn set_process_interface_sequence(&mut self, id: i64, sequence: i64) -> Result<bool> {
        Ok(match self.tables.process_interfaces.get_mut(&id) {
            Some(pi) => {
                pi.sequence_number = sequence;
                true
            }
            None => false,
        })
    }

    // ========== Change requests ==========

    fn create_change_request(&mut self, new: NewChangeRequest) -> Result<ChangeRequest> {
        if self
            .tables
            .change_requests
            .values()
            .any(|cr| cr.cr_number == new.cr_number)
        {
            return Err(unique_violation("change_requests.cr_number", &new.cr_number));
        }
        let cr = ChangeRequest {
            id: ChangeRequestId(self.tables.next_id()),
            cr_number: new.cr_number,
            title: new.title,
            status: new.status,
            priority: new.priority,
        };
        self.tables.change_requests.insert(cr.id.as_i64(), cr.clone());
        Ok(cr)
    }

    fn change_request(&self, id: ChangeRequestId) -> Result<Option<ChangeRequest>> {
        Ok(self.tables.change_requests.get(&id.as_i64()).cloned())
    }

    fn change_requests(&self, ids: &[ChangeRequestId]) -> Result<Vec<ChangeRequest>> {
        Ok(select_by(&self.tables.change_requests, ids, |cr| Some(cr.id)))
    }

    fn delete_change_request(&mut self, id: ChangeRequestId) -> Result<bool> {
        let t = &mut self.tables;
        remove_where(&mut t.cr_applications, |l| l.change_request_id == id);
        remove_where(&mut t.cr_interfaces, |l| l.change_request_id == id);
        remove_where(&mut t.cr_technical_processes, |l| l.change_request_id == id);
        Ok(t.change_requests.remove(&id.as_i64()).is_some())
    }

    fn change_request_applications(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<ApplicationId>>> {
        Ok(select_by(&self.tables.cr_applications, change_requests, |l| {
            Some(l.change_request_id)
        }))
    }

    fn change_request_interfaces(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<InterfaceId>>> {
        Ok(select_by(&self.tables.cr_interfaces, change_requests, |l| {
            Some(l.change_request_id)
        }))
    }

    fn change_request_technical_processes(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<TechnicalProcessId>>> {
        Ok(select_by(
            &self.tables.cr_technical_processes,
            change_requests,
            |l| Some(l.change_request_id),
        ))
    }

    fn application_change_links(
        &self,
        apps: &[ApplicationId],
    ) -> Result<Vec<ImpactLink<ApplicationId>>> {
        Ok(select_by(&self.tables.cr_applications, apps, |l| {
            Some(l.entity_id)
        }))
    }

    fn interface_change_links(
        &self,
        interfaces: &[InterfaceId],
    ) -> Result<Vec<ImpactLink<InterfaceId>>> {
        Ok(select_by(&self.tables.cr_interfaces, interfaces, |l| {
            Some(l.entity_id)
        }))
    }

    fn replace_change_request_applications(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<ApplicationId>>,
    ) -> Result<Vec<ImpactLink<ApplicationId>>> {
        self.require_change_request(change_request)?;
        for link in &links {
            self.require_application(Some(link.entity_id))?;
        }
        let Tables {
            next_id,
            cr_applications,
            ..
        } = &mut self.tables;
        let mut next = || {
            *next_id += 1;
            *next_id
        };
        Ok(replace_links(&mut next, cr_applications, change_request, links))
    }

    fn replace_change_request_interfaces(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<InterfaceId>>,
    ) -> Result<Vec<ImpactLink<InterfaceId>>> {
        self.require_change_request(change_request)?;
        for link in &links {
            self.require_interface(link.entity_id)?;
        }
        let Tables {
            next_id,
            cr_interfaces,
            ..
        } = &mut self.tables;
        let mut next = || {
            *next_id += 1;
            *next_id
        };
        Ok(replace_links(&mut next, cr_interfaces, change_request, links))
    }

    fn replace_change_request_technical_processes(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<TechnicalProcessId>>,
    ) -> Result<Vec<ImpactLink<TechnicalProcessId>>> {
        self.require_change_request(change_request)?;
        for link in &links {
            if !self
                .tables
                .technical_processes
                .contains_key(&link.entity_id.as_i64())
            {
                return Err(fk_violation("technical process", link.entity_id.as_i64()));
            }
        }
        let Tables {
            next_id,
            cr_technical_processes,
            ..
        } = &mut self.tables;
        let mut next = || {
            *next_id += 1;
            *next_id
        };
        Ok(replace_links(
            &mut next,
            cr_technical_processes,
            change_request,
            links,
        ))
    }

    // ========== Technical processes ==========

    fn create_technical_process(&mut self, new: NewTechnicalProcess) -> Result<TechnicalProcess> {
        self.require_application(new.application_id)?;
        let tp = TechnicalProcess {
            id: TechnicalProcessId(self.tables.next_id()),
            name: new.name,
            job_name: new.job_name,
            application_id: new.application_id,
            criticality: new.criticality,
            status: new.status,
        };
        self.tables
            .technical_processes
            .insert(tp.id.as_i64(), tp.clone());
        Ok(tp)
    }

    fn technical_processes(&self, ids: &[TechnicalProcessId]) -> Result<Vec<TechnicalProcess>> {
        Ok(select_by(&self.tables.technical_processes, ids, |tp| {
            Some(tp.id)
        }))
    }

    // ========== Diagrams ==========

    fn save_diagram(&mut self, process: ProcessId, data: &str) -> Result<Diagram> {
        self.require_process(process)?;
        let existing = self
            .tables
            .diagrams
            .values()
            .find(|d| d.business_process_id == process)
            .map(|d| d.id);
        let id = match existing {
            Some(id) => id,
            None => self.tables.next_id(),
        };
        let diagram = Diagram {
            id,
            business_process_id: process,
            diagram_data: data.to_string(),
            updated_at: Utc::now(),
        };
        self.tables.diagrams.insert(id, diagram.clone());
        Ok(diagram)
    }

    fn diagram(&self, process: ProcessId) -> Result<Option<Diagram>> {
        Ok(self
            .tables
            .diagrams
            .values()
            .find(|d| d.business_process_id == process)
            .cloned())
    }

    fn delete_diagrams(&mut self, processes: &[ProcessId]) -> Result<usize> {
        let doomed: HashSet<ProcessId> = processes.iter().copied().collect();
        Ok(remove_where(&mut self.tables.diagrams, |d| {
            doomed.contains(&d.business_process_id)
        }))
    }

    // ========== Transactions ==========

    fn atomically(&mut self, body: &mut TransactionBody<'_>) -> Result<()> {
        let snapshot = self.tables.clone();
        let result = body(self);
        if result.is_err() {
            debug!("Rolling back in-memory transaction");
            self.tables = snapshot;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::in_transaction;
    use crate::types::RelationshipType;

    fn edge(parent: ProcessId, child: ProcessId, seq: i64) -> NewRelationship {
        NewRelationship {
            parent,
            child,
            relationship_type: RelationshipType::Contains,
            sequence_number: seq,
        }
    }

    #[test]
    fn children_are_ordered_by_sequence_then_edge_id() {
        let mut store = InMemoryStore::new();
        let parent = store
            .create_process(NewBusinessProcess::named("P", Level::A))
            .expect("create");
        let a = store
            .create_process(NewBusinessProcess::named("a", Level::B))
            .expect("create");
        let b = store
            .create_process(NewBusinessProcess::named("b", Level::B))
            .expect("create");
        let c = store
            .create_process(NewBusinessProcess::named("c", Level::B))
            .expect("create");

        store.insert_relationship(edge(parent.id, a.id, 20)).expect("edge");
        store.insert_relationship(edge(parent.id, b.id, 10)).expect("edge");
        store.insert_relationship(edge(parent.id, c.id, 20)).expect("edge");

        let names: Vec<_> = store
            .children_of(parent.id)
            .expect("children")
            .into_iter()
            .map(|c| c.process.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn relationship_to_missing_process_violates_foreign_key() {
        let mut store = InMemoryStore::new();
        let parent = store
            .create_process(NewBusinessProcess::named("P", Level::A))
            .expect("create");

        let err = store
            .insert_relationship(edge(parent.id, ProcessId(999), 10))
            .expect_err("missing child");
        assert!(matches!(err, Error::Storage(msg) if msg.contains("FOREIGN KEY")));
    }

    #[test]
    fn failed_transaction_restores_every_table() {
        let mut store = InMemoryStore::new();
        let kept = store
            .create_process(NewBusinessProcess::named("kept", Level::A))
            .expect("create");

        let result: Result<()> = in_transaction(&mut store, |tx| {
            tx.create_process(NewBusinessProcess::named("discarded", Level::A))?;
            tx.delete_process(kept.id)?;
            Err(Error::Internal("abort".into()))
        });

        assert!(result.is_err());
        let names: Vec<_> = store
            .processes()
            .expect("list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["kept"]);
    }

    #[test]
    fn deleting_interface_cascades_to_assignments_and_links() {
        let mut store = InMemoryStore::new();
        let bp = store
            .create_process(NewBusinessProcess::named("P", Level::A))
            .expect("create");
        let iface = store
            .create_interface(NewInterface {
                iml_number: "IML-1".into(),
                ..NewInterface::default()
            })
            .expect("interface");
        let cr = store
            .create_change_request(NewChangeRequest {
                cr_number: "CR-1".into(),
                title: "t".into(),
                status: crate::types::ChangeRequestStatus::Submitted,
                priority: None,
            })
            .expect("cr");
        store
            .insert_process_interface(NewProcessInterface {
                business_process_id: bp.id,
                interface_id: iface.id,
                sequence_number: 1,
                description: None,
            })
            .expect("assign");
        store
            .replace_change_request_interfaces(
                cr.id,
                vec![NewImpactLink {
                    entity_id: iface.id,
                    impact_type: Some("modify".into()),
                    impact_description: None,
                }],
            )
            .expect("links");

        assert!(store.delete_interface(iface.id).expect("delete"));

        assert!(store.process_interfaces_for_process(bp.id).expect("pis").is_empty());
        assert!(store.change_request_interfaces(&[cr.id]).expect("links").is_empty());
    }

    #[test]
    fn duplicate_aml_number_is_rejected() {
        let mut store = InMemoryStore::new();
        let app = NewApplication {
            aml_number: "AML-1".into(),
            name: "Billing".into(),
            ..NewApplication::default()
        };
        store.create_application(app.clone()).expect("first");
        assert!(matches!(
            store.create_application(app),
            Err(Error::Storage(_))
        ));
    }
}
