//! `EntityStore` implementation over `SQLite`.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use super::SqliteStore;
use super::helpers::{
    APPLICATION_COLUMNS, CHANGE_REQUEST_COLUMNS, DIAGRAM_COLUMNS, INTERFACE_COLUMNS,
    PROCESS_COLUMNS, PROCESS_INTERFACE_COLUMNS, RELATIONSHIP_COLUMNS, TECHNICAL_PROCESS_COLUMNS,
    query_in, row_to_application, row_to_change_request, row_to_diagram, row_to_interface,
    row_to_link, row_to_process, row_to_process_interface, row_to_relationship,
    row_to_sequenced, row_to_technical_process,
};
use crate::error::Result;
use crate::store::{EntityStore, TransactionBody};
use crate::types::{
    Application, ApplicationId, BusinessProcess, ChangeRequest, ChangeRequestId, Diagram,
    ImpactLink, Interface, InterfaceId, Level, NewApplication, NewBusinessProcess,
    NewChangeRequest, NewImpactLink, NewInterface, NewProcessInterface, NewRelationship,
    NewTechnicalProcess, ProcessId, ProcessInterface, Relationship, SequencedProcess,
    TechnicalProcess, TechnicalProcessId,
};

/// One of the three change-request impact tables.
struct LinkTable {
    table: &'static str,
    entity_column: &'static str,
}

const CR_APPLICATIONS: LinkTable = LinkTable {
    table: "change_request_applications",
    entity_column: "application_id",
};

const CR_INTERFACES: LinkTable = LinkTable {
    table: "change_request_interfaces",
    entity_column: "interface_id",
};

const CR_TECHNICAL_PROCESSES: LinkTable = LinkTable {
    table: "change_request_technical_processes",
    entity_column: "technical_process_id",
};

impl LinkTable {
    fn select_where(&self, conn: &Connection, column: &str, ids: &[i64]) -> Result<Vec<ImpactLink<i64>>> {
        query_in(
            conn,
            &format!(
                "SELECT id, change_request_id, {}, impact_type, impact_description
                 FROM {} WHERE {column} IN ({{ids}}) ORDER BY id",
                self.entity_column, self.table
            ),
            ids,
            row_to_link::<i64>,
        )
    }

    fn by_change_requests<T: From<i64>>(
        &self,
        conn: &Connection,
        ids: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<T>>> {
        let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        Ok(self
            .select_where(conn, "change_request_id", &raw)?
            .into_iter()
            .map(retype_link)
            .collect())
    }

    fn by_entities<T: From<i64>>(&self, conn: &Connection, ids: &[i64]) -> Result<Vec<ImpactLink<T>>> {
        Ok(self
            .select_where(conn, self.entity_column, ids)?
            .into_iter()
            .map(retype_link)
            .collect())
    }

    fn replace<T: Copy + Into<i64> + From<i64>>(
        &self,
        conn: &Connection,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<T>>,
    ) -> Result<Vec<ImpactLink<T>>> {
        conn.execute(
            &format!("DELETE FROM {} WHERE change_request_id = ?1", self.table),
            [change_request.as_i64()],
        )?;

        let mut stmt = conn.prepare(&format!(
            "INSERT INTO {} (change_request_id, {}, impact_type, impact_description)
             VALUES (?1, ?2, ?3, ?4)",
            self.table, self.entity_column
        ))?;

        let mut inserted = Vec::with_capacity(links.len());
        for link in links {
            let entity: i64 = link.entity_id.into();
            stmt.execute(params![
                change_request.as_i64(),
                entity,
                link.impact_type,
                link.impact_description
            ])?;
            inserted.push(ImpactLink {
                id: conn.last_insert_rowid(),
                change_request_id: change_request,
                entity_id: link.entity_id,
                impact_type: link.impact_type,
                impact_description: link.impact_description,
            });
        }
        Ok(inserted)
    }
}

fn retype_link<T: From<i64>>(link: ImpactLink<i64>) -> ImpactLink<T> {
    ImpactLink {
        id: link.id,
        change_request_id: link.change_request_id,
        entity_id: T::from(link.entity_id),
        impact_type: link.impact_type,
        impact_description: link.impact_description,
    }
}

macro_rules! raw_ids {
    ($ids:expr) => {
        $ids.iter().map(|id| id.as_i64()).collect::<Vec<i64>>()
    };
}

impl SqliteStore {
    fn sequenced(&self, join_on: &str, filter: &str, id: ProcessId) -> Result<Vec<SequencedProcess>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {PROCESS_COLUMNS}, r.id, r.sequence_number
             FROM business_process_relationships r
             JOIN business_processes bp ON bp.id = r.{join_on}
             WHERE r.{filter} = ?1
             ORDER BY r.sequence_number, r.id"
        ))?;
        let rows = stmt
            .query_map([id.as_i64()], row_to_sequenced)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl EntityStore for SqliteStore {
    // ========== Applications ==========

    fn create_application(&mut self, new: NewApplication) -> Result<Application> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO applications (aml_number, name, status, uptime, criticality)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![new.aml_number, new.name, new.status, new.uptime, new.criticality],
        )?;
        Ok(Application {
            id: conn.last_insert_rowid().into(),
            aml_number: new.aml_number,
            name: new.name,
            status: new.status,
            uptime: new.uptime,
            criticality: new.criticality,
        })
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>> {
        self.connection()
            .query_row(
                &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
                [id.as_i64()],
                row_to_application,
            )
            .optional()
            .map_err(Into::into)
    }

    fn applications(&self, ids: &[ApplicationId]) -> Result<Vec<Application>> {
        query_in(
            self.connection(),
            &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id IN ({{ids}}) ORDER BY id"),
            &raw_ids!(ids),
            row_to_application,
        )
    }

    // ========== Interfaces ==========

    fn create_interface(&mut self, new: NewInterface) -> Result<Interface> {
        let conn = self.connection();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO interfaces (iml_number, description, provider_application_id,
                consumer_application_id, interface_type, status, version, last_change_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.iml_number,
                new.description,
                new.provider_application_id.map(ApplicationId::as_i64),
                new.consumer_application_id.map(ApplicationId::as_i64),
                new.interface_type,
                new.status,
                new.version,
                now
            ],
        )?;
        Ok(Interface {
            id: conn.last_insert_rowid().into(),
            iml_number: new.iml_number,
            description: new.description,
            provider_application_id: new.provider_application_id,
            consumer_application_id: new.consumer_application_id,
            interface_type: new.interface_type,
            status: new.status,
            version: new.version,
            last_change_date: now,
        })
    }

    fn interface(&self, id: InterfaceId) -> Result<Option<Interface>> {
        self.connection()
            .query_row(
                &format!("SELECT {INTERFACE_COLUMNS} FROM interfaces WHERE id = ?1"),
                [id.as_i64()],
                row_to_interface,
            )
            .optional()
            .map_err(Into::into)
    }

    fn interfaces(&self, ids: &[InterfaceId]) -> Result<Vec<Interface>> {
        query_in(
            self.connection(),
            &format!("SELECT {INTERFACE_COLUMNS} FROM interfaces WHERE id IN ({{ids}}) ORDER BY id"),
            &raw_ids!(ids),
            row_to_interface,
        )
    }

    fn interfaces_provided_by(&self, apps: &[ApplicationId]) -> Result<Vec<Interface>> {
        query_in(
            self.connection(),
            &format!(
                "SELECT {INTERFACE_COLUMNS} FROM interfaces
                 WHERE provider_application_id IN ({{ids}}) ORDER BY id"
            ),
            &raw_ids!(apps),
            row_to_interface,
        )
    }

    fn interfaces_consumed_by(&self, apps: &[ApplicationId]) -> Result<Vec<Interface>> {
        query_in(
            self.connection(),
            &format!(
                "SELECT {INTERFACE_COLUMNS} FROM interfaces
                 WHERE consumer_application_id IN ({{ids}}) ORDER BY id"
            ),
            &raw_ids!(apps),
            row_to_interface,
        )
    }

    fn delete_interface(&mut self, id: InterfaceId) -> Result<bool> {
        // Assignments and change-request links cascade
        let removed = self
            .connection()
            .execute("DELETE FROM interfaces WHERE id = ?1", [id.as_i64()])?;
        Ok(removed > 0)
    }

    // ========== Business processes ==========

    fn create_process(&mut self, new: NewBusinessProcess) -> Result<BusinessProcess> {
        let conn = self.connection();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO business_processes (name, lob, product, version, level, domain_owner,
                it_owner, vendor_focal, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                new.name,
                new.lob,
                new.product,
                new.version,
                new.level.as_str(),
                new.domain_owner,
                new.it_owner,
                new.vendor_focal,
                new.status,
                now
            ],
        )?;
        Ok(BusinessProcess {
            id: conn.last_insert_rowid().into(),
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
        })
    }

    fn process(&self, id: ProcessId) -> Result<Option<BusinessProcess>> {
        self.connection()
            .query_row(
                &format!("SELECT {PROCESS_COLUMNS} FROM business_processes bp WHERE bp.id = ?1"),
                [id.as_i64()],
                row_to_process,
            )
            .optional()
            .map_err(Into::into)
    }

    fn processes(&self) -> Result<Vec<BusinessProcess>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {PROCESS_COLUMNS} FROM business_processes bp ORDER BY bp.id"
        ))?;
        let rows = stmt
            .query_map([], row_to_process)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn set_process_level(&mut self, id: ProcessId, level: Level) -> Result<bool> {
        let updated = self.connection().execute(
            "UPDATE business_processes SET level = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.as_i64(), level.as_str(), Utc::now()],
        )?;
        Ok(updated > 0)
    }

    fn delete_process(&mut self, id: ProcessId) -> Result<bool> {
        let removed = self
            .connection()
            .execute("DELETE FROM business_processes WHERE id = ?1", [id.as_i64()])?;
        Ok(removed > 0)
    }

    // ========== Relationships ==========

    fn insert_relationship(&mut self, new: NewRelationship) -> Result<Relationship> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO business_process_relationships
                (parent_process_id, child_process_id, relationship_type, sequence_number)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                new.parent.as_i64(),
                new.child.as_i64(),
                new.relationship_type.as_str(),
                new.sequence_number
            ],
        )?;
        Ok(Relationship {
            id: conn.last_insert_rowid(),
            parent_process_id: new.parent,
            child_process_id: new.child,
            relationship_type: new.relationship_type,
            sequence_number: new.sequence_number,
        })
    }

    fn delete_relationship(&mut self, parent: ProcessId, child: ProcessId) -> Result<bool> {
        let removed = self.connection().execute(
            "DELETE FROM business_process_relationships
             WHERE parent_process_id = ?1 AND child_process_id = ?2",
            [parent.as_i64(), child.as_i64()],
        )?;
        Ok(removed > 0)
    }

    fn delete_parent_edges(&mut self, child: ProcessId) -> Result<usize> {
        Ok(self.connection().execute(
            "DELETE FROM business_process_relationships WHERE child_process_id = ?1",
            [child.as_i64()],
        )?)
    }

    fn delete_relationships_touching(&mut self, process: ProcessId) -> Result<usize> {
        Ok(self.connection().execute(
            "DELETE FROM business_process_relationships
             WHERE parent_process_id = ?1 OR child_process_id = ?1",
            [process.as_i64()],
        )?)
    }

    fn set_relationship_sequence(&mut self, relationship_id: i64, sequence: i64) -> Result<bool> {
        let updated = self.connection().execute(
            "UPDATE business_process_relationships SET sequence_number = ?2 WHERE id = ?1",
            [relationship_id, sequence],
        )?;
        Ok(updated > 0)
    }

    fn parents_of(&self, child: ProcessId) -> Result<Vec<SequencedProcess>> {
        self.sequenced("parent_process_id", "child_process_id", child)
    }

    fn children_of(&self, parent: ProcessId) -> Result<Vec<SequencedProcess>> {
        self.sequenced("child_process_id", "parent_process_id", parent)
    }

    fn relationships_of(&self, process: ProcessId) -> Result<Vec<Relationship>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM business_process_relationships
             WHERE parent_process_id = ?1 OR child_process_id = ?1
             ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([process.as_i64()], row_to_relationship)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn all_relationships(&self) -> Result<Vec<Relationship>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM business_process_relationships ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([], row_to_relationship)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ========== Process interfaces ==========

    fn insert_process_interface(&mut self, new: NewProcessInterface) -> Result<ProcessInterface> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO business_process_interfaces
                (business_process_id, interface_id, sequence_number, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                new.business_process_id.as_i64(),
                new.interface_id.as_i64(),
                new.sequence_number,
                new.description
            ],
        )?;
        Ok(ProcessInterface {
            id: conn.last_insert_rowid(),
            business_process_id: new.business_process_id,
            interface_id: new.interface_id,
            sequence_number: new.sequence_number,
            description: new.description,
        })
    }

    fn process_interface(&self, id: i64) -> Result<Option<ProcessInterface>> {
        self.connection()
            .query_row(
                &format!(
                    "SELECT {PROCESS_INTERFACE_COLUMNS} FROM business_process_interfaces WHERE id = ?1"
                ),
                [id],
                row_to_process_interface,
            )
            .optional()
            .map_err(Into::into)
    }

    fn delete_process_interface(&mut self, id: i64) -> Result<bool> {
        let removed = self
            .connection()
            .execute("DELETE FROM business_process_interfaces WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn delete_process_interfaces_for_process(&mut self, process: ProcessId) -> Result<usize> {
        Ok(self.connection().execute(
            "DELETE FROM business_process_interfaces WHERE business_process_id = ?1",
            [process.as_i64()],
        )?)
    }

    fn delete_process_interfaces_for_interface(
        &mut self,
        interface: InterfaceId,
    ) -> Result<usize> {
        Ok(self.connection().execute(
            "DELETE FROM business_process_interfaces WHERE interface_id = ?1",
            [interface.as_i64()],
        )?)
    }

    fn process_interfaces_for_interfaces(
        &self,
        interfaces: &[InterfaceId],
    ) -> Result<Vec<ProcessInterface>> {
        query_in(
            self.connection(),
            &format!(
                "SELECT {PROCESS_INTERFACE_COLUMNS} FROM business_process_interfaces
                 WHERE interface_id IN ({{ids}}) ORDER BY id"
            ),
            &raw_ids!(interfaces),
            row_to_process_interface,
        )
    }

    fn process_interfaces_for_process(&self, process: ProcessId) -> Result<Vec<ProcessInterface>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {PROCESS_INTERFACE_COLUMNS} FROM business_process_interfaces
             WHERE business_process_id = ?1
             ORDER BY sequence_number, id"
        ))?;
        let rows = stmt
            .query_map([process.as_i64()], row_to_process_interface)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn set_process_interface_sequence(&mut self, id: i64, sequence: i64) -> Result<bool> {
        let updated = self.connection().execute(
            "UPDATE business_process_interfaces SET sequence_number = ?2 WHERE id = ?1",
            [id, sequence],
        )?;
        Ok(updated > 0)
    }

    // ========== Change requests ==========

    fn create_change_request(&mut self, new: NewChangeRequest) -> Result<ChangeRequest> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO change_requests (cr_number, title, status, priority)
             VALUES (?1, ?2, ?3, ?4)",
            params![new.cr_number, new.title, new.status.as_str(), new.priority],
        )?;
        Ok(ChangeRequest {
            id: conn.last_insert_rowid().into(),
            cr_number: new.cr_number,
            title: new.title,
            status: new.status,
            priority: new.priority,
        })
    }

    fn change_request(&self, id: ChangeRequestId) -> Result<Option<ChangeRequest>> {
        self.connection()
            .query_row(
                &format!("SELECT {CHANGE_REQUEST_COLUMNS} FROM change_requests WHERE id = ?1"),
                [id.as_i64()],
                row_to_change_request,
            )
            .optional()
            .map_err(Into::into)
    }

    fn change_requests(&self, ids: &[ChangeRequestId]) -> Result<Vec<ChangeRequest>> {
        query_in(
            self.connection(),
            &format!(
                "SELECT {CHANGE_REQUEST_COLUMNS} FROM change_requests WHERE id IN ({{ids}}) ORDER BY id"
            ),
            &raw_ids!(ids),
            row_to_change_request,
        )
    }

    fn delete_change_request(&mut self, id: ChangeRequestId) -> Result<bool> {
        // Impact rows cascade
        let removed = self
            .connection()
            .execute("DELETE FROM change_requests WHERE id = ?1", [id.as_i64()])?;
        Ok(removed > 0)
    }

    fn change_request_applications(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<ApplicationId>>> {
        CR_APPLICATIONS.by_change_requests(self.connection(), change_requests)
    }

    fn change_request_interfaces(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<InterfaceId>>> {
        CR_INTERFACES.by_change_requests(self.connection(), change_requests)
    }

    fn change_request_technical_processes(
        &self,
        change_requests: &[ChangeRequestId],
    ) -> Result<Vec<ImpactLink<TechnicalProcessId>>> {
        CR_TECHNICAL_PROCESSES.by_change_requests(self.connection(), change_requests)
    }

    fn application_change_links(
        &self,
        apps: &[ApplicationId],
    ) -> Result<Vec<ImpactLink<ApplicationId>>> {
        CR_APPLICATIONS.by_entities(self.connection(), &raw_ids!(apps))
    }

    fn interface_change_links(
        &self,
        interfaces: &[InterfaceId],
    ) -> Result<Vec<ImpactLink<InterfaceId>>> {
        CR_INTERFACES.by_entities(self.connection(), &raw_ids!(interfaces))
    }

    fn replace_change_request_applications(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<ApplicationId>>,
    ) -> Result<Vec<ImpactLink<ApplicationId>>> {
        CR_APPLICATIONS.replace(self.connection(), change_request, links)
    }

    fn replace_change_request_interfaces(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<InterfaceId>>,
    ) -> Result<Vec<ImpactLink<InterfaceId>>> {
        CR_INTERFACES.replace(self.connection(), change_request, links)
    }

    fn replace_change_request_technical_processes(
        &mut self,
        change_request: ChangeRequestId,
        links: Vec<NewImpactLink<TechnicalProcessId>>,
    ) -> Result<Vec<ImpactLink<TechnicalProcessId>>> {
        CR_TECHNICAL_PROCESSES.replace(self.connection(), change_request, links)
    }

    // ========== Technical processes ==========

    fn create_technical_process(&mut self, new: NewTechnicalProcess) -> Result<TechnicalProcess> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO technical_processes (name, job_name, application_id, criticality, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.name,
                new.job_name,
                new.application_id.map(ApplicationId::as_i64),
                new.criticality,
                new.status
            ],
        )?;
        Ok(TechnicalProcess {
            id: conn.last_insert_rowid().into(),
            name: new.name,
            job_name: new.job_name,
            application_id: new.application_id,
            criticality: new.criticality,
            status: new.status,
        })
    }

    fn technical_processes(&self, ids: &[TechnicalProcessId]) -> Result<Vec<TechnicalProcess>> {
        query_in(
            self.connection(),
            &format!(
                "SELECT {TECHNICAL_PROCESS_COLUMNS} FROM technical_processes
                 WHERE id IN ({{ids}}) ORDER BY id"
            ),
            &raw_ids!(ids),
            row_to_technical_process,
        )
    }

    // ========== Diagrams ==========

    fn save_diagram(&mut self, process: ProcessId, data: &str) -> Result<Diagram> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO business_process_diagrams (business_process_id, diagram_data, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(business_process_id) DO UPDATE SET
                diagram_data = excluded.diagram_data,
                updated_at = excluded.updated_at",
            params![process.as_i64(), data, Utc::now()],
        )?;
        conn.query_row(
            &format!(
                "SELECT {DIAGRAM_COLUMNS} FROM business_process_diagrams WHERE business_process_id = ?1"
            ),
            [process.as_i64()],
            row_to_diagram,
        )
        .map_err(Into::into)
    }

    fn diagram(&self, process: ProcessId) -> Result<Option<Diagram>> {
        self.connection()
            .query_row(
                &format!(
                    "SELECT {DIAGRAM_COLUMNS} FROM business_process_diagrams WHERE business_process_id = ?1"
                ),
                [process.as_i64()],
                row_to_diagram,
            )
            .optional()
            .map_err(Into::into)
    }

    fn delete_diagrams(&mut self, processes: &[ProcessId]) -> Result<usize> {
        if processes.is_empty() {
            return Ok(0);
        }
        let conn = self.connection();
        let mut stmt =
            conn.prepare("DELETE FROM business_process_diagrams WHERE business_process_id = ?1")?;
        let mut removed = 0;
        for process in processes {
            removed += stmt.execute([process.as_i64()])?;
        }
        Ok(removed)
    }

    // ========== Transactions ==========

    fn atomically(&mut self, body: &mut TransactionBody<'_>) -> Result<()> {
        self.run_atomically(body)
    }
}
