//! Helper functions for database row conversion and parsing.
//!
//! Also provides SQL column list constants so every query selects columns in
//! the order its `row_to_*` function expects.

use rusqlite::types::Type;
use rusqlite::{Connection, Row, params_from_iter};

use crate::error::Result;
use crate::types::{
    Application, BusinessProcess, ChangeRequest, ChangeRequestStatus, Diagram, ImpactLink,
    Interface, Level, ProcessInterface, Relationship, RelationshipType, SequencedProcess,
    TechnicalProcess,
};

/// SQL column list for applications table.
pub(crate) const APPLICATION_COLUMNS: &str = "id, aml_number, name, status, uptime, criticality";

/// SQL column list for interfaces table.
pub(crate) const INTERFACE_COLUMNS: &str = "id, iml_number, description, provider_application_id, \
     consumer_application_id, interface_type, status, version, last_change_date";

/// SQL column list for business processes, qualified with alias `bp`.
///
/// Use with `row_to_process`; joins append extra columns after these.
pub(crate) const PROCESS_COLUMNS: &str = "bp.id, bp.name, bp.lob, bp.product, bp.version, \
     bp.level, bp.domain_owner, bp.it_owner, bp.vendor_focal, bp.status, bp.created_at, \
     bp.updated_at";

/// Number of columns in `PROCESS_COLUMNS`.
pub(crate) const PROCESS_COLUMN_COUNT: usize = 12;

/// SQL column list for relationships table.
pub(crate) const RELATIONSHIP_COLUMNS: &str =
    "id, parent_process_id, child_process_id, relationship_type, sequence_number";

/// SQL column list for business process interfaces table.
pub(crate) const PROCESS_INTERFACE_COLUMNS: &str =
    "id, business_process_id, interface_id, sequence_number, description";

/// SQL column list for change requests table.
pub(crate) const CHANGE_REQUEST_COLUMNS: &str = "id, cr_number, title, status, priority";

/// SQL column list for technical processes table.
pub(crate) const TECHNICAL_PROCESS_COLUMNS: &str =
    "id, name, job_name, application_id, criticality, status";

/// SQL column list for diagrams table.
pub(crate) const DIAGRAM_COLUMNS: &str = "id, business_process_id, diagram_data, updated_at";

fn corrupt(index: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        Type::Text,
        format!("Unknown {what} '{value}' in database. Database may be corrupted or from a newer version.").into(),
    )
}

/// Parse a level string from the database.
pub(crate) fn parse_level(index: usize, s: &str) -> rusqlite::Result<Level> {
    Level::parse(s).ok_or_else(|| corrupt(index, "level", s))
}

/// Parse a change request status string from the database.
pub(crate) fn parse_status(index: usize, s: &str) -> rusqlite::Result<ChangeRequestStatus> {
    ChangeRequestStatus::parse(s).ok_or_else(|| corrupt(index, "change request status", s))
}

/// Convert a database row to an Application.
pub(crate) fn row_to_application(row: &Row) -> rusqlite::Result<Application> {
    Ok(Application {
        id: row.get::<_, i64>(0)?.into(),
        aml_number: row.get(1)?,
        name: row.get(2)?,
        status: row.get(3)?,
        uptime: row.get(4)?,
        criticality: row.get(5)?,
    })
}

/// Convert a database row to an Interface.
pub(crate) fn row_to_interface(row: &Row) -> rusqlite::Result<Interface> {
    Ok(Interface {
        id: row.get::<_, i64>(0)?.into(),
        iml_number: row.get(1)?,
        description: row.get(2)?,
        provider_application_id: row.get::<_, Option<i64>>(3)?.map(Into::into),
        consumer_application_id: row.get::<_, Option<i64>>(4)?.map(Into::into),
        interface_type: row.get(5)?,
        status: row.get(6)?,
        version: row.get(7)?,
        last_change_date: row.get(8)?,
    })
}

/// Convert a database row to a `BusinessProcess`.
pub(crate) fn row_to_process(row: &Row) -> rusqlite::Result<BusinessProcess> {
    let level: String = row.get(5)?;
    Ok(BusinessProcess {
        id: row.get::<_, i64>(0)?.into(),
        name: row.get(1)?,
        lob: row.get(2)?,
        product: row.get(3)?,
        version: row.get(4)?,
        level: parse_level(5, &level)?,
        domain_owner: row.get(6)?,
        it_owner: row.get(7)?,
        vendor_focal: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Convert a row of `PROCESS_COLUMNS, r.id, r.sequence_number` to a `SequencedProcess`.
pub(crate) fn row_to_sequenced(row: &Row) -> rusqlite::Result<SequencedProcess> {
    Ok(SequencedProcess {
        process: row_to_process(row)?,
        relationship_id: row.get(PROCESS_COLUMN_COUNT)?,
        sequence_number: row.get(PROCESS_COLUMN_COUNT + 1)?,
    })
}

/// Convert a database row to a Relationship.
pub(crate) fn row_to_relationship(row: &Row) -> rusqlite::Result<Relationship> {
    let kind: String = row.get(3)?;
    Ok(Relationship {
        id: row.get(0)?,
        parent_process_id: row.get::<_, i64>(1)?.into(),
        child_process_id: row.get::<_, i64>(2)?.into(),
        relationship_type: RelationshipType::parse(&kind)
            .ok_or_else(|| corrupt(3, "relationship type", &kind))?,
        sequence_number: row.get(4)?,
    })
}

/// Convert a database row to a `ProcessInterface`.
pub(crate) fn row_to_process_interface(row: &Row) -> rusqlite::Result<ProcessInterface> {
    Ok(ProcessInterface {
        id: row.get(0)?,
        business_process_id: row.get::<_, i64>(1)?.into(),
        interface_id: row.get::<_, i64>(2)?.into(),
        sequence_number: row.get(3)?,
        description: row.get(4)?,
    })
}

/// Convert a database row to a `ChangeRequest`.
pub(crate) fn row_to_change_request(row: &Row) -> rusqlite::Result<ChangeRequest> {
    let status: String = row.get(3)?;
    Ok(ChangeRequest {
        id: row.get::<_, i64>(0)?.into(),
        cr_number: row.get(1)?,
        title: row.get(2)?,
        status: parse_status(3, &status)?,
        priority: row.get(4)?,
    })
}

/// Convert a database row to a `TechnicalProcess`.
pub(crate) fn row_to_technical_process(row: &Row) -> rusqlite::Result<TechnicalProcess> {
    Ok(TechnicalProcess {
        id: row.get::<_, i64>(0)?.into(),
        name: row.get(1)?,
        job_name: row.get(2)?,
        application_id: row.get::<_, Option<i64>>(3)?.map(Into::into),
        criticality: row.get(4)?,
        status: row.get(5)?,
    })
}

/// Convert a database row to a Diagram.
pub(crate) fn row_to_diagram(row: &Row) -> rusqlite::Result<Diagram> {
    Ok(Diagram {
        id: row.get(0)?,
        business_process_id: row.get::<_, i64>(1)?.into(),
        diagram_data: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

/// Convert a row of `id, change_request_id, <entity>, impact_type, impact_description`.
pub(crate) fn row_to_link<T: From<i64>>(row: &Row) -> rusqlite::Result<ImpactLink<T>> {
    Ok(ImpactLink {
        id: row.get(0)?,
        change_request_id: row.get::<_, i64>(1)?.into(),
        entity_id: row.get::<_, i64>(2)?.into(),
        impact_type: row.get(3)?,
        impact_description: row.get(4)?,
    })
}

/// `?1, ?2, ... ?n` placeholder list for an `IN (...)` clause.
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run `sql` with `{ids}` replaced by one placeholder per id.
///
/// An empty id list short-circuits to an empty result without touching the
/// database.
pub(crate) fn query_in<T>(
    conn: &Connection,
    sql: &str,
    ids: &[i64],
    map: impl FnMut(&Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = sql.replace("{ids}", &placeholders(ids.len()));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(ids.iter()), map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
