//! Database schema definition for the strata store.

/// Database schema definition.
pub(crate) const SCHEMA: &str = r"
-- Inventory
CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY,
    aml_number TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    uptime REAL,
    criticality TEXT
);

CREATE TABLE IF NOT EXISTS interfaces (
    id INTEGER PRIMARY KEY,
    iml_number TEXT NOT NULL UNIQUE,
    description TEXT,
    provider_application_id INTEGER REFERENCES applications(id) ON DELETE SET NULL,
    consumer_application_id INTEGER REFERENCES applications(id) ON DELETE SET NULL,
    interface_type TEXT NOT NULL,
    status TEXT NOT NULL,
    version TEXT NOT NULL,
    last_change_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_interfaces_provider ON interfaces(provider_application_id);
CREATE INDEX IF NOT EXISTS idx_interfaces_consumer ON interfaces(consumer_application_id);

CREATE TABLE IF NOT EXISTS technical_processes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    job_name TEXT NOT NULL,
    application_id INTEGER REFERENCES applications(id) ON DELETE SET NULL,
    criticality TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Business process hierarchy
CREATE TABLE IF NOT EXISTS business_processes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    lob TEXT NOT NULL,
    product TEXT NOT NULL,
    version TEXT NOT NULL,
    level TEXT NOT NULL CHECK (level IN ('A', 'B', 'C')),
    domain_owner TEXT,
    it_owner TEXT,
    vendor_focal TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- No UNIQUE(parent, child): duplicate edges are distinct contributions
CREATE TABLE IF NOT EXISTS business_process_relationships (
    id INTEGER PRIMARY KEY,
    parent_process_id INTEGER NOT NULL REFERENCES business_processes(id) ON DELETE CASCADE,
    child_process_id INTEGER NOT NULL REFERENCES business_processes(id) ON DELETE CASCADE,
    relationship_type TEXT NOT NULL DEFAULT 'contains',
    sequence_number INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bpr_parent ON business_process_relationships(parent_process_id);
CREATE INDEX IF NOT EXISTS idx_bpr_child ON business_process_relationships(child_process_id);

CREATE TABLE IF NOT EXISTS business_process_interfaces (
    id INTEGER PRIMARY KEY,
    business_process_id INTEGER NOT NULL REFERENCES business_processes(id) ON DELETE CASCADE,
    interface_id INTEGER NOT NULL REFERENCES interfaces(id) ON DELETE CASCADE,
    sequence_number INTEGER NOT NULL,
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_bpi_process ON business_process_interfaces(business_process_id);
CREATE INDEX IF NOT EXISTS idx_bpi_interface ON business_process_interfaces(interface_id);

-- Cached diagram artifacts, one per process
CREATE TABLE IF NOT EXISTS business_process_diagrams (
    id INTEGER PRIMARY KEY,
    business_process_id INTEGER NOT NULL UNIQUE REFERENCES business_processes(id) ON DELETE CASCADE,
    diagram_data TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Change requests and their declared impacts
CREATE TABLE IF NOT EXISTS change_requests (
    id INTEGER PRIMARY KEY,
    cr_number TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    status TEXT NOT NULL,
    priority TEXT
);

CREATE TABLE IF NOT EXISTS change_request_applications (
    id INTEGER PRIMARY KEY,
    change_request_id INTEGER NOT NULL REFERENCES change_requests(id) ON DELETE CASCADE,
    application_id INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    impact_type TEXT,
    impact_description TEXT
);

CREATE INDEX IF NOT EXISTS idx_cra_cr ON change_request_applications(change_request_id);
CREATE INDEX IF NOT EXISTS idx_cra_app ON change_request_applications(application_id);

CREATE TABLE IF NOT EXISTS change_request_interfaces (
    id INTEGER PRIMARY KEY,
    change_request_id INTEGER NOT NULL REFERENCES change_requests(id) ON DELETE CASCADE,
    interface_id INTEGER NOT NULL REFERENCES interfaces(id) ON DELETE CASCADE,
    impact_type TEXT,
    impact_description TEXT
);

CREATE INDEX IF NOT EXISTS idx_cri_cr ON change_request_interfaces(change_request_id);
CREATE INDEX IF NOT EXISTS idx_cri_interface ON change_request_interfaces(interface_id);

CREATE TABLE IF NOT EXISTS change_request_technical_processes (
    id INTEGER PRIMARY KEY,
    change_request_id INTEGER NOT NULL REFERENCES change_requests(id) ON DELETE CASCADE,
    technical_process_id INTEGER NOT NULL REFERENCES technical_processes(id) ON DELETE CASCADE,
    impact_type TEXT,
    impact_description TEXT
);

CREATE INDEX IF NOT EXISTS idx_crtp_cr ON change_request_technical_processes(change_request_id);
";
