//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use strata::{
    ApplicationId, ChangeRequestId, ChangeRequestStatus, EntityStore, Hierarchy, InMemoryStore,
    InterfaceId, Level, NewApplication, NewBusinessProcess, NewChangeRequest, NewInterface,
    ProcessId, SequencedProcess, SqliteStore,
};

/// Storage backend a test runs against.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    InMemory,
    Sqlite,
}

/// A fresh, empty store of the given kind.
pub fn store(backend: Backend) -> Box<dyn EntityStore> {
    match backend {
        Backend::InMemory => Box::new(InMemoryStore::new()),
        Backend::Sqlite => Box::new(SqliteStore::open_in_memory().expect("open sqlite")),
    }
}

pub fn bp(store: &mut dyn EntityStore, name: &str, level: Level) -> ProcessId {
    store
        .create_process(NewBusinessProcess::named(name, level))
        .expect("create process")
        .id
}

/// Attach `child` under `parent` at `sequence`.
pub fn edge(store: &mut dyn EntityStore, parent: ProcessId, child: ProcessId, sequence: i64) {
    Hierarchy::new(store)
        .add_relationship(parent, child, sequence)
        .expect("add relationship");
}

pub fn app(store: &mut dyn EntityStore, name: &str) -> ApplicationId {
    store
        .create_application(NewApplication {
            aml_number: format!("AML-{name}"),
            name: name.to_string(),
            status: "active".to_string(),
            ..NewApplication::default()
        })
        .expect("create application")
        .id
}

pub fn iface(
    store: &mut dyn EntityStore,
    iml: &str,
    provider: ApplicationId,
    consumer: ApplicationId,
) -> InterfaceId {
    store
        .create_interface(NewInterface {
            iml_number: iml.to_string(),
            provider_application_id: Some(provider),
            consumer_application_id: Some(consumer),
            interface_type: "REST".to_string(),
            status: "active".to_string(),
            version: "1.0".to_string(),
            ..NewInterface::default()
        })
        .expect("create interface")
        .id
}

pub fn change_request(store: &mut dyn EntityStore, number: &str) -> ChangeRequestId {
    store
        .create_change_request(NewChangeRequest {
            cr_number: number.to_string(),
            title: format!("Change {number}"),
            status: ChangeRequestStatus::Approved,
            priority: Some("high".to_string()),
        })
        .expect("create change request")
        .id
}

/// Child names in hierarchy order.
pub fn names(children: &[SequencedProcess]) -> Vec<String> {
    children.iter().map(|c| c.process.name.clone()).collect()
}

/// Child sequence numbers in hierarchy order.
pub fn sequences(children: &[SequencedProcess]) -> Vec<i64> {
    children.iter().map(|c| c.sequence_number).collect()
}
