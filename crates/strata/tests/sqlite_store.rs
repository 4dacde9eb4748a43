//! Integration tests for the persistent `SQLite` backend.

mod common;

use common::{app, bp, iface};
use strata::config::{DATABASE_FILE_NAME, STRATA_DIR_NAME};
use strata::{
    EntityStore, Error, InterfaceAssignments, Level, NewInterface, RiskLevel, SqliteStore, Strata,
    StrataConfig,
};
use tempfile::tempdir;

fn config_in(dir: &std::path::Path) -> StrataConfig {
    StrataConfig {
        database: dir.join(STRATA_DIR_NAME).join(DATABASE_FILE_NAME),
        ..StrataConfig::default()
    }
}

#[test]
fn hierarchy_survives_reopen() {
    let temp = tempdir().unwrap();
    let config = config_in(temp.path());

    let (root, child) = {
        let mut strata = Strata::open(config.clone()).expect("open");
        let root = bp(strata.store_mut(), "Order to cash", Level::A);
        let child = bp(strata.store_mut(), "Billing", Level::A);
        strata
            .hierarchy()
            .move_process(child, Some(root), None)
            .expect("move");
        (root, child)
    };
    assert!(config.database.exists());

    let mut strata = Strata::open(config).expect("reopen");
    let hierarchy = strata.hierarchy();
    let tree = hierarchy.tree(root).unwrap().expect("tree");
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].process.id, child);
    assert_eq!(tree.children[0].process.level, Level::B);
    assert!(hierarchy.audit().unwrap().is_consistent());
}

#[test]
fn impact_reads_from_reopened_database() {
    let temp = tempdir().unwrap();
    let config = config_in(temp.path());

    let (p, c) = {
        let mut strata = Strata::open(config.clone()).expect("open");
        let store: &mut dyn EntityStore = strata.store_mut();
        let p = app(store, "P");
        let c = app(store, "C");
        let interface = iface(store, "IML-1", p, c);
        let process = bp(store, "Order to cash", Level::A);
        strata
            .assignments()
            .assign(process, interface, 10, None)
            .expect("assign");
        (p, c)
    };

    let strata = Strata::open(config).expect("reopen");
    let report = strata
        .impact()
        .analyze_application(p)
        .expect("analyze")
        .expect("report");
    assert_eq!(report.related_ids(), [c]);
    assert_eq!(report.impact_summary.total_business_processes, 1);
    assert_eq!(report.impact_summary.risk_level, RiskLevel::Low);
}

#[test]
fn configured_risk_tables_drive_classification() {
    let temp = tempdir().unwrap();
    let mut config = config_in(temp.path());
    // Any provided interface now trips the high band.
    config.risk.application.bands[0].limits.values_mut().for_each(|limit| *limit = 0);

    let mut strata = Strata::open(config.clone()).expect("open");
    let store: &mut dyn EntityStore = strata.store_mut();
    let p = app(store, "P");
    let c = app(store, "C");
    iface(store, "IML-1", p, c);

    let report = strata
        .impact()
        .analyze_application(p)
        .expect("analyze")
        .expect("report");
    assert_eq!(report.impact_summary.risk_level, RiskLevel::High);

    let path = temp.path().join("strata.yaml");
    config.save(&path).expect("save");
    assert_eq!(StrataConfig::load(&path).expect("load"), config);
}

#[test]
fn failed_mutation_rolls_back_every_step() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    let p = app(&mut store, "P");
    let c = app(&mut store, "C");
    let interface = iface(&mut store, "IML-1", p, c);
    let process = bp(&mut store, "Order to cash", Level::A);
    InterfaceAssignments::new(&mut store)
        .assign(process, interface, 10, None)
        .expect("assign");

    let err = InterfaceAssignments::new(&mut store)
        .replace_assignments(
            interface,
            vec![strata::Assignment {
                business_process_id: strata::ProcessId(9_999),
                sequence_number: 10,
                description: None,
            }],
        )
        .unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
    let rows = store.process_interfaces_for_interfaces(&[interface]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].business_process_id, process);
}

#[test]
fn interfaces_must_reference_existing_applications() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    let result = store.create_interface(NewInterface {
        iml_number: "IML-1".to_string(),
        provider_application_id: Some(strata::ApplicationId(404)),
        interface_type: "REST".to_string(),
        status: "active".to_string(),
        version: "1.0".to_string(),
        ..NewInterface::default()
    });

    assert!(result.is_err());
    assert!(store.interfaces(&[strata::InterfaceId(1)]).unwrap().is_empty());
}
