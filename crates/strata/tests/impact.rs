//! Integration tests for impact analyses.

mod common;

use common::{Backend, app, bp, change_request, edge, iface, store};
use rstest::rstest;
use strata::impact::ProcessImpact;
use strata::{
    ApplicationId, EntityStore, ImpactAnalyzer, InterfaceAssignments, InterfaceId, Level,
    NewImpactLink, NewTechnicalProcess, ProcessId, RiskLevel, RiskTables,
};

fn link<T>(entity_id: T, impact_type: &str) -> NewImpactLink<T> {
    NewImpactLink {
        entity_id,
        impact_type: Some(impact_type.to_string()),
        impact_description: None,
    }
}

fn assign(store: &mut dyn EntityStore, process: ProcessId, interface: InterfaceId, seq: i64) {
    InterfaceAssignments::new(store)
        .assign(process, interface, seq, None)
        .expect("assign");
}

/// P provides I1 to C1; C1 provides I2 to C2.
struct Chain {
    p: ApplicationId,
    c1: ApplicationId,
    c2: ApplicationId,
    i1: InterfaceId,
    i2: InterfaceId,
}

fn chain(store: &mut dyn EntityStore) -> Chain {
    let p = app(store, "P");
    let c1 = app(store, "C1");
    let c2 = app(store, "C2");
    let i1 = iface(store, "IML-1", p, c1);
    let i2 = iface(store, "IML-2", c1, c2);
    Chain { p, c1, c2, i1, i2 }
}

// ========== Applications ==========

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn application_impact_stops_after_one_indirect_hop(#[case] backend: Backend) {
    let mut store = store(backend);
    let chain = chain(&mut *store);
    // C2 provides onward to C3, which is two hops away and must not appear.
    let c3 = app(&mut *store, "C3");
    iface(&mut *store, "IML-3", chain.c2, c3);
    let tables = RiskTables::default();

    let report = ImpactAnalyzer::new(&*store, &tables)
        .analyze_application(chain.p)
        .expect("analyze")
        .expect("report");

    assert_eq!(report.provided_interfaces.len(), 1);
    assert_eq!(report.provided_interfaces[0].interface.id, chain.i1);
    assert_eq!(report.provided_interfaces[0].consumer_application_name, "C1");
    assert!(report.consumed_interfaces.is_empty());
    assert_eq!(report.related_ids(), [chain.c1, chain.c2]);

    let impact_of = |id: ApplicationId| {
        report
            .impacted_applications
            .iter()
            .find(|row| row.application.id == id)
            .and_then(|row| row.impact.impact_type.clone())
    };
    assert_eq!(impact_of(chain.c1).as_deref(), Some("direct"));
    assert_eq!(impact_of(chain.c2).as_deref(), Some("indirect"));

    assert_eq!(report.impact_summary.total_interfaces, 1);
    assert_eq!(report.impact_summary.related_applications, 2);
    assert_eq!(report.impact_summary.risk_level, RiskLevel::Low);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn application_impact_maps_interfaces_to_processes(#[case] backend: Backend) {
    let mut store = store(backend);
    let chain = chain(&mut *store);
    let order = bp(&mut *store, "Order to cash", Level::A);
    let billing = bp(&mut *store, "Billing", Level::A);
    assign(&mut *store, order, chain.i1, 10);
    assign(&mut *store, billing, chain.i1, 20);
    // Only reachable through C1's own interface, which P does not touch.
    let unrelated = bp(&mut *store, "Unrelated", Level::A);
    assign(&mut *store, unrelated, chain.i2, 10);
    let tables = RiskTables::default();

    let report = ImpactAnalyzer::new(&*store, &tables)
        .analyze_application(chain.p)
        .expect("analyze")
        .expect("report");

    let processes: Vec<(ProcessId, Option<i64>)> = report
        .impacted_business_processes
        .iter()
        .map(|row| (row.business_process.id, row.sequence_number))
        .collect();
    assert_eq!(processes, [(order, Some(10)), (billing, Some(20))]);
    assert!(
        report
            .impacted_business_processes
            .iter()
            .all(|row| row.impact_type == ProcessImpact::Direct && row.interface_id == chain.i1)
    );
    assert_eq!(report.impact_summary.total_business_processes, 2);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn multi_application_impact_excludes_seeds_from_related(#[case] backend: Backend) {
    let mut store = store(backend);
    let chain = chain(&mut *store);
    let tables = RiskTables::default();

    let report = ImpactAnalyzer::new(&*store, &tables)
        .analyze_applications(&[chain.p, chain.c1, ApplicationId(999)])
        .expect("analyze")
        .expect("report");

    // I1 is both provided (by P) and consumed (by C1).
    assert_eq!(report.provided_interfaces.len(), 2);
    assert_eq!(report.consumed_interfaces.len(), 1);
    assert_eq!(report.related_ids(), [chain.c2]);
    assert!(
        report
            .provided_interfaces
            .iter()
            .all(|i| i.source_application_id.is_some())
    );

    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["applications"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["impactSummary"]["riskLevel"], "low");
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn application_impact_reports_each_change_request_row(#[case] backend: Backend) {
    let mut store = store(backend);
    let p = app(&mut *store, "P");
    let cr = change_request(&mut *store, "CR-1");
    store
        .replace_change_request_applications(
            cr,
            vec![link(p, "modification"), link(p, "decommission")],
        )
        .expect("apps");
    let tables = RiskTables::default();

    let report = ImpactAnalyzer::new(&*store, &tables)
        .analyze_application(p)
        .expect("analyze")
        .expect("report");

    let impact_types: Vec<_> = report
        .active_change_requests
        .iter()
        .map(|row| row.impact_type.as_deref())
        .collect();
    assert_eq!(impact_types, vec![Some("modification"), Some("decommission")]);
    assert_eq!(report.impact_summary.active_changes, 2);
    assert_eq!(report.impact_summary.risk_level, RiskLevel::Medium);
}

// ========== Change requests ==========

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn change_request_impact_expands_hierarchy(#[case] backend: Backend) {
    let mut store = store(backend);
    let chain = chain(&mut *store);
    let a = bp(&mut *store, "Order to cash", Level::A);
    let b = bp(&mut *store, "Billing", Level::B);
    let c = bp(&mut *store, "Issue invoice", Level::C);
    edge(&mut *store, a, b, 10);
    edge(&mut *store, b, c, 10);
    assign(&mut *store, b, chain.i1, 10);

    let tp = store
        .create_technical_process(NewTechnicalProcess {
            name: "Nightly export".to_string(),
            job_name: "EXP01".to_string(),
            application_id: Some(chain.c1),
            criticality: "high".to_string(),
            status: "active".to_string(),
        })
        .expect("technical process");
    let cr = change_request(&mut *store, "CR-1");
    store
        .replace_change_request_applications(cr, vec![link(chain.p, "modification")])
        .expect("apps");
    store
        .replace_change_request_interfaces(cr, vec![link(chain.i1, "modification")])
        .expect("interfaces");
    store
        .replace_change_request_technical_processes(cr, vec![link(tp.id, "retest")])
        .expect("technical processes");
    let tables = RiskTables::default();

    let report = ImpactAnalyzer::new(&*store, &tables)
        .analyze_change_request(cr)
        .expect("analyze")
        .expect("report");

    let rows: Vec<(ProcessId, ProcessImpact)> = report
        .impacted_business_processes
        .iter()
        .map(|row| (row.business_process.id, row.impact_type))
        .collect();
    assert_eq!(
        rows,
        [
            (b, ProcessImpact::Direct),
            (a, ProcessImpact::Parent),
            (c, ProcessImpact::Child),
        ]
    );
    assert!(
        report.impacted_business_processes[1..]
            .iter()
            .all(|row| row.sequence_number.is_none() && row.interface_id == chain.i1)
    );

    assert_eq!(
        report.impacted_technical_processes[0]
            .technical_process
            .application_name
            .as_deref(),
        Some("C1")
    );
    assert_eq!(report.impact_summary.total_applications, 1);
    assert_eq!(report.impact_summary.total_interfaces, 1);
    assert_eq!(report.impact_summary.total_technical_processes, 1);
    assert_eq!(report.impact_summary.total_business_processes, 3);
    assert_eq!(report.impact_summary.active_changes, None);
    assert_eq!(report.impact_summary.risk_level, RiskLevel::Medium);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn change_request_with_wide_impact_is_high_risk(#[case] backend: Backend) {
    let mut store = store(backend);
    let provider = app(&mut *store, "Provider");
    let mut apps = Vec::new();
    let mut interfaces = Vec::new();
    for i in 0..5 {
        let consumer = app(&mut *store, &format!("Consumer {i}"));
        apps.push(link(consumer, "modification"));
        interfaces.push(link(
            iface(&mut *store, &format!("IML-{i}"), provider, consumer),
            "modification",
        ));
    }
    let cr = change_request(&mut *store, "CR-BIG");
    store.replace_change_request_applications(cr, apps).expect("apps");
    store
        .replace_change_request_interfaces(cr, interfaces)
        .expect("interfaces");
    let tables = RiskTables::default();

    let report = ImpactAnalyzer::new(&*store, &tables)
        .analyze_change_request(cr)
        .expect("analyze")
        .expect("report");

    // 5 applications + 5 interfaces > 8.
    assert_eq!(report.impact_summary.risk_level, RiskLevel::High);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn multi_change_request_lists_shared_entities_once(#[case] backend: Backend) {
    let mut store = store(backend);
    let chain = chain(&mut *store);
    let first = change_request(&mut *store, "CR-1");
    let second = change_request(&mut *store, "CR-2");
    for cr in [first, second] {
        store
            .replace_change_request_applications(cr, vec![link(chain.c1, "modification")])
            .expect("apps");
        store
            .replace_change_request_interfaces(cr, vec![link(chain.i2, "modification")])
            .expect("interfaces");
    }
    let tables = RiskTables::default();

    let report = ImpactAnalyzer::new(&*store, &tables)
        .analyze_change_requests(&[first, second])
        .expect("analyze")
        .expect("report");

    assert_eq!(report.impacted_applications.len(), 1);
    assert_eq!(report.impacted_interfaces.len(), 1);
    assert_eq!(report.impacted_applications[0].impact.change_request_id, Some(first));
    assert_eq!(report.impact_summary.active_changes, Some(2));
    assert_eq!(report.impact_summary.risk_level, RiskLevel::Low);
}

// ========== Interfaces ==========

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn interface_impact_collects_counterparts_and_change_requests(#[case] backend: Backend) {
    let mut store = store(backend);
    let chain = chain(&mut *store);
    let process = bp(&mut *store, "Order to cash", Level::A);
    assign(&mut *store, process, chain.i2, 10);
    for n in 0..6 {
        let cr = change_request(&mut *store, &format!("CR-{n}"));
        store
            .replace_change_request_interfaces(cr, vec![link(chain.i1, "modification")])
            .expect("interfaces");
    }
    let tables = RiskTables::default();

    let report = ImpactAnalyzer::new(&*store, &tables)
        .analyze_interfaces(&[chain.i1, chain.i2])
        .expect("analyze")
        .expect("report");

    let mut related: Vec<ApplicationId> =
        report.related_applications.iter().map(|a| a.id).collect();
    related.sort();
    assert_eq!(related, [chain.p, chain.c1, chain.c2]);
    assert_eq!(report.related_change_requests.len(), 6);
    assert_eq!(report.impacted_business_processes.len(), 1);
    assert_eq!(report.impact_summary.related_change_requests, 6);
    assert_eq!(report.impact_summary.risk_level, RiskLevel::High);
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn analyses_return_none_for_unknown_seeds(#[case] backend: Backend) {
    let store = store(backend);
    let tables = RiskTables::default();
    let analyzer = ImpactAnalyzer::new(&*store, &tables);

    assert!(analyzer.analyze_application(ApplicationId(1)).unwrap().is_none());
    assert!(analyzer.analyze_interfaces(&[InterfaceId(1)]).unwrap().is_none());
    assert!(
        analyzer
            .analyze_change_request(strata::ChangeRequestId(1))
            .unwrap()
            .is_none()
    );
}
