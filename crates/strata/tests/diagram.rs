//! Cached diagrams are dropped whenever a process's interface set changes.

mod common;

use common::{Backend, app, bp, edge, iface, store};
use rstest::rstest;
use strata::{Assignment, DiagramCache, EntityStore, Hierarchy, InterfaceAssignments, Level};

fn cached(store: &mut dyn EntityStore, process: strata::ProcessId) -> bool {
    DiagramCache::new(store).get(process).expect("get").is_some()
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn assigning_or_unassigning_drops_the_diagram(#[case] backend: Backend) {
    let mut store = store(backend);
    let p = app(&mut *store, "P");
    let c = app(&mut *store, "C");
    let interface = iface(&mut *store, "IML-1", p, c);
    let process = bp(&mut *store, "Order to cash", Level::A);

    DiagramCache::new(&mut *store)
        .save(process, "graph TD; P-->C")
        .expect("save");
    assert!(cached(&mut *store, process));

    let row = InterfaceAssignments::new(&mut *store)
        .assign(process, interface, 10, None)
        .expect("assign");
    assert!(!cached(&mut *store, process));

    DiagramCache::new(&mut *store).save(process, "v2").expect("save");
    assert!(InterfaceAssignments::new(&mut *store).unassign(row.id).expect("unassign"));
    assert!(!cached(&mut *store, process));
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn replacing_assignments_drops_old_and_new_processes(#[case] backend: Backend) {
    let mut store = store(backend);
    let p = app(&mut *store, "P");
    let c = app(&mut *store, "C");
    let interface = iface(&mut *store, "IML-1", p, c);
    let old = bp(&mut *store, "Old", Level::A);
    let new = bp(&mut *store, "New", Level::A);
    let bystander = bp(&mut *store, "Bystander", Level::A);
    InterfaceAssignments::new(&mut *store)
        .assign(old, interface, 10, None)
        .expect("assign");
    for process in [old, new, bystander] {
        DiagramCache::new(&mut *store).save(process, "cached").expect("save");
    }

    let rows = InterfaceAssignments::new(&mut *store)
        .replace_assignments(
            interface,
            vec![Assignment {
                business_process_id: new,
                sequence_number: 10,
                description: Some("moved".to_string()),
            }],
        )
        .expect("replace");

    assert_eq!(rows.len(), 1);
    assert!(!cached(&mut *store, old));
    assert!(!cached(&mut *store, new));
    assert!(cached(&mut *store, bystander));
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn deleting_an_interface_drops_diagrams_of_its_processes(#[case] backend: Backend) {
    let mut store = store(backend);
    let p = app(&mut *store, "P");
    let c = app(&mut *store, "C");
    let interface = iface(&mut *store, "IML-1", p, c);
    let process = bp(&mut *store, "Order to cash", Level::A);
    InterfaceAssignments::new(&mut *store)
        .assign(process, interface, 10, None)
        .expect("assign");
    DiagramCache::new(&mut *store).save(process, "cached").expect("save");

    assert!(InterfaceAssignments::new(&mut *store)
        .delete_interface(interface)
        .expect("delete"));

    assert!(!cached(&mut *store, process));
    assert!(store.interface(interface).unwrap().is_none());
    assert!(store.process_interfaces_for_process(process).unwrap().is_empty());
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn cascade_delete_removes_diagrams_and_assignments(#[case] backend: Backend) {
    let mut store = store(backend);
    let p = app(&mut *store, "P");
    let c = app(&mut *store, "C");
    let interface = iface(&mut *store, "IML-1", p, c);
    let parent = bp(&mut *store, "Parent", Level::A);
    let child = bp(&mut *store, "Child", Level::B);
    edge(&mut *store, parent, child, 10);
    InterfaceAssignments::new(&mut *store)
        .assign(child, interface, 10, None)
        .expect("assign");
    DiagramCache::new(&mut *store).save(child, "cached").expect("save");

    assert!(Hierarchy::new(&mut *store).delete(parent).expect("delete"));

    assert!(store.diagram(child).unwrap().is_none());
    assert!(
        store
            .process_interfaces_for_interfaces(&[interface])
            .unwrap()
            .is_empty()
    );
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn raw_store_writes_leave_diagrams_to_the_assignment_view(#[case] backend: Backend) {
    let mut store = store(backend);
    let p = app(&mut *store, "P");
    let c = app(&mut *store, "C");
    let interface = iface(&mut *store, "IML-1", p, c);
    let process = bp(&mut *store, "Order to cash", Level::A);
    DiagramCache::new(&mut *store).save(process, "cached").expect("save");

    store
        .insert_process_interface(strata::NewProcessInterface {
            business_process_id: process,
            interface_id: interface,
            sequence_number: 10,
            description: None,
        })
        .expect("insert");
    assert!(cached(&mut *store, process));

    InterfaceAssignments::new(&mut *store)
        .unassign_all(interface)
        .expect("unassign all");
    assert!(!cached(&mut *store, process));
}

#[rstest]
#[case::in_memory(Backend::InMemory)]
#[case::sqlite(Backend::Sqlite)]
fn resequencing_an_assignment_keeps_the_diagram(#[case] backend: Backend) {
    let mut store = store(backend);
    let p = app(&mut *store, "P");
    let c = app(&mut *store, "C");
    let interface = iface(&mut *store, "IML-1", p, c);
    let process = bp(&mut *store, "Order to cash", Level::A);
    let row = InterfaceAssignments::new(&mut *store)
        .assign(process, interface, 10, None)
        .expect("assign");
    DiagramCache::new(&mut *store).save(process, "cached").expect("save");

    assert!(
        InterfaceAssignments::new(&mut *store)
            .resequence_assignment(row.id, 20)
            .expect("resequence")
    );

    assert!(cached(&mut *store, process));
}
