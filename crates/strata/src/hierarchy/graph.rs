//! Whole-hierarchy consistency audit using petgraph.
//!
//! The store is loaded into a `DiGraph` once, then checked for the two
//! hierarchy invariants:
//!
//! - acyclicity (strongly connected components via `tarjan_scc`)
//! - level consistency (`level(child) == level(parent).child_level()` on every edge)

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::store::EntityStore;
use crate::types::{Level, ProcessId, Relationship};

/// An edge whose child level does not follow from its parent level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelMismatch {
    /// Id of the offending edge.
    pub relationship_id: i64,
    /// Parent end of the edge.
    pub parent: ProcessId,
    /// Child end of the edge.
    pub child: ProcessId,
    /// Level stored on the parent.
    pub parent_level: Level,
    /// Level stored on the child.
    pub child_level: Level,
    /// Level the child should have, `None` when the parent is a leaf level.
    pub expected: Option<Level>,
}

/// Result of [`audit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyAudit {
    /// Processes in the snapshot.
    pub process_count: usize,
    /// Edges in the snapshot.
    pub relationship_count: usize,
    /// Each entry is one cycle's members, sorted by id.
    pub cycles: Vec<Vec<ProcessId>>,
    /// Edges whose levels disagree.
    pub level_mismatches: Vec<LevelMismatch>,
}

impl HierarchyAudit {
    /// `true` when no cycles and no level mismatches were found.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.cycles.is_empty() && self.level_mismatches.is_empty()
    }
}

/// Load every process and edge and check both invariants.
pub(crate) fn audit<S: EntityStore + ?Sized>(store: &S) -> Result<HierarchyAudit> {
    let processes = store.processes()?;
    let relationships = store.all_relationships()?;

    let mut graph: DiGraph<ProcessId, i64> = DiGraph::with_capacity(processes.len(), relationships.len());
    let mut nodes: HashMap<ProcessId, NodeIndex> = HashMap::with_capacity(processes.len());
    let mut levels: HashMap<ProcessId, Level> = HashMap::with_capacity(processes.len());
    for bp in &processes {
        nodes.insert(bp.id, graph.add_node(bp.id));
        levels.insert(bp.id, bp.level);
    }

    let mut level_mismatches = Vec::new();
    for rel in &relationships {
        let (Some(&from), Some(&to)) = (
            nodes.get(&rel.parent_process_id),
            nodes.get(&rel.child_process_id),
        ) else {
            continue;
        };
        graph.add_edge(from, to, rel.id);

        if let Some(mismatch) = check_levels(rel, &levels) {
            level_mismatches.push(mismatch);
        }
    }

    let mut cycles: Vec<Vec<ProcessId>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut members: Vec<ProcessId> = scc.into_iter().map(|n| graph[n]).collect();
            members.sort();
            members
        })
        .collect();
    cycles.sort();

    debug!(
        processes = processes.len(),
        relationships = relationships.len(),
        cycles = cycles.len(),
        mismatches = level_mismatches.len(),
        "Audited hierarchy"
    );

    Ok(HierarchyAudit {
        process_count: processes.len(),
        relationship_count: relationships.len(),
        cycles,
        level_mismatches,
    })
}

fn check_levels(rel: &Relationship, levels: &HashMap<ProcessId, Level>) -> Option<LevelMismatch> {
    let parent_level = *levels.get(&rel.parent_process_id)?;
    let child_level = *levels.get(&rel.child_process_id)?;
    let expected = parent_level.child_level();
    (expected != Some(child_level)).then(|| LevelMismatch {
        relationship_id: rel.id,
        parent: rel.parent_process_id,
        child: rel.child_process_id,
        parent_level,
        child_level,
        expected,
    })
}
