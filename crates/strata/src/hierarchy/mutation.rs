//! Multi-step hierarchy mutations.
//!
//! Each function here runs against a store that is already inside a
//! transaction; [`super::Hierarchy`] opens it.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};

use super::sequence::{insertion_sequence, needs_resequence, resequence_plan};
use super::walk::{depth_below, is_descendant};
use super::DeletionImpact;
use crate::diagram;
use crate::error::{Error, Result};
use crate::store::EntityStore;
use crate::types::{
    BusinessProcess, Level, NewBusinessProcess, NewRelationship, ProcessId, Relationship,
    RelationshipType, SequencedProcess,
};

fn require(store: &dyn EntityStore, id: ProcessId) -> Result<BusinessProcess> {
    store.process(id)?.ok_or_else(|| Error::process_not_found(id))
}

fn contains(parent: ProcessId, child: ProcessId, sequence_number: i64) -> NewRelationship {
    NewRelationship {
        parent,
        child,
        relationship_type: RelationshipType::Contains,
        sequence_number,
    }
}

/// Insert an edge unless it would close a cycle.
pub(super) fn add_relationship(
    tx: &mut dyn EntityStore,
    parent: ProcessId,
    child: ProcessId,
    sequence_number: i64,
) -> Result<Relationship> {
    require(tx, parent)?;
    require(tx, child)?;
    if parent == child || is_descendant(&*tx, parent, child)? {
        return Err(Error::Cycle {
            process: child,
            parent,
        });
    }
    tx.insert_relationship(contains(parent, child, sequence_number))
}

/// Normalize `parent`'s child edges to `10, 20, 30, ...`.
pub(super) fn resequence(
    tx: &mut dyn EntityStore,
    parent: ProcessId,
) -> Result<Vec<SequencedProcess>> {
    let children = tx.children_of(parent)?;
    let plan = resequence_plan(&children);
    if plan.is_empty() {
        return Ok(children);
    }

    for (relationship_id, sequence) in &plan {
        tx.set_relationship_sequence(*relationship_id, *sequence)?;
    }
    debug!(parent_id = %parent, updated = plan.len(), "Resequenced children");
    tx.children_of(parent)
}

/// Set `root` to `level` and recompute every descendant from its parent.
fn propagate_levels(tx: &mut dyn EntityStore, root: ProcessId, level: Level) -> Result<usize> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([(root, level)]);
    let mut updated = 0;

    while let Some((id, level)) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        tx.set_process_level(id, level)?;
        updated += 1;

        let children = tx.children_of(id)?;
        if children.is_empty() {
            continue;
        }
        let child_level = level.child_level().ok_or_else(|| {
            Error::InvalidLevel(format!("process {id} would hold children at level C"))
        })?;
        queue.extend(children.into_iter().map(|c| (c.process.id, child_level)));
    }

    Ok(updated)
}

/// Re-parent `id` under `new_parent` (or make it a root).
pub(super) fn move_process(
    tx: &mut dyn EntityStore,
    id: ProcessId,
    new_parent: Option<ProcessId>,
    position: Option<usize>,
) -> Result<BusinessProcess> {
    let process = require(tx, id)?;

    let new_level = match new_parent {
        None => Level::A,
        Some(parent_id) => {
            if parent_id == id || is_descendant(&*tx, parent_id, id)? {
                return Err(Error::Cycle {
                    process: id,
                    parent: parent_id,
                });
            }
            let parent = require(tx, parent_id)?;
            parent.level.child_level().ok_or_else(|| {
                Error::InvalidLevel("Cannot add children to Level C process".to_string())
            })?
        }
    };

    let room = Level::C.depth() - new_level.depth();
    if depth_below(&*tx, id, room + 1)? > room {
        return Err(Error::InvalidLevel(format!(
            "moving \"{}\" to level {new_level} would place its descendants below level C",
            process.name
        )));
    }

    let detached = tx.delete_parent_edges(id)?;
    let relevelled = propagate_levels(tx, id, new_level)?;

    if let Some(parent_id) = new_parent {
        // Half-step positions assume whole-step siblings.
        let siblings = if position.is_some() {
            resequence(tx, parent_id)?
        } else {
            tx.children_of(parent_id)?
        };
        let sequence = insertion_sequence(position, siblings.len());
        tx.insert_relationship(contains(parent_id, id, sequence))?;
        if needs_resequence(sequence) {
            resequence(tx, parent_id)?;
        }
    }

    info!(
        process_id = %id,
        parent_id = ?new_parent.map(ProcessId::as_i64),
        level = %new_level,
        detached,
        relevelled,
        "Moved business process"
    );
    require(tx, id)
}

/// Copy `id`; level A shares its children, level B copies them.
pub(super) fn duplicate(tx: &mut dyn EntityStore, id: ProcessId) -> Result<BusinessProcess> {
    let original = require(tx, id)?;

    let mut payload = NewBusinessProcess::from(&original);
    payload.name = format!("{} (Copy)", original.name);
    payload.version = "1.0".to_string();
    let copy = tx.create_process(payload)?;

    let children = tx.children_of(id)?;
    let mut copied_children = 0;
    match original.level {
        Level::A => {
            for child in &children {
                tx.insert_relationship(contains(copy.id, child.process.id, child.sequence_number))?;
            }
        }
        Level::B => {
            for child in &children {
                let mut child_payload = NewBusinessProcess::from(&child.process);
                child_payload.name = format!("{} (Copy)", child.process.name);
                let child_copy = tx.create_process(child_payload)?;
                tx.insert_relationship(contains(copy.id, child_copy.id, child.sequence_number))?;
                copied_children += 1;
            }
        }
        Level::C => {}
    }

    for parent in tx.parents_of(id)? {
        tx.insert_relationship(contains(parent.process.id, copy.id, parent.sequence_number))?;
    }

    info!(
        process_id = %id,
        copy_id = %copy.id,
        level = %original.level,
        children = children.len(),
        copied_children,
        "Duplicated business process"
    );
    Ok(copy)
}

/// Children of `id` that would lose their last parent if `id` were deleted.
pub(super) fn preview_deletion<S: EntityStore + ?Sized>(
    store: &S,
    id: ProcessId,
) -> Result<DeletionImpact> {
    let Some(process) = store.process(id)? else {
        return Ok(DeletionImpact {
            can_delete: false,
            orphaned_children: Vec::new(),
            message: "Business process not found".to_string(),
        });
    };

    let mut seen = HashSet::new();
    let mut orphaned_children = Vec::new();
    for child in store.children_of(id)? {
        if !seen.insert(child.process.id) {
            continue;
        }
        let parents = store.parents_of(child.process.id)?;
        if parents.iter().all(|p| p.process.id == id) {
            orphaned_children.push(child.process);
        }
    }

    let mut message = format!("Business process \"{}\" will be deleted.", process.name);
    if !orphaned_children.is_empty() {
        let names: Vec<&str> = orphaned_children.iter().map(|c| c.name.as_str()).collect();
        message.push_str(&format!(
            " The following child processes will also be deleted as they will have no remaining parents: {}",
            names.join(", ")
        ));
    }

    Ok(DeletionImpact {
        can_delete: true,
        orphaned_children,
        message,
    })
}

/// Delete `root` and, depth-first, every child left without a parent.
pub(super) fn delete_cascade(tx: &mut dyn EntityStore, root: ProcessId) -> Result<bool> {
    if tx.process(root)?.is_none() {
        return Ok(false);
    }

    let mut stack = vec![root];
    let mut deleted = HashSet::new();

    while let Some(current) = stack.pop() {
        if deleted.contains(&current) {
            continue;
        }
        // Candidates are re-checked when popped: an earlier branch of the
        // cascade may have removed their last other parent.
        if current != root && !tx.parents_of(current)?.is_empty() {
            continue;
        }
        if tx.process(current)?.is_none() {
            continue;
        }

        let children = tx.children_of(current)?;
        tx.delete_process_interfaces_for_process(current)?;
        diagram::invalidate(&mut *tx, &[current])?;
        tx.delete_relationships_touching(current)?;
        tx.delete_process(current)?;
        deleted.insert(current);
        if current != root {
            debug!(process_id = %current, "Deleted orphaned child process");
        }

        let mut seen = HashSet::new();
        let candidates: Vec<ProcessId> = children
            .into_iter()
            .map(|c| c.process.id)
            .filter(|id| seen.insert(*id))
            .collect();
        stack.extend(candidates.into_iter().rev());
    }

    info!(
        process_id = %root,
        cascaded = deleted.len() - 1,
        "Deleted business process"
    );
    Ok(true)
}
