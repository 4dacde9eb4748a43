//! Sibling ordering arithmetic.
//!
//! Siblings are kept at multiples of [`SEQUENCE_STEP`]. An insertion between
//! two siblings lands on a half-step (`5`, `15`, ...), which sorts correctly
//! and is then normalized back to whole steps by a resequence.

use crate::types::SequencedProcess;

/// Gap between consecutive siblings after a resequence.
pub const SEQUENCE_STEP: i64 = 10;

/// Sequence number for a process inserted among `sibling_count` siblings.
///
/// - `None` or a position at/after the end appends: `(count + 1) * 10`
/// - position `0` goes before the first sibling: `5`
/// - position `p` goes between siblings `p - 1` and `p`: `p * 10 + 5`
///
/// Positions assume the siblings are already at `10, 20, 30, ...`.
#[must_use]
pub fn insertion_sequence(position: Option<usize>, sibling_count: usize) -> i64 {
    let step = |n: usize| i64::try_from(n).unwrap_or(i64::MAX / SEQUENCE_STEP) * SEQUENCE_STEP;
    match position {
        Some(0) => SEQUENCE_STEP / 2,
        Some(p) if p < sibling_count => step(p) + SEQUENCE_STEP / 2,
        _ => step(sibling_count + 1),
    }
}

/// Whether `sequence` sits off the whole-step grid.
#[must_use]
pub fn needs_resequence(sequence: i64) -> bool {
    sequence % SEQUENCE_STEP != 0
}

/// Edge updates that bring `children` to `10, 20, 30, ...` in their current
/// order.
///
/// `children` must already be ordered by `(sequence_number, relationship_id)`.
/// Returns `(relationship_id, new_sequence)` only for edges that change, so
/// applying the plan twice is a no-op the second time.
#[must_use]
pub fn resequence_plan(children: &[SequencedProcess]) -> Vec<(i64, i64)> {
    children
        .iter()
        .zip((1..).map(|i: i64| i * SEQUENCE_STEP))
        .filter(|(child, wanted)| child.sequence_number != *wanted)
        .map(|(child, wanted)| (child.relationship_id, wanted))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BusinessProcess, Level, ProcessId};
    use chrono::Utc;
    use rstest::rstest;

    fn child(relationship_id: i64, sequence_number: i64) -> SequencedProcess {
        let now = Utc::now();
        SequencedProcess {
            process: BusinessProcess {
                id: ProcessId(relationship_id * 100),
                name: format!("p{relationship_id}"),
                lob: String::new(),
                product: String::new(),
                version: "1.0".into(),
                level: Level::B,
                domain_owner: None,
                it_owner: None,
                vendor_focal: None,
                status: "active".into(),
                created_at: now,
                updated_at: now,
            },
            relationship_id,
            sequence_number,
        }
    }

    #[rstest]
    #[case(None, 0, 10)]
    #[case(None, 3, 40)]
    #[case(Some(0), 0, 5)]
    #[case(Some(0), 3, 5)]
    #[case(Some(1), 3, 15)]
    #[case(Some(2), 3, 25)]
    #[case(Some(3), 3, 40)]
    #[case(Some(9), 3, 40)]
    fn insertion_positions(
        #[case] position: Option<usize>,
        #[case] siblings: usize,
        #[case] expected: i64,
    ) {
        assert_eq!(insertion_sequence(position, siblings), expected);
    }

    #[test]
    fn half_steps_trigger_resequence() {
        assert!(needs_resequence(5));
        assert!(needs_resequence(25));
        assert!(!needs_resequence(30));
    }

    #[test]
    fn plan_only_touches_edges_off_grid() {
        let children = vec![child(1, 5), child(2, 10), child(3, 30), child(4, 31)];

        assert_eq!(resequence_plan(&children), vec![(1, 10), (2, 20), (4, 40)]);
    }

    #[test]
    fn plan_is_empty_for_normalized_children() {
        let children = vec![child(1, 10), child(2, 20)];
        assert!(resequence_plan(&children).is_empty());
    }
}
