//! # Prune Compactor
//!
//! Min-count pruning and order-preserving reindexing.
//!
//! Given the occurrence counts of an id space and a threshold, every id with
//! `count > threshold` survives. Survivors are renumbered 0, 1, 2, ... in
//! increasing order of their original id, so relative order never changes.
//! The mapping is a pure function of `(counts, threshold)` and is recomputed
//! on every read instead of being stored.

use crate::{AttributeRecord, RelationRecord};

/// Order-preserving, injective mapping from original ids to compacted ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneMapping {
    /// Compacted id per original id; `None` for pruned ids.
    forward: Vec<Option<u64>>,
    /// Original id per compacted id.
    survivors: Vec<u64>,
}

impl PruneMapping {
    /// Mapping that keeps all `len` ids unchanged.
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self {
            forward: (0..len as u64).map(Some).collect(),
            survivors: (0..len as u64).collect(),
        }
    }

    /// Compacted id of `old`, if it survived.
    #[must_use]
    pub fn get(&self, old: u64) -> Option<u64> {
        usize::try_from(old)
            .ok()
            .and_then(|i| self.forward.get(i))
            .copied()
            .flatten()
    }

    /// True if `old` survived.
    #[must_use]
    pub fn contains(&self, old: u64) -> bool {
        self.get(old).is_some()
    }

    /// Number of survivors (size of the compacted id space).
    #[must_use]
    pub fn len(&self) -> usize {
        self.survivors.len()
    }

    /// True if nothing survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.survivors.is_empty()
    }

    /// Size of the original id space.
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.forward.len()
    }

    /// Original ids of the survivors, indexed by compacted id.
    #[must_use]
    pub fn survivors(&self) -> &[u64] {
        &self.survivors
    }

    /// Restrict an id-ordered sequence (an index or a count vector) to the
    /// survivors, in compacted id order. Ids beyond the sequence are skipped.
    #[must_use]
    pub fn apply_to_keys<T: Clone>(&self, values: &[T]) -> Vec<T> {
        self.survivors
            .iter()
            .filter_map(|&old| usize::try_from(old).ok().and_then(|i| values.get(i)))
            .cloned()
            .collect()
    }
}

/// Compute the mapping for `counts` (indexed by original id).
///
/// An id survives iff `counts[id] > threshold`. A negative threshold keeps
/// every id; a threshold at or above the maximum count keeps none.
#[must_use]
pub fn compute_mapping(counts: &[u64], threshold: i64) -> PruneMapping {
    let mut forward = Vec::with_capacity(counts.len());
    let mut survivors = Vec::new();

    for (old, &count) in counts.iter().enumerate() {
        if exceeds(count, threshold) {
            forward.push(Some(survivors.len() as u64));
            survivors.push(old as u64);
        } else {
            forward.push(None);
        }
    }

    PruneMapping { forward, survivors }
}

/// Compute a mapping and log the pruning summary for `name`.
#[must_use]
pub fn compute_mapping_logged(counts: &[u64], threshold: i64, name: &str) -> PruneMapping {
    let mapping = compute_mapping(counts, threshold);
    tracing::debug!(
        "Pruned {} {} -> {} (min count: {})",
        name,
        mapping.source_len(),
        mapping.len(),
        threshold
    );
    mapping
}

fn exceeds(count: u64, threshold: i64) -> bool {
    match u64::try_from(threshold) {
        Ok(t) => count > t,
        // Negative thresholds: every count (>= 0) exceeds them.
        Err(_) => true,
    }
}

/// Remap a relation; `None` unless subject, predicate and object all survived.
#[must_use]
pub fn apply_to_relation(
    subjects: &PruneMapping,
    predicates: &PruneMapping,
    objects: &PruneMapping,
    record: &RelationRecord,
) -> Option<RelationRecord> {
    Some(RelationRecord::new(
        subjects.get(record.subject)?,
        predicates.get(record.predicate)?,
        objects.get(record.object)?,
        record.weight,
    ))
}

/// Remap an attribute record by its item; attribute ids are never pruned.
#[must_use]
pub fn apply_to_attribute(
    items: &PruneMapping,
    record: &AttributeRecord,
) -> Option<AttributeRecord> {
    Some(AttributeRecord::new(
        items.get(record.item)?,
        record.attribute,
        record.count,
    ))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_threshold() {
        let mapping = compute_mapping(&[1, 2, 1, 3], 1);
        assert_eq!(mapping.survivors(), &[1, 3]);
        assert_eq!(mapping.get(0), None);
        assert_eq!(mapping.get(1), Some(0));
        assert_eq!(mapping.get(3), Some(1));
        assert_eq!(mapping.source_len(), 4);
    }

    #[test]
    fn threshold_at_max_prunes_everything() {
        let mapping = compute_mapping(&[4, 2, 4], 4);
        assert!(mapping.is_empty());
        assert_eq!(mapping.source_len(), 3);
    }

    #[test]
    fn negative_threshold_is_identity() {
        let counts = [0, 0, 5];
        assert_eq!(compute_mapping(&counts, -1), PruneMapping::identity(3));
    }

    #[test]
    fn zero_threshold_drops_only_zero_counts() {
        let mapping = compute_mapping(&[2, 0, 1], 0);
        assert_eq!(mapping.survivors(), &[0, 2]);
        assert_eq!(mapping.get(2), Some(1));
    }

    #[test]
    fn out_of_range_ids_are_pruned() {
        let mapping = compute_mapping(&[1], 0);
        assert!(!mapping.contains(1));
        assert!(!mapping.contains(u64::MAX));
    }

    #[test]
    fn relation_requires_all_three_ids() {
        let entities = compute_mapping(&[1, 0, 1], 0);
        let predicates = compute_mapping(&[1], 0);

        let kept = RelationRecord::new(0, 0, 2, 0.5);
        assert_eq!(
            apply_to_relation(&entities, &predicates, &entities, &kept),
            Some(RelationRecord::new(0, 0, 1, 0.5))
        );

        let dropped = RelationRecord::new(1, 0, 2, 1.0);
        assert_eq!(
            apply_to_relation(&entities, &predicates, &entities, &dropped),
            None
        );

        let unknown_predicate = RelationRecord::new(0, 4, 2, 1.0);
        assert_eq!(
            apply_to_relation(&entities, &predicates, &entities, &unknown_predicate),
            None
        );
    }

    #[test]
    fn attribute_keeps_attribute_id() {
        let items = compute_mapping(&[0, 3], 0);
        assert_eq!(
            apply_to_attribute(&items, &AttributeRecord::new(1, 42, 2)),
            Some(AttributeRecord::new(0, 42, 2))
        );
        assert_eq!(apply_to_attribute(&items, &AttributeRecord::new(0, 1, 1)), None);
    }

    #[test]
    fn apply_to_keys_reorders_into_compacted_ids() {
        let mapping = compute_mapping(&[1, 0, 1], 0);
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(mapping.apply_to_keys(&keys), vec!["a", "c"]);
        assert_eq!(mapping.apply_to_keys(&[1u64, 0, 1]), vec![1, 1]);
    }
}
