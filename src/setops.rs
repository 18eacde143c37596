use std::collections::{BTreeSet, HashSet};

use crate::domain::{AccessionId, MetadataRecord};

/// Sorted-set intersection of two accession lists. Duplicates on either side
/// collapse; output order is the sorted order of the intersection.
pub fn intersect(left: &[AccessionId], right: &[AccessionId]) -> Vec<AccessionId> {
    let left: BTreeSet<&AccessionId> = left.iter().collect();
    let right: BTreeSet<&AccessionId> = right.iter().collect();
    left.intersection(&right).map(|acc| (*acc).clone()).collect()
}

/// Stable first-seen-wins filter on the primary-key field. Records too short
/// to carry the key field are dropped; the updater never sees them.
pub fn dedup_by_key(records: Vec<MetadataRecord>, key_index: usize) -> Vec<MetadataRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record.key(key_index) {
            Some(key) => seen.insert(key.to_string()),
            None => false,
        })
        .collect()
}
