//! Helpers for the emission phase: the greedy mask partitioning of composite sets, the
//! exactly-once emission bitmap and the flat next-state table shared by all generated
//! assertions.

use rustc_hash::FxHashMap;

use super::{registry::SetKey, registry::StateRegistry, StateName};

/// Partition the band-active members of a composite set into groups with pairwise disjoint
/// masks. Members are considered in descending mask cardinality; each group is filled greedily
/// with every remaining member whose mask does not overlap the group's union. Within a group
/// at most one member can fire for any character, so the group can be emitted as an
/// `if / else if` chain.
pub(crate) fn partition_for_band(
    registry: &StateRegistry,
    members: &[StateName],
    band: usize,
) -> Vec<Vec<StateName>> {
    let mut remaining: Vec<(StateName, u64)> = members
        .iter()
        .filter_map(|&m| {
            let mask = registry.node_by_name(m).ascii_moves[band];
            if mask != 0 {
                Some((m, mask))
            } else {
                None
            }
        })
        .collect();
    // Stable, so members with equal cardinality keep their set order.
    remaining.sort_by_key(|&(_, mask)| std::cmp::Reverse(mask.count_ones()));

    let mut partition = Vec::new();
    while !remaining.is_empty() {
        let (first, mut union) = remaining.remove(0);
        let mut group = vec![first];
        remaining.retain(|&(m, mask)| {
            if mask & union == 0 {
                union |= mask;
                group.push(m);
                false
            } else {
                true
            }
        });
        partition.push(group);
    }
    partition
}

/// Tracks which states already got a case in the current band. Sized to cover dummy
/// identifiers as well.
pub(crate) struct EmittedSet {
    bits: Vec<bool>,
}

impl EmittedSet {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            bits: vec![false; size],
        }
    }

    #[inline]
    pub(crate) fn mark(&mut self, state: StateName) {
        self.bits[state] = true;
    }

    #[inline]
    pub(crate) fn contains(&self, state: StateName) -> bool {
        self.bits[state]
    }
}

/// The flat table all multi-state assertions index into. Each distinct member array is
/// appended once; assertions refer to it by `(start, end)` with `end` exclusive.
#[derive(Default)]
pub(crate) struct StateSetTable {
    indices: FxHashMap<SetKey, (usize, usize)>,
    /// The flattened member entries in first-use order.
    entries: Vec<StateName>,
}

impl StateSetTable {
    /// The `(start, end)` slice of the flat table holding this set's members. Memoized per
    /// canonical key.
    pub(crate) fn indices_for(&mut self, key: &SetKey, members: &[StateName]) -> (usize, usize) {
        if let Some(&range) = self.indices.get(key) {
            return range;
        }
        let range = (self.entries.len(), self.entries.len() + members.len());
        self.entries.extend_from_slice(members);
        self.indices.insert(key.clone(), range);
        range
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[StateName] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_masks(masks: &[u64]) -> (StateRegistry, Vec<StateName>) {
        let mut registry = StateRegistry::new("INITIAL", 1000);
        for &mask in masks {
            let id = registry.new_state();
            for bit in 0..64 {
                if mask & (1u64 << bit) != 0 {
                    registry.node_mut(id).add_char_range(bit, bit);
                }
            }
        }
        registry.compute_closures();
        registry.assign_state_names().unwrap();
        let names = (0..masks.len() as u32).map(StateName::new).collect();
        (registry, names)
    }

    #[test]
    fn test_partition_disjoint_groups_cover_all_active_members() {
        let (registry, names) = registry_with_masks(&[0b0011, 0b1100, 0b0110, 0b1000_0000]);
        let partition = partition_for_band(&registry, &names, 0);

        let mut covered: Vec<StateName> = partition.iter().flatten().copied().collect();
        covered.sort_unstable();
        assert_eq!(covered, names);

        for group in &partition {
            let mut union = 0u64;
            for &m in group {
                let mask = registry.node_by_name(m).ascii_moves[0];
                assert_eq!(mask & union, 0, "masks within a group must be disjoint");
                union |= mask;
            }
        }
    }

    #[test]
    fn test_partition_orders_by_descending_cardinality() {
        let (registry, names) = registry_with_masks(&[0b1, 0b111, 0b11]);
        let partition = partition_for_band(&registry, &names, 0);
        // The widest mask (0b111) leads the first group and excludes the overlapping others.
        assert_eq!(partition[0][0], names[1]);
        assert_eq!(partition.len(), 3);
    }

    #[test]
    fn test_partition_skips_members_inactive_in_band() {
        let mut registry = StateRegistry::new("INITIAL", 1000);
        let a = registry.new_state();
        registry.node_mut(a).add_char_range('a' as u32, 'a' as u32);
        let b = registry.new_state();
        registry.node_mut(b).add_char_range('0' as u32, '9' as u32);
        registry.compute_closures();
        registry.assign_state_names().unwrap();
        let names = vec![StateName::new(0), StateName::new(1)];
        // Band 0 holds only the digits, band 1 only the letter.
        assert_eq!(
            partition_for_band(&registry, &names, 0),
            vec![vec![names[1]]]
        );
        assert_eq!(
            partition_for_band(&registry, &names, 1),
            vec![vec![names[0]]]
        );
    }

    #[test]
    fn test_state_set_table_memoizes_ranges() {
        let mut table = StateSetTable::default();
        let k1 = vec![StateName::new(0), StateName::new(1)];
        let k2 = vec![StateName::new(1), StateName::new(2)];
        assert_eq!(table.indices_for(&k1, &k1), (0, 2));
        assert_eq!(table.indices_for(&k2, &k2), (2, 4));
        assert_eq!(table.indices_for(&k1, &k1), (0, 2));
        assert_eq!(table.entries().len(), 4);
    }
}
