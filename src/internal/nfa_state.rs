//! This module contains the automaton node model.
//! One node stands for one primitive construct of a token rule: a set of characters it can
//! consume, a single successor node whose epsilon closure is entered on a match, and epsilon
//! edges to nodes that are active together with it.

use super::{ExtendedMoveID, KindID, StateID, StateName};

/// One NFA node owned by a [`StateRegistry`](super::registry::StateRegistry).
#[derive(Debug, Clone)]
pub(crate) struct NfaState {
    /// Creation-order identifier, never reused.
    id: StateID,
    /// Index in the final reachable-state numbering. `None` until assigned, and stays `None`
    /// for nodes without transitions.
    pub(crate) state_name: Option<StateName>,
    /// Token kind matched if the scan halts with this node in the active set and no longer
    /// match was recorded.
    pub(crate) accepting: Option<KindID>,
    /// Direct epsilon edges, kept ordered by node id and free of duplicates.
    pub(crate) epsilon_targets: Vec<StateID>,
    /// Epsilon closure of this node, filled by the closure pass. Ordered by discovery,
    /// duplicate-free.
    pub(crate) epsilon_closure: Vec<StateID>,
    /// Set once the closure pass has resolved this node.
    pub(crate) closure_done: bool,
    /// Transition masks for the two ASCII bands: chars 0-63 and 64-127. Bit `i` set means the
    /// successor closure is reachable on character `64 * band + i`.
    pub(crate) ascii_moves: [u64; 2],
    /// Character ranges >= 128 this node can consume, before table deduplication.
    pub(crate) extended_ranges: Vec<(u32, u32)>,
    /// Index of the deduplicated extended-move table, assigned at compile time.
    pub(crate) extended_move: Option<ExtendedMoveID>,
    /// The single successor node. Its epsilon closure is the set entered when any character of
    /// this node's masks is consumed.
    pub(crate) next: Option<StateID>,
    /// Minimum accepting kind over the successor closure. This is what a firing transition
    /// records into the scan's `(kind, pos)` pair.
    pub(crate) kind_to_print: Option<KindID>,
    /// True when this node stands in for a whole composite set.
    pub(crate) is_composite: bool,
    /// The member names of the composite set this node stands for.
    pub(crate) composite_members: Vec<StateName>,
    /// Partner node of the no-break case-sharing optimization. Symmetric.
    pub(crate) paired_case: Option<StateID>,
    /// Number of distinct state sets that list this node as a member.
    pub(crate) in_degree: u32,
    /// Placeholder node holding an otherwise-unused identifier. Skipped by numbering and
    /// emission.
    pub(crate) dummy: bool,
}

impl NfaState {
    pub(crate) fn new(id: StateID) -> Self {
        Self {
            id,
            state_name: None,
            accepting: None,
            epsilon_targets: Vec::new(),
            epsilon_closure: Vec::new(),
            closure_done: false,
            ascii_moves: [0, 0],
            extended_ranges: Vec::new(),
            extended_move: None,
            next: None,
            kind_to_print: None,
            is_composite: false,
            composite_members: Vec::new(),
            paired_case: None,
            in_degree: 0,
            dummy: false,
        }
    }

    pub(crate) fn new_dummy(id: StateID) -> Self {
        let mut state = Self::new(id);
        state.dummy = true;
        state
    }

    #[inline]
    pub(crate) fn id(&self) -> StateID {
        self.id
    }

    /// True if the node consumes input on at least one character.
    pub(crate) fn has_transitions(&self) -> bool {
        self.ascii_moves[0] != 0 || self.ascii_moves[1] != 0 || !self.extended_ranges.is_empty()
    }

    /// Add an epsilon edge, keeping the target list ordered by id and duplicate-free.
    pub(crate) fn add_epsilon_target(&mut self, target: StateID) {
        let mut i = 0;
        while i < self.epsilon_targets.len() {
            if self.epsilon_targets[i] == target {
                return;
            }
            if self.epsilon_targets[i] > target {
                break;
            }
            i += 1;
        }
        self.epsilon_targets.insert(i, target);
    }

    /// Accumulate the characters `lo..=hi` into the band masks and the extended range list.
    pub(crate) fn add_char_range(&mut self, lo: u32, hi: u32) {
        for c in lo..=hi.min(127) {
            self.ascii_moves[(c / 64) as usize] |= 1u64 << (c % 64);
        }
        if hi >= 128 {
            self.extended_ranges.push((lo.max(128), hi));
        }
    }

    /// True if the node consumes the character `c`.
    pub(crate) fn can_move_on(&self, c: u32) -> bool {
        if c < 128 {
            self.ascii_moves[(c / 64) as usize] & (1u64 << (c % 64)) != 0
        } else {
            self.extended_ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
        }
    }
}
