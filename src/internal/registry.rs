//! This module contains the per-lexical-state registry that owns all automaton nodes and drives
//! the compilation passes: epsilon-closure computation, reachable-state numbering, canonical
//! state-set registration, composite-state assignment, case pairing and the final set fixups.
//! The passes run in exactly this order; the emitter and the runtime both read the registry's
//! tables afterwards.

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{ScangenError, ScangenErrorKind};

use super::{
    ids::StateNameBase, ExtendedMoveID, ExtendedMoveIDBase, KindID, NfaState, StateID,
    StateIDBase, StateName,
};

/// Canonical identity of a state set: the sorted, deduplicated member names. Identical member
/// sets always produce identical keys, regardless of discovery order.
pub(crate) type SetKey = Vec<StateName>;

/// Everything the registry records about one canonical state set.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateSetEntry {
    /// The member array in discovery order of the first registration. This is what the flat
    /// next-state table and the generated assertions use.
    pub(crate) members: Vec<StateName>,
    /// Provisional member array with a withdrawn pairing partner, compacted by
    /// [`StateRegistry::fix_state_sets`].
    patched: Option<Vec<Option<StateName>>>,
    /// Memoized composite identifier for this key.
    pub(crate) composite_id: Option<StateName>,
    /// True for composite sets registered with `starts == false`: their members are emitted
    /// only inside the composite case block.
    pub(crate) state_block: bool,
}

/// The registry and compiler for one lexical state.
#[derive(Debug, Default)]
pub(crate) struct StateRegistry {
    /// Name of the lexical state, used as the suffix of the emitted scan function.
    pub(crate) name: String,
    /// All created nodes, creation order preserved.
    pub(crate) nodes: Vec<NfaState>,
    /// The start node. Holds only epsilon edges to the rule automata.
    pub(crate) start: StateID,
    /// Reachable-state numbering: index = state name, value = node.
    pub(crate) indexed: Vec<StateID>,
    /// Per node (by arena index): canonical key of its successor set, if any.
    pub(crate) next_keys: Vec<Option<SetKey>>,
    entries: FxHashMap<SetKey, StateSetEntry>,
    /// Registration order of canonical keys.
    pub(crate) set_keys: Vec<SetKey>,
    /// Assignment order of multi-member composite keys.
    pub(crate) composite_keys: Vec<SetKey>,
    /// Canonical key of the start set, once registered.
    pub(crate) start_key: Option<SetKey>,
    /// Composite identifier of the start set.
    pub(crate) start_id: Option<StateName>,
    /// Highest dummy identifier handed out so far.
    dummy_state_index: Option<StateNameBase>,
    /// Keys whose member arrays carry placeholders until all sharing decisions are final.
    pending_fixups: Vec<SetKey>,
    /// Deduplicated extended-character range tables, referenced by nodes.
    pub(crate) extended_tables: Vec<Vec<(u32, u32)>>,
    /// Ceiling for both node count and dummy identifiers.
    max_states: usize,
}

impl StateRegistry {
    pub(crate) fn new(name: &str, max_states: usize) -> Self {
        let mut registry = Self {
            name: name.to_string(),
            max_states,
            ..Default::default()
        };
        registry.start = registry.new_state();
        registry
    }

    pub(crate) fn set_max_states(&mut self, max_states: usize) {
        self.max_states = max_states;
    }

    pub(crate) fn new_state(&mut self) -> StateID {
        let id = StateID::new(self.nodes.len() as StateIDBase);
        self.nodes.push(NfaState::new(id));
        self.next_keys.push(None);
        id
    }

    pub(crate) fn new_dummy_state(&mut self) -> StateID {
        let id = StateID::new(self.nodes.len() as StateIDBase);
        self.nodes.push(NfaState::new_dummy(id));
        self.next_keys.push(None);
        id
    }

    #[inline]
    pub(crate) fn node(&self, id: StateID) -> &NfaState {
        &self.nodes[id]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: StateID) -> &mut NfaState {
        &mut self.nodes[id]
    }

    /// Resolve a generated state name to its node.
    #[inline]
    pub(crate) fn node_by_name(&self, name: StateName) -> &NfaState {
        &self.nodes[self.indexed[name]]
    }

    /// Number of nodes that were assigned a state name.
    #[inline]
    pub(crate) fn generated_states(&self) -> usize {
        self.indexed.len()
    }

    /// Size of an exactly-once emission bitmap: reachable count or highest dummy id + 1,
    /// whichever is larger.
    pub(crate) fn highest_state_count(&self) -> usize {
        self.generated_states()
            .max(self.dummy_state_index.map_or(0, |d| d as usize + 1))
    }

    pub(crate) fn members_of(&self, key: &SetKey) -> &[StateName] {
        self.entries
            .get(key)
            .map(|e| e.members.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn entry(&self, key: &SetKey) -> Option<&StateSetEntry> {
        self.entries.get(key)
    }

    /// Run all compilation passes in their required order.
    pub(crate) fn compile(&mut self) -> crate::Result<()> {
        debug!("Compiling lexical state '{}'", self.name);
        self.compute_closures();
        self.assign_state_names()?;
        self.register_sets();
        if let Some(key) = self.start_key.clone() {
            let id = self.add_composite_state_set(&key, true)?;
            self.start_id = Some(id);
        }
        self.compute_case_pairings()?;
        self.fix_state_sets();
        debug!(
            "Lexical state '{}': {} generated states, {} canonical sets, {} composite keys",
            self.name,
            self.generated_states(),
            self.set_keys.len(),
            self.composite_keys.len()
        );
        Ok(())
    }

    // ---------------------------------------------------------------------------------------
    // Epsilon closures
    // ---------------------------------------------------------------------------------------

    /// Compute the epsilon closure of every node in two passes: first over nodes in reverse
    /// creation order, then forward, skipping nodes already resolved. The closure array is in
    /// breadth-first discovery order over the ordered epsilon edges, so two nodes with
    /// identical edge topology always produce identical arrays.
    pub(crate) fn compute_closures(&mut self) {
        for i in (0..self.nodes.len()).rev() {
            if !self.nodes[i].closure_done {
                self.resolve_closure(StateID::new(i as StateIDBase));
            }
        }
        for i in 0..self.nodes.len() {
            if !self.nodes[i].closure_done {
                self.resolve_closure(StateID::new(i as StateIDBase));
            }
        }
    }

    fn resolve_closure(&mut self, id: StateID) {
        let mut closure = vec![id];
        let mut i = 0;
        while i < closure.len() {
            let current = closure[i];
            for &target in self.nodes[current].epsilon_targets.iter() {
                if !closure.contains(&target) {
                    closure.push(target);
                }
            }
            i += 1;
        }
        trace!("Closure of node {}: {:?}", id, closure);
        let node = &mut self.nodes[id];
        node.epsilon_closure = closure;
        node.closure_done = true;
    }

    // ---------------------------------------------------------------------------------------
    // State numbering
    // ---------------------------------------------------------------------------------------

    /// Assign state names in creation order to every transition-bearing, non-dummy node.
    pub(crate) fn assign_state_names(&mut self) -> crate::Result<()> {
        for i in 0..self.nodes.len() {
            if self.nodes[i].dummy || !self.nodes[i].has_transitions() {
                continue;
            }
            let name = StateName::new(self.indexed.len() as StateNameBase);
            self.nodes[i].state_name = Some(name);
            self.indexed.push(StateID::new(i as StateIDBase));
        }
        if self.indexed.len() > self.max_states {
            return Err(ScangenError::new(ScangenErrorKind::AutomatonTooLarge {
                states: self.indexed.len(),
                limit: self.max_states,
            }));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------
    // Canonical state sets
    // ---------------------------------------------------------------------------------------

    /// The transition-bearing members of a closure, as state names in closure order.
    fn useful_members(&self, closure: &[StateID]) -> Vec<StateName> {
        closure
            .iter()
            .filter_map(|&id| {
                let node = &self.nodes[id];
                if node.has_transitions() {
                    node.state_name
                } else {
                    None
                }
            })
            .collect()
    }

    /// Register a state set under its canonical key. The first registration fixes the stored
    /// member order; identical sets registered later reuse the same entry.
    pub(crate) fn register_state_set(&mut self, members: Vec<StateName>) -> SetKey {
        let mut key = members.clone();
        key.sort_unstable();
        key.dedup();
        if !self.entries.contains_key(&key) {
            let mut deduplicated = Vec::with_capacity(members.len());
            for m in members {
                if !deduplicated.contains(&m) {
                    deduplicated.push(m);
                }
            }
            self.entries.insert(
                key.clone(),
                StateSetEntry {
                    members: deduplicated,
                    ..Default::default()
                },
            );
            self.set_keys.push(key.clone());
        }
        key
    }

    /// Register the successor set and accepting kind of every named node, the start set, the
    /// in-degrees and the deduplicated extended-move tables.
    pub(crate) fn register_sets(&mut self) {
        for i in 0..self.nodes.len() {
            if self.nodes[i].state_name.is_none() {
                continue;
            }
            let Some(next) = self.nodes[i].next else {
                continue;
            };
            let closure = self.nodes[next].epsilon_closure.clone();
            self.nodes[i].kind_to_print = closure
                .iter()
                .filter_map(|&id| self.nodes[id].accepting)
                .min();
            let useful = self.useful_members(&closure);
            if !useful.is_empty() {
                let key = self.register_state_set(useful);
                self.next_keys[i] = Some(key);
            }
        }

        let start_closure = self.nodes[self.start].epsilon_closure.clone();
        let start_members = self.useful_members(&start_closure);
        if !start_members.is_empty() {
            self.start_key = Some(self.register_state_set(start_members));
        }

        // One increment per distinct canonical set listing the node.
        let keys = self.set_keys.clone();
        for key in &keys {
            let members = self.members_of(key).to_vec();
            for m in members {
                let id = self.indexed[m];
                self.nodes[id].in_degree += 1;
            }
        }

        for i in 0..self.nodes.len() {
            if self.nodes[i].state_name.is_none() || self.nodes[i].extended_ranges.is_empty() {
                continue;
            }
            let ranges = self.nodes[i].extended_ranges.clone();
            let table = match self.extended_tables.iter().position(|t| *t == ranges) {
                Some(pos) => ExtendedMoveID::new(pos as ExtendedMoveIDBase),
                None => {
                    self.extended_tables.push(ranges);
                    ExtendedMoveID::new((self.extended_tables.len() - 1) as ExtendedMoveIDBase)
                }
            };
            self.nodes[i].extended_move = Some(table);
        }
    }

    // ---------------------------------------------------------------------------------------
    // Composite state assignment
    // ---------------------------------------------------------------------------------------

    /// Assign (or look up) the composite identifier of a canonical state set.
    ///
    /// A single-member set is identified by that member's own state name and consumes no new
    /// identifier. Otherwise the members are searched in key order for one whose identity can
    /// stand in for the whole set: for start sets the candidate must not be listed by more
    /// than one canonical set, and no candidate may already be a member of another assigned
    /// composite key. If no member qualifies, a synthetic dummy identifier is allocated past
    /// the reachable count.
    pub(crate) fn add_composite_state_set(
        &mut self,
        key: &SetKey,
        starts: bool,
    ) -> crate::Result<StateName> {
        if let Some(entry) = self.entries.get(key) {
            if let Some(id) = entry.composite_id {
                return Ok(id);
            }
        } else {
            return Err(ScangenError::new(ScangenErrorKind::Inconsistency(format!(
                "no member array registered for state-set key {:?}",
                key
            ))));
        }

        if !starts {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.state_block = true;
            }
        }

        let members = self.members_of(key).to_vec();
        if members.len() == 1 {
            let id = members[0];
            if let Some(entry) = self.entries.get_mut(key) {
                entry.composite_id = Some(id);
            }
            return Ok(id);
        }

        for &m in &members {
            let node_id = self.indexed[m];
            let node = &mut self.nodes[node_id];
            node.is_composite = true;
            node.composite_members = members.clone();
        }

        let mut chosen = None;
        'candidates: for &m in &members {
            if starts && self.node_by_name(m).in_degree > 1 {
                continue;
            }
            for other in &self.composite_keys {
                if other != key && self.members_of(other).contains(&m) {
                    continue 'candidates;
                }
            }
            chosen = Some(m);
            break;
        }

        let id = match chosen {
            Some(m) => m,
            None => {
                let next_dummy = match self.dummy_state_index {
                    None => self.generated_states() as StateNameBase,
                    Some(d) => d + 1,
                };
                if next_dummy as usize >= self.max_states {
                    return Err(ScangenError::new(ScangenErrorKind::AutomatonTooLarge {
                        states: next_dummy as usize + 1,
                        limit: self.max_states,
                    }));
                }
                self.dummy_state_index = Some(next_dummy);
                StateName::new(next_dummy)
            }
        };

        trace!(
            "Composite set {:?} in '{}' assigned identifier {}",
            key,
            self.name,
            id
        );
        if let Some(entry) = self.entries.get_mut(key) {
            entry.composite_id = Some(id);
        }
        self.composite_keys.push(key.clone());
        Ok(id)
    }

    /// Look up the memoized composite identifier of a key.
    pub(crate) fn composite_id_of(&self, key: &SetKey) -> crate::Result<StateName> {
        self.entries
            .get(key)
            .and_then(|e| e.composite_id)
            .ok_or_else(|| {
                ScangenError::new(ScangenErrorKind::Inconsistency(format!(
                    "no composite identifier assigned for state-set key {:?}",
                    key
                )))
            })
    }

    // ---------------------------------------------------------------------------------------
    // Case pairing
    // ---------------------------------------------------------------------------------------

    /// Pair case nodes for no-break emission.
    ///
    /// For every successor set with more than one member that is not itself a composite key:
    /// find the first member that is exclusive to this set (listed by no other set, not a
    /// composite member) and a second member that is shared (listed by several sets, not a
    /// composite member, not yet paired). The shared member is withdrawn from the stored set
    /// and the exclusive member becomes its textual proxy: the exclusive member's case is
    /// emitted without a break immediately before the shared member's case. Pairing is
    /// symmetric and final before any emission starts.
    pub(crate) fn compute_case_pairings(&mut self) -> crate::Result<()> {
        let mut seen: FxHashSet<SetKey> = FxHashSet::default();
        let mut claimed = vec![false; self.generated_states()];

        'outer: for j in 0..self.nodes.len() {
            {
                let node = &self.nodes[j];
                if node.state_name.is_none() || node.dummy || !node.has_transitions() {
                    continue;
                }
            }
            let Some(key) = self.next_keys[j].clone() else {
                continue;
            };
            if self.composite_keys.contains(&key) || !seen.insert(key.clone()) {
                continue;
            }
            let members = self.members_of(&key).to_vec();
            if members.len() == 1 {
                continue;
            }

            let mut exclusive: Option<(usize, StateID)> = None;
            for (i, &m) in members.iter().enumerate() {
                let node = self.node_by_name(m);
                if !node.is_composite && node.in_degree == 1 {
                    if claimed[m.as_usize()] {
                        return Err(ScangenError::new(ScangenErrorKind::Inconsistency(
                            format!("case node {} claimed by two pairings", m),
                        )));
                    }
                    claimed[m.as_usize()] = true;
                    exclusive = Some((i, node.id()));
                    break;
                }
            }
            let Some((found_at, exclusive_id)) = exclusive else {
                continue;
            };

            for (i, &m) in members.iter().enumerate() {
                let node = self.node_by_name(m);
                if !claimed[m.as_usize()]
                    && node.in_degree > 1
                    && !node.is_composite
                    && node.paired_case.is_none()
                {
                    let shared_id = node.id();
                    claimed[m.as_usize()] = true;

                    let mut patched: Vec<Option<StateName>> =
                        members.iter().map(|&m| Some(m)).collect();
                    patched[i] = None;
                    patched.swap(0, found_at);
                    if let Some(entry) = self.entries.get_mut(&key) {
                        entry.patched = Some(patched);
                    }
                    self.pending_fixups.push(key.clone());

                    self.nodes[shared_id].paired_case = Some(exclusive_id);
                    self.nodes[exclusive_id].paired_case = Some(shared_id);
                    trace!(
                        "Paired case nodes {} (exclusive) and {} (shared) for set {:?}",
                        members[found_at],
                        m,
                        key
                    );
                    continue 'outer;
                }
            }

            // No shared partner found; release the claims on exclusive members.
            for &m in &members {
                if self.node_by_name(m).in_degree <= 1 {
                    claimed[m.as_usize()] = false;
                }
            }
        }
        Ok(())
    }

    /// Compact the member arrays whose pairing partner was withdrawn.
    pub(crate) fn fix_state_sets(&mut self) {
        for key in std::mem::take(&mut self.pending_fixups) {
            if let Some(entry) = self.entries.get_mut(&key) {
                if let Some(patched) = entry.patched.take() {
                    entry.members = patched.into_iter().flatten().collect();
                    trace!("Fixed state set {:?} to {:?}", key, entry.members);
                }
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Tables for the emitter and the runtime
    // ---------------------------------------------------------------------------------------

    /// The member expansion of every state identifier, including dummy composite identifiers.
    /// Index = state name; a plain state expands to itself.
    pub(crate) fn states_for_state(&self) -> Vec<Vec<StateName>> {
        let mut table: Vec<Vec<StateName>> = (0..self.generated_states())
            .map(|n| {
                let name = StateName::new(n as StateNameBase);
                let node = self.node_by_name(name);
                if node.is_composite {
                    node.composite_members.clone()
                } else {
                    vec![name]
                }
            })
            .collect();
        table.resize(self.highest_state_count(), Vec::new());
        for key in &self.set_keys {
            let entry = &self.entries[key];
            if let Some(id) = entry.composite_id {
                if id.as_usize() >= self.generated_states() {
                    table[id] = entry.members.clone();
                }
            }
        }
        table
    }

    /// The accepting kind recorded for every named state.
    pub(crate) fn kind_for_state(&self) -> Vec<Option<KindID>> {
        (0..self.generated_states())
            .map(|n| {
                self.node_by_name(StateName::new(n as StateNameBase))
                    .accepting
            })
            .collect()
    }
}
