//! This module contains the scan runtime: a table-driven interpreter whose behavior matches
//! the emitted scanner text move for move, and a naive subset simulation used as an oracle in
//! equivalence tests.

use crate::ScanMatch;

use super::{registry::StateRegistry, KindID, StateID, StateName};

/// Per-state move data, resolved once from the registry.
#[derive(Debug, Clone)]
struct StateMoves {
    ascii: [u64; 2],
    extended: Vec<(u32, u32)>,
    kind: Option<KindID>,
    /// The successor members asserted when this state fires, after all sharing fixups.
    next: Vec<StateName>,
    /// Partner processed together with this state. Set on the exclusive side of a case
    /// pairing, whose partner was withdrawn from the stored successor set.
    also: Option<StateName>,
}

/// The resolved tables of one compiled lexical state.
#[derive(Debug)]
pub(crate) struct ScanTables {
    start: Option<StateName>,
    /// Member expansion per state identifier, dummy identifiers included.
    states_for_state: Vec<Vec<StateName>>,
    moves: Vec<StateMoves>,
}

impl ScanTables {
    pub(crate) fn new(registry: &StateRegistry) -> Self {
        let moves = (0..registry.generated_states())
            .map(|n| {
                let name = StateName::new(n as u32);
                let state = registry.node_by_name(name);
                let next = registry.next_keys[state.id()]
                    .as_ref()
                    .map(|key| registry.members_of(key).to_vec())
                    .unwrap_or_default();
                let also = match state.paired_case {
                    Some(pair) if state.in_degree == 1 => registry.nodes[pair].state_name,
                    _ => None,
                };
                StateMoves {
                    ascii: state.ascii_moves,
                    extended: state.extended_ranges.clone(),
                    kind: state.kind_to_print,
                    next,
                    also,
                }
            })
            .collect();
        Self {
            start: registry.start_id,
            states_for_state: registry.states_for_state(),
            moves,
        }
    }

    pub(crate) fn start(&self) -> Option<StateName> {
        self.start
    }

    /// Run the scan loop over the input and return the longest match, as the winning kind and
    /// the character index of the last consumed character. Empty matches do not exist: at
    /// least one character must fire a transition.
    pub(crate) fn scan(&self, input: &str, unicode_escapes: bool) -> Option<ScanMatch> {
        let start = self.start?;
        let mut current: Vec<StateName> = self
            .states_for_state
            .get(start.as_usize())
            .cloned()
            .unwrap_or_default();
        if current.is_empty() {
            return None;
        }
        let mut stamps = vec![0u64; self.moves.len()];
        let mut round = 0u64;
        let mut best: Option<ScanMatch> = None;

        for (pos, c) in input.chars().enumerate() {
            let c = c as u32;
            if c >= 128 && !unicode_escapes {
                return best;
            }
            round += 1;
            let mut kind: Option<KindID> = None;
            let mut next: Vec<StateName> = Vec::new();
            for &s in &current {
                self.step(s, c, round, &mut stamps, &mut next, &mut kind);
                if let Some(also) = self.moves[s].also {
                    self.step(also, c, round, &mut stamps, &mut next, &mut kind);
                }
            }
            if let Some(k) = kind {
                best = Some(ScanMatch::new(k.id(), pos));
            }
            if next.is_empty() {
                return best;
            }
            current = next;
        }
        best
    }

    fn step(
        &self,
        s: StateName,
        c: u32,
        round: u64,
        stamps: &mut [u64],
        next: &mut Vec<StateName>,
        kind: &mut Option<KindID>,
    ) {
        let m = &self.moves[s];
        let fires = if c < 128 {
            m.ascii[(c / 64) as usize] & (1u64 << (c % 64)) != 0
        } else {
            m.extended.iter().any(|&(lo, hi)| lo <= c && c <= hi)
        };
        if !fires {
            return;
        }
        if let Some(k) = m.kind {
            if kind.map_or(true, |cur| k < cur) {
                *kind = Some(k);
            }
        }
        for &t in &m.next {
            if stamps[t] != round {
                stamps[t] = round;
                next.push(t);
            }
        }
    }
}

/// Naive subset simulation straight over the node graph, without state names, composite sets,
/// pairings or move tables. Epsilon closures are rediscovered on every step.
pub(crate) fn simulate(
    registry: &StateRegistry,
    input: &str,
    unicode_escapes: bool,
) -> Option<ScanMatch> {
    let mut active = closure_transitions(registry, registry.start);
    if active.is_empty() {
        return None;
    }
    let mut best: Option<ScanMatch> = None;

    for (pos, c) in input.chars().enumerate() {
        let c = c as u32;
        if c >= 128 && !unicode_escapes {
            return best;
        }
        let mut kind: Option<KindID> = None;
        let mut next: Vec<StateID> = Vec::new();
        for &s in &active {
            let node = registry.node(s);
            if !node.can_move_on(c) {
                continue;
            }
            let Some(successor) = node.next else {
                continue;
            };
            for t in raw_closure(registry, successor) {
                let target = registry.node(t);
                if let Some(k) = target.accepting {
                    if kind.map_or(true, |cur| k < cur) {
                        kind = Some(k);
                    }
                }
                if target.has_transitions() && !next.contains(&t) {
                    next.push(t);
                }
            }
        }
        if let Some(k) = kind {
            best = Some(ScanMatch::new(k.id(), pos));
        }
        if next.is_empty() {
            return best;
        }
        active = next;
    }
    best
}

/// Breadth-first epsilon closure, computed from the raw edges.
fn raw_closure(registry: &StateRegistry, from: StateID) -> Vec<StateID> {
    let mut closure = vec![from];
    let mut i = 0;
    while i < closure.len() {
        for &t in registry.node(closure[i]).epsilon_targets.iter() {
            if !closure.contains(&t) {
                closure.push(t);
            }
        }
        i += 1;
    }
    closure
}

fn closure_transitions(registry: &StateRegistry, from: StateID) -> Vec<StateID> {
    raw_closure(registry, from)
        .into_iter()
        .filter(|&id| registry.node(id).has_transitions())
        .collect()
}
