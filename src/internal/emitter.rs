//! This module contains the code emitter. It renders a compiled registry as the text of a
//! switch-threaded scan loop in a C-like host language, one `case` per active state, plus the
//! helper routines and tables the loop needs.
//!
//! Emission is organized in character bands: bits 0-63, bits 64-127 and the extended band for
//! code points at and above 128. Within a band every state identifier gets at most one `case`.
//! Host fall-through between cases carries the no-break pairing optimization, so the target
//! language must execute `case` labels without an implicit break.

use log::trace;

use crate::{CodeGenConfig, CodeSink, ScangenError, ScangenErrorKind, StringSink};

use super::{
    partition::{partition_for_band, EmittedSet, StateSetTable},
    registry::{SetKey, StateRegistry},
    NfaState, StateName,
};

/// Sentinel for "no kind matched", as spelled in the generated text.
const KIND_SENTINEL: &str = "0x7fffffff";

/// One character band of the scan loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Band {
    /// ASCII half `0` (characters 0-63) or `1` (characters 64-127).
    Ascii(usize),
    /// Characters at and above code point 128, tested through range predicates.
    Extended,
}

/// Renders one compiled lexical state as scanner text.
pub(crate) struct CodeEmitter<'a> {
    registry: &'a StateRegistry,
    config: &'a CodeGenConfig,
    sets: StateSetTable,
    check_n_add_states_needed: bool,
}

impl<'a> CodeEmitter<'a> {
    pub(crate) fn new(registry: &'a StateRegistry, config: &'a CodeGenConfig) -> Self {
        Self {
            registry,
            config,
            sets: StateSetTable::default(),
            check_n_add_states_needed: false,
        }
    }

    /// Emit the complete scanner unit: declarations, extended-move predicates, the flat
    /// next-state table, the assertion helpers and the scan loop itself.
    pub(crate) fn emit(&mut self, sink: &mut dyn CodeSink) -> crate::Result<()> {
        let registry = self.registry;
        trace!(
            "Emitting scanner for lexical state '{}' with {} states",
            registry.name,
            registry.generated_states()
        );

        // The scan loop is rendered first into a buffer: only afterwards the flat next-state
        // table and the set of needed helpers are known.
        let mut body = StringSink::new();
        self.emit_move_function(&mut body)?;

        self.emit_declarations(sink);
        if self.config.unicode_escapes {
            self.emit_extended_predicates(sink);
        }
        self.emit_next_states_table(sink);
        self.emit_state_tables(sink);
        self.emit_helpers(sink);
        for line in body.as_str().lines() {
            sink.println(line);
        }
        Ok(())
    }

    fn emit_declarations(&mut self, sink: &mut dyn CodeSink) {
        let generated = self.registry.generated_states();
        sink.println(&format!(
            "/* Scanner for lexical state {}, generated by scangen. */",
            self.registry.name
        ));
        sink.println("/* Provided by the host scanner: */");
        sink.println("extern int cur_char;");
        sink.println("extern int read_char(void);");
        sink.newline();
        sink.println("static int matched_kind;");
        sink.println("static int matched_pos;");
        if generated > 0 {
            sink.println(&format!("static int rounds[{}];", generated));
            sink.println(&format!("static int state_set[{}];", 2 * generated));
            sink.println("static int round = 0x80000001;");
            sink.println("static int new_state_count;");
        }
        sink.newline();
    }

    fn emit_extended_predicates(&mut self, sink: &mut dyn CodeSink) {
        for (i, table) in self.registry.extended_tables.iter().enumerate() {
            sink.println(&format!("static int can_move_{}(int cur_char)", i));
            sink.println("{");
            sink.indent();
            let condition = table
                .iter()
                .map(|&(lo, hi)| {
                    if lo == hi {
                        format!("cur_char == 0x{:x}", lo)
                    } else {
                        format!("(cur_char >= 0x{:x} && cur_char <= 0x{:x})", lo, hi)
                    }
                })
                .collect::<Vec<_>>()
                .join(" || ");
            sink.println(&format!("return {};", condition));
            sink.unindent();
            sink.println("}");
            sink.newline();
        }
    }

    fn emit_next_states_table(&mut self, sink: &mut dyn CodeSink) {
        if self.sets.is_empty() {
            return;
        }
        let entries: Vec<String> = self.sets.entries().iter().map(|s| s.to_string()).collect();
        sink.print("static const int next_states[] = { ");
        sink.print_joined(", ", &entries);
        sink.println(" };");
        sink.newline();
    }

    /// Emit the per-state accept table and the member expansion of every state identifier,
    /// consulted by the generated scanner's driver when a scan halts.
    fn emit_state_tables(&mut self, sink: &mut dyn CodeSink) {
        let registry = self.registry;
        if registry.generated_states() == 0 {
            return;
        }
        let kinds: Vec<String> = registry
            .kind_for_state()
            .iter()
            .map(|k| match k {
                Some(kind) => kind.to_string(),
                None => KIND_SENTINEL.to_string(),
            })
            .collect();
        sink.print("static const int kind_for_state[] = { ");
        sink.print_joined(", ", &kinds);
        sink.println(" };");

        let expansions = registry.states_for_state();
        let width = expansions.iter().map(|row| row.len()).max().unwrap_or(1).max(1);
        sink.println(&format!(
            "static const int states_for_state[][{}] = {{",
            width
        ));
        sink.indent();
        for row in &expansions {
            let mut items: Vec<String> = row.iter().map(|s| s.to_string()).collect();
            items.resize(width, "-1".to_string());
            sink.print("{ ");
            sink.print_joined(", ", &items);
            sink.println(" },");
        }
        sink.unindent();
        sink.println("};");
        sink.newline();
    }

    fn emit_helpers(&mut self, sink: &mut dyn CodeSink) {
        let generated = self.registry.generated_states();
        if generated == 0 {
            return;
        }
        sink.println("static void reinit_rounds(void)");
        sink.println("{");
        sink.indent();
        sink.println("round = 0x80000001;");
        sink.println(&format!("for (int i = 0; i < {}; i++)", generated));
        sink.indent();
        sink.println("rounds[i] = 0x80000000;");
        sink.unindent();
        sink.unindent();
        sink.println("}");
        sink.newline();
        sink.println("static void check_n_add(int state)");
        sink.println("{");
        sink.indent();
        sink.println("if (rounds[state] != round) {");
        sink.indent();
        sink.println("state_set[new_state_count++] = state;");
        sink.println("rounds[state] = round;");
        sink.unindent();
        sink.println("}");
        sink.unindent();
        sink.println("}");
        sink.newline();
        sink.println("static void check_n_add_two_states(int state1, int state2)");
        sink.println("{");
        sink.indent();
        sink.println("check_n_add(state1);");
        sink.println("check_n_add(state2);");
        sink.unindent();
        sink.println("}");
        sink.newline();
        if self.check_n_add_states_needed {
            sink.println("static void check_n_add_states(int start, int end)");
            sink.println("{");
            sink.indent();
            sink.println("do {");
            sink.indent();
            sink.println("check_n_add(next_states[start]);");
            sink.unindent();
            sink.println("} while (++start < end);");
            sink.unindent();
            sink.println("}");
            sink.newline();
        }
        if self.config.debug_scanner {
            sink.println("static void trace_states(int count, int starts_at)");
            sink.println("{");
            sink.indent();
            sink.println(
                "fprintf(stderr, \"scan: char %d, %d active states\\n\", cur_char, count - starts_at);",
            );
            sink.unindent();
            sink.println("}");
            sink.newline();
        }
    }

    fn emit_move_function(&mut self, sink: &mut dyn CodeSink) -> crate::Result<()> {
        let registry = self.registry;
        let generated = registry.generated_states();
        sink.println(&format!(
            "static int move_nfa_{}(int start_state, int cur_pos)",
            registry.name
        ));
        sink.println("{");
        sink.indent();
        if generated == 0 {
            sink.println("return cur_pos;");
            sink.unindent();
            sink.println("}");
            return Ok(());
        }
        sink.println("int starts_at = 0;");
        sink.println(&format!("new_state_count = {};", generated));
        sink.println("int i = 1;");
        sink.println("state_set[0] = start_state;");
        sink.println(&format!("int kind = {};", KIND_SENTINEL));
        sink.println("for (;;) {");
        sink.indent();
        sink.println(&format!("if (++round == {})", KIND_SENTINEL));
        sink.indent();
        sink.println("reinit_rounds();");
        sink.unindent();
        if self.config.debug_scanner {
            sink.println("trace_states(i, starts_at);");
        }

        sink.println("if (cur_char < 64) {");
        sink.indent();
        self.emit_band(Band::Ascii(0), sink)?;
        sink.unindent();
        sink.println("}");
        sink.println("else if (cur_char < 128) {");
        sink.indent();
        self.emit_band(Band::Ascii(1), sink)?;
        sink.unindent();
        sink.println("}");
        if self.config.unicode_escapes {
            sink.println("else {");
            sink.indent();
            self.emit_band(Band::Extended, sink)?;
            sink.unindent();
            sink.println("}");
        }

        sink.println(&format!("if (kind != {}) {{", KIND_SENTINEL));
        sink.indent();
        sink.println("matched_kind = kind;");
        sink.println("matched_pos = cur_pos;");
        sink.println(&format!("kind = {};", KIND_SENTINEL));
        sink.unindent();
        sink.println("}");
        sink.println("++cur_pos;");
        // Swap the two halves of the state buffer; equality means no state survived.
        sink.println(&format!(
            "if ((i = new_state_count) == (starts_at = {} - (new_state_count = starts_at)))",
            generated
        ));
        sink.indent();
        sink.println("return cur_pos;");
        sink.unindent();
        sink.println("cur_char = read_char();");
        sink.println("if (cur_char < 0)");
        sink.indent();
        sink.println("return cur_pos;");
        sink.unindent();
        sink.unindent();
        sink.println("}");
        sink.unindent();
        sink.println("}");
        Ok(())
    }

    /// True if the state consumes at least one character of the band.
    fn active_in_band(&self, state: &NfaState, band: Band) -> bool {
        match band {
            Band::Ascii(half) => state.ascii_moves[half] != 0,
            Band::Extended => state.extended_move.is_some(),
        }
    }

    /// Emit the dispatch of one band: the bit for the current character, then the composite
    /// cases in assignment order, then the plain cases in creation order.
    fn emit_band(&mut self, band: Band, sink: &mut dyn CodeSink) -> crate::Result<()> {
        let registry = self.registry;
        match band {
            Band::Ascii(0) => sink.println("long l = 1L << cur_char;"),
            Band::Ascii(_) => sink.println("long l = 1L << (cur_char & 63);"),
            Band::Extended => {}
        }
        sink.println("do {");
        sink.indent();
        sink.println("switch (state_set[--i]) {");
        sink.indent();

        let mut emitted = EmittedSet::new(registry.highest_state_count());
        let composite_keys = registry.composite_keys.clone();
        for key in &composite_keys {
            self.emit_composite_cases(key, band, &mut emitted, sink)?;
        }

        for i in 0..registry.nodes.len() {
            let state = &registry.nodes[i];
            let Some(name) = state.state_name else {
                continue;
            };
            if state.dummy || emitted.contains(name) {
                continue;
            }
            let mut deferred = String::new();
            if let Some(pair) = state.paired_case {
                // The exclusive side is emitted as the proxy of its partner, never alone.
                if state.in_degree == 1 {
                    continue;
                }
                let pair = &registry.nodes[pair];
                if let Some(pair_name) = pair.state_name {
                    if emitted.contains(pair_name) {
                        continue;
                    }
                }
                deferred = self.print_no_break(pair, band, &mut emitted, sink)?;
                if !self.active_in_band(state, band) {
                    if deferred.is_empty() {
                        sink.println("break;");
                    }
                    continue;
                }
            }
            if !self.active_in_band(state, band) {
                continue;
            }
            if !deferred.is_empty() {
                sink.println(&deferred);
            }
            emitted.mark(name);
            sink.println(&format!("case {}:", name));
            self.emit_full_move(state, band, sink)?;
        }

        sink.println("default:");
        sink.indent();
        sink.println("break;");
        sink.unindent();
        sink.unindent();
        sink.println("}");
        sink.unindent();
        sink.println("} while (i != starts_at);");
        Ok(())
    }

    /// Emit the case of one composite set in the given band.
    fn emit_composite_cases(
        &mut self,
        key: &SetKey,
        band: Band,
        emitted: &mut EmittedSet,
        sink: &mut dyn CodeSink,
    ) -> crate::Result<()> {
        let registry = self.registry;
        let composite_id = registry.composite_id_of(key)?;
        let members = registry.members_of(key);
        if members.len() == 1 || emitted.contains(composite_id) {
            return Ok(());
        }
        let state_block = registry.entry(key).map_or(false, |e| e.state_block);

        let mut needed = 0usize;
        let mut to_be_printed: Option<StateName> = None;
        let mut paired_proxy: Option<StateName> = None;
        for &m in members {
            let state = registry.node_by_name(m);
            if self.active_in_band(state, band) {
                needed += 1;
                if needed == 2 {
                    break;
                }
                to_be_printed = Some(m);
            } else {
                emitted.mark(m);
            }
            if let Some(pair) = state.paired_case {
                if paired_proxy.is_some() {
                    return Err(ScangenError::new(ScangenErrorKind::Inconsistency(
                        format!("two paired case nodes in composite set {:?}", key),
                    )));
                }
                paired_proxy = registry.nodes[pair].state_name;
            }
        }

        let mut deferred = String::new();
        if let Some(proxy) = paired_proxy {
            let proxy = registry.node_by_name(proxy);
            deferred = self.print_no_break(proxy, band, emitted, sink)?;
        }

        if needed == 0 {
            if paired_proxy.is_some() && deferred.is_empty() {
                sink.println("break;");
            }
            return Ok(());
        }

        if needed == 1 {
            let name = match to_be_printed {
                Some(name) => name,
                None => {
                    return Err(ScangenError::new(ScangenErrorKind::Inconsistency(format!(
                        "no active member found for composite set {:?}",
                        key
                    ))))
                }
            };
            let state = registry.node_by_name(name);
            if !deferred.is_empty() {
                sink.println(&deferred);
            }
            sink.println(&format!("case {}:", composite_id));
            if !emitted.contains(name) && !state_block && state.in_degree > 1 {
                sink.println(&format!("case {}:", name));
            }
            emitted.mark(name);
            self.emit_full_move(state, band, sink)?;
            return Ok(());
        }

        if !deferred.is_empty() {
            sink.println(&deferred);
        }
        sink.println(&format!("case {}:", composite_id));
        if composite_id.as_usize() < registry.generated_states() {
            emitted.mark(composite_id);
        }
        let groups: Vec<Vec<StateName>> = match band {
            Band::Ascii(half) => partition_for_band(registry, members, half),
            Band::Extended => members
                .iter()
                .filter(|&&m| self.active_in_band(registry.node_by_name(m), band))
                .map(|&m| vec![m])
                .collect(),
        };
        for group in &groups {
            for (j, &m) in group.iter().enumerate() {
                if state_block {
                    emitted.mark(m);
                }
                let state = registry.node_by_name(m);
                self.emit_guarded_move(state, band, j != 0, sink)?;
            }
        }
        sink.println("break;");
        Ok(())
    }

    /// Emit the case of the exclusive side of a pairing, without a closing break, so the
    /// following case continues its work via fall-through. Returns the bare case label
    /// instead when the state has no moves in this band; the caller prints it directly
    /// before the partner's case.
    fn print_no_break(
        &mut self,
        state: &NfaState,
        band: Band,
        emitted: &mut EmittedSet,
        sink: &mut dyn CodeSink,
    ) -> crate::Result<String> {
        if state.in_degree != 1 {
            return Err(ScangenError::new(ScangenErrorKind::Inconsistency(format!(
                "no-break emission requested for shared case node {}",
                state.id()
            ))));
        }
        let name = match state.state_name {
            Some(name) => name,
            None => {
                return Err(ScangenError::new(ScangenErrorKind::Inconsistency(format!(
                    "no-break emission requested for unnamed node {}",
                    state.id()
                ))))
            }
        };
        emitted.mark(name);
        if self.active_in_band(state, band) {
            sink.println(&format!("case {}:", name));
            self.emit_guarded_move(state, band, false, sink)?;
            Ok(String::new())
        } else {
            Ok(format!("case {}:", name))
        }
    }

    /// The guard expression for one state in one band. `None` means the state fires on every
    /// character of the band.
    fn guard_for(&self, state: &NfaState, band: Band) -> Option<String> {
        match band {
            Band::Ascii(half) => {
                let mask = state.ascii_moves[half];
                if mask == u64::MAX {
                    None
                } else if mask.count_ones() == 1 {
                    Some(format!(
                        "cur_char == {}",
                        64 * half as u32 + mask.trailing_zeros()
                    ))
                } else {
                    Some(format!("(0x{:x}L & l) != 0L", mask))
                }
            }
            Band::Extended => state
                .extended_move
                .map(|t| format!("can_move_{}(cur_char)", t)),
        }
    }

    fn emit_kind_update(&self, state: &NfaState, sink: &mut dyn CodeSink) {
        if let Some(kind) = state.kind_to_print {
            sink.println(&format!("if (kind > {})", kind));
            sink.indent();
            sink.println(&format!("kind = {};", kind));
            sink.unindent();
        }
    }

    /// Emit the successor assertion of a state: direct adds for one or two successors, an
    /// indexed run of the flat next-state table otherwise.
    fn emit_assertion(&mut self, state: &NfaState, sink: &mut dyn CodeSink) {
        let registry = self.registry;
        let Some(key) = &registry.next_keys[state.id()] else {
            return;
        };
        let members = registry.members_of(key);
        match members.len() {
            0 => {}
            1 => sink.println(&format!("check_n_add({});", members[0])),
            2 => sink.println(&format!(
                "check_n_add_two_states({}, {});",
                members[0], members[1]
            )),
            _ => {
                let (start, end) = self.sets.indices_for(key, members);
                self.check_n_add_states_needed = true;
                sink.println(&format!("check_n_add_states({}, {});", start, end));
            }
        }
    }

    fn has_successors(&self, state: &NfaState) -> bool {
        self.registry.next_keys[state.id()]
            .as_ref()
            .map_or(false, |key| !self.registry.members_of(key).is_empty())
    }

    /// Emit the full case body of a plain state, closed by a break.
    fn emit_full_move(
        &mut self,
        state: &NfaState,
        band: Band,
        sink: &mut dyn CodeSink,
    ) -> crate::Result<()> {
        let guard = self.guard_for(state, band);
        if !self.has_successors(state) {
            // Kind-only body: the guard and the kind test fuse into one condition.
            match (guard, state.kind_to_print) {
                (Some(test), Some(kind)) => {
                    sink.println(&format!("if ({} && kind > {})", test, kind));
                    sink.indent();
                    sink.println(&format!("kind = {};", kind));
                    sink.unindent();
                }
                (None, Some(_)) => self.emit_kind_update(state, sink),
                _ => {}
            }
            sink.println("break;");
            return Ok(());
        }
        match guard {
            None => {
                self.emit_kind_update(state, sink);
                self.emit_assertion(state, sink);
            }
            Some(test) => {
                sink.println(&format!("if ({}) {{", test));
                sink.indent();
                self.emit_kind_update(state, sink);
                self.emit_assertion(state, sink);
                sink.unindent();
                sink.println("}");
            }
        }
        sink.println("break;");
        Ok(())
    }

    /// Emit the guarded body of one member of a composite case, without a break.
    fn emit_guarded_move(
        &mut self,
        state: &NfaState,
        band: Band,
        else_needed: bool,
        sink: &mut dyn CodeSink,
    ) -> crate::Result<()> {
        let guard = self.guard_for(state, band);
        let head = match (&guard, else_needed) {
            (None, false) => None,
            (None, true) => Some("else {".to_string()),
            (Some(test), false) => Some(format!("if ({}) {{", test)),
            (Some(test), true) => Some(format!("else if ({}) {{", test)),
        };
        match head {
            Some(head) => {
                sink.println(&head);
                sink.indent();
                self.emit_kind_update(state, sink);
                self.emit_assertion(state, sink);
                sink.unindent();
                sink.println("}");
            }
            None => {
                self.emit_kind_update(state, sink);
                self.emit_assertion(state, sink);
            }
        }
        Ok(())
    }
}
