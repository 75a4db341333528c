//! Module with the public builder for token automata.

use log::debug;

use crate::{
    internal::{StateID, StateRegistry},
    CodeGenConfig, CompiledAutomaton, ScangenError, ScangenErrorKind,
};

/// Opaque handle to a node created by an [`NfaCompiler`]. Handles are only meaningful for the
/// compiler that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHandle(pub(crate) StateID);

/// Builder for the automaton of one lexical state.
///
/// The usual construction is one small linear automaton per token rule, all reachable from the
/// start state via epsilon edges. Each node carries the characters it consumes and a single
/// successor entered on a match; an accepting node carries the token kind of its rule.
///
/// ```
/// use scangen::{CodeGenConfig, NfaCompiler};
///
/// let mut compiler = NfaCompiler::new("INITIAL");
/// let a = compiler.new_state();
/// let accept = compiler.new_state();
/// compiler.add_move(a, 'a', 'a', accept).unwrap();
/// compiler.set_accepting(accept, 1).unwrap();
/// compiler.add_epsilon(compiler.start_state(), a);
/// let automaton = compiler.compile(&CodeGenConfig::default()).unwrap();
/// assert_eq!(automaton.scan("abc").unwrap().kind(), 1);
/// ```
#[derive(Debug)]
pub struct NfaCompiler {
    registry: StateRegistry,
}

impl NfaCompiler {
    /// Create a compiler for the lexical state with the given name. The start state exists
    /// from the beginning.
    pub fn new(name: &str) -> Self {
        Self {
            registry: StateRegistry::new(name, CodeGenConfig::default().max_states),
        }
    }

    /// The start state of the lexical state. Wire the entry node of every token rule to it
    /// with [`NfaCompiler::add_epsilon`].
    pub fn start_state(&self) -> StateHandle {
        StateHandle(self.registry.start)
    }

    /// Create a new node.
    pub fn new_state(&mut self) -> StateHandle {
        StateHandle(self.registry.new_state())
    }

    /// Create a placeholder node that holds an identifier but takes no part in matching.
    pub fn new_dummy_state(&mut self) -> StateHandle {
        StateHandle(self.registry.new_dummy_state())
    }

    /// Let `from` consume the characters `lo..=hi` and enter the epsilon closure of `to`.
    ///
    /// A node has a single successor; adding moves with a different `to` for the same `from`
    /// is an inconsistency. Additional character ranges to the same successor accumulate.
    pub fn add_move(
        &mut self,
        from: StateHandle,
        lo: char,
        hi: char,
        to: StateHandle,
    ) -> crate::Result<()> {
        let node = self.registry.node_mut(from.0);
        match node.next {
            Some(existing) if existing != to.0 => {
                return Err(ScangenError::new(ScangenErrorKind::Inconsistency(format!(
                    "node {} already has successor {}, cannot add a move to {}",
                    from.0, existing, to.0
                ))));
            }
            _ => node.next = Some(to.0),
        }
        node.add_char_range(lo as u32, hi as u32);
        Ok(())
    }

    /// Add an epsilon edge from `from` to `to`.
    pub fn add_epsilon(&mut self, from: StateHandle, to: StateHandle) {
        self.registry.node_mut(from.0).add_epsilon_target(to.0);
    }

    /// Mark a node as accepting the given token kind. Lower kinds win when several rules
    /// accept at the same position.
    pub fn set_accepting(&mut self, state: StateHandle, kind: u32) -> crate::Result<()> {
        let node = self.registry.node_mut(state.0);
        match node.accepting {
            Some(existing) if existing.id() != kind => {
                Err(ScangenError::new(ScangenErrorKind::Inconsistency(format!(
                    "node {} already accepts kind {}, cannot also accept kind {}",
                    state.0, existing, kind
                ))))
            }
            _ => {
                node.accepting = Some(kind.into());
                Ok(())
            }
        }
    }

    /// Run all compilation passes and return the compiled automaton.
    pub fn compile(mut self, config: &CodeGenConfig) -> crate::Result<CompiledAutomaton> {
        debug!("Compiling automaton with {} nodes", self.registry.nodes.len());
        self.registry.set_max_states(config.max_states);
        self.registry.compile()?;
        Ok(CompiledAutomaton::new(self.registry, config.clone()))
    }
}
