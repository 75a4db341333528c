//! Module with the compiled automaton, the result of the compilation passes.

use std::io::Write;

use crate::{
    internal::{simulate, CodeEmitter, ScanTables, StateRegistry},
    CodeGenConfig, CodeSink, ScanMatch, StringSink,
};

/// A fully compiled lexical state: state numbering, composite sets and pairings are final.
/// It can scan input directly, and it can emit itself as scanner source text.
#[derive(Debug)]
pub struct CompiledAutomaton {
    registry: StateRegistry,
    config: CodeGenConfig,
    tables: ScanTables,
}

impl CompiledAutomaton {
    pub(crate) fn new(registry: StateRegistry, config: CodeGenConfig) -> Self {
        let tables = ScanTables::new(&registry);
        Self {
            registry,
            config,
            tables,
        }
    }

    /// Name of the lexical state.
    pub fn name(&self) -> &str {
        &self.registry.name
    }

    /// Number of reachable states after numbering.
    pub fn state_count(&self) -> usize {
        self.registry.generated_states()
    }

    /// Identifier the emitted scan loop is entered with, if the automaton can consume
    /// anything at all. For a start set with several members this is the set's composite
    /// identifier.
    pub fn start_state_id(&self) -> Option<u32> {
        self.tables.start().map(|s| s.id())
    }

    /// Scan the input with the compiled move tables and return the longest match: the winning
    /// token kind and the character index of the last consumed character. `None` if not even
    /// one character matched.
    pub fn scan(&self, input: &str) -> Option<ScanMatch> {
        self.tables.scan(input, self.config.unicode_escapes)
    }

    /// Scan the input by naive subset simulation over the raw node graph. Slower than
    /// [`CompiledAutomaton::scan`] but independent of the compiled tables, which makes it the
    /// oracle of equivalence tests.
    pub fn simulate(&self, input: &str) -> Option<ScanMatch> {
        simulate(&self.registry, input, self.config.unicode_escapes)
    }

    /// Emit the scanner text into the given sink.
    pub fn emit_scanner(&self, sink: &mut dyn CodeSink) -> crate::Result<()> {
        CodeEmitter::new(&self.registry, &self.config).emit(sink)
    }

    /// Emit the scanner text and return it as a string.
    pub fn emit_to_string(&self) -> crate::Result<String> {
        let mut sink = StringSink::new();
        self.emit_scanner(&mut sink)?;
        Ok(sink.into_string())
    }

    /// Emit the scanner text into a writer.
    pub fn emit_to_writer(&self, writer: &mut dyn Write) -> crate::Result<()> {
        let text = self.emit_to_string()?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Render the node graph in graphviz dot format, for debugging.
    #[cfg(feature = "dot_writer")]
    pub fn render_to_dot<W: Write>(&self, label: &str, output: &mut W) {
        crate::internal::dot::automaton_render(&self.registry, label, output);
    }
}
