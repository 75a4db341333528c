//! Module with the code generation configuration.

/// Options that influence the compilation passes and the generated scanner text.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeGenConfig {
    /// Generate the handling of characters at and above code point 128. When disabled, such
    /// characters never match and end the scan loop.
    pub unicode_escapes: bool,
    /// Interleave trace statements in the generated scan loop.
    pub debug_scanner: bool,
    /// Ceiling for state identifiers, covering both reachable states and synthetic composite
    /// identifiers.
    pub max_states: usize,
}

impl CodeGenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unicode_escapes(mut self, unicode_escapes: bool) -> Self {
        self.unicode_escapes = unicode_escapes;
        self
    }

    pub fn with_debug_scanner(mut self, debug_scanner: bool) -> Self {
        self.debug_scanner = debug_scanner;
        self
    }

    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }
}

impl Default for CodeGenConfig {
    fn default() -> Self {
        Self {
            unicode_escapes: true,
            debug_scanner: false,
            max_states: 10_000,
        }
    }
}
