//! # scangen
//!
//! The `scangen` crate compiles the combined nondeterministic automaton of a lexical state
//! into the source text of a switch-threaded scanner. Token rules are entered as small node
//! chains wired to a shared start state; the compilation passes then number the reachable
//! states, fold recurring state sets into composite identifiers, pair cases for fall-through
//! sharing and finally emit one `case` per state and character band.
//!
//! The compiled automaton can also scan input directly with the same longest-match semantics
//! the emitted text has, which is how the pipeline is tested.
//!
//! ```
//! use scangen::{CodeGenConfig, NfaCompiler};
//!
//! // Two rules: "a" as kind 1 and "ab" as kind 2.
//! let mut compiler = NfaCompiler::new("INITIAL");
//! let start = compiler.start_state();
//!
//! let a = compiler.new_state();
//! let a_accept = compiler.new_state();
//! compiler.add_move(a, 'a', 'a', a_accept).unwrap();
//! compiler.set_accepting(a_accept, 1).unwrap();
//! compiler.add_epsilon(start, a);
//!
//! let ab_1 = compiler.new_state();
//! let ab_2 = compiler.new_state();
//! let ab_accept = compiler.new_state();
//! compiler.add_move(ab_1, 'a', 'a', ab_2).unwrap();
//! compiler.add_move(ab_2, 'b', 'b', ab_accept).unwrap();
//! compiler.set_accepting(ab_accept, 2).unwrap();
//! compiler.add_epsilon(start, ab_1);
//!
//! let automaton = compiler.compile(&CodeGenConfig::default()).unwrap();
//! // Longest match wins: "ab" is kind 2, a lone "a" is kind 1.
//! assert_eq!(automaton.scan("ab").map(|m| (m.kind(), m.pos())), Some((2, 1)));
//! assert_eq!(automaton.scan("ac").map(|m| (m.kind(), m.pos())), Some((1, 0)));
//! let scanner_text = automaton.emit_to_string().unwrap();
//! assert!(scanner_text.contains("move_nfa_INITIAL"));
//! ```

mod automaton;
pub use automaton::CompiledAutomaton;

mod code_sink;
pub use code_sink::{CodeSink, StringSink};

mod compiler;
pub use compiler::{NfaCompiler, StateHandle};

mod config;
pub use config::CodeGenConfig;

mod errors;
pub use errors::{Result, ScangenError, ScangenErrorKind};

mod match_type;
pub use match_type::ScanMatch;

mod internal;
