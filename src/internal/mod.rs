//! The internal module contains the compilation passes, the code emitter and the scan
//! runtime. Its types are not part of the public API.

#[cfg(feature = "dot_writer")]
pub(crate) mod dot;
mod emitter;
pub(crate) mod ids;
mod nfa_state;
pub(crate) mod partition;
pub(crate) mod registry;
pub(crate) mod runtime;

pub(crate) use emitter::CodeEmitter;
pub(crate) use ids::{ExtendedMoveID, ExtendedMoveIDBase, KindID, StateID, StateIDBase, StateName};
pub(crate) use nfa_state::NfaState;
pub(crate) use registry::StateRegistry;
pub(crate) use runtime::{simulate, ScanTables};
