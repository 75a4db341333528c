//! Module with error types used by this crate.

use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, ScangenError>;

/// The error type for this crate.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ScangenError {
    pub source: Box<ScangenErrorKind>,
}

impl ScangenError {
    pub fn new(kind: ScangenErrorKind) -> Self {
        ScangenError {
            source: Box::new(kind),
        }
    }
}

/// The error kind type.
#[derive(Error, Debug)]
pub enum ScangenErrorKind {
    /// An error from std::io
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// A violated internal invariant of the compilation passes. Always a bug, never caused by
    /// the input automaton alone.
    #[error("internal inconsistency: {0}")]
    Inconsistency(String),

    /// The automaton needs more state identifiers than the configured ceiling allows.
    #[error("automaton needs {states} states, the configured limit is {limit}")]
    AutomatonTooLarge { states: usize, limit: usize },
}

impl From<std::io::Error> for ScangenError {
    fn from(error: std::io::Error) -> Self {
        ScangenError::new(ScangenErrorKind::IoError(error))
    }
}
