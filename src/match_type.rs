//! Module with the match type returned by the runtime scan.

use std::fmt::{Display, Error, Formatter};

/// The longest match found by a scan, as the pair of the winning token kind and the character
/// position of the last consumed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanMatch {
    kind: u32,
    pos: usize,
}

impl ScanMatch {
    pub fn new(kind: u32, pos: usize) -> Self {
        Self { kind, pos }
    }

    /// The matched token kind. When several rules accept at the same position, this is the
    /// lowest kind among them.
    #[inline]
    pub fn kind(&self) -> u32 {
        self.kind
    }

    /// Character index of the last character of the match, counted from the scan start.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of characters the match consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.pos + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Display for ScanMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "(kind {}, pos {})", self.kind, self.pos)
    }
}
