macro_rules! impl_id {
    ($name:ident, $tp:ty) => {
        /// The ID type $name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub(crate) struct $name($tp);

        impl $name {
            /// Create a new id.
            #[inline]
            pub(crate) const fn new(index: $tp) -> Self {
                $name(index)
            }

            /// Get the id as usize.
            #[allow(dead_code)]
            #[inline]
            pub(crate) fn as_usize(&self) -> usize {
                self.0 as usize
            }

            /// Get the id as $tp.
            #[allow(dead_code)]
            #[inline]
            pub(crate) fn id(&self) -> $tp {
                self.0
            }
        }

        impl<T> std::ops::Index<$name> for [T] {
            type Output = T;

            #[inline]
            fn index(&self, index: $name) -> &Self::Output {
                &self[index.0 as usize]
            }
        }

        impl<T> std::ops::IndexMut<$name> for [T] {
            #[inline]
            fn index_mut(&mut self, index: $name) -> &mut T {
                &mut self[index.0 as usize]
            }
        }

        impl<T> std::ops::Index<$name> for Vec<T> {
            type Output = T;

            #[inline]
            fn index(&self, index: $name) -> &Self::Output {
                &self[index.0 as usize]
            }
        }

        impl<T> std::ops::IndexMut<$name> for Vec<T> {
            #[inline]
            fn index_mut(&mut self, index: $name) -> &mut T {
                &mut self[index.0 as usize]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$tp> for $name {
            fn from(index: $tp) -> Self {
                $name::new(index)
            }
        }
    };
}

/// The ID type for automaton nodes. This is the creation-order index of the node in the
/// registry's arena and is never reused.
pub(crate) type StateIDBase = u32;
impl_id!(StateID, StateIDBase);

/// The ID type for generated states. This is the index of a node in the final reachable-state
/// numbering, or a synthetic ("dummy") identifier allocated past the reachable count for a
/// composite set no real node could stand in for.
pub(crate) type StateNameBase = u32;
impl_id!(StateName, StateNameBase);

/// The ID type for token kinds. Lower kinds have higher priority when two rules accept at the
/// same position.
pub(crate) type KindIDBase = u32;
impl_id!(KindID, KindIDBase);

/// The ID type for extended-character move tables. This is the index of the out-of-band routine
/// that handles characters >= 128 for a node.
pub(crate) type ExtendedMoveIDBase = u32;
impl_id!(ExtendedMoveID, ExtendedMoveIDBase);
