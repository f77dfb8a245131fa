//! Nesting level budget.

use std::fmt;

use appset_model::GeneratorKind;

/// Remaining budget of composite nestings at a generator slot.
///
/// A top-level slot starts at [`NestingLevel::TOP`]. Entering a matrix or
/// merge generator costs one level for all of its children. Composite kinds
/// are only reachable while the level is above one, which allows exactly two
/// stacked composites and bounds the recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NestingLevel(u8);

impl NestingLevel {
    /// Level of a top-level generator slot.
    pub const TOP: Self = Self(3);

    /// Create a level with the given budget.
    #[must_use]
    pub const fn new(level: u8) -> Self {
        Self(level)
    }

    /// Return the raw budget.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Whether matrix and merge generators may appear at this level.
    #[must_use]
    pub const fn allows_composites(self) -> bool {
        self.0 > 1
    }

    /// The level of the children of a composite at this level.
    #[must_use]
    pub const fn descend(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Generator kinds reachable at this level, in dispatch order.
    pub fn reachable_kinds(self) -> impl Iterator<Item = GeneratorKind> {
        GeneratorKind::ALL
            .into_iter()
            .filter(move |kind| !kind.is_composite() || self.allows_composites())
    }
}

impl Default for NestingLevel {
    fn default() -> Self {
        Self::TOP
    }
}

impl fmt::Display for NestingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_allows_two_composite_levels() {
        let top = NestingLevel::TOP;
        assert!(top.allows_composites());
        assert!(top.descend().allows_composites());
        assert!(!top.descend().descend().allows_composites());
    }

    #[test]
    fn leaf_level_reaches_only_leaves() {
        let kinds: Vec<_> = NestingLevel::new(1).reachable_kinds().collect();
        assert_eq!(kinds.len(), 6);
        assert!(kinds.iter().all(|kind| !kind.is_composite()));
    }

    #[test]
    fn descend_saturates() {
        assert_eq!(NestingLevel::new(0).descend(), NestingLevel::new(0));
    }
}
