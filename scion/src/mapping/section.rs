//! Unresolved stretches of two child lists.
//!
//! When two similar nodes are mapped, their child lists are aligned piece by
//! piece. A [`Section`] holds a contiguous run of still-unmapped left children
//! facing a contiguous run of still-unmapped right children. Resolving part of
//! a section splits it into the part before and the part after, so sections
//! always stay in document order.

use indextree::NodeId;

/// Handle to a section inside an [`Unprocessed`] set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionId(usize);

/// Searches already known to fail for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionFlags(u8);

impl SectionFlags {
    /// No run of identical subtrees exists
    pub const NO_IDENTICAL: Self = Self(1);
    /// No run of similar nodes exists
    pub const NO_SIMILAR: Self = Self(1 << 1);

    /// True if all bits of `other` are set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// Unmapped left and right children between two resolved points.
#[derive(Debug, Clone)]
pub struct Section {
    left: Vec<NodeId>,
    right: Vec<NodeId>,
    previous: Option<NodeId>,
    flags: SectionFlags,
}

impl Section {
    /// Unmapped left children.
    pub fn left(&self) -> &[NodeId] {
        &self.left
    }

    /// Unmapped right children.
    pub fn right(&self) -> &[NodeId] {
        &self.right
    }

    /// Last left child before the section, `None` at the start of the list.
    /// Insertions for this section are anchored after it.
    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    /// Searches known to fail.
    pub fn flags(&self) -> SectionFlags {
        self.flags
    }

    fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// Live sections of one parent pair, in document order.
#[derive(Debug, Default)]
pub struct Unprocessed {
    sections: Vec<Section>,
    live: Vec<SectionId>,
}

impl Unprocessed {
    /// Start with a single section covering both child lists.
    pub fn new(left: Vec<NodeId>, right: Vec<NodeId>) -> Self {
        let mut unprocessed = Self::default();
        unprocessed.push_live(
            0,
            Section {
                left,
                right,
                previous: None,
                flags: SectionFlags::default(),
            },
        );
        unprocessed
    }

    fn push_live(&mut self, at: usize, section: Section) -> usize {
        if section.is_empty() {
            return at;
        }
        let id = SectionId(self.sections.len());
        self.sections.push(section);
        self.live.insert(at, id);
        at + 1
    }

    /// First live section, `None` once everything is resolved.
    pub fn first_section(&self) -> Option<SectionId> {
        self.live.first().copied()
    }

    /// Number of live sections.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True once everything is resolved.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Access a section.
    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }

    /// Remember that a search failed for a section.
    pub fn set_flag(&mut self, id: SectionId, flag: SectionFlags) {
        self.sections[id.0].flags.insert(flag);
    }

    /// Resolve the whole section.
    pub fn resolve_all(&mut self, id: SectionId) {
        self.live.retain(|&live| live != id);
    }

    /// Resolve `count` left children starting at `left_offset` against as many
    /// right children starting at `right_offset`. What remains on either side
    /// becomes up to two new sections that inherit the flags.
    pub fn resolve_run(
        &mut self,
        id: SectionId,
        left_offset: usize,
        right_offset: usize,
        count: usize,
    ) {
        let Some(at) = self.live.iter().position(|&live| live == id) else {
            return;
        };
        self.live.remove(at);

        let section = &self.sections[id.0];
        let left_end = left_offset + count;
        let right_end = right_offset + count;
        let before = Section {
            left: section.left[..left_offset].to_vec(),
            right: section.right[..right_offset].to_vec(),
            previous: section.previous,
            flags: section.flags,
        };
        let after = Section {
            left: section.left[left_end..].to_vec(),
            right: section.right[right_end..].to_vec(),
            previous: left_end
                .checked_sub(1)
                .map(|last| section.left[last])
                .or(section.previous),
            flags: section.flags,
        };

        let at = self.push_live(at, before);
        self.push_live(at, after);
    }

    /// Resolve a single left child against a single right child of a section.
    pub fn resolve_pair(&mut self, id: SectionId, left: NodeId, right: NodeId) {
        let section = &self.sections[id.0];
        let left_offset = section.left.iter().position(|&n| n == left);
        let right_offset = section.right.iter().position(|&n| n == right);
        if let (Some(l), Some(r)) = (left_offset, right_offset) {
            self.resolve_run(id, l, r, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use indextree::Arena;

    fn ids(arena: &mut Arena<()>, n: usize) -> Vec<NodeId> {
        (0..n).map(|_| arena.new_node(())).collect()
    }

    #[test]
    fn test_run_in_the_middle_splits_in_two() {
        let mut arena = Arena::new();
        let left = ids(&mut arena, 5);
        let right = ids(&mut arena, 4);
        let mut unprocessed = Unprocessed::new(left.clone(), right.clone());
        let id = unprocessed.first_section().unwrap();
        unprocessed.set_flag(id, SectionFlags::NO_IDENTICAL);

        unprocessed.resolve_run(id, 1, 2, 2);
        assert_eq!(unprocessed.len(), 2);

        let first = unprocessed.section(unprocessed.first_section().unwrap());
        assert_eq!(first.left(), &left[..1]);
        assert_eq!(first.right(), &right[..2]);
        assert_eq!(first.previous(), None);
        assert!(first.flags().contains(SectionFlags::NO_IDENTICAL));
        assert!(!first.flags().contains(SectionFlags::NO_SIMILAR));

        let first_id = unprocessed.first_section().unwrap();
        unprocessed.resolve_all(first_id);
        let second = unprocessed.section(unprocessed.first_section().unwrap());
        assert_eq!(second.left(), &left[3..]);
        assert!(second.right().is_empty());
        assert_eq!(second.previous(), Some(left[2]));
    }

    #[test]
    fn test_empty_remainders_are_dropped() {
        let mut arena = Arena::new();
        let left = ids(&mut arena, 2);
        let right = ids(&mut arena, 2);
        let mut unprocessed = Unprocessed::new(left, right);
        let id = unprocessed.first_section().unwrap();
        unprocessed.resolve_run(id, 0, 0, 2);
        assert!(unprocessed.is_empty());
    }

    #[test]
    fn test_resolve_pair_keeps_previous_anchor() {
        let mut arena = Arena::new();
        let left = ids(&mut arena, 3);
        let right = ids(&mut arena, 3);
        let mut unprocessed = Unprocessed::new(left.clone(), right.clone());
        let id = unprocessed.first_section().unwrap();

        // pair at the very start: nothing before, the rest follows left[0]
        unprocessed.resolve_pair(id, left[0], right[1]);
        assert_eq!(unprocessed.len(), 2);
        let before = unprocessed.section(unprocessed.first_section().unwrap());
        assert!(before.left().is_empty());
        assert_eq!(before.right(), &right[..1]);
        assert_eq!(before.previous(), None);
    }

    #[test]
    fn test_empty_lists_have_no_section() {
        let unprocessed = Unprocessed::new(Vec::new(), Vec::new());
        assert!(unprocessed.first_section().is_none());
    }
}
