//! Hash-guided top-down mapping of two trees.
//!
//! The mapper walks both trees from the roots:
//!
//! 1. equal absolute hashes: the subtrees are identical and are mapped node by
//!    node;
//! 2. equal local hashes: the two nodes are mapped and their child lists are
//!    aligned section by section (see [`section`]);
//! 3. otherwise the left subtree is replaced by the right one and both are
//!    skipped.
//!
//! Every node of both trees ends up recorded, either with a counterpart or
//! with none (inserted, deleted, replaced or inside a replaced subtree).

pub mod finder;
pub mod section;

use crate::{debug, trace};

use indextree::NodeId;
use rayon::prelude::*;

use crate::hashed::{HashKind, HashedTree};
use crate::tree::Tree;
use finder::{band, longest_common_run};
use section::{SectionFlags, SectionId, Unprocessed};

/// State of one node in a [`Mapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Entry {
    #[default]
    Absent,
    Skipped,
    Mapped(NodeId),
}

/// A right node inserted under a mapped left parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Inserted node, in the right tree
    pub node: NodeId,
    /// Destination parent, in the left tree
    pub into: NodeId,
    /// Left sibling the node goes after, `None` for the start of the list
    pub after: Option<NodeId>,
}

/// Result of mapping a left tree onto a right tree.
///
/// Both directions use Vecs indexed by `usize::from(NodeId)`; key order is
/// kept separately so that iteration follows recording order.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    left_to_right: Vec<Entry>,
    right_to_left: Vec<Entry>,
    left_keys: Vec<NodeId>,
    right_keys: Vec<NodeId>,
    pairs: Vec<(NodeId, NodeId)>,
    insertions: Vec<Insertion>,
    replaced: Vec<(NodeId, NodeId)>,
    deleted: Vec<NodeId>,
}

fn record(entries: &mut Vec<Entry>, keys: &mut Vec<NodeId>, id: NodeId, entry: Entry) {
    let idx = usize::from(id);
    if idx >= entries.len() {
        entries.resize(idx + 1, Entry::Absent);
    }
    if entries[idx] == Entry::Absent {
        keys.push(id);
    }
    entries[idx] = entry;
}

fn lookup(entries: &[Entry], id: NodeId) -> Entry {
    entries.get(usize::from(id)).copied().unwrap_or_default()
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a left node to a right node.
    #[inline]
    pub fn add(&mut self, left: NodeId, right: NodeId) {
        record(
            &mut self.left_to_right,
            &mut self.left_keys,
            left,
            Entry::Mapped(right),
        );
        record(
            &mut self.right_to_left,
            &mut self.right_keys,
            right,
            Entry::Mapped(left),
        );
        self.pairs.push((left, right));
    }

    /// Record a left node without counterpart.
    pub fn skip_left(&mut self, left: NodeId) {
        record(
            &mut self.left_to_right,
            &mut self.left_keys,
            left,
            Entry::Skipped,
        );
    }

    /// Record a right node without counterpart.
    pub fn skip_right(&mut self, right: NodeId) {
        record(
            &mut self.right_to_left,
            &mut self.right_keys,
            right,
            Entry::Skipped,
        );
    }

    /// True if the left node is recorded, with or without counterpart.
    pub fn contains_left(&self, left: NodeId) -> bool {
        lookup(&self.left_to_right, left) != Entry::Absent
    }

    /// True if the right node is recorded, with or without counterpart.
    pub fn contains_right(&self, right: NodeId) -> bool {
        lookup(&self.right_to_left, right) != Entry::Absent
    }

    /// Counterpart of a left node.
    #[inline(always)]
    pub fn get_right(&self, left: NodeId) -> Option<NodeId> {
        match lookup(&self.left_to_right, left) {
            Entry::Mapped(right) => Some(right),
            _ => None,
        }
    }

    /// Counterpart of a right node.
    #[inline(always)]
    pub fn get_left(&self, right: NodeId) -> Option<NodeId> {
        match lookup(&self.right_to_left, right) {
            Entry::Mapped(left) => Some(left),
            _ => None,
        }
    }

    /// Every recorded left node with its counterpart, in recording order.
    pub fn left_to_right(&self) -> impl Iterator<Item = (NodeId, Option<NodeId>)> + '_ {
        self.left_keys.iter().map(|&l| (l, self.get_right(l)))
    }

    /// Every recorded right node with its counterpart, in recording order.
    pub fn right_to_left(&self) -> impl Iterator<Item = (NodeId, Option<NodeId>)> + '_ {
        self.right_keys.iter().map(|&r| (r, self.get_left(r)))
    }

    /// Number of recorded left nodes.
    pub fn left_len(&self) -> usize {
        self.left_keys.len()
    }

    /// Number of recorded right nodes.
    pub fn right_len(&self) -> usize {
        self.right_keys.len()
    }

    /// All mapped pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.pairs.iter().copied()
    }

    /// Number of mapped pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Insertions, in the order they were found.
    pub fn insertions(&self) -> &[Insertion] {
        &self.insertions
    }

    /// Replaced subtree roots as (left, right) pairs.
    pub fn replaced(&self) -> &[(NodeId, NodeId)] {
        &self.replaced
    }

    /// Deleted left subtree roots.
    pub fn deleted(&self) -> &[NodeId] {
        &self.deleted
    }

    /// True if the left node is the root of a replaced subtree.
    pub fn is_replaced(&self, left: NodeId) -> bool {
        self.replaced.iter().any(|&(l, _)| l == left)
    }

    /// True if the left node is the root of a deleted subtree.
    pub fn is_deleted(&self, left: NodeId) -> bool {
        self.deleted.contains(&left)
    }

    /// True if any insertion, deletion or replacement was recorded.
    pub fn has_changes(&self) -> bool {
        !(self.insertions.is_empty() && self.replaced.is_empty() && self.deleted.is_empty())
    }

    fn absorb(&mut self, other: Mapping) {
        for (left, entry) in other.left_keys.iter().map(|&l| (l, lookup(&other.left_to_right, l))) {
            record(&mut self.left_to_right, &mut self.left_keys, left, entry);
        }
        for (right, entry) in other
            .right_keys
            .iter()
            .map(|&r| (r, lookup(&other.right_to_left, r)))
        {
            record(&mut self.right_to_left, &mut self.right_keys, right, entry);
        }
        self.pairs.extend(other.pairs);
        self.insertions.extend(other.insertions);
        self.replaced.extend(other.replaced);
        self.deleted.extend(other.deleted);
    }
}

/// Configuration for the mapper.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    /// Run the trials of an ambiguous best-pair search on the rayon thread
    /// pool. The winner does not depend on this setting.
    pub parallel_trials: bool,

    /// Minimum number of trials before the parallel path is taken.
    pub parallel_threshold: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            parallel_trials: false,
            parallel_threshold: 16,
        }
    }
}

/// Map `left` onto `right`.
///
/// # Example
///
/// ```
/// use scion::{Tree, MappingConfig, map_trees};
///
/// let left = Tree::from_description(r#"Sum(Var<"a">, Int<"1">)"#).unwrap();
/// let right = Tree::from_description(r#"Sum(Var<"a">, Int<"2">)"#).unwrap();
///
/// let mapping = map_trees(&left, &right, &MappingConfig::default());
/// assert_eq!(mapping.left_len(), 3);
/// assert_eq!(mapping.replaced().len(), 1);
/// ```
pub fn map_trees(left: &Tree, right: &Tree, config: &MappingConfig) -> Mapping {
    let left = HashedTree::new(left);
    let right = HashedTree::new(right);
    debug!(
        left_nodes = left.tree().node_count(),
        right_nodes = right.tree().node_count(),
        "map_trees start"
    );

    let mut mapper = TopDownMapper::new(&left, &right, config);
    mapper.execute(left.root(), right.root());

    debug!(
        mapped = mapper.mapping.len(),
        identical = mapper.identical,
        insertions = mapper.mapping.insertions.len(),
        deletions = mapper.mapping.deleted.len(),
        replacements = mapper.mapping.replaced.len(),
        "map_trees done"
    );
    mapper.mapping
}

/// Map with [`MappingConfig::default`].
pub fn map_trees_default(left: &Tree, right: &Tree) -> Mapping {
    map_trees(left, right, &MappingConfig::default())
}

/// One run of the top-down algorithm over a pair of decorated trees.
///
/// Trials of the best-pair search are separate instances over the same
/// decorations; only the winner's mapping is merged back.
pub struct TopDownMapper<'a> {
    left: &'a HashedTree<'a>,
    right: &'a HashedTree<'a>,
    config: &'a MappingConfig,
    mapping: Mapping,
    identical: usize,
}

impl<'a> TopDownMapper<'a> {
    /// Create a mapper with an empty mapping.
    pub fn new(
        left: &'a HashedTree<'a>,
        right: &'a HashedTree<'a>,
        config: &'a MappingConfig,
    ) -> Self {
        Self {
            left,
            right,
            config,
            mapping: Mapping::new(),
            identical: 0,
        }
    }

    /// Number of node pairs mapped as parts of identical subtrees.
    pub fn identical(&self) -> usize {
        self.identical
    }

    /// Finish and return the mapping.
    pub fn into_mapping(self) -> Mapping {
        self.mapping
    }

    /// Map the subtree rooted at `left` onto the one rooted at `right`.
    pub fn execute(&mut self, left: NodeId, right: NodeId) {
        let mut pending = Vec::new();
        self.descend(left, right, &mut pending);
        self.drain(&mut pending);
    }

    /// Rules 1 to 3 for one pair. Similar pairs are queued on `pending`
    /// instead of being reconciled right away, so deep trees do not recurse.
    fn descend(&mut self, left: NodeId, right: NodeId, pending: &mut Vec<(NodeId, NodeId)>) {
        if self.left.absolute_hash(left) == self.right.absolute_hash(right) {
            self.map_identical(left, right);
        } else if self.left.local_hash(left) == self.right.local_hash(right) {
            pending.push((left, right));
        } else {
            self.replace(left, right);
        }
    }

    fn drain(&mut self, pending: &mut Vec<(NodeId, NodeId)>) {
        while let Some((left, right)) = pending.pop() {
            self.align_children(left, right, pending);
        }
    }

    fn replace(&mut self, left: NodeId, right: NodeId) {
        trace!(
            left = usize::from(left),
            right = usize::from(right),
            "replace"
        );
        self.mapping.replaced.push((left, right));
        self.skip_left_subtree(left);
        self.skip_right_subtree(right);
    }

    fn skip_left_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.mapping.skip_left(id);
            stack.extend(self.left.children(id).iter().rev());
        }
    }

    fn skip_right_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.mapping.skip_right(id);
            stack.extend(self.right.children(id).iter().rev());
        }
    }

    fn map_identical(&mut self, left: NodeId, right: NodeId) {
        let mut stack = vec![(left, right)];
        while let Some((l, r)) = stack.pop() {
            self.mapping.add(l, r);
            self.identical += 1;
            let pairs = self
                .left
                .children(l)
                .iter()
                .copied()
                .zip(self.right.children(r).iter().copied());
            stack.extend(pairs.rev());
        }
    }

    /// Map two similar nodes and everything below them.
    fn map_similar(&mut self, left: NodeId, right: NodeId) {
        let mut pending = vec![(left, right)];
        self.drain(&mut pending);
    }

    /// Map two similar nodes and align their children section by section.
    /// Child pairs that are similar themselves go to `pending`.
    fn align_children(&mut self, left: NodeId, right: NodeId, pending: &mut Vec<(NodeId, NodeId)>) {
        trace!(
            left = usize::from(left),
            right = usize::from(right),
            "similar"
        );
        self.mapping.add(left, right);

        let mut unprocessed = Unprocessed::new(
            self.left.children(left).to_vec(),
            self.right.children(right).to_vec(),
        );
        while let Some(id) = unprocessed.first_section() {
            let section = unprocessed.section(id);
            let (left_size, right_size) = (section.left().len(), section.right().len());

            if left_size == 0 {
                self.insert_all(&mut unprocessed, id, left);
            } else if right_size == 0 {
                self.delete_all(&mut unprocessed, id);
            } else if left_size == 1 && right_size == 1 {
                let (l, r) = (section.left()[0], section.right()[0]);
                self.descend(l, r, pending);
                unprocessed.resolve_run(id, 0, 0, 1);
            } else if self.map_run(&mut unprocessed, id, HashKind::Absolute, pending) {
                trace!("identical run");
            } else if self.map_run(&mut unprocessed, id, HashKind::Local, pending) {
                trace!("similar run");
            } else {
                let section = unprocessed.section(id);
                let (l, r) = (section.left()[0], section.right()[0]);
                self.replace(l, r);
                unprocessed.resolve_run(id, 0, 0, 1);
            }
        }
    }

    fn insert_all(&mut self, unprocessed: &mut Unprocessed, id: SectionId, into: NodeId) {
        let section = unprocessed.section(id);
        let after = section.previous();
        for &node in section.right() {
            trace!(node = usize::from(node), into = usize::from(into), "insert");
            self.mapping.insertions.push(Insertion { node, into, after });
            self.skip_right_subtree(node);
        }
        unprocessed.resolve_all(id);
    }

    fn delete_all(&mut self, unprocessed: &mut Unprocessed, id: SectionId) {
        for &node in unprocessed.section(id).left() {
            trace!(node = usize::from(node), "delete");
            self.mapping.deleted.push(node);
            self.skip_left_subtree(node);
        }
        unprocessed.resolve_all(id);
    }

    /// Look for a run of equal hashes of the given kind and map it. Returns
    /// false, and flags the section, if there is none.
    fn map_run(
        &mut self,
        unprocessed: &mut Unprocessed,
        id: SectionId,
        kind: HashKind,
        pending: &mut Vec<(NodeId, NodeId)>,
    ) -> bool {
        let flag = match kind {
            HashKind::Absolute => SectionFlags::NO_IDENTICAL,
            HashKind::Local => SectionFlags::NO_SIMILAR,
        };
        let section = unprocessed.section(id);
        if section.flags().contains(flag) {
            return false;
        }

        let left_keys: Vec<_> = section.left().iter().map(|&n| self.left.hash(n, kind)).collect();
        let right_keys: Vec<_> = section
            .right()
            .iter()
            .map(|&n| self.right.hash(n, kind))
            .collect();
        let Some(run) = longest_common_run(&left_keys, &right_keys) else {
            unprocessed.set_flag(id, flag);
            return false;
        };

        match kind {
            HashKind::Absolute => {
                for offset in 0..run.count {
                    let l = section.left()[run.left_offset + offset];
                    let r = section.right()[run.right_offset + offset];
                    self.map_identical(l, r);
                }
                unprocessed.resolve_run(id, run.left_offset, run.right_offset, run.count);
            }
            HashKind::Local => {
                let left_band = &section.left()[band(&left_keys, run.left_offset)];
                let right_band = &section.right()[band(&right_keys, run.right_offset)];
                let (l, r) = if let ([l], [r]) = (left_band, right_band) {
                    pending.push((*l, *r));
                    (*l, *r)
                } else {
                    self.map_best_pair(left_band, right_band)
                };
                unprocessed.resolve_pair(id, l, r);
            }
        }
        true
    }

    /// Try every pair of the two bands in isolation and commit the trial with
    /// the most identical pairs. Ties go to the first trial in left-major,
    /// right-minor order.
    fn map_best_pair(&mut self, left: &[NodeId], right: &[NodeId]) -> (NodeId, NodeId) {
        let candidates: Vec<(NodeId, NodeId)> = left
            .iter()
            .flat_map(|&l| right.iter().map(move |&r| (l, r)))
            .collect();

        let run_trial = |&(l, r): &(NodeId, NodeId)| {
            let mut trial = TopDownMapper::new(self.left, self.right, self.config);
            trial.map_similar(l, r);
            trial
        };
        let trials: Vec<TopDownMapper<'a>> =
            if self.config.parallel_trials && candidates.len() >= self.config.parallel_threshold {
                candidates.par_iter().map(run_trial).collect()
            } else {
                candidates.iter().map(run_trial).collect()
            };

        let mut best = 0;
        for (index, trial) in trials.iter().enumerate() {
            if trial.identical > trials[best].identical {
                best = index;
            }
        }
        debug!(
            trials = trials.len(),
            best,
            identical = trials[best].identical,
            "best pair"
        );

        let (l, r) = candidates[best];
        let Some(winner) = trials.into_iter().nth(best) else {
            return (l, r);
        };
        self.identical += winner.identical;
        self.mapping.absorb(winner.mapping);
        (l, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;
    use facet_testhelpers::test;

    fn parse(text: &str) -> Tree {
        Tree::from_description(text).unwrap()
    }

    fn map(left: &str, right: &str) -> (Tree, Tree, Mapping) {
        let left = parse(left);
        let right = parse(right);
        let mapping = map_trees_default(&left, &right);
        (left, right, mapping)
    }

    fn assert_total(left: &Tree, right: &Tree, mapping: &Mapping) {
        assert_eq!(mapping.left_len(), left.node_count());
        assert_eq!(mapping.right_len(), right.node_count());
        for (l, r) in mapping.left_to_right() {
            if let Some(r) = r {
                assert_eq!(mapping.get_left(r), Some(l));
            }
        }
        for (r, l) in mapping.right_to_left() {
            if let Some(l) = l {
                assert_eq!(mapping.get_right(l), Some(r));
            }
        }
    }

    #[test]
    fn test_identical_trees_map_one_to_one() {
        let text = r#"Block(Assign(Var<"x">, Int<"1">), Call<"f">(Var<"x">))"#;
        let (left, right, mapping) = map(text, text);
        assert_total(&left, &right, &mapping);
        assert_eq!(mapping.len(), left.node_count());
        assert!(!mapping.has_changes());
        for (l, r) in left.iter().zip(right.iter()) {
            assert_eq!(mapping.get_right(l), Some(r));
        }
    }

    #[test]
    fn test_leaf_change_replaces_leaf() {
        let (left, right, mapping) = map(
            r#"Stmt(Add(Var<"a">, Int<"1">))"#,
            r#"Stmt(Add(Var<"a">, Int<"2">))"#,
        );
        assert_total(&left, &right, &mapping);
        assert_eq!(mapping.replaced().len(), 1);
        let (l, r) = mapping.replaced()[0];
        assert_eq!(left.get(l).data, "1");
        assert_eq!(right.get(r).data, "2");
        assert_eq!(mapping.get_right(l), None);
        assert!(mapping.contains_left(l));
        // Stmt, Add and Var stay mapped
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_root_replacement_skips_everything() {
        let (left, right, mapping) = map("A(B, C)", "X(B, C)");
        assert_total(&left, &right, &mapping);
        assert!(mapping.is_empty());
        assert_eq!(mapping.replaced(), &[(left.root, right.root)]);
    }

    #[test]
    fn test_insertion_is_anchored_after_previous_sibling() {
        let (left, right, mapping) = map(
            r#"L(A<"1">, B<"2">)"#,
            r#"L(A<"1">, N<"new">, M<"more">, B<"2">)"#,
        );
        assert_total(&left, &right, &mapping);
        let a = left.child(left.root, 0).unwrap();
        let inserted: Vec<_> = mapping
            .insertions()
            .iter()
            .map(|ins| {
                assert_eq!(ins.into, left.root);
                assert_eq!(ins.after, Some(a));
                right.get(ins.node).type_name()
            })
            .collect();
        assert_eq!(inserted, ["N", "M"]);
        assert!(mapping.deleted().is_empty());
        assert!(mapping.replaced().is_empty());
    }

    #[test]
    fn test_insertion_at_start_has_no_anchor() {
        let (_, right, mapping) = map(r#"L(A<"1">, B<"2">)"#, r#"L(Z, A<"1">, B<"2">)"#);
        assert_eq!(mapping.insertions().len(), 1);
        let ins = mapping.insertions()[0];
        assert_eq!(ins.after, None);
        assert_eq!(right.get(ins.node).type_name(), "Z");
    }

    #[test]
    fn test_deletion() {
        let (left, right, mapping) = map(
            r#"L(A<"1">, D(E, F), B<"2">)"#,
            r#"L(A<"1">, B<"2">)"#,
        );
        assert_total(&left, &right, &mapping);
        assert_eq!(mapping.deleted().len(), 1);
        let d = mapping.deleted()[0];
        assert_eq!(left.get(d).type_name(), "D");
        assert!(mapping.is_deleted(d));
        // the deleted subtree is recorded without counterparts
        for id in left.descendants(d) {
            assert!(mapping.contains_left(id));
            assert_eq!(mapping.get_right(id), None);
        }
    }

    #[test]
    fn test_similar_nodes_are_reconciled() {
        // same call, one argument changed: Call is mapped, not replaced
        let (left, right, mapping) = map(
            r#"Call<"f">(Var<"x">, Var<"y">)"#,
            r#"Call<"f">(Var<"x">, Var<"z">)"#,
        );
        assert_total(&left, &right, &mapping);
        assert_eq!(mapping.get_right(left.root), Some(right.root));
        assert_eq!(mapping.replaced().len(), 1);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_single_similar_candidate_is_mapped() {
        let (left, right, mapping) = map(r#"L(S<"s">(A), Q, R)"#, r#"L(S<"s">(B), T)"#);
        assert_total(&left, &right, &mapping);
        let child = |tree: &Tree, index| tree.child(tree.root, index).unwrap();
        let (s_left, s_right) = (child(&left, 0), child(&right, 0));
        assert_eq!(mapping.get_right(s_left), Some(s_right));

        let a = left.child(s_left, 0).unwrap();
        let b = right.child(s_right, 0).unwrap();
        assert!(mapping.replaced().contains(&(a, b)));
        assert!(mapping.replaced().contains(&(child(&left, 1), child(&right, 1))));
        assert_eq!(mapping.replaced().len(), 2);
        assert_eq!(mapping.deleted(), &[child(&left, 2)]);
        assert!(mapping.insertions().is_empty());
    }

    #[test]
    fn test_unrelated_children_are_replaced_in_order() {
        let (left, right, mapping) = map("L(A, B)", "L(C, D)");
        assert_total(&left, &right, &mapping);
        let child = |tree: &Tree, index| tree.child(tree.root, index).unwrap();
        assert_eq!(
            mapping.replaced(),
            &[
                (child(&left, 0), child(&right, 0)),
                (child(&left, 1), child(&right, 1)),
            ]
        );
        assert_eq!(mapping.get_right(left.root), Some(right.root));
        assert_eq!(mapping.len(), 1);
        assert!(mapping.deleted().is_empty());
        assert!(mapping.insertions().is_empty());
    }

    fn chain(depth: usize, leaf: &str) -> Tree {
        let mut tree = Tree::new(NodeData::draft("A", ""));
        let mut parent = tree.root;
        for _ in 1..depth {
            parent = tree.add_child(parent, NodeData::draft("A", ""));
        }
        tree.add_child(parent, NodeData::draft("X", leaf));
        tree
    }

    #[test]
    fn test_deep_similar_chains() {
        // every level is similar but not identical
        let depth = 200_000;
        let left = chain(depth, "1");
        let right = chain(depth, "2");
        let mapping = map_trees_default(&left, &right);
        assert_total(&left, &right, &mapping);
        assert_eq!(mapping.len(), depth);
        assert_eq!(mapping.replaced().len(), 1);
        let (l, r) = mapping.replaced()[0];
        assert_eq!(left.get(l).data, "1");
        assert_eq!(right.get(r).data, "2");
    }

    #[test]
    fn test_best_pair_prefers_most_identical_content() {
        // both S nodes on the right look alike locally; the second shares more
        let (left, right, mapping) = map(
            r#"R(S(A<"1">, B<"2">, C<"3">), S(X<"9">))"#,
            r#"R(S(Q<"0">), S(A<"1">, B<"2">, C<"4">))"#,
        );
        assert_total(&left, &right, &mapping);
        let left_first = left.child(left.root, 0).unwrap();
        let right_second = right.child(right.root, 1).unwrap();
        assert_eq!(mapping.get_right(left_first), Some(right_second));
    }

    #[test]
    fn test_parallel_trials_give_the_same_result() {
        let left = parse(
            r#"R(S(A<"1">, B<"2">), S(A<"1">), S(C<"3">), S(B<"2">, C<"3">), S(D<"4">))"#,
        );
        let right = parse(
            r#"R(S(B<"2">, C<"3">, E), S(A<"1">, B<"2">, E), S(D<"4">, E), S(C<"3">), S(E))"#,
        );
        let sequential = map_trees(&left, &right, &MappingConfig::default());
        let parallel = map_trees(
            &left,
            &right,
            &MappingConfig {
                parallel_trials: true,
                parallel_threshold: 1,
            },
        );
        assert_total(&left, &right, &parallel);
        let a: Vec<_> = sequential.left_to_right().collect();
        let b: Vec<_> = parallel.left_to_right().collect();
        assert_eq!(a, b);
        assert_eq!(sequential.insertions(), parallel.insertions());
        assert_eq!(sequential.replaced(), parallel.replaced());
        assert_eq!(sequential.deleted(), parallel.deleted());
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let left = parse(r#"R(A(X<"1">), B, A(X<"2">), C<"c">)"#);
        let right = parse(r#"R(B, A(X<"2">), D, A(X<"1">, Y))"#);
        let first = map_trees_default(&left, &right);
        let second = map_trees_default(&left, &right);
        assert_total(&left, &right, &first);
        assert_eq!(
            first.left_to_right().collect::<Vec<_>>(),
            second.left_to_right().collect::<Vec<_>>()
        );
        assert_eq!(first.insertions(), second.insertions());
        assert_eq!(first.replaced(), second.replaced());
        assert_eq!(first.deleted(), second.deleted());
    }

    #[test]
    fn test_identical_subtree_has_no_changes_inside() {
        let shared = r#"Body(Stmt(Var<"a">), Stmt(Var<"b">))"#;
        let left = parse(&format!(r#"Fn<"f">({shared}, Ret<"1">)"#));
        let right = parse(&format!(r#"Fn<"f">({shared}, Ret<"2">)"#));
        let mapping = map_trees_default(&left, &right);
        let body = left.child(left.root, 0).unwrap();
        let inside: Vec<_> = left.descendants(body).collect();
        assert!(inside.iter().all(|&id| mapping.get_right(id).is_some()));
        assert!(mapping.replaced().iter().all(|(l, _)| !inside.contains(l)));
        assert!(mapping.deleted().iter().all(|l| !inside.contains(l)));
        assert!(mapping.insertions().iter().all(|ins| !inside.contains(&ins.into)));
    }
}
