//! Patterns: trees whose subtrees may be replaced by numbered holes and which
//! may carry action markers.
//!
//! A pattern is built from a prototype, either a plain [`Tree`] or a
//! [`DifferenceTree`]. Each pattern item remembers the prototype node it was
//! copied from, and each difference-tree node remembers its source node, so a
//! node of any layer can be found again by walking prototypes one level at a
//! time (see [`Pattern::prototype_of`]).

use core::fmt;

use indextree::{Arena, NodeId};
use scion::draft::{write_description, write_label};
use scion::{NodeData, Tree};
use smallvec::SmallVec;

use crate::action::ActionKind;
use crate::difference::{DiffItem, DifferenceTree};
#[allow(unused_imports)]
use crate::{debug, trace};

/// A node in one of the three layers a pattern can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// A node of the plain tree a pattern or difference tree was built from
    Source(NodeId),
    /// An item of the difference tree a pattern was built from
    Diff(NodeId),
    /// An item of the pattern itself
    Pattern(NodeId),
}

/// One item of a [`Pattern`].
#[derive(Debug, Clone)]
pub enum PatternItem {
    /// A node that must match by type, data and children
    Node {
        /// Node payload
        data: NodeData,
        /// Prototype node it was copied from
        prototype: NodeRef,
    },
    /// A numbered wildcard
    Hole {
        /// Hole number; holes sharing a number must match equal subtrees
        number: u32,
        /// The detached item the hole replaced
        replaced: NodeId,
    },
    /// An action marker, with its contents as children
    Action {
        /// Kind of the action
        kind: ActionKind,
        /// Prototype item it was copied from
        prototype: NodeRef,
    },
}

#[derive(Clone)]
enum Prototype {
    Tree(Tree),
    Diff(DifferenceTree),
}

/// A match-and-edit template.
#[derive(Clone)]
pub struct Pattern {
    arena: Arena<PatternItem>,
    root: NodeId,
    prototype: Prototype,
}

impl Pattern {
    /// Pattern matching exactly `tree`.
    pub fn from_tree(tree: &Tree) -> Self {
        let mut arena = Arena::new();
        let item = |id: NodeId| PatternItem::Node {
            data: tree.get(id).clone(),
            prototype: NodeRef::Source(id),
        };
        let root = arena.new_node(item(tree.root));
        let mut stack = vec![(tree.root, root)];
        while let Some((src, dst)) = stack.pop() {
            for child in tree.children(src) {
                let copied = arena.new_node(item(child));
                dst.append(copied, &mut arena);
                stack.push((child, copied));
            }
        }
        Self {
            arena,
            root,
            prototype: Prototype::Tree(tree.clone()),
        }
    }

    /// Pattern matching the "before" side of `diff` and carrying its actions.
    pub fn from_diff(diff: &DifferenceTree) -> Self {
        let mut arena = Arena::new();
        let item = |id: NodeId| match diff.get(id) {
            DiffItem::Node { data, .. } => PatternItem::Node {
                data: data.clone(),
                prototype: NodeRef::Diff(id),
            },
            DiffItem::Action(kind) => PatternItem::Action {
                kind: *kind,
                prototype: NodeRef::Diff(id),
            },
        };
        let root = arena.new_node(item(diff.root()));
        let mut stack = vec![(diff.root(), root)];
        while let Some((src, dst)) = stack.pop() {
            for child in diff.children(src) {
                let copied = arena.new_node(item(child));
                dst.append(copied, &mut arena);
                stack.push((child, copied));
            }
        }
        Self {
            arena,
            root,
            prototype: Prototype::Diff(diff.clone()),
        }
    }

    /// Root item.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// An item.
    pub fn get(&self, id: NodeId) -> &PatternItem {
        self.arena[id].get()
    }

    /// Children of an item, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// The node `node` was copied from, one layer down.
    pub fn prototype_of(&self, node: NodeRef) -> Option<NodeRef> {
        match node {
            NodeRef::Pattern(id) => match self.get(id) {
                PatternItem::Node { prototype, .. } | PatternItem::Action { prototype, .. } => {
                    Some(*prototype)
                }
                PatternItem::Hole { replaced, .. } => Some(NodeRef::Pattern(*replaced)),
            },
            NodeRef::Diff(id) => match &self.prototype {
                Prototype::Diff(diff) => diff.prototype(id).map(NodeRef::Source),
                Prototype::Tree(_) => None,
            },
            NodeRef::Source(_) => None,
        }
    }

    /// True if walking prototypes from `start` reaches `target`.
    fn derives_from(&self, start: NodeRef, target: NodeRef) -> bool {
        let mut chain: SmallVec<[NodeRef; 4]> = SmallVec::new();
        let mut current = Some(start);
        while let Some(node) = current {
            if node == target {
                trace!(?chain, "prototype chain");
                return true;
            }
            chain.push(node);
            current = self.prototype_of(node);
        }
        false
    }

    /// Non-root items in pre-order, not descending into holes or actions.
    fn hole_candidates(&self) -> Vec<NodeId> {
        let mut candidates = Vec::new();
        if !matches!(self.get(self.root), PatternItem::Node { .. }) {
            return candidates;
        }
        let mut stack: Vec<NodeId> = self.children(self.root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            if let PatternItem::Node { .. } = self.get(id) {
                candidates.push(id);
                let first = stack.len();
                stack.extend(self.children(id));
                stack[first..].reverse();
            }
        }
        candidates
    }

    /// Replace the first non-root item (pre-order) whose prototype chain
    /// reaches `target` with hole `number`. Returns false if there is none.
    pub fn make_hole(&mut self, target: NodeRef, number: u32) -> bool {
        let Some(id) = self
            .hole_candidates()
            .into_iter()
            .find(|&id| self.derives_from(NodeRef::Pattern(id), target))
        else {
            debug!(?target, number, "no item to turn into a hole");
            return false;
        };

        let hole = self.arena.new_node(PatternItem::Hole {
            number,
            replaced: id,
        });
        id.insert_before(hole, &mut self.arena);
        id.detach(&mut self.arena);
        trace!(item = usize::from(id), number, "hole made");
        true
    }

    /// The item a hole replaced.
    pub fn hole_prototype(&self, hole: NodeId) -> Option<NodeId> {
        match self.get(hole) {
            PatternItem::Hole { replaced, .. } => Some(*replaced),
            _ => None,
        }
    }

    /// All holes in pre-order, with their numbers.
    pub fn holes(&self) -> Vec<(NodeId, u32)> {
        self.root
            .descendants(&self.arena)
            .filter_map(|id| match self.get(id) {
                PatternItem::Hole { number, .. } => Some((id, *number)),
                _ => None,
            })
            .collect()
    }

    /// The plain tree made of `id` and its descendants, `None` if it contains
    /// a hole or an action.
    pub fn subtree(&self, id: NodeId) -> Option<Tree> {
        let PatternItem::Node { data, .. } = self.get(id) else {
            return None;
        };
        let mut tree = Tree::new(data.clone());
        let mut stack = vec![(id, tree.root)];
        while let Some((src, dst)) = stack.pop() {
            for child in self.children(src) {
                let PatternItem::Node { data, .. } = self.get(child) else {
                    return None;
                };
                let copied = tree.add_child(dst, data.clone());
                stack.push((child, copied));
            }
        }
        Some(tree)
    }

    fn write_item(&self, out: &mut String, id: NodeId) {
        write_description(
            out,
            id,
            |out, id| match self.get(id) {
                PatternItem::Node { data, .. } => write_label(out, data),
                PatternItem::Hole { number, .. } => {
                    out.push('#');
                    out.push_str(&number.to_string());
                }
                PatternItem::Action { kind, .. } => out.push_str(&kind.to_string()),
            },
            |id| self.children(id),
        );
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_item(&mut out, self.root);
        f.write_str(&out)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;
    use scion::MappingConfig;

    fn parse(text: &str) -> Tree {
        Tree::from_description(text).unwrap()
    }

    #[test]
    fn test_hole_from_source_node() {
        let tree = parse(r#"P(X<"x">, B)"#);
        let x = tree.child(tree.root, 0).unwrap();
        let mut pattern = Pattern::from_tree(&tree);
        assert!(pattern.make_hole(NodeRef::Source(x), 1));
        assert_eq!(pattern.to_string(), "P(#1, B)");

        let (hole, number) = pattern.holes()[0];
        assert_eq!(number, 1);
        let replaced = pattern.hole_prototype(hole).unwrap();
        assert_eq!(
            pattern.prototype_of(NodeRef::Pattern(replaced)),
            Some(NodeRef::Source(x))
        );
    }

    #[test]
    fn test_root_cannot_become_a_hole() {
        let tree = parse("P(A)");
        let mut pattern = Pattern::from_tree(&tree);
        assert!(!pattern.make_hole(NodeRef::Source(tree.root), 1));
        assert_eq!(pattern.to_string(), "P(A)");
    }

    #[test]
    fn test_unknown_target_is_not_found() {
        let tree = parse("P(A)");
        let other = parse("Q(Z, Y)");
        let y = other.child(other.root, 1).unwrap();
        let mut pattern = Pattern::from_tree(&tree);
        assert!(!pattern.make_hole(NodeRef::Source(y), 1));
    }

    #[test]
    fn test_hole_through_difference_tree() {
        let before = parse(r#"Stmt(Add(Var<"a">, Int<"1">))"#);
        let after = parse(r#"Stmt(Add(Var<"a">, Int<"2">))"#);
        let diff = DifferenceTree::build(&before, &after, &MappingConfig::default());
        let mut pattern = Pattern::from_diff(&diff);
        assert_eq!(
            pattern.to_string(),
            r#"Stmt(Add(Var<"a">, Replace(Int<"1">, Int<"2">)))"#
        );

        let var = before.find_first(|d| d.type_name() == "Var").unwrap();
        assert!(pattern.make_hole(NodeRef::Source(var), 1));
        assert_eq!(
            pattern.to_string(),
            r#"Stmt(Add(#1, Replace(Int<"1">, Int<"2">)))"#
        );
    }

    #[test]
    fn test_action_contents_never_become_holes() {
        let before = parse(r#"Stmt(Add(Var<"a">, Int<"1">))"#);
        let after = parse(r#"Stmt(Add(Var<"a">, Int<"2">))"#);
        let diff = DifferenceTree::build(&before, &after, &MappingConfig::default());
        let mut pattern = Pattern::from_diff(&diff);
        let int = before.find_first(|d| d.type_name() == "Int").unwrap();
        assert!(!pattern.make_hole(NodeRef::Source(int), 1));
    }

    #[test]
    fn test_subtree_of_plain_items() {
        let tree = parse(r#"P(A(B<"b">), C)"#);
        let a = tree.child(tree.root, 0).unwrap();
        let mut pattern = Pattern::from_tree(&tree);
        let first = pattern.children(pattern.root()).next().unwrap();
        assert_eq!(pattern.subtree(first).unwrap().to_string(), r#"A(B<"b">)"#);

        assert!(pattern.make_hole(NodeRef::Source(a), 3));
        assert!(pattern.subtree(pattern.root()).is_none());
    }
}
