//! Typed syntax nodes stored in an indextree arena.
//!
//! A [`Tree`] is built once (root first, then children appended in order) and
//! treated as immutable afterwards. Every algorithm in this crate addresses
//! nodes by their [`NodeId`] inside a given tree.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use indextree::{Arena, NodeEdge, NodeId};
use rapidhash::RapidHashSet as HashSet;

use crate::allocator::ChildDescriptor;

/// A location in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Line number, starting at 1 (0 means unknown)
    pub line: u32,
    /// Column number, starting at 1 (0 means unknown)
    pub column: u32,
}

impl Position {
    /// Create a position.
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// The stretch of source text a node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fragment {
    /// First character of the fragment
    pub begin: Position,
    /// Position just past the fragment
    pub end: Position,
}

impl Fragment {
    /// Fragment of a node that was not built from source text.
    pub const EMPTY: Fragment = Fragment {
        begin: Position::new(0, 0),
        end: Position::new(0, 0),
    };

    /// Create a fragment.
    pub const fn new(begin: Position, end: Position) -> Self {
        Self { begin, end }
    }

    /// True if the fragment covers no text.
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }
}

/// Descriptor of a node type: its name, the groups it belongs to, the child
/// slots it expects and a set of free-form properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeType {
    name: String,
    hierarchy: Vec<String>,
    children: Vec<ChildDescriptor>,
    properties: BTreeMap<String, String>,
    draft: bool,
}

impl NodeType {
    /// Create a typed node type. Its hierarchy starts with its own name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hierarchy: vec![name.clone()],
            name,
            children: Vec::new(),
            properties: BTreeMap::new(),
            draft: false,
        }
    }

    /// A type without child slots that accepts any list of children.
    pub fn draft(name: impl Into<String>) -> Self {
        Self {
            draft: true,
            ..Self::new(name)
        }
    }

    /// Append groups (supertypes) to the hierarchy, nearest first.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hierarchy.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Set the expected child slots.
    pub fn with_children(mut self, children: Vec<ChildDescriptor>) -> Self {
        self.children = children;
        self
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type name followed by every group the type belongs to.
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    /// Expected child slots, in order.
    pub fn child_types(&self) -> &[ChildDescriptor] {
        &self.children
    }

    /// All properties of the type.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// A single property, if set.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// True if the type is named `group` or has it in its hierarchy.
    pub fn belongs_to(&self, group: &str) -> bool {
        self.name == group || self.hierarchy.iter().any(|g| g == group)
    }

    /// True for draft types, which skip child slot validation.
    pub fn is_draft(&self) -> bool {
        self.draft
    }
}

/// Payload of a single node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Node type, shared between nodes
    pub ty: Arc<NodeType>,
    /// Data string (identifier, literal value...), empty for most inner nodes
    pub data: String,
    /// Source location
    pub fragment: Fragment,
}

impl NodeData {
    /// Create node data of the given type.
    pub fn new(ty: Arc<NodeType>, data: impl Into<String>) -> Self {
        Self {
            ty,
            data: data.into(),
            fragment: Fragment::EMPTY,
        }
    }

    /// Node data with a fresh draft type.
    pub fn draft(type_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(Arc::new(NodeType::draft(type_name)), data)
    }

    /// Attach a source fragment.
    pub fn with_fragment(mut self, fragment: Fragment) -> Self {
        self.fragment = fragment;
        self
    }

    /// Name of the node type.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Properties of the node (those of its type).
    pub fn properties(&self) -> &BTreeMap<String, String> {
        self.ty.properties()
    }

    /// Same type name and same data. Children are not compared.
    pub fn same_shape(&self, other: &NodeData) -> bool {
        self.type_name() == other.type_name() && self.data == other.data
    }
}

/// Which nodes [`Tree::extract`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtreeMode {
    /// Keep only the listed nodes
    Include,
    /// Drop the listed nodes
    Exclude,
}

impl SubtreeMode {
    pub(crate) fn keeps(self, listed: bool) -> bool {
        match self {
            SubtreeMode::Include => listed,
            SubtreeMode::Exclude => !listed,
        }
    }
}

/// A syntax tree.
#[derive(Clone)]
pub struct Tree {
    /// All nodes of the tree
    pub arena: Arena<NodeData>,
    /// The root node
    pub root: NodeId,
}

impl Tree {
    /// Create a tree consisting of a single root node.
    pub fn new(root: NodeData) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(root);
        Self { arena, root }
    }

    /// Append a new last child to `parent`.
    pub fn add_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.arena.new_node(data);
        parent.append(id, &mut self.arena);
        id
    }

    /// Copy the subtree rooted at `other_id` in `other` and append it as the
    /// last child of `parent`. Returns the id of the copied root.
    pub fn graft(&mut self, parent: NodeId, other: &Tree, other_id: NodeId) -> NodeId {
        let copied = self.add_child(parent, other.get(other_id).clone());
        let mut stack = vec![(other_id, copied)];
        while let Some((src, dst)) = stack.pop() {
            for child in other.children(src) {
                let id = self.add_child(dst, other.get(child).clone());
                stack.push((child, id));
            }
        }
        copied
    }

    /// Root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Payload of a node.
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Children of a node, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Child at `index`, if any.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).nth(index)
    }

    /// Number of children of a node.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Parent of a node, `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Index of a node among its siblings.
    pub fn position(&self, id: NodeId) -> usize {
        id.preceding_siblings(&self.arena).count() - 1
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root.descendants(&self.arena)
    }

    /// A node and all its descendants, in pre-order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    /// All nodes in post-order (children before parents).
    pub fn post_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root.traverse(&self.arena).filter_map(|edge| match edge {
            NodeEdge::End(id) => Some(id),
            NodeEdge::Start(_) => None,
        })
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Copy the subtree rooted at `id` into a tree of its own.
    pub fn subtree(&self, id: NodeId) -> Tree {
        let mut tree = Tree::new(self.get(id).clone());
        let mut stack = vec![(id, tree.root)];
        while let Some((src, dst)) = stack.pop() {
            for child in self.children(src) {
                let copied = tree.add_child(dst, self.get(child).clone());
                stack.push((child, copied));
            }
        }
        tree
    }

    /// Copy the tree, keeping or dropping the listed nodes. A dropped node
    /// takes its whole subtree with it; `None` if the root is dropped.
    pub fn extract(&self, nodes: &HashSet<NodeId>, mode: SubtreeMode) -> Option<Tree> {
        if !mode.keeps(nodes.contains(&self.root)) {
            return None;
        }
        let mut tree = Tree::new(self.get(self.root).clone());
        let mut stack = vec![(self.root, tree.root)];
        while let Some((src, dst)) = stack.pop() {
            for child in self.children(src) {
                if mode.keeps(nodes.contains(&child)) {
                    let copied = tree.add_child(dst, self.get(child).clone());
                    stack.push((child, copied));
                }
            }
        }
        Some(tree)
    }

    /// Compare the subtree at `id` with the subtree at `other_id` in `other`:
    /// same type names, same data, same shape. Fragments are ignored.
    pub fn structurally_equal(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
        let mut stack = vec![(id, other_id)];
        while let Some((a, b)) = stack.pop() {
            if !self.get(a).same_shape(other.get(b)) {
                return false;
            }
            let mut a_children = self.children(a);
            let mut b_children = other.children(b);
            loop {
                match (a_children.next(), b_children.next()) {
                    (Some(x), Some(y)) => stack.push((x, y)),
                    (None, None) => break,
                    _ => return false,
                }
            }
        }
        true
    }

    /// First node in pre-order whose data satisfies the predicate.
    pub fn find_first(&self, mut predicate: impl FnMut(&NodeData) -> bool) -> Option<NodeId> {
        self.iter().find(|&id| predicate(self.get(id)))
    }

    /// Every node in pre-order whose data satisfies the predicate.
    pub fn find_all(&self, mut predicate: impl FnMut(&NodeData) -> bool) -> Vec<NodeId> {
        self.iter().filter(|&id| predicate(self.get(id))).collect()
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equal(self.root, other, other.root)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tree({})", self)
    }
}
