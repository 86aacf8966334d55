//! Hash decoration of a [`Tree`].
//!
//! Two hashes per node, both computed bottom-up in a single post-order pass:
//!
//! - the **local** hash covers the node's type name and data only, so two
//!   nodes that "look the same" ignoring their children share it;
//! - the **absolute** hash additionally covers the absolute hashes of all
//!   children in order (Merkle style), so equal absolute hashes mean
//!   structurally identical subtrees.
//!
//! Hashes use the default-seeded [`RapidHasher`], which makes them stable
//! across runs and processes.

use core::fmt;
use core::hash::{Hash, Hasher};

use indextree::NodeId;
use rapidhash::RapidHasher;

use crate::tree::{NodeData, Tree};

/// A 64-bit node hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeHash(pub u64);

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Which of the two hashes to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// Whole subtree
    Absolute,
    /// Node only
    Local,
}

/// Per-node decoration.
#[derive(Debug, Clone)]
pub struct HashedNode {
    /// Hash of the whole subtree
    pub absolute: NodeHash,
    /// Hash of the type name and data
    pub local: NodeHash,
    /// Parent, `None` for the root
    pub parent: Option<NodeId>,
    /// Index among siblings
    pub index: usize,
    /// Children, in order
    pub children: Vec<NodeId>,
}

fn shape_hasher(data: &NodeData) -> RapidHasher {
    let mut hasher = RapidHasher::default();
    data.type_name().hash(&mut hasher);
    data.data.hash(&mut hasher);
    hasher
}

/// Local hash of a single node.
pub fn local_hash(data: &NodeData) -> NodeHash {
    NodeHash(shape_hasher(data).finish())
}

/// A tree together with the hashes and sibling indices of all its nodes.
///
/// The decoration borrows the tree; nodes are looked up by indexing a Vec with
/// `usize::from(NodeId)`.
pub struct HashedTree<'a> {
    tree: &'a Tree,
    nodes: Vec<Option<HashedNode>>,
}

impl<'a> HashedTree<'a> {
    /// Decorate every node of `tree`.
    pub fn new(tree: &'a Tree) -> Self {
        let mut nodes: Vec<Option<HashedNode>> = vec![None; tree.arena.count() + 1];

        for id in tree.post_order() {
            let data = tree.get(id);
            let children: Vec<NodeId> = tree.children(id).collect();

            let mut hasher = shape_hasher(data);
            children.len().hash(&mut hasher);
            for (index, &child) in children.iter().enumerate() {
                if let Some(node) = nodes[usize::from(child)].as_mut() {
                    node.parent = Some(id);
                    node.index = index;
                    node.absolute.0.hash(&mut hasher);
                }
            }

            nodes[usize::from(id)] = Some(HashedNode {
                absolute: NodeHash(hasher.finish()),
                local: local_hash(data),
                parent: None,
                index: 0,
                children,
            });
        }

        Self { tree, nodes }
    }

    /// The decorated tree.
    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    /// Root node.
    pub fn root(&self) -> NodeId {
        self.tree.root
    }

    /// Decoration of a node.
    ///
    /// Panics if the node is not part of the decorated tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &HashedNode {
        self.nodes[usize::from(id)]
            .as_ref()
            .expect("node should belong to the decorated tree")
    }

    /// Hash of the given kind.
    #[inline]
    pub fn hash(&self, id: NodeId, kind: HashKind) -> NodeHash {
        match kind {
            HashKind::Absolute => self.node(id).absolute,
            HashKind::Local => self.node(id).local,
        }
    }

    /// Hash of the whole subtree.
    #[inline]
    pub fn absolute_hash(&self, id: NodeId) -> NodeHash {
        self.node(id).absolute
    }

    /// Hash of the node alone.
    #[inline]
    pub fn local_hash(&self, id: NodeId) -> NodeHash {
        self.node(id).local
    }

    /// Children of a node.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Index of a node among its siblings.
    pub fn index(&self, id: NodeId) -> usize {
        self.node(id).index
    }

    /// Payload of a node.
    pub fn data(&self, id: NodeId) -> &'a NodeData {
        self.tree.get(id)
    }
}
