//! Building typed nodes from arbitrary children lists.

use std::sync::Arc;

use facet::Facet;

use crate::allocator::NodeAllocator;
use crate::debug;
use crate::tree::{Fragment, NodeData, NodeType, Tree};

/// Error returned by [`NodeBuilder::create_node`].
#[derive(Facet, Debug)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum BuildError {
    /// cannot create a node of type {type_name}: its children do not fill the required slots
    InvalidChildren {
        /// Type of the node being built
        type_name: String,
    },
}

/// Collects the parts of a node and checks its children against the type.
///
/// ```
/// use std::sync::Arc;
/// use scion::{ChildDescriptor, NodeBuilder, NodeType, Tree};
///
/// let variable = Tree::from_description(r#"Variable<"a">"#).unwrap();
/// let assign = Arc::new(NodeType::new("Assign").with_children(
///     ChildDescriptor::create().required("Variable").optional("Comment").build(),
/// ));
///
/// let mut builder = NodeBuilder::new(assign);
/// assert!(builder.set_children_list(vec![variable]));
/// let node = builder.create_node().unwrap();
/// assert_eq!(node.to_string(), r#"Assign(Variable<"a">)"#);
/// ```
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    ty: Arc<NodeType>,
    data: String,
    fragment: Fragment,
    children: Vec<Tree>,
    valid: bool,
}

impl NodeBuilder {
    /// Builder for a node of the given type, with no children yet.
    pub fn new(ty: Arc<NodeType>) -> Self {
        let valid = ty.is_draft() || ty.child_types().iter().all(|d| d.is_optional());
        Self {
            ty,
            data: String::new(),
            fragment: Fragment::EMPTY,
            children: Vec::new(),
            valid,
        }
    }

    /// Builder for a node with a fresh draft type.
    pub fn draft(type_name: impl Into<String>) -> Self {
        Self::new(Arc::new(NodeType::draft(type_name)))
    }

    /// Set the source fragment.
    pub fn set_fragment(&mut self, fragment: Fragment) -> &mut Self {
        self.fragment = fragment;
        self
    }

    /// Set the data string.
    pub fn set_data(&mut self, data: impl Into<String>) -> &mut Self {
        self.data = data.into();
        self
    }

    /// Offer a list of children. Returns false, leaving the builder
    /// unchanged, if they do not fit the child slots of the type.
    pub fn set_children_list(&mut self, children: Vec<Tree>) -> bool {
        if self.ty.is_draft() {
            self.children = children;
            self.valid = true;
            return true;
        }

        let descriptors = self.ty.child_types();
        let mut slots = vec![None; descriptors.len()];
        match NodeAllocator::new(descriptors).allocate(&mut slots, &children) {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                debug!(type_name = self.ty.name(), count = children.len(), "children rejected");
                return false;
            }
        }

        let mut children: Vec<Option<Tree>> = children.into_iter().map(Some).collect();
        self.children = slots
            .iter()
            .flatten()
            .filter_map(|&index| children[index].take())
            .collect();
        self.valid = true;
        true
    }

    /// True if [`create_node`](Self::create_node) would succeed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Create the node with copies of the accepted children.
    pub fn create_node(&self) -> Result<Tree, BuildError> {
        if !self.valid {
            return Err(BuildError::InvalidChildren {
                type_name: self.ty.name().to_owned(),
            });
        }
        let data = NodeData::new(self.ty.clone(), self.data.clone()).with_fragment(self.fragment);
        let mut tree = Tree::new(data);
        for child in &self.children {
            tree.graft(tree.root, child, child.root);
        }
        Ok(tree)
    }
}
