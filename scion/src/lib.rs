//! # Scion
//!
//! Language-independent syntax trees and a hash-guided top-down mapping
//! between two of them.
//!
//! A scion is the cutting that gets grafted onto a rootstock; this crate holds
//! the trees, the `graft` crate does the grafting.
//!
//! ## Algorithm Overview
//!
//! Every node is decorated with two hashes (see [`hashed`]):
//! - an *absolute* hash over the whole subtree, and
//! - a *local* hash over the node's type name and data only.
//!
//! The mapper descends from the roots. Identical subtrees are mapped node by
//! node, similar nodes (equal local hash) are mapped and their children
//! aligned section by section, everything else is replaced. The result is a
//! [`Mapping`] that records every node of both trees and lists insertions,
//! deletions and replacements.
//!
//! ## Usage
//!
//! ```
//! use scion::{Tree, map_trees_default};
//!
//! let before = Tree::from_description(r#"Call<"f">(Var<"x">)"#).unwrap();
//! let after = Tree::from_description(r#"Call<"f">(Var<"x">, Var<"y">)"#).unwrap();
//!
//! let mapping = map_trees_default(&before, &after);
//! assert_eq!(mapping.insertions().len(), 1);
//! ```
//!
//! The crate also carries the pieces needed to build typed trees: node types
//! with child slots, the [`NodeAllocator`] that binds children to those slots,
//! and the [`NodeBuilder`] on top of it.

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]

pub use indextree;

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

/// Binding children to typed child slots
pub mod allocator;
/// Typed node construction
pub mod builder;
/// Textual tree descriptions
pub mod draft;
/// Hash decoration
pub mod hashed;
/// Identical-node finder
pub mod identical;
/// Top-down tree mapping
pub mod mapping;
/// Tree representation
pub mod tree;

pub use allocator::{AllocationError, ChildDescriptor, DescriptorListBuilder, NodeAllocator, Typed};
pub use builder::{BuildError, NodeBuilder};
pub use draft::DescriptionError;
pub use hashed::{HashKind, HashedTree, NodeHash};
pub use identical::find_identical;
pub use mapping::{Insertion, Mapping, MappingConfig, TopDownMapper, map_trees, map_trees_default};
pub use tree::{Fragment, NodeData, NodeType, Position, SubtreeMode, Tree};
