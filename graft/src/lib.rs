//! Edit patterns for syntax trees, built on scion.
//!
//! graft provides:
//! - **Action lists**: insert, delete and replace edits against a source tree
//! - **Difference trees**: a source tree with the edits overlaid as markers,
//!   projecting to the tree before and after
//! - **Patterns**: difference trees with some subtrees turned into numbered holes
//! - **Patching**: matching a pattern anywhere in a tree and applying its edits
//!
//! # Example
//!
//! ```rust
//! use graft::{DefaultPatcher, DifferenceTree, NodeRef, Pattern, Patcher};
//! use scion::{MappingConfig, Tree};
//!
//! // Learn an edit from one example
//! let before = Tree::from_description(r#"Stmt(Add(Var<"a">, Int<"1">))"#).unwrap();
//! let after = Tree::from_description(r#"Stmt(Add(Var<"a">, Int<"2">))"#).unwrap();
//! let diff = DifferenceTree::build(&before, &after, &MappingConfig::default());
//!
//! // Abstract over the variable
//! let mut pattern = Pattern::from_diff(&diff);
//! let var = before.find_first(|d| d.type_name() == "Var").unwrap();
//! assert!(pattern.make_hole(NodeRef::Source(var), 1));
//!
//! // Apply it elsewhere
//! let source = Tree::from_description(r#"Stmt(Add(Var<"b">, Int<"1">))"#).unwrap();
//! let patched = DefaultPatcher.patch(&source, &pattern);
//! assert_eq!(patched.to_string(), r#"Stmt(Add(Var<"b">, Int<"2">))"#);
//! ```

#![warn(missing_docs)]

mod tracing_macros;
#[allow(unused_imports)]
pub(crate) use tracing_macros::{debug, trace};

pub mod action;
pub mod difference;
pub mod matcher;
pub mod patcher;
pub mod pattern;

pub use action::{Action, ActionKind, ActionList};
pub use difference::{DiffItem, DifferenceTree};
pub use matcher::PatternMatcher;
pub use patcher::{DefaultPatcher, Patcher};
pub use pattern::{NodeRef, Pattern, PatternItem};
