//! Edit actions against a source tree.

use core::fmt;

use facet::Facet;
use indextree::NodeId;
use scion::{Mapping, Tree};

use crate::debug;
use crate::difference::DifferenceTree;

/// Kind of an edit action.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionKind {
    /// A new subtree goes in
    Insert,
    /// An existing subtree goes away
    Delete,
    /// An existing subtree is swapped for a new one
    Replace,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Insert => "Insert",
            ActionKind::Delete => "Delete",
            ActionKind::Replace => "Replace",
        })
    }
}

/// A single edit. Node ids refer to the source tree the action applies to.
#[derive(Debug, Clone)]
pub enum Action {
    /// Insert `subtree` as a child of `into`, right after `after` (or first).
    Insert {
        /// Parent in the source tree
        into: NodeId,
        /// Sibling the subtree follows, `None` for the start of the list
        after: Option<NodeId>,
        /// The new subtree
        subtree: Tree,
    },
    /// Delete the subtree rooted at `node`.
    Delete {
        /// Root of the deleted subtree
        node: NodeId,
    },
    /// Replace the subtree rooted at `node`.
    Replace {
        /// Root of the replaced subtree
        node: NodeId,
        /// What goes in its place
        replacement: Tree,
    },
}

impl Action {
    /// Kind of the action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Insert { .. } => ActionKind::Insert,
            Action::Delete { .. } => ActionKind::Delete,
            Action::Replace { .. } => ActionKind::Replace,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Insert {
                into,
                after,
                subtree,
            } => {
                write!(f, "Insert({subtree} into {}", usize::from(*into))?;
                match after {
                    Some(after) => write!(f, " after {})", usize::from(*after)),
                    None => write!(f, " first)"),
                }
            }
            Action::Delete { node } => write!(f, "Delete({})", usize::from(*node)),
            Action::Replace { node, replacement } => {
                write!(f, "Replace({} with {replacement})", usize::from(*node))
            }
        }
    }
}

/// An ordered list of actions.
#[derive(Debug, Clone, Default)]
pub struct ActionList {
    actions: Vec<Action>,
}

impl ActionList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action.
    pub fn push(&mut self, action: Action) {
        debug!(%action, "action");
        self.actions.push(action);
    }

    /// Insert `subtree` under `into` after the sibling `after`.
    pub fn insert_node_after(&mut self, into: NodeId, after: Option<NodeId>, subtree: Tree) {
        self.push(Action::Insert {
            into,
            after,
            subtree,
        });
    }

    /// Delete the subtree rooted at `node`.
    pub fn delete_node(&mut self, node: NodeId) {
        self.push(Action::Delete { node });
    }

    /// Replace the subtree rooted at `node` with `replacement`.
    pub fn replace_node(&mut self, node: NodeId, replacement: Tree) {
        self.push(Action::Replace { node, replacement });
    }

    /// Append every action of `other`.
    pub fn extend(&mut self, other: ActionList) {
        self.actions.extend(other.actions);
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if there are no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate over the actions in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Actions that turn the left tree of `mapping` into `right`: insertions
    /// first, then replacements, then deletions.
    pub fn from_mapping(mapping: &Mapping, right: &Tree) -> Self {
        let mut actions = Self::new();
        for insertion in mapping.insertions() {
            actions.insert_node_after(
                insertion.into,
                insertion.after,
                right.subtree(insertion.node),
            );
        }
        for &(left, replacement) in mapping.replaced() {
            actions.replace_node(left, right.subtree(replacement));
        }
        for &left in mapping.deleted() {
            actions.delete_node(left);
        }
        actions
    }

    /// Apply the actions to `source`, producing a difference tree.
    pub fn to_difference_tree(&self, source: &Tree) -> DifferenceTree {
        DifferenceTree::from_actions(source, self)
    }
}

impl<'a> IntoIterator for &'a ActionList {
    type Item = &'a Action;
    type IntoIter = core::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
