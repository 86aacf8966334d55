//! Difference trees: a source tree overlaid with insert, delete and replace
//! markers.
//!
//! An `Insert` item has one child (the new subtree), a `Delete` item has one
//! child (the removed subtree) and a `Replace` item has two (before, after).
//! Every other item is an ordinary node. Projecting the tree on either side
//! yields the tree before or after the edits.

use core::fmt;

use indextree::{Arena, NodeId};
use rapidhash::{RapidHashMap as HashMap, RapidHashSet as HashSet};
use scion::draft::{write_description, write_label};
use scion::{MappingConfig, NodeData, SubtreeMode, Tree, map_trees};

use crate::action::{Action, ActionKind, ActionList};
use crate::tracing_macros::warn;
#[allow(unused_imports)]
use crate::{debug, trace};

/// One item of a [`DifferenceTree`].
#[derive(Debug, Clone)]
pub enum DiffItem {
    /// An ordinary node
    Node {
        /// Node payload
        data: NodeData,
        /// The source node this item was copied from, if any
        prototype: Option<NodeId>,
    },
    /// An action marker
    Action(ActionKind),
}

impl DiffItem {
    /// Payload of an ordinary node.
    pub fn data(&self) -> Option<&NodeData> {
        match self {
            DiffItem::Node { data, .. } => Some(data),
            DiffItem::Action(_) => None,
        }
    }

    /// Kind of an action marker.
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            DiffItem::Node { .. } => None,
            DiffItem::Action(kind) => Some(*kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

/// A source tree with edits applied as markers.
#[derive(Clone)]
pub struct DifferenceTree {
    arena: Arena<DiffItem>,
    root: NodeId,
}

struct Materializer<'a> {
    source: &'a Tree,
    arena: Arena<DiffItem>,
    deleted: HashSet<NodeId>,
    replaced: HashMap<NodeId, &'a Tree>,
    inserts: HashMap<(NodeId, Option<NodeId>), Vec<&'a Tree>>,
    applied_inserts: usize,
}

impl<'a> Materializer<'a> {
    fn new(source: &'a Tree, actions: &'a ActionList) -> Self {
        let mut deleted = HashSet::default();
        let mut replaced = HashMap::default();
        let mut inserts: HashMap<_, Vec<&'a Tree>> = HashMap::default();
        for action in actions {
            match action {
                Action::Insert {
                    into,
                    after,
                    subtree,
                } => inserts.entry((*into, *after)).or_default().push(subtree),
                Action::Delete { node } if *node == source.root => {
                    warn!("dropping delete of the source root");
                }
                Action::Delete { node } => {
                    deleted.insert(*node);
                }
                Action::Replace { node, replacement } => {
                    replaced.insert(*node, replacement);
                }
            }
        }
        Self {
            source,
            arena: Arena::new(),
            deleted,
            replaced,
            inserts,
            applied_inserts: 0,
        }
    }

    fn node(&mut self, data: NodeData, prototype: Option<NodeId>) -> NodeId {
        self.arena.new_node(DiffItem::Node { data, prototype })
    }

    /// Copy a plain subtree under `parent`.
    fn copy(&mut self, parent: NodeId, tree: &Tree, id: NodeId, from_source: bool) {
        let mut stack = vec![(id, parent)];
        while let Some((src, dst_parent)) = stack.pop() {
            let prototype = from_source.then_some(src);
            let copied = self.node(tree.get(src).clone(), prototype);
            dst_parent.append(copied, &mut self.arena);
            stack.extend(tree.children(src).map(|c| (c, copied)).rev());
        }
    }

    fn marker(&mut self, kind: ActionKind) -> NodeId {
        self.arena.new_node(DiffItem::Action(kind))
    }

    /// Emit the whole source tree below `root`, walking it with an explicit
    /// stack of ordinary items whose children are still to come.
    fn emit(&mut self, root: NodeId) -> NodeId {
        let source = self.source;
        let (item, open) = self.emit_one(root);
        let mut stack = Vec::new();
        if open {
            stack.push((root, item));
        }
        while let Some((id, item)) = stack.pop() {
            self.emit_inserts(item, id, None);
            for child in source.children(id) {
                let (emitted, open) = self.emit_one(child);
                item.append(emitted, &mut self.arena);
                self.emit_inserts(item, id, Some(child));
                if open {
                    stack.push((child, emitted));
                }
            }
        }
        item
    }

    /// The item standing for a source node: a marker that already holds its
    /// contents, or an ordinary node whose children are still open (`true`).
    fn emit_one(&mut self, id: NodeId) -> (NodeId, bool) {
        let source = self.source;
        if let Some(replacement) = self.replaced.get(&id).copied() {
            let marker = self.marker(ActionKind::Replace);
            self.copy(marker, source, id, true);
            self.copy(marker, replacement, replacement.root, false);
            return (marker, false);
        }
        if self.deleted.contains(&id) {
            let marker = self.marker(ActionKind::Delete);
            self.copy(marker, source, id, true);
            return (marker, false);
        }
        (self.node(source.get(id).clone(), Some(id)), true)
    }

    fn emit_inserts(&mut self, item: NodeId, into: NodeId, after: Option<NodeId>) {
        let Some(subtrees) = self.inserts.get(&(into, after)).cloned() else {
            return;
        };
        for subtree in subtrees {
            let marker = self.marker(ActionKind::Insert);
            self.copy(marker, subtree, subtree.root, false);
            item.append(marker, &mut self.arena);
            self.applied_inserts += 1;
        }
    }
}

impl DifferenceTree {
    /// Apply `actions` to `source`.
    ///
    /// Actions inside a deleted or replaced subtree are dropped, a later
    /// replace of a node wins over an earlier one, inserts sharing an anchor
    /// keep their order and a delete of the source root is dropped.
    pub fn from_actions(source: &Tree, actions: &ActionList) -> Self {
        let mut materializer = Materializer::new(source, actions);
        let root = materializer.emit(source.root);

        let requested: usize = materializer.inserts.values().map(Vec::len).sum();
        if materializer.applied_inserts < requested {
            warn!(
                dropped = requested - materializer.applied_inserts,
                "dropping inserts with unreachable anchors"
            );
        }
        debug!(actions = actions.len(), "difference tree built");

        Self {
            arena: materializer.arena,
            root,
        }
    }

    /// Map `left` onto `right` and turn the result into a difference tree.
    pub fn build(left: &Tree, right: &Tree, config: &MappingConfig) -> Self {
        let mapping = map_trees(left, right, config);
        ActionList::from_mapping(&mapping, right).to_difference_tree(left)
    }

    /// Root item.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// An item.
    pub fn get(&self, id: NodeId) -> &DiffItem {
        self.arena[id].get()
    }

    /// Children of an item, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Parent of an item.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// All items in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root.descendants(&self.arena)
    }

    /// Source node an item was copied from.
    pub fn prototype(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id) {
            DiffItem::Node { prototype, .. } => *prototype,
            DiffItem::Action(_) => None,
        }
    }

    /// All action markers, in pre-order.
    pub fn actions(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter(|&id| self.get(id).action().is_some())
    }

    /// True if the tree carries at least one action marker.
    pub fn has_actions(&self) -> bool {
        self.actions().next().is_some()
    }

    /// The tree before the edits.
    pub fn before(&self) -> Tree {
        self.project(Side::Before)
    }

    /// The tree after the edits.
    pub fn after(&self) -> Tree {
        self.project(Side::After)
    }

    /// The ordinary node that stands for `id` on the given side, if any.
    fn resolve(&self, id: NodeId, side: Side) -> Option<NodeId> {
        match self.get(id) {
            DiffItem::Node { .. } => Some(id),
            DiffItem::Action(ActionKind::Insert) => match side {
                Side::Before => None,
                Side::After => self.children(id).next(),
            },
            DiffItem::Action(ActionKind::Delete) => match side {
                Side::Before => self.children(id).next(),
                Side::After => None,
            },
            DiffItem::Action(ActionKind::Replace) => match side {
                Side::Before => self.children(id).next(),
                Side::After => self.children(id).nth(1),
            },
        }
    }

    fn data(&self, id: NodeId) -> NodeData {
        match self.get(id) {
            DiffItem::Node { data, .. } => data.clone(),
            // never reached: resolve() only yields ordinary nodes
            DiffItem::Action(kind) => NodeData::draft(kind.to_string(), ""),
        }
    }

    fn project(&self, side: Side) -> Tree {
        let root = self
            .resolve(self.root, side)
            .expect("difference tree root should exist on both sides");
        let mut tree = Tree::new(self.data(root));
        let mut stack = vec![(root, tree.root)];
        while let Some((item, parent)) = stack.pop() {
            for child in self.children(item) {
                if let Some(node) = self.resolve(child, side) {
                    let id = tree.add_child(parent, self.data(node));
                    stack.push((node, id));
                }
            }
        }
        tree
    }

    /// Copy the tree, keeping or dropping the listed items. A dropped item
    /// takes its whole subtree with it, action markers included; `None` if
    /// the root is dropped.
    pub fn extract(&self, items: &HashSet<NodeId>, mode: SubtreeMode) -> Option<DifferenceTree> {
        let keeps = |id: &NodeId| match mode {
            SubtreeMode::Include => items.contains(id),
            SubtreeMode::Exclude => !items.contains(id),
        };
        if !keeps(&self.root) {
            return None;
        }
        let mut arena = Arena::new();
        let root = arena.new_node(self.get(self.root).clone());
        let mut stack = vec![(self.root, root)];
        while let Some((src, dst)) = stack.pop() {
            for child in self.children(src).filter(|c| keeps(c)) {
                let copied = arena.new_node(self.get(child).clone());
                dst.append(copied, &mut arena);
                stack.push((child, copied));
            }
        }
        Some(DifferenceTree { arena, root })
    }

    fn write_item(&self, out: &mut String, id: NodeId) {
        write_description(
            out,
            id,
            |out, id| match self.get(id) {
                DiffItem::Node { data, .. } => write_label(out, data),
                DiffItem::Action(kind) => out.push_str(&kind.to_string()),
            },
            |id| self.children(id),
        );
    }
}

impl fmt::Display for DifferenceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_item(&mut out, self.root);
        f.write_str(&out)
    }
}

impl fmt::Debug for DifferenceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DifferenceTree({self})")
    }
}
