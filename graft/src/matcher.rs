//! Matching a pattern against a target tree.

use indextree::NodeId;
use rapidhash::RapidHashMap as HashMap;
use scion::{HashedTree, NodeHash, Tree};
use smallvec::SmallVec;

use crate::action::{Action, ActionKind, ActionList};
use crate::pattern::{Pattern, PatternItem};
#[allow(unused_imports)]
use crate::{debug, trace};

/// Bindings and actions of one candidate root. Discarded unless the whole
/// pattern matches there.
#[derive(Default)]
struct Attempt {
    holes: HashMap<u32, NodeHash>,
    actions: ActionList,
}

/// Finds where a pattern matches in a target tree and collects the actions
/// the pattern's markers imply at those places.
pub struct PatternMatcher<'t> {
    target: HashedTree<'t>,
    actions: ActionList,
}

impl<'t> PatternMatcher<'t> {
    /// Matcher over `target`.
    pub fn new(target: &'t Tree) -> Self {
        Self {
            target: HashedTree::new(target),
            actions: ActionList::new(),
        }
    }

    /// Every target node, in pre-order, at which `pattern` matches.
    pub fn match_pattern(&mut self, pattern: &Pattern) -> Vec<NodeId> {
        let mut matched = Vec::new();
        for candidate in self.target.tree().iter() {
            let mut attempt = Attempt::default();
            if self.check(pattern, pattern.root(), candidate, &mut attempt) {
                trace!(node = usize::from(candidate), "pattern matched");
                matched.push(candidate);
                self.actions.extend(attempt.actions);
            }
        }
        debug!(
            matched = matched.len(),
            actions = self.actions.len(),
            "match_pattern done"
        );
        matched
    }

    /// Actions gathered by every successful match so far.
    pub fn action_list(&self) -> &ActionList {
        &self.actions
    }

    /// Give up the matcher and keep the actions.
    pub fn into_action_list(self) -> ActionList {
        self.actions
    }

    /// Check the pattern below `item` against the target below `node`.
    ///
    /// Items and actions are handled through an explicit list of steps in
    /// pattern pre-order, so the actions come out in the same order as a
    /// depth-first walk would produce them.
    fn check(&self, pattern: &Pattern, item: NodeId, node: NodeId, attempt: &mut Attempt) -> bool {
        let mut steps = vec![Step::Check(item, node)];
        while let Some(step) = steps.pop() {
            let (item, node) = match step {
                Step::Check(item, node) => (item, node),
                Step::Record(action) => {
                    attempt.actions.push(action);
                    continue;
                }
            };
            let matched = match pattern.get(item) {
                PatternItem::Hole { number, .. } => {
                    let hash = self.target.absolute_hash(node);
                    match attempt.holes.get(number) {
                        Some(&bound) => bound == hash,
                        None => {
                            attempt.holes.insert(*number, hash);
                            true
                        }
                    }
                }
                PatternItem::Node { data, .. } => {
                    self.target.data(node).same_shape(data)
                        && self.plan_children(pattern, item, node, &mut steps)
                }
                PatternItem::Action { kind, .. } => {
                    self.plan_action(pattern, item, *kind, node, &mut steps)
                }
            };
            if !matched {
                return false;
            }
        }
        true
    }

    fn plan_action(
        &self,
        pattern: &Pattern,
        item: NodeId,
        kind: ActionKind,
        node: NodeId,
        steps: &mut Vec<Step>,
    ) -> bool {
        let mut contents = pattern.children(item);
        let Some(before) = contents.next() else {
            return false;
        };
        let action = match kind {
            // an insert has no counterpart in the target
            ActionKind::Insert => return false,
            ActionKind::Delete => Action::Delete { node },
            ActionKind::Replace => {
                let Some(replacement) = contents.next().and_then(|a| pattern.subtree(a)) else {
                    return false;
                };
                Action::Replace { node, replacement }
            }
        };
        steps.push(Step::Record(action));
        steps.push(Step::Check(before, node));
        true
    }

    fn plan_children(
        &self,
        pattern: &Pattern,
        item: NodeId,
        node: NodeId,
        steps: &mut Vec<Step>,
    ) -> bool {
        let targets = self.target.children(node);
        let mut next = 0;
        let mut planned: SmallVec<[Step; 4]> = SmallVec::new();

        for child in pattern.children(item) {
            if let PatternItem::Action {
                kind: ActionKind::Insert,
                ..
            } = pattern.get(child)
            {
                let Some(subtree) = pattern.children(child).next().and_then(|c| pattern.subtree(c))
                else {
                    return false;
                };
                let after = next.checked_sub(1).map(|i| targets[i]);
                planned.push(Step::Record(Action::Insert {
                    into: node,
                    after,
                    subtree,
                }));
                continue;
            }

            let Some(&target) = targets.get(next) else {
                return false;
            };
            planned.push(Step::Check(child, target));
            next += 1;
        }

        if next != targets.len() {
            return false;
        }
        steps.extend(planned.into_iter().rev());
        true
    }
}

/// Pending work while checking one candidate.
enum Step {
    Check(NodeId, NodeId),
    Record(Action),
}
