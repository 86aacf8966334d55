//! Applying patterns to source trees.

use scion::Tree;

use crate::debug;
use crate::matcher::PatternMatcher;
use crate::pattern::Pattern;

/// Something that rewrites a source tree according to a pattern.
pub trait Patcher {
    /// The patched tree; a copy of `source` if the pattern does not apply.
    fn patch(&self, source: &Tree, pattern: &Pattern) -> Tree;
}

/// Matches the pattern everywhere in the source, collects the actions of all
/// matches and returns the "after" side of the resulting difference tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPatcher;

impl Patcher for DefaultPatcher {
    fn patch(&self, source: &Tree, pattern: &Pattern) -> Tree {
        let mut matcher = PatternMatcher::new(source);
        let matched = matcher.match_pattern(pattern);
        if matched.is_empty() {
            debug!("pattern does not apply");
            return source.clone();
        }
        let actions = matcher.into_action_list();
        debug!(
            matched = matched.len(),
            actions = actions.len(),
            "applying pattern"
        );
        actions.to_difference_tree(source).after()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::NodeRef;
    use crate::DifferenceTree;
    use facet_testhelpers::test;
    use scion::MappingConfig;

    fn parse(text: &str) -> Tree {
        Tree::from_description(text).unwrap()
    }

    fn literal_bump() -> Pattern {
        let before = parse(r#"Stmt(Add(Var<"a">, Int<"1">))"#);
        let after = parse(r#"Stmt(Add(Var<"a">, Int<"2">))"#);
        let diff = DifferenceTree::build(&before, &after, &MappingConfig::default());
        let mut pattern = Pattern::from_diff(&diff);
        let var = before.find_first(|d| d.type_name() == "Var").unwrap();
        assert!(pattern.make_hole(NodeRef::Source(var), 1));
        pattern
    }

    #[test]
    fn test_no_match_returns_source() {
        let source = parse(r#"Block(Stmt(Sub(Var<"b">, Int<"1">)))"#);
        let patched = DefaultPatcher.patch(&source, &literal_bump());
        assert_eq!(patched, source);
    }

    #[test]
    fn test_every_match_is_patched() {
        let source = parse(
            r#"Block(Stmt(Add(Var<"b">, Int<"1">)), Stmt(Add(Var<"c">, Int<"1">)), Stmt(Add(Var<"d">, Int<"7">)))"#,
        );
        let patched = DefaultPatcher.patch(&source, &literal_bump());
        assert_eq!(
            patched.to_string(),
            r#"Block(Stmt(Add(Var<"b">, Int<"2">)), Stmt(Add(Var<"c">, Int<"2">)), Stmt(Add(Var<"d">, Int<"7">)))"#
        );
    }

    #[test]
    fn test_pattern_without_actions_changes_nothing() {
        let source = parse(r#"Stmt(Add(Var<"a">, Int<"1">))"#);
        let pattern = Pattern::from_tree(&source);
        assert_eq!(DefaultPatcher.patch(&source, &pattern), source);
    }
}
