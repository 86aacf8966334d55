use divan::{Bencher, black_box};
use graft::{DefaultPatcher, DifferenceTree, NodeRef, Patcher, Pattern};
use scion::{MappingConfig, NodeData, Tree, map_trees};

fn main() {
    divan::main();
}

/// A module of `functions` functions, each with a few statements; `bump`
/// changes one literal per function.
fn module(functions: usize, bump: bool) -> Tree {
    let mut tree = Tree::new(NodeData::draft("Module", ""));
    for f in 0..functions {
        let func = tree.add_child(tree.root, NodeData::draft("Fn", format!("f{f}")));
        let body = tree.add_child(func, NodeData::draft("Body", ""));
        for s in 0..4 {
            let stmt = tree.add_child(body, NodeData::draft("Stmt", ""));
            let add = tree.add_child(stmt, NodeData::draft("Add", ""));
            tree.add_child(add, NodeData::draft("Var", format!("v{s}")));
            let literal = if bump && s == 2 { s + 100 } else { s };
            tree.add_child(add, NodeData::draft("Int", literal.to_string()));
        }
    }
    tree
}

// Mapping benchmarks: decorate both trees + map
#[divan::bench(args = [10, 100, 1000])]
fn map_modules(bencher: Bencher, functions: usize) {
    let left = module(functions, false);
    let right = module(functions, true);
    let config = MappingConfig::default();
    bencher.bench_local(|| {
        let mapping = map_trees(black_box(&left), black_box(&right), &config);
        black_box(mapping);
    });
}

// Many look-alike siblings force the best-pair search
#[divan::bench(args = [false, true])]
fn map_ambiguous_siblings(bencher: Bencher, parallel_trials: bool) {
    let mut left = Tree::new(NodeData::draft("List", ""));
    let mut right = Tree::new(NodeData::draft("List", ""));
    for i in 0..24 {
        let item = left.add_child(left.root, NodeData::draft("Item", ""));
        left.add_child(item, NodeData::draft("Value", i.to_string()));
        let item = right.add_child(right.root, NodeData::draft("Item", ""));
        right.add_child(item, NodeData::draft("Value", (i * 7 % 24).to_string()));
        right.add_child(item, NodeData::draft("Extra", ""));
    }
    let config = MappingConfig {
        parallel_trials,
        parallel_threshold: 16,
    };
    bencher.bench_local(|| {
        let mapping = map_trees(black_box(&left), black_box(&right), &config);
        black_box(mapping);
    });
}

// Full cycle: learn a pattern from a small example, patch a large module
#[divan::bench(args = [10, 100, 1000])]
fn patch_module(bencher: Bencher, functions: usize) {
    let before = Tree::from_description(r#"Stmt(Add(Var<"v2">, Int<"2">))"#).unwrap();
    let after = Tree::from_description(r#"Stmt(Add(Var<"v2">, Int<"102">))"#).unwrap();
    let diff = DifferenceTree::build(&before, &after, &MappingConfig::default());
    let mut pattern = Pattern::from_diff(&diff);
    let var = before.find_first(|d| d.type_name() == "Var").unwrap();
    pattern.make_hole(NodeRef::Source(var), 1);

    let source = module(functions, false);
    bencher.bench_local(|| {
        let patched = DefaultPatcher.patch(black_box(&source), black_box(&pattern));
        black_box(patched);
    });
}
