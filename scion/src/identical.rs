//! Groups of nodes that carry the same type and data.

use indextree::NodeId;
use rapidhash::RapidHashMap as HashMap;

use crate::tree::Tree;

/// Find nodes that share both type name and data with at least one other
/// node. Nodes with empty data are ignored. Groups are ordered by their first
/// member, members are in pre-order.
pub fn find_identical(tree: &Tree) -> Vec<Vec<NodeId>> {
    let mut groups: Vec<Vec<NodeId>> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::default();

    for id in tree.iter() {
        let data = tree.get(id);
        if data.data.is_empty() {
            continue;
        }
        let key = (data.type_name(), data.data.as_str());
        let group = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(id);
    }

    groups.retain(|group| group.len() > 1);
    groups
}
