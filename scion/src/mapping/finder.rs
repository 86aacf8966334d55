//! Runs of equal keys in two sequences.

use core::ops::Range;

/// A common run: `count` elements starting at `left_offset` on the left and
/// `right_offset` on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Start in the left sequence
    pub left_offset: usize,
    /// Start in the right sequence
    pub right_offset: usize,
    /// Length of the run, never zero
    pub count: usize,
}

/// Longest contiguous run of equal keys.
///
/// Among runs of maximal length the one with the smallest left offset wins,
/// then the one with the smallest right offset.
pub fn longest_common_run<K: PartialEq>(left: &[K], right: &[K]) -> Option<Run> {
    let mut best: Option<Run> = None;
    // lengths of the runs ending at (i - 1, j - 1)
    let mut previous = vec![0usize; right.len() + 1];
    let mut current = vec![0usize; right.len() + 1];

    for (i, l) in left.iter().enumerate() {
        for (j, r) in right.iter().enumerate() {
            current[j + 1] = if l == r { previous[j] + 1 } else { 0 };
            let count = current[j + 1];
            if count > best.map_or(0, |run| run.count) {
                best = Some(Run {
                    left_offset: i + 1 - count,
                    right_offset: j + 1 - count,
                    count,
                });
            }
        }
        core::mem::swap(&mut previous, &mut current);
    }

    best
}

/// The maximal range around `index` whose keys all equal `keys[index]`.
pub fn band<K: PartialEq>(keys: &[K], index: usize) -> Range<usize> {
    let key = &keys[index];
    let start = keys[..index]
        .iter()
        .rposition(|k| k != key)
        .map_or(0, |p| p + 1);
    let end = keys[index..]
        .iter()
        .position(|k| k != key)
        .map_or(keys.len(), |p| index + p);
    start..end
}
