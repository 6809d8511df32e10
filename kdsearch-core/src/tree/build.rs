//! Median-split tree construction.

use super::node::Node;
use crate::point::{Ordinal, Point};

/// Recursion depth below which sibling subtrees are built as separate tasks.
pub(crate) const PARALLEL_BUILD_DEPTH: usize = 3;

/// Selects sequential or fork-join construction.
///
/// Both modes produce the same tree shape for the same input.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BuildMode {
    /// Build every subtree on the calling thread.
    #[default]
    Sequential,
    /// Build sibling subtrees concurrently down to a fixed depth.
    Parallel,
}

impl BuildMode {
    fn fork_depth(self) -> usize {
        match self {
            Self::Sequential => 0,
            Self::Parallel => PARALLEL_BUILD_DEPTH,
        }
    }
}

pub(crate) struct Entry {
    point: Point,
    ordinal: Ordinal,
}

/// Tags points with consecutive ordinals starting at `first`.
pub(crate) fn entries(points: Vec<Point>, first: Ordinal) -> Vec<Entry> {
    points
        .into_iter()
        .zip(first..)
        .map(|(point, ordinal)| Entry { point, ordinal })
        .collect()
}

pub(crate) fn build_subtree(
    entries: Vec<Entry>,
    dimensions: usize,
    mode: BuildMode,
) -> Option<Box<Node>> {
    split(entries, 0, dimensions, mode.fork_depth())
}

fn split(
    mut entries: Vec<Entry>,
    depth: usize,
    dimensions: usize,
    fork_depth: usize,
) -> Option<Box<Node>> {
    if entries.is_empty() {
        return None;
    }

    let axis = depth % dimensions;
    let median = entries.len() / 2;
    entries.select_nth_unstable_by(median, |a, b| {
        a.point.coordinate(axis).total_cmp(&b.point.coordinate(axis))
    });
    let right = entries.split_off(median + 1);
    let pivot = entries.pop()?;
    let left = entries;

    let (left, right) = if depth < fork_depth {
        rayon::join(
            || split(left, depth + 1, dimensions, fork_depth),
            || split(right, depth + 1, dimensions, fork_depth),
        )
    } else {
        (
            split(left, depth + 1, dimensions, fork_depth),
            split(right, depth + 1, dimensions, fork_depth),
        )
    };

    Some(Box::new(Node::with_children(
        pivot.point,
        pivot.ordinal,
        left,
        right,
    )))
}
