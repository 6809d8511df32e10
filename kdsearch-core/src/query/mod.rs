//! Exact k-nearest-neighbour search over a [`KdTree`].
//!
//! All traversals share one branch-and-bound rule: visit a node, descend the
//! side of its splitting plane that holds the target, then cross the plane
//! only while the candidate list has room or the plane is no farther than the
//! current worst candidate. Results are ordered by `(distance, ordinal)`, so
//! every traversal returns the same list.

mod candidates;
mod iterative;
mod parallel;
mod recursive;

use std::cmp::Ordering;

use tracing::warn;

pub(crate) use self::candidates::CandidateList;

use crate::{
    KdTree, Result,
    distance::{euclidean_distance, plane_distance},
    point::{Label, Ordinal, validate_vector},
    telemetry,
    tree::Node,
};

/// A point returned by a nearest-neighbour query.
#[derive(Clone, Copy, Debug)]
pub struct Neighbour {
    /// Ingestion-order index of the matched point.
    pub ordinal: Ordinal,
    /// Label of the matched point.
    pub label: Label,
    /// Euclidean distance from the query target.
    pub distance: f64,
}

impl Neighbour {
    fn compare(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.ordinal.cmp(&other.ordinal))
    }
}

impl Eq for Neighbour {}

impl PartialEq for Neighbour {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Ord for Neighbour {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Neighbour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Selects how a query walks the tree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Traversal {
    /// Depth-first recursion; stack depth grows with tree height.
    #[default]
    Recursive,
    /// Depth-first walk over an explicit stack.
    Iterative,
    /// Sibling subtrees searched as concurrent tasks sharing one locked list.
    Parallel,
}

impl KdTree {
    /// Returns the `k` stored points closest to `target`, nearest first.
    ///
    /// Equivalent to [`KdTree::query_with`] using [`Traversal::Recursive`].
    ///
    /// # Errors
    /// See [`KdTree::query_with`].
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use kdsearch_core::{BuildMode, KdTree, Point};
    ///
    /// let points = vec![
    ///     Point::new(vec![1.0, 1.0], 0),
    ///     Point::new(vec![2.0, 2.0], 1),
    ///     Point::new(vec![3.0, 3.0], 0),
    ///     Point::new(vec![8.0, 8.0], 1),
    /// ];
    /// let tree = KdTree::build(points, NonZeroUsize::new(2).expect("non-zero"), BuildMode::Sequential)?;
    /// let nearest = tree.query(&[2.0, 3.0], 2)?;
    /// assert_eq!(nearest[0].label, 1);
    /// assert!((nearest[0].distance - 1.0).abs() < 1e-12);
    /// assert_eq!(nearest[1].label, 0);
    /// # Ok::<(), kdsearch_core::KdError>(())
    /// ```
    pub fn query(&self, target: &[f64], k: usize) -> Result<Vec<Neighbour>> {
        self.query_with(target, k, Traversal::Recursive)
    }

    /// Returns the `k` stored points closest to `target` using `traversal`.
    ///
    /// Returns `min(k, len)` neighbours sorted by ascending distance, with
    /// equal distances ordered by ordinal. An empty tree or `k == 0` yields an
    /// empty list without visiting any node.
    ///
    /// # Errors
    /// Returns [`KdError::DimensionMismatch`](crate::KdError::DimensionMismatch)
    /// when `target` does not have [`KdTree::dimensions`] coordinates,
    /// [`KdError::NonFiniteCoordinate`](crate::KdError::NonFiniteCoordinate)
    /// when a coordinate is NaN or infinite, and
    /// [`KdError::LockPoisoned`](crate::KdError::LockPoisoned) if a parallel
    /// task panicked while holding the candidate list.
    pub fn query_with(
        &self,
        target: &[f64],
        k: usize,
        traversal: Traversal,
    ) -> Result<Vec<Neighbour>> {
        let dimensions = self.dimensions().get();
        validate_vector(target, dimensions)?;

        let Some(root) = self.root() else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let search = Search { target, dimensions };
        match traversal {
            Traversal::Recursive => {
                let mut list = CandidateList::new(k);
                recursive::search(&search, root, 0, &mut list);
                Ok(list.into_vec())
            }
            Traversal::Iterative => Ok(iterative::search(&search, root, k)),
            Traversal::Parallel => parallel::search(&search, root, k),
        }
    }
}

/// Query state shared by the traversals.
pub(crate) struct Search<'t> {
    target: &'t [f64],
    dimensions: usize,
}

/// The two children of a visited node, ordered by proximity to the target.
pub(crate) struct Split<'n> {
    near: Option<&'n Node>,
    far: Option<&'n Node>,
    plane_distance: f64,
}

impl Search<'_> {
    /// Scores `node` against the target.
    ///
    /// A node whose distance cannot be computed is logged and skipped; the
    /// walk continues through its children.
    fn score(&self, node: &Node) -> Option<Neighbour> {
        telemetry::record_nodes_visited(1);
        match euclidean_distance(self.target, node.point().features()) {
            Ok(distance) => Some(Neighbour {
                ordinal: node.ordinal(),
                label: node.point().label(),
                distance: distance.value(),
            }),
            Err(error) => {
                warn!(ordinal = node.ordinal(), %error, "skipping node with unusable features");
                None
            }
        }
    }

    fn split<'n>(&self, node: &'n Node, depth: usize) -> Split<'n> {
        let axis = depth % self.dimensions;
        let coordinate = self.target[axis];
        let (near, far) = node.branch(coordinate, axis);
        Split {
            near: near.load(),
            far: far.load(),
            plane_distance: plane_distance(coordinate, node.point().coordinate(axis)),
        }
    }
}

#[cfg(test)]
mod tests;
