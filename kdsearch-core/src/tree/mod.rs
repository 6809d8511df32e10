//! KD-tree storage, construction, and lock-free insertion.
//!
//! A [`KdTree`] partitions labelled points by alternating axis: a node at
//! depth `d` splits on `d % D`. Construction places the median of each subset
//! at the root of its subtree, so freshly built trees are balanced. Further
//! points can be added concurrently with [`KdTree::insert`].

mod build;
mod inspect;
mod insert;
mod node;


use std::{
    fmt,
    num::NonZeroUsize,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};

pub use self::build::BuildMode;
pub use self::inspect::{AxisRuleViolation, BoundSide, NodeView};
pub(crate) use self::node::Node;

use self::node::Slot;
use crate::{
    Result,
    point::{Ordinal, Point},
};

/// A k-dimensional binary search tree over labelled points.
///
/// The tree records its dimensionality `D`; every stored point carries
/// exactly `D` finite features. Nodes are append-only: once reachable, a node
/// is never moved or mutated, which lets queries run alongside inserts.
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
/// ];
/// let tree = KdTree::build(points, NonZeroUsize::new(2).expect("non-zero"), BuildMode::Parallel)?;
/// assert_eq!(tree.len(), 3);
/// assert_eq!(tree.height(), 2);
/// # Ok::<(), kdsearch_core::KdError>(())
/// ```
pub struct KdTree {
    root: Slot,
    dimensions: NonZeroUsize,
    len: AtomicUsize,
    next_ordinal: AtomicU64,
}

impl KdTree {
    /// Creates a tree with no points.
    #[must_use]
    pub fn empty(dimensions: NonZeroUsize) -> Self {
        Self::from_root(None, dimensions, 0, 0)
    }

    /// Builds a balanced tree over `points`, assigning ordinals in input order.
    ///
    /// # Errors
    /// Returns [`KdError::DimensionMismatch`](crate::KdError::DimensionMismatch)
    /// when a point does not carry exactly `dimensions` features and
    /// [`KdError::NonFiniteCoordinate`](crate::KdError::NonFiniteCoordinate)
    /// when a feature is NaN or infinite.
    pub fn build(points: Vec<Point>, dimensions: NonZeroUsize, mode: BuildMode) -> Result<Self> {
        Self::build_from(points, dimensions, mode, 0)
    }

    /// Builds a tree whose ordinals start at `first_ordinal`.
    pub(crate) fn build_from(
        points: Vec<Point>,
        dimensions: NonZeroUsize,
        mode: BuildMode,
        first_ordinal: Ordinal,
    ) -> Result<Self> {
        for point in &points {
            point.validate(dimensions.get())?;
        }
        let len = points.len();
        let next_ordinal = first_ordinal + len as u64;
        let root = build::build_subtree(
            build::entries(points, first_ordinal),
            dimensions.get(),
            mode,
        );
        Ok(Self::from_root(root, dimensions, len, next_ordinal))
    }

    fn from_root(
        root: Option<Box<Node>>,
        dimensions: NonZeroUsize,
        len: usize,
        next_ordinal: Ordinal,
    ) -> Self {
        Self {
            root: Slot::from_option(root),
            dimensions,
            len: AtomicUsize::new(len),
            next_ordinal: AtomicU64::new(next_ordinal),
        }
    }

    /// Returns the number of points stored, including completed inserts.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.len.load(Ordering::Acquire) }

    /// Returns whether the tree stores no points.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Returns the dimensionality every stored point shares.
    #[must_use]
    #[rustfmt::skip]
    pub fn dimensions(&self) -> NonZeroUsize { self.dimensions }

    pub(crate) fn root(&self) -> Option<&Node> {
        self.root.load()
    }
}

impl fmt::Debug for KdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KdTree")
            .field("dimensions", &self.dimensions)
            .field("len", &self.len())
            .field("root", &self.root)
            .finish()
    }
}
