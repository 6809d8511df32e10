//! Runtime entry point for building indexes and answering queries.
//!
//! [`KdSearch`] carries the validated configuration (neighbour count,
//! requested dimensionality, execution strategy) and applies it consistently
//! to construction, insertion, local queries, and distributed queries.

use std::num::NonZeroUsize;

use tracing::{debug, instrument, warn};

use crate::{
    KdError, Result,
    builder::ExecutionStrategy,
    distributed::{Communicator, Shard, search_shard},
    point::{Ordinal, Point, dataset_dimensions},
    query::Neighbour,
    tree::KdTree,
    vote::Classification,
};

/// Configured nearest-neighbour search runtime.
///
/// # Examples
/// ```
/// use kdsearch_core::{KdSearchBuilder, Point};
///
/// let search = KdSearchBuilder::new().with_neighbours(2).build()?;
/// let tree = search.build_tree(vec![
///     Point::new(vec![1.0, 1.0], 0),
///     Point::new(vec![2.0, 2.0], 1),
///     Point::new(vec![3.0, 3.0], 0),
///     Point::new(vec![8.0, 8.0], 1),
/// ])?;
/// let outcome = search.classify(&tree, &[2.0, 3.0])?;
/// assert_eq!(outcome.neighbours().len(), 2);
/// assert_eq!(outcome.predicted_label(), Some(1));
/// # Ok::<(), kdsearch_core::KdError>(())
/// ```
#[derive(Debug, Clone)]
pub struct KdSearch {
    neighbours: NonZeroUsize,
    dimensions: Option<NonZeroUsize>,
    execution_strategy: ExecutionStrategy,
}

impl KdSearch {
    pub(crate) fn new(
        neighbours: NonZeroUsize,
        dimensions: Option<NonZeroUsize>,
        execution_strategy: ExecutionStrategy,
    ) -> Self {
        Self {
            neighbours,
            dimensions,
            execution_strategy,
        }
    }

    /// Returns the number of neighbours each query returns.
    #[must_use]
    #[rustfmt::skip]
    pub fn neighbours(&self) -> NonZeroUsize { self.neighbours }

    /// Returns the requested dimensionality, if one was configured.
    #[must_use]
    #[rustfmt::skip]
    pub fn dimensions(&self) -> Option<NonZeroUsize> { self.dimensions }

    /// Returns the execution strategy.
    #[must_use]
    #[rustfmt::skip]
    pub fn execution_strategy(&self) -> ExecutionStrategy { self.execution_strategy }

    /// Resolves the dimensionality a tree over `points` will use.
    ///
    /// A request larger than the data's dimensionality (its minimum feature
    /// count) is clamped with a warning. Without a request the data's
    /// dimensionality is used.
    ///
    /// # Errors
    /// Returns [`KdError::InvalidDimensions`] when the dimensionality resolves
    /// to zero, which includes an empty point set without a request.
    pub fn resolve_dimensions(&self, points: &[Point]) -> Result<NonZeroUsize> {
        let available = dataset_dimensions(points);
        let resolved = match (self.dimensions, available) {
            (Some(requested), Some(available)) if requested.get() > available => {
                warn!(
                    requested = requested.get(),
                    available,
                    "requested dimensionality exceeds the data; clamping"
                );
                available
            }
            (Some(requested), _) => requested.get(),
            (None, Some(available)) => available,
            (None, None) => 0,
        };
        NonZeroUsize::new(resolved).ok_or(KdError::InvalidDimensions { got: resolved })
    }

    /// Resolves the dimensionality a distributed query over `target` will use.
    ///
    /// A request longer than `target` is clamped to its length with a
    /// warning. Without a request the target's length is used.
    ///
    /// # Errors
    /// Returns [`KdError::InvalidDimensions`] when `target` is empty.
    pub fn resolve_target_dimensions(&self, target: &[f64]) -> Result<NonZeroUsize> {
        let available = target.len();
        let resolved = match self.dimensions {
            Some(requested) if requested.get() > available => {
                warn!(
                    requested = requested.get(),
                    available,
                    "requested dimensionality exceeds the target; clamping"
                );
                available
            }
            Some(requested) => requested.get(),
            None => available,
        };
        NonZeroUsize::new(resolved).ok_or(KdError::InvalidDimensions { got: resolved })
    }

    /// Builds a tree over `points` using the configured strategy.
    ///
    /// Each point keeps only the first `D` features, where `D` comes from
    /// [`KdSearch::resolve_dimensions`].
    ///
    /// # Errors
    /// Returns [`KdError::InvalidDimensions`] when no dimensionality can be
    /// resolved and [`KdError::NonFiniteCoordinate`] when a kept feature is NaN
    /// or infinite.
    #[instrument(
        name = "core.build_tree",
        err,
        skip(self, points),
        fields(
            points = points.len(),
            requested = ?self.dimensions,
            strategy = ?self.execution_strategy
        ),
    )]
    pub fn build_tree(&self, points: Vec<Point>) -> Result<KdTree> {
        let dimensions = self.resolve_dimensions(&points)?;
        let projected = points
            .into_iter()
            .map(|point| point.projected(dimensions.get()))
            .collect();
        let tree = KdTree::build(projected, dimensions, self.execution_strategy.build_mode())?;
        debug!(
            len = tree.len(),
            height = tree.height(),
            dimensions = dimensions.get(),
            "tree built"
        );
        Ok(tree)
    }

    /// Inserts `point` into a live tree, keeping only its first `D` features.
    ///
    /// # Errors
    /// Returns [`KdError::DimensionMismatch`] when the point has fewer than
    /// [`KdTree::dimensions`] features and [`KdError::NonFiniteCoordinate`]
    /// when a kept feature is NaN or infinite.
    pub fn insert(&self, tree: &KdTree, point: Point) -> Result<Ordinal> {
        tree.insert(point.projected(tree.dimensions().get()))
    }

    /// Returns the configured number of neighbours closest to `target`.
    ///
    /// # Errors
    /// Returns [`KdError::DimensionMismatch`] when `target` does not have
    /// [`KdTree::dimensions`] coordinates, [`KdError::NonFiniteCoordinate`]
    /// when a coordinate is NaN or infinite, and [`KdError::LockPoisoned`] if
    /// a parallel search task panicked.
    #[instrument(
        name = "core.query",
        err,
        skip(self, tree, target),
        fields(
            tree_len = tree.len(),
            k = self.neighbours.get(),
            strategy = ?self.execution_strategy
        ),
    )]
    pub fn query(&self, tree: &KdTree, target: &[f64]) -> Result<Vec<Neighbour>> {
        tree.query_with(
            target,
            self.neighbours.get(),
            self.execution_strategy.traversal(),
        )
    }

    /// Queries `tree` and votes on the labels of the neighbours found.
    ///
    /// # Errors
    /// See [`KdSearch::query`].
    pub fn classify(&self, tree: &KdTree, target: &[f64]) -> Result<Classification> {
        self.query(tree, target).map(Classification::from_neighbours)
    }

    /// Runs this rank's part of a distributed query.
    ///
    /// Builds a tree over `shard`, searches it locally, and merges every
    /// rank's candidates on [`COORDINATOR_RANK`](crate::COORDINATOR_RANK).
    /// All ranks must call this with the same target. The dimensionality
    /// comes from [`KdSearch::resolve_target_dimensions`], so every rank
    /// agrees on it without exchanging shard shapes.
    ///
    /// Returns `Some` on the coordinator and `None` on every other rank.
    ///
    /// # Errors
    /// Returns [`KdError::DimensionMismatch`] when a shard point or the target
    /// is too short, [`KdError::Collective`] when a collective fails, and
    /// any error [`KdSearch::query`] can return. A failure on any rank
    /// surfaces on the coordinator as a collective failure.
    #[instrument(
        name = "core.distributed_query",
        err,
        skip(self, communicator, shard, target),
        fields(
            rank = communicator.rank(),
            workers = communicator.size(),
            shard_len = shard.len(),
            k = self.neighbours.get()
        ),
    )]
    pub fn distributed_query<C: Communicator>(
        &self,
        communicator: &mut C,
        shard: Shard,
        target: &[f64],
    ) -> Result<Option<Classification>> {
        let dimensions = self.resolve_target_dimensions(target)?;
        let first_ordinal = shard.first_ordinal();
        let points = shard
            .into_points()
            .into_iter()
            .map(|point| point.projected(dimensions.get()))
            .collect();
        let tree = KdTree::build_from(
            points,
            dimensions,
            self.execution_strategy.build_mode(),
            first_ordinal,
        )?;
        search_shard(
            communicator,
            &tree,
            target,
            self.neighbours.get(),
            self.execution_strategy.traversal(),
        )
    }
}
