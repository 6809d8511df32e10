//! Builder utilities for configuring kdsearch runtimes.
//!
//! Exposes the execution strategy selection surface and the validation
//! applied before constructing [`KdSearch`] instances.

use std::num::NonZeroUsize;

use crate::{KdError, Result, query::Traversal, runtime::KdSearch, tree::BuildMode};

/// Selects how [`KdSearch`] spreads work across threads.
///
/// Every strategy returns identical results; they differ only in where the
/// parallelism goes.
///
/// # Examples
/// ```
/// use kdsearch_core::{BuildMode, ExecutionStrategy, Traversal};
///
/// let strategy = ExecutionStrategy::Auto;
/// assert_eq!(strategy.build_mode(), BuildMode::Parallel);
/// assert_eq!(strategy.traversal(), Traversal::Iterative);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Parallel construction with an iterative single-threaded query.
    #[default]
    Auto,
    /// Sequential construction and recursive query.
    Sequential,
    /// Sequential construction and iterative query.
    Iterative,
    /// Parallel construction and parallel query.
    Parallel,
}

impl ExecutionStrategy {
    /// Construction mode used by [`KdSearch::build_tree`].
    #[must_use]
    pub const fn build_mode(self) -> BuildMode {
        match self {
            Self::Auto | Self::Parallel => BuildMode::Parallel,
            Self::Sequential | Self::Iterative => BuildMode::Sequential,
        }
    }

    /// Traversal used by [`KdSearch::query`].
    #[must_use]
    pub const fn traversal(self) -> Traversal {
        match self {
            Self::Sequential => Traversal::Recursive,
            Self::Auto | Self::Iterative => Traversal::Iterative,
            Self::Parallel => Traversal::Parallel,
        }
    }
}

/// Configures and constructs [`KdSearch`] instances.
///
/// # Examples
/// ```
/// use kdsearch_core::{ExecutionStrategy, KdSearchBuilder};
///
/// let search = KdSearchBuilder::new()
///     .with_neighbours(3)
///     .with_dimensions(2)
///     .with_execution_strategy(ExecutionStrategy::Parallel)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(search.neighbours().get(), 3);
/// assert_eq!(search.dimensions().map(|d| d.get()), Some(2));
/// assert_eq!(search.execution_strategy(), ExecutionStrategy::Parallel);
/// ```
#[derive(Debug, Clone)]
pub struct KdSearchBuilder {
    neighbours: usize,
    dimensions: Option<usize>,
    execution_strategy: ExecutionStrategy,
}

impl Default for KdSearchBuilder {
    fn default() -> Self {
        Self {
            neighbours: 5,
            dimensions: None,
            execution_strategy: ExecutionStrategy::Auto,
        }
    }
}

impl KdSearchBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use kdsearch_core::{ExecutionStrategy, KdSearchBuilder};
    ///
    /// let builder = KdSearchBuilder::new();
    /// assert_eq!(builder.neighbours(), 5);
    /// assert_eq!(builder.dimensions(), None);
    /// assert_eq!(builder.execution_strategy(), ExecutionStrategy::Auto);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many neighbours each query returns.
    #[must_use]
    pub fn with_neighbours(mut self, neighbours: usize) -> Self {
        self.neighbours = neighbours;
        self
    }

    /// Returns the configured neighbour count.
    #[must_use]
    pub fn neighbours(&self) -> usize {
        self.neighbours
    }

    /// Requests a dimensionality.
    ///
    /// Points keep only their first `dimensions` features. When the data has
    /// fewer features the request is clamped at build time. Without a request
    /// the data's own dimensionality is used.
    ///
    /// # Examples
    /// ```
    /// use kdsearch_core::KdSearchBuilder;
    ///
    /// let builder = KdSearchBuilder::new().with_dimensions(4);
    /// assert_eq!(builder.dimensions(), Some(4));
    /// ```
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Returns the requested dimensionality, if any.
    #[must_use]
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Sets the execution strategy.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.execution_strategy = strategy;
        self
    }

    /// Returns the currently configured execution strategy.
    #[must_use]
    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.execution_strategy
    }

    /// Validates the configuration and constructs a [`KdSearch`] instance.
    ///
    /// # Errors
    /// Returns [`KdError::InvalidNeighbourCount`] when the neighbour count is
    /// zero and [`KdError::InvalidDimensions`] when a dimensionality of zero
    /// was requested.
    ///
    /// # Examples
    /// ```
    /// use kdsearch_core::{KdError, KdSearchBuilder};
    ///
    /// let err = KdSearchBuilder::new().with_neighbours(0).build().expect_err("k=0 is invalid");
    /// assert_eq!(err, KdError::InvalidNeighbourCount { got: 0 });
    /// ```
    pub fn build(self) -> Result<KdSearch> {
        let neighbours = NonZeroUsize::new(self.neighbours).ok_or(
            KdError::InvalidNeighbourCount {
                got: self.neighbours,
            },
        )?;
        let dimensions = self
            .dimensions
            .map(|requested| {
                NonZeroUsize::new(requested).ok_or(KdError::InvalidDimensions { got: requested })
            })
            .transpose()?;

        Ok(KdSearch::new(neighbours, dimensions, self.execution_strategy))
    }
}
