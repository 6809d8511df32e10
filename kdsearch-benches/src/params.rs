//! Benchmark parameter types used as Criterion benchmark identifiers.

use std::fmt;

/// Parameters for a construction benchmark run.
#[derive(Clone, Debug)]
pub struct BuildBenchParams {
    /// Number of points in the dataset.
    pub point_count: usize,
    /// Construction mode label.
    pub mode: &'static str,
}

impl fmt::Display for BuildBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},mode={}", self.point_count, self.mode)
    }
}

/// Parameters for a query benchmark run.
#[derive(Clone, Debug)]
pub struct QueryBenchParams {
    /// Number of points in the dataset.
    pub point_count: usize,
    /// Neighbours requested per query.
    pub neighbours: usize,
    /// Traversal or worker-count label.
    pub variant: String,
}

impl fmt::Display for QueryBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={},k={},{}",
            self.point_count, self.neighbours, self.variant
        )
    }
}
