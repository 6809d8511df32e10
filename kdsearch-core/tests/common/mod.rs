use kdsearch_core::{ExecutionStrategy, KdSearch, KdSearchBuilder, Point};
use kdsearch_test_support::fixtures::Record;

/// The four labelled points used by the worked examples.
#[must_use]
pub fn scenario_points() -> Vec<Point> {
    vec![
        Point::new(vec![1.0, 1.0], 0),
        Point::new(vec![2.0, 2.0], 1),
        Point::new(vec![3.0, 3.0], 0),
        Point::new(vec![8.0, 8.0], 1),
    ]
}

#[must_use]
pub fn points(records: &[Record]) -> Vec<Point> {
    records
        .iter()
        .map(|(features, label)| Point::new(features.clone(), *label))
        .collect()
}

#[must_use]
pub fn search(neighbours: usize, strategy: ExecutionStrategy) -> KdSearch {
    KdSearchBuilder::new()
        .with_neighbours(neighbours)
        .with_execution_strategy(strategy)
        .build()
        .expect("configuration must be valid")
}
