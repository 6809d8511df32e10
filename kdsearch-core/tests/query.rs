//! End-to-end queries through the `KdSearch` runtime.

mod common;

use common::{points, scenario_points, search};
use kdsearch_core::{ExecutionStrategy, KdError, KdSearchBuilder, Neighbour};
use kdsearch_test_support::fixtures::{brute_force_neighbours, lattice_cloud, uniform_cloud};
use rstest::rstest;

fn ordinals(neighbours: &[Neighbour]) -> Vec<u64> {
    neighbours.iter().map(|n| n.ordinal).collect()
}

#[rstest]
#[case::auto(ExecutionStrategy::Auto)]
#[case::sequential(ExecutionStrategy::Sequential)]
#[case::iterative(ExecutionStrategy::Iterative)]
#[case::parallel(ExecutionStrategy::Parallel)]
fn classifies_the_worked_example(#[case] strategy: ExecutionStrategy) {
    let search = search(2, strategy);
    let tree = search.build_tree(scenario_points()).expect("build must succeed");
    let outcome = search.classify(&tree, &[2.0, 3.0]).expect("query must succeed");

    assert_eq!(ordinals(outcome.neighbours()), vec![1, 2]);
    assert!(outcome.neighbours().iter().all(|n| (n.distance - 1.0).abs() < 1e-12));
    // One vote each; the nearer label wins.
    assert_eq!(outcome.predicted_label(), Some(1));
}

#[rstest]
#[case::auto(ExecutionStrategy::Auto)]
#[case::parallel(ExecutionStrategy::Parallel)]
fn oversized_neighbour_count_returns_everything(#[case] strategy: ExecutionStrategy) {
    let search = search(10, strategy);
    let tree = search.build_tree(scenario_points()).expect("build must succeed");
    let nearest = search.query(&tree, &[0.0, 0.0]).expect("query must succeed");
    assert_eq!(ordinals(&nearest), vec![0, 1, 2, 3]);
}

#[test]
fn empty_point_set_with_requested_dimensions_answers_nothing() {
    let search = KdSearchBuilder::new()
        .with_neighbours(3)
        .with_dimensions(2)
        .build()
        .expect("configuration must be valid");
    let tree = search.build_tree(Vec::new()).expect("an empty tree is valid");
    let outcome = search.classify(&tree, &[0.0, 0.0]).expect("query must succeed");
    assert!(outcome.neighbours().is_empty());
    assert_eq!(outcome.predicted_label(), None);
}

#[test]
fn empty_point_set_without_dimensions_is_rejected() {
    let err = search(3, ExecutionStrategy::Auto)
        .build_tree(Vec::new())
        .expect_err("dimensionality cannot be inferred");
    assert_eq!(err, KdError::InvalidDimensions { got: 0 });
}

#[rstest]
#[case::uniform(uniform_cloud(101, 600, 3, 50.0, 4), vec![1.5, -7.25, 20.0])]
#[case::lattice(lattice_cloud(202, 400, 3, 4), vec![1.0, 2.0, 1.0])]
fn every_strategy_matches_exhaustive_search(
    #[case] records: Vec<(Vec<f64>, i64)>,
    #[case] target: Vec<f64>,
) {
    let expected: Vec<u64> = brute_force_neighbours(&records, &target, 7)
        .iter()
        .map(|n| n.index)
        .collect();
    for strategy in [
        ExecutionStrategy::Auto,
        ExecutionStrategy::Sequential,
        ExecutionStrategy::Iterative,
        ExecutionStrategy::Parallel,
    ] {
        let search = search(7, strategy);
        let tree = search.build_tree(points(&records)).expect("build must succeed");
        let nearest = search.query(&tree, &target).expect("query must succeed");
        assert_eq!(ordinals(&nearest), expected, "strategy {strategy:?}");
    }
}

#[test]
fn target_must_match_the_tree_dimensionality() {
    let search = search(2, ExecutionStrategy::Auto);
    let tree = search.build_tree(scenario_points()).expect("build must succeed");
    assert_eq!(
        search.query(&tree, &[1.0, 2.0, 3.0]),
        Err(KdError::DimensionMismatch { expected: 2, actual: 3 })
    );
}
