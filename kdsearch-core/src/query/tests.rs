use kdsearch_test_support::fixtures::{brute_force_neighbours, lattice_cloud, uniform_cloud};
use proptest::prelude::*;
use rstest::{fixture, rstest};

use super::{Neighbour, Traversal};
use crate::{
    KdError, KdTree,
    test_utils::{dims, signature, suite_proptest_config, tree_from},
    tree::BuildMode,
};

const ALL_TRAVERSALS: [Traversal; 3] = [Traversal::Recursive, Traversal::Iterative, Traversal::Parallel];

#[fixture]
fn scenario_tree() -> KdTree {
    tree_from(
        &[
            (vec![1.0, 1.0], 0),
            (vec![2.0, 2.0], 1),
            (vec![3.0, 3.0], 0),
            (vec![8.0, 8.0], 1),
        ],
        2,
        BuildMode::Sequential,
    )
}

#[rstest]
#[case::recursive(Traversal::Recursive)]
#[case::iterative(Traversal::Iterative)]
#[case::parallel(Traversal::Parallel)]
fn finds_the_two_nearest_points(scenario_tree: KdTree, #[case] traversal: Traversal) {
    let nearest = scenario_tree
        .query_with(&[2.0, 3.0], 2, traversal)
        .expect("query must succeed");
    assert_eq!(nearest.len(), 2);
    assert_eq!((nearest[0].ordinal, nearest[0].label), (1, 1));
    assert!((nearest[0].distance - 1.0).abs() < 1e-12);
    assert_eq!((nearest[1].ordinal, nearest[1].label), (2, 0));
    // (3,3) is as close as (2,2); the earlier ordinal ranks first.
    assert!((nearest[1].distance - 1.0).abs() < 1e-12);
}

#[rstest]
#[case::recursive(Traversal::Recursive)]
#[case::iterative(Traversal::Iterative)]
#[case::parallel(Traversal::Parallel)]
fn oversized_k_returns_every_point_sorted(scenario_tree: KdTree, #[case] traversal: Traversal) {
    let nearest = scenario_tree
        .query_with(&[0.0, 0.0], 10, traversal)
        .expect("query must succeed");
    let ordinals: Vec<u64> = nearest.iter().map(|n| n.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3]);
    assert!(nearest.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
}

#[rstest]
fn zero_k_returns_nothing(scenario_tree: KdTree) {
    for traversal in ALL_TRAVERSALS {
        let nearest = scenario_tree
            .query_with(&[2.0, 3.0], 0, traversal)
            .expect("k=0 is not an error");
        assert!(nearest.is_empty());
    }
}

#[test]
fn empty_tree_returns_nothing() {
    let tree = KdTree::empty(dims(2));
    for traversal in ALL_TRAVERSALS {
        let nearest = tree.query_with(&[0.0, 0.0], 3, traversal).expect("empty tree is valid");
        assert!(nearest.is_empty());
    }
}

#[rstest]
#[case::short(&[1.0], KdError::DimensionMismatch { expected: 2, actual: 1 })]
#[case::long(&[1.0, 2.0, 3.0], KdError::DimensionMismatch { expected: 2, actual: 3 })]
#[case::infinite(&[f64::NEG_INFINITY, 0.0], KdError::NonFiniteCoordinate { index: 0, value: f64::NEG_INFINITY })]
fn rejects_malformed_targets(scenario_tree: KdTree, #[case] target: &[f64], #[case] expected: KdError) {
    assert_eq!(scenario_tree.query(target, 1).expect_err("must fail"), expected);
}

#[test]
fn target_validation_precedes_the_empty_tree_shortcut() {
    let tree = KdTree::empty(dims(2));
    assert!(matches!(
        tree.query(&[0.0], 1),
        Err(KdError::DimensionMismatch { .. })
    ));
}

#[test]
fn single_point_is_always_nearest() {
    let tree = tree_from(&[(vec![4.0, -2.0, 1.0], 3)], 3, BuildMode::Sequential);
    for target in [[0.0, 0.0, 0.0], [100.0, 100.0, -100.0], [4.0, -2.0, 1.0]] {
        let nearest = tree.query(&target, 5).expect("query must succeed");
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].label, 3);
    }
}

#[test]
fn equal_distances_prefer_earlier_points() {
    // Four points equidistant from the origin.
    let tree = tree_from(
        &[
            (vec![1.0, 0.0], 0),
            (vec![0.0, 1.0], 1),
            (vec![-1.0, 0.0], 2),
            (vec![0.0, -1.0], 3),
        ],
        2,
        BuildMode::Sequential,
    );
    for traversal in ALL_TRAVERSALS {
        let nearest = tree.query_with(&[0.0, 0.0], 2, traversal).expect("query must succeed");
        let ordinals: Vec<u64> = nearest.iter().map(|n| n.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1], "{traversal:?}");
    }
}

#[test]
fn deep_insert_chains_are_searchable_iteratively() {
    let tree = KdTree::empty(dims(1));
    for step in 0..5_000_i32 {
        tree.insert(crate::Point::new(vec![f64::from(step)], 0))
            .expect("insert must succeed");
    }
    let nearest = tree
        .query_with(&[4_999.0], 1, Traversal::Iterative)
        .expect("query must succeed");
    assert_eq!(nearest[0].ordinal, 4_999);
}

#[test]
fn neighbours_order_by_distance_then_ordinal() {
    let near = Neighbour { ordinal: 9, label: 0, distance: 0.5 };
    let tie_early = Neighbour { ordinal: 1, label: 0, distance: 1.0 };
    let tie_late = Neighbour { ordinal: 2, label: 1, distance: 1.0 };
    let mut shuffled = vec![tie_late, near, tie_early];
    shuffled.sort_unstable();
    assert_eq!(shuffled, vec![near, tie_early, tie_late]);
}

proptest! {
    #![proptest_config(suite_proptest_config(64))]

    #[test]
    fn traversals_match_exhaustive_search(
        seed in any::<u64>(),
        count in 0usize..200,
        dimensions in 1usize..4,
        k in 0usize..20,
        lattice in any::<bool>(),
    ) {
        let records = if lattice {
            lattice_cloud(seed, count, dimensions, 5)
        } else {
            uniform_cloud(seed, count, dimensions, 50.0, 3)
        };
        let target: Vec<f64> = uniform_cloud(seed ^ 0x5eed, 1, dimensions, 50.0, 1)
            .remove(0)
            .0
            .into_iter()
            .map(|value| if lattice { value.round().clamp(-1.0, 6.0) } else { value })
            .collect();
        let tree = tree_from(&records, dimensions, BuildMode::Parallel);

        let expected: Vec<(u64, u64)> = brute_force_neighbours(&records, &target, k)
            .iter()
            .map(|n| (n.index, n.distance.to_bits()))
            .collect();
        for traversal in ALL_TRAVERSALS {
            let nearest = tree.query_with(&target, k, traversal).expect("query must succeed");
            prop_assert_eq!(nearest.len(), k.min(count));
            prop_assert_eq!(&signature(&nearest), &expected);
        }
    }
}
