use std::num::NonZeroUsize;

use kdsearch_test_support::fixtures::{brute_force_neighbours, uniform_cloud};
use rstest::rstest;

use super::{
    COORDINATOR_RANK, ChannelCommunicator, Communicator, GatherLayout, Shard, merge_candidates,
    run_local_cluster, search_shard,
};
use crate::{
    CollectiveError, KdError, KdTree,
    query::{Neighbour, Traversal},
    test_utils::{dims, points_from},
    tree::BuildMode,
};

fn workers(count: usize) -> NonZeroUsize {
    NonZeroUsize::new(count).expect("worker count must be non-zero")
}

fn neighbour(ordinal: u64, label: i64, distance: f64) -> Neighbour {
    Neighbour {
        ordinal,
        label,
        distance,
    }
}

#[test]
fn merge_keeps_the_global_best_and_votes() {
    let gathered = vec![
        neighbour(4, 1, 0.9),
        neighbour(0, 0, 0.2),
        neighbour(7, 1, 0.4),
        neighbour(2, 0, 1.5),
        neighbour(9, 1, 0.3),
    ];
    let merged = merge_candidates(gathered, 3);
    let ordinals: Vec<u64> = merged.neighbours().iter().map(|n| n.ordinal).collect();
    assert_eq!(ordinals, vec![0, 9, 7]);
    assert_eq!(merged.predicted_label(), Some(1));
}

#[test]
fn gather_places_contributions_at_their_displacements() {
    let results = run_local_cluster(workers(3), |mut comm| {
        let rank = comm.rank() as u64;
        let local: Vec<Neighbour> = (0..rank).map(|i| neighbour(rank * 10 + i, 0, 0.0)).collect();
        let counts = comm.gather_count(COORDINATOR_RANK, local.len())?;
        let layout = counts.map(GatherLayout::from_counts);
        comm.gather_candidates(COORDINATOR_RANK, &local, layout.as_ref())
    });

    let buffer = results[0].clone().expect("gather must succeed").expect("root receives");
    let ordinals: Vec<u64> = buffer.iter().map(|n| n.ordinal).collect();
    assert_eq!(ordinals, vec![10, 20, 21]);
    assert_eq!(results[1], Ok(None));
    assert_eq!(results[2], Ok(None));
}

#[test]
fn vanished_rank_is_reported_as_missing() {
    let mut cluster = ChannelCommunicator::cluster(workers(3));
    let absent = cluster.pop().expect("rank 2 exists");
    drop(absent);
    let mut iter = cluster.into_iter();
    let mut root = iter.next().expect("rank 0 exists");
    let mut present = iter.next().expect("rank 1 exists");

    assert_eq!(present.gather_count(COORDINATOR_RANK, 0), Ok(None));
    drop(present);
    assert_eq!(
        root.gather_count(COORDINATOR_RANK, 0),
        Err(CollectiveError::MissingParticipant { rank: 2 })
    );
}

#[test]
fn contribution_disagreeing_with_its_count_is_rejected() {
    let results = run_local_cluster(workers(2), |mut comm| {
        // Rank 1 announces two candidates but sends one.
        let local = vec![neighbour(comm.rank() as u64, 0, 1.0)];
        let announced = if comm.rank() == 1 { 2 } else { 1 };
        let counts = comm.gather_count(COORDINATOR_RANK, announced)?;
        let layout = counts.map(GatherLayout::from_counts);
        comm.gather_candidates(COORDINATOR_RANK, &local, layout.as_ref())
    });
    assert_eq!(
        results[0],
        Err(CollectiveError::CountMismatch {
            rank: 1,
            announced: 2,
            received: 1,
        })
    );
}

#[rstest]
#[case::gather_count(true)]
#[case::gather_candidates(false)]
fn root_outside_the_cluster_is_rejected(#[case] counting: bool) {
    let mut cluster = ChannelCommunicator::cluster(workers(2));
    let comm = &mut cluster[0];
    let err = if counting {
        comm.gather_count(5, 0).map(|_| ())
    } else {
        comm.gather_candidates(5, &[], None).map(|_| ())
    };
    assert_eq!(err, Err(CollectiveError::InvalidRank { rank: 5, size: 2 }));
}

#[test]
fn root_gather_requires_a_layout() {
    let mut cluster = ChannelCommunicator::cluster(workers(1));
    assert_eq!(
        cluster[0].gather_candidates(COORDINATOR_RANK, &[], None),
        Err(CollectiveError::MissingLayout)
    );
}

#[rstest]
#[case::one_worker(1)]
#[case::three_workers(3)]
#[case::more_workers_than_points(12)]
fn shard_search_matches_exhaustive_search(#[case] count: usize) {
    let records = uniform_cloud(21, 10, 2, 10.0, 3);
    let points = points_from(&records);
    let target = [0.5, -1.0];
    let k = 4;

    let results = run_local_cluster(workers(count), |mut comm| {
        let shard = Shard::carve(&points, comm.rank(), workers(count))?;
        let first = shard.first_ordinal();
        let tree = KdTree::build_from(shard.into_points(), dims(2), BuildMode::Sequential, first)?;
        search_shard(&mut comm, &tree, &target, k, Traversal::Iterative)
    });

    let merged = results[0].clone().expect("query must succeed").expect("coordinator answers");
    let expected: Vec<u64> = brute_force_neighbours(&records, &target, k)
        .iter()
        .map(|n| n.index)
        .collect();
    let ordinals: Vec<u64> = merged.neighbours().iter().map(|n| n.ordinal).collect();
    assert_eq!(ordinals, expected);
    assert!(results[1..].iter().all(|result| matches!(result, Ok(None))));
}

#[test]
fn failing_worker_aborts_the_query_on_the_coordinator() {
    let results = run_local_cluster(workers(2), |mut comm| {
        let tree = KdTree::empty(dims(2));
        // Rank 1 passes a malformed target and never joins the collectives.
        let target: &[f64] = if comm.rank() == 1 { &[0.0] } else { &[0.0, 0.0] };
        search_shard(&mut comm, &tree, target, 3, Traversal::Recursive)
    });
    assert!(matches!(results[1], Err(KdError::DimensionMismatch { .. })));
    assert_eq!(
        results[0].as_ref().err().and_then(KdError::collective_code),
        Some(crate::CollectiveErrorCode::MissingParticipant)
    );
}
