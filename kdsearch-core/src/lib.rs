//! kdsearch core library: KD-tree indexing and exact k-nearest-neighbour search.
//!
//! The crate builds balanced KD-trees over labelled points (sequentially or
//! with fork-join parallelism), accepts concurrent lock-free inserts, answers
//! exact KNN queries through recursive, iterative, or parallel traversals, and
//! runs a partition/search/merge protocol across message-passing workers.
//!
//! # Ordering
//!
//! Neighbours are ranked by distance, then by ordinal (the point's position in
//! ingestion order). Every traversal and the distributed merge return the same
//! list for the same data.
//!
//! # Metrics
//!
//! With the `metrics` feature enabled the crate emits these counters:
//!
//! - `kd_insert_cas_retries`
//! - `kd_query_nodes_visited`
//! - `kd_query_subtrees_pruned`
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod distance;
mod distributed;
mod error;
mod point;
mod query;
mod runtime;
mod telemetry;
mod tree;
mod vote;

#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::{ExecutionStrategy, KdSearchBuilder},
    distance::{Distance, DistanceError, VectorKind, euclidean_distance},
    distributed::{
        COORDINATOR_RANK, ChannelCommunicator, Communicator, GatherLayout, Shard,
        run_local_cluster, shard_range,
    },
    error::{CollectiveError, CollectiveErrorCode, CollectivePhase, KdError, KdErrorCode, Result},
    point::{Label, Ordinal, Point, dataset_dimensions},
    query::{Neighbour, Traversal},
    runtime::KdSearch,
    tree::{AxisRuleViolation, BoundSide, BuildMode, KdTree, NodeView},
    vote::{Classification, majority_label},
};
