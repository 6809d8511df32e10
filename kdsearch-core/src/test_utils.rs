//! Shared test utilities for `kdsearch-core`.

use std::num::NonZeroUsize;

use kdsearch_test_support::{ci::property_test_profile::ProptestRunProfile, fixtures::Record};
use proptest::test_runner::Config as ProptestConfig;

use crate::{
    point::Point,
    query::Neighbour,
    tree::{BuildMode, KdTree},
};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// Keeps property suites aligned on the same `PROGTEST_CASES` and
/// `KDSEARCH_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

pub(crate) fn dims(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).expect("test dimensionality must be non-zero")
}

pub(crate) fn points_from(records: &[Record]) -> Vec<Point> {
    records
        .iter()
        .map(|(features, label)| Point::new(features.clone(), *label))
        .collect()
}

pub(crate) fn tree_from(records: &[Record], dimensions: usize, mode: BuildMode) -> KdTree {
    KdTree::build(points_from(records), dims(dimensions), mode).expect("fixture points are valid")
}

/// Projects neighbours onto `(ordinal, distance bits)` for exact comparison.
pub(crate) fn signature(neighbours: &[Neighbour]) -> Vec<(u64, u64)> {
    neighbours
        .iter()
        .map(|n| (n.ordinal, n.distance.to_bits()))
        .collect()
}
