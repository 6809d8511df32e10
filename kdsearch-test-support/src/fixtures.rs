//! Seeded point clouds and a brute-force nearest-neighbour oracle.
//!
//! The fixtures work on plain `(features, label)` records so every crate in
//! the workspace can convert them into its own point type.

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// A labelled feature vector as produced by the fixtures.
pub type Record = (Vec<f64>, i64);

/// A neighbour reported by [`brute_force_neighbours`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OracleNeighbour {
    /// Index of the record in the input slice.
    pub index: u64,
    /// Label of the record.
    pub label: i64,
    /// Euclidean distance from the target.
    pub distance: f64,
}

/// Draws `count` records with coordinates uniform in `[-extent, extent)` and
/// labels uniform in `0..labels`.
///
/// # Examples
/// ```
/// use kdsearch_test_support::fixtures::uniform_cloud;
///
/// let cloud = uniform_cloud(7, 32, 3, 10.0, 4);
/// assert_eq!(cloud.len(), 32);
/// assert!(cloud.iter().all(|(features, label)| features.len() == 3 && (0..4).contains(label)));
/// assert_eq!(cloud, uniform_cloud(7, 32, 3, 10.0, 4));
/// ```
#[must_use]
pub fn uniform_cloud(seed: u64, count: usize, dimensions: usize, extent: f64, labels: i64) -> Vec<Record> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let features = (0..dimensions).map(|_| rng.gen_range(-extent..extent)).collect();
            (features, rng.gen_range(0..labels.max(1)))
        })
        .collect()
}

/// Draws `count` records whose coordinates are small integers, so duplicate
/// points and equal distances are common.
///
/// # Examples
/// ```
/// use kdsearch_test_support::fixtures::lattice_cloud;
///
/// let cloud = lattice_cloud(3, 64, 2, 3);
/// assert!(cloud.iter().flat_map(|(features, _)| features).all(|value| value.fract() == 0.0));
/// ```
#[must_use]
pub fn lattice_cloud(seed: u64, count: usize, dimensions: usize, side: i32) -> Vec<Record> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let features = (0..dimensions)
                .map(|_| f64::from(rng.gen_range(0..side.max(1))))
                .collect();
            (features, rng.gen_range(0..2))
        })
        .collect()
}

/// Returns the `k` records closest to `target` by exhaustive scan, ordered by
/// distance and then by index.
///
/// Records shorter than the target are compared on their common prefix;
/// callers are expected to pass consistent dimensionality.
///
/// # Examples
/// ```
/// use kdsearch_test_support::fixtures::brute_force_neighbours;
///
/// let records = vec![(vec![0.0, 0.0], 0), (vec![3.0, 4.0], 1), (vec![1.0, 0.0], 2)];
/// let nearest = brute_force_neighbours(&records, &[0.0, 0.0], 2);
/// assert_eq!(nearest.iter().map(|n| n.index).collect::<Vec<_>>(), vec![0, 2]);
/// ```
#[must_use]
pub fn brute_force_neighbours(records: &[Record], target: &[f64], k: usize) -> Vec<OracleNeighbour> {
    let mut scored: Vec<OracleNeighbour> = records
        .iter()
        .zip(0_u64..)
        .map(|((features, label), index)| OracleNeighbour {
            index,
            label: *label,
            distance: euclidean(features, target),
        })
        .collect();
    scored.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
    scored.truncate(k);
    scored
}

fn euclidean(left: &[f64], right: &[f64]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(l, r)| (l - r) * (l - r))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{brute_force_neighbours, lattice_cloud, uniform_cloud};

    #[rstest]
    #[case::fewer_than_available(3, 3)]
    #[case::more_than_available(50, 10)]
    #[case::none(0, 0)]
    fn oracle_truncates_to_k(#[case] k: usize, #[case] expected: usize) {
        let cloud = uniform_cloud(11, 10, 2, 5.0, 3);
        assert_eq!(brute_force_neighbours(&cloud, &[0.0, 0.0], k).len(), expected);
    }

    #[test]
    fn oracle_breaks_ties_by_index() {
        let records = vec![(vec![1.0], 0), (vec![-1.0], 1), (vec![1.0], 2)];
        let nearest = brute_force_neighbours(&records, &[0.0], 3);
        assert_eq!(nearest.iter().map(|n| n.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn lattice_repeats_points() {
        let cloud = lattice_cloud(5, 100, 2, 2);
        let mut distinct: Vec<&Vec<f64>> = cloud.iter().map(|(features, _)| features).collect();
        distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        distinct.dedup();
        assert!(distinct.len() <= 4);
    }
}
