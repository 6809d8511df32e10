//! Seeded synthetic point sets for benchmarking.

use kdsearch_core::Point;
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Errors that may occur while generating benchmark points.
#[derive(Debug, thiserror::Error)]
pub enum SyntheticError {
    /// The requested point count was zero.
    #[error("point count must be greater than zero")]
    ZeroPoints,
    /// The requested dimension count was zero.
    #[error("dimension count must be greater than zero")]
    ZeroDimensions,
    /// The requested cluster count was zero.
    #[error("cluster count must be greater than zero")]
    ZeroClusters,
    /// A floating-point generator parameter was invalid.
    #[error("invalid floating-point parameter `{parameter}`")]
    InvalidFloatParameter {
        /// Name of the invalid parameter.
        parameter: &'static str,
    },
}

/// Uniform random points in the unit hypercube with a single label.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Number of points to generate.
    pub point_count: usize,
    /// Dimensionality of each point.
    pub dimensions: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// Isotropic Gaussian-like clusters labelled by cluster index.
#[derive(Clone, Debug)]
pub struct BlobConfig {
    /// Number of points to generate.
    pub point_count: usize,
    /// Dimensionality of each point.
    pub dimensions: usize,
    /// Number of clusters; each cluster is its own label.
    pub cluster_count: usize,
    /// Half-width of the box centroids are drawn from.
    pub separation: f64,
    /// Half-width of the box each point is drawn from around its centroid.
    pub spread: f64,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// Generates uniform random points in `[0.0, 1.0)`, all labelled `0`.
///
/// # Errors
/// Returns [`SyntheticError`] when the configuration is invalid.
pub fn uniform_points(config: &SyntheticConfig) -> Result<Vec<Point>, SyntheticError> {
    validate_counts(config.point_count, config.dimensions)?;
    let mut rng = SmallRng::seed_from_u64(config.seed);
    Ok((0..config.point_count)
        .map(|_| {
            let features = (0..config.dimensions).map(|_| rng.gen_range(0.0..1.0)).collect();
            Point::new(features, 0)
        })
        .collect())
}

/// Generates clustered points; point `i` belongs to cluster `i % cluster_count`.
///
/// # Errors
/// Returns [`SyntheticError`] when the configuration is invalid.
#[expect(
    clippy::float_arithmetic,
    reason = "points are offset from their centroid"
)]
pub fn blob_points(config: &BlobConfig) -> Result<Vec<Point>, SyntheticError> {
    validate_counts(config.point_count, config.dimensions)?;
    if config.cluster_count == 0 {
        return Err(SyntheticError::ZeroClusters);
    }
    for (parameter, value) in [("separation", config.separation), ("spread", config.spread)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(SyntheticError::InvalidFloatParameter { parameter });
        }
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let centroids: Vec<Vec<f64>> = (0..config.cluster_count)
        .map(|_| {
            (0..config.dimensions)
                .map(|_| rng.gen_range(-config.separation..config.separation))
                .collect()
        })
        .collect();

    Ok(centroids
        .iter()
        .zip(0_i64..)
        .cycle()
        .take(config.point_count)
        .map(|(centroid, label)| {
            let features = centroid
                .iter()
                .map(|centre| centre + rng.gen_range(-config.spread..config.spread))
                .collect();
            Point::new(features, label)
        })
        .collect())
}

const fn validate_counts(point_count: usize, dimensions: usize) -> Result<(), SyntheticError> {
    if point_count == 0 {
        return Err(SyntheticError::ZeroPoints);
    }
    if dimensions == 0 {
        return Err(SyntheticError::ZeroDimensions);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{BlobConfig, SyntheticConfig, SyntheticError, blob_points, uniform_points};

    fn blobs(cluster_count: usize, spread: f64) -> BlobConfig {
        BlobConfig {
            point_count: 12,
            dimensions: 3,
            cluster_count,
            separation: 10.0,
            spread,
            seed: 5,
        }
    }

    #[test]
    fn uniform_points_are_reproducible() {
        let config = SyntheticConfig {
            point_count: 20,
            dimensions: 4,
            seed: 9,
        };
        let first = uniform_points(&config).expect("config is valid");
        assert_eq!(first.len(), 20);
        assert!(first.iter().all(|point| point.dimension() == 4));
        assert_eq!(first, uniform_points(&config).expect("config is valid"));
    }

    #[test]
    fn blob_labels_cycle_through_clusters() {
        let points = blob_points(&blobs(3, 0.5)).expect("config is valid");
        let labels: Vec<i64> = points.iter().map(|point| point.label()).collect();
        assert_eq!(labels, vec![0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2]);
    }

    #[rstest]
    #[case::zero_clusters(blobs(0, 0.5), "cluster count must be greater than zero")]
    #[case::negative_spread(blobs(2, -1.0), "invalid floating-point parameter `spread`")]
    #[case::nan_spread(blobs(2, f64::NAN), "invalid floating-point parameter `spread`")]
    fn rejects_invalid_blob_configs(#[case] config: BlobConfig, #[case] message: &str) {
        let err: SyntheticError = blob_points(&config).expect_err("config is invalid");
        assert_eq!(err.to_string(), message);
    }
}
