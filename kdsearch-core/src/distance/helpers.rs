//! Shared helpers for distance implementations.

use super::types::{DistanceError, Result, Vector};

/// Ensures both vectors share the same dimensionality.
pub(crate) fn validate_dimensions(left: &Vector<'_>, right: &Vector<'_>) -> Result<()> {
    if left.dimension() != right.dimension() {
        return Err(DistanceError::DimensionMismatch {
            left: left.dimension(),
            right: right.dimension(),
        });
    }
    Ok(())
}

/// Distance from `coordinate` to the splitting plane at `split`.
#[inline]
pub(crate) fn plane_distance(coordinate: f64, split: f64) -> f64 {
    (coordinate - split).abs()
}
