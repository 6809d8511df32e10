//! Labelled feature vectors ingested by the index.

use crate::{KdError, Result};

/// Integer class label attached to every point.
pub type Label = i64;

/// Ingestion-order index of a point, used to identify matches and break
/// distance ties.
pub type Ordinal = u64;

/// A labelled feature vector.
///
/// # Examples
/// ```
/// use kdsearch_core::Point;
///
/// let point = Point::new(vec![1.0, 2.0], 7);
/// assert_eq!(point.dimension(), 2);
/// assert_eq!(point.label(), 7);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    features: Vec<f64>,
    label: Label,
}

impl Point {
    /// Creates a point from its features and label.
    #[must_use]
    pub fn new(features: Vec<f64>, label: Label) -> Self {
        Self { features, label }
    }

    /// Returns the feature vector.
    #[must_use]
    #[rustfmt::skip]
    pub fn features(&self) -> &[f64] { &self.features }

    /// Returns the class label.
    #[must_use]
    #[rustfmt::skip]
    pub fn label(&self) -> Label { self.label }

    /// Number of features carried by the point.
    #[must_use]
    #[rustfmt::skip]
    pub fn dimension(&self) -> usize { self.features.len() }

    /// Keeps only the first `dimensions` features.
    ///
    /// Points that already have `dimensions` or fewer features are returned
    /// unchanged.
    ///
    /// # Examples
    /// ```
    /// use kdsearch_core::Point;
    ///
    /// let point = Point::new(vec![1.0, 2.0, 3.0], 0).projected(2);
    /// assert_eq!(point.features(), &[1.0, 2.0]);
    /// ```
    #[must_use]
    pub fn projected(mut self, dimensions: usize) -> Self {
        self.features.truncate(dimensions);
        self
    }

    /// Splits the point into its features and label.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Label) {
        (self.features, self.label)
    }

    /// Coordinate on `axis`; callers guarantee `axis < dimension()`.
    #[inline]
    pub(crate) fn coordinate(&self, axis: usize) -> f64 {
        self.features[axis]
    }

    /// Checks that the point carries exactly `dimensions` finite features.
    pub(crate) fn validate(&self, dimensions: usize) -> Result<()> {
        validate_vector(&self.features, dimensions)
    }
}

/// Returns the dimensionality of a point set: the minimum feature count
/// observed, or `None` when the set is empty.
///
/// # Examples
/// ```
/// use kdsearch_core::{Point, dataset_dimensions};
///
/// let points = vec![Point::new(vec![1.0, 2.0, 3.0], 0), Point::new(vec![4.0, 5.0], 1)];
/// assert_eq!(dataset_dimensions(&points), Some(2));
/// assert_eq!(dataset_dimensions(&[]), None);
/// ```
#[must_use]
pub fn dataset_dimensions(points: &[Point]) -> Option<usize> {
    points.iter().map(Point::dimension).min()
}

/// Checks that `values` holds exactly `dimensions` finite coordinates.
pub(crate) fn validate_vector(values: &[f64], dimensions: usize) -> Result<()> {
    if values.len() != dimensions {
        return Err(KdError::DimensionMismatch {
            expected: dimensions,
            actual: values.len(),
        });
    }
    match values.iter().position(|value| !value.is_finite()) {
        Some(index) => Err(KdError::NonFiniteCoordinate {
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Point, dataset_dimensions, validate_vector};
    use crate::KdError;

    #[rstest]
    #[case::exact(&[1.0, 2.0], 2, None)]
    #[case::short(&[1.0], 2, Some(KdError::DimensionMismatch { expected: 2, actual: 1 }))]
    #[case::long(&[1.0, 2.0, 3.0], 2, Some(KdError::DimensionMismatch { expected: 2, actual: 3 }))]
    #[case::infinite(
        &[1.0, f64::INFINITY],
        2,
        Some(KdError::NonFiniteCoordinate { index: 1, value: f64::INFINITY }),
    )]
    fn validates_vectors(
        #[case] values: &[f64],
        #[case] dimensions: usize,
        #[case] expected: Option<KdError>,
    ) {
        assert_eq!(validate_vector(values, dimensions).err(), expected);
    }

    #[test]
    fn nan_coordinates_are_rejected() {
        let err = validate_vector(&[f64::NAN], 1).expect_err("NaN must be rejected");
        assert!(matches!(err, KdError::NonFiniteCoordinate { index: 0, .. }));
    }

    #[test]
    fn dimensionality_is_the_minimum_feature_count() {
        let points = vec![
            Point::new(vec![1.0, 2.0, 3.0], 0),
            Point::new(vec![1.0], 1),
            Point::new(vec![1.0, 2.0], 2),
        ];
        assert_eq!(dataset_dimensions(&points), Some(1));
    }

    #[test]
    fn projection_keeps_short_points_intact() {
        let point = Point::new(vec![4.0], 3).projected(5);
        assert_eq!(point.features(), &[4.0]);
        assert_eq!(point.label(), 3);
    }
}
