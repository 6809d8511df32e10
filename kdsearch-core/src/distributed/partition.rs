//! Contiguous partitioning of a point set across workers.

use std::{num::NonZeroUsize, ops::Range};

use crate::{
    CollectiveError, Result,
    point::{Ordinal, Point},
};

/// Returns the index range owned by `rank` when `total` points are split
/// across `workers`.
///
/// Every rank receives `total / workers` points in rank order and the last
/// rank also absorbs the remainder, so a rank may own no points at all.
///
/// # Errors
/// Returns [`CollectiveError::InvalidRank`] when `rank >= workers`.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use kdsearch_core::shard_range;
///
/// let workers = NonZeroUsize::new(3).expect("non-zero");
/// assert_eq!(shard_range(10, 0, workers)?, 0..3);
/// assert_eq!(shard_range(10, 2, workers)?, 6..10);
/// assert_eq!(shard_range(2, 1, workers)?, 0..0);
/// # Ok::<(), kdsearch_core::CollectiveError>(())
/// ```
pub fn shard_range(
    total: usize,
    rank: usize,
    workers: NonZeroUsize,
) -> core::result::Result<Range<usize>, CollectiveError> {
    let workers = workers.get();
    if rank >= workers {
        return Err(CollectiveError::InvalidRank { rank, size: workers });
    }
    let per_worker = total / workers;
    let start = rank * per_worker;
    let end = if rank + 1 == workers { total } else { start + per_worker };
    Ok(start..end)
}

/// The slice of the point set owned by one worker.
///
/// A shard remembers the global ordinal of its first point so that matches
/// found on different workers can be told apart and ordered consistently.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shard {
    first_ordinal: Ordinal,
    points: Vec<Point>,
}

impl Shard {
    /// Creates a shard whose first point has the global ordinal `first_ordinal`.
    #[must_use]
    pub fn new(first_ordinal: Ordinal, points: Vec<Point>) -> Self {
        Self {
            first_ordinal,
            points,
        }
    }

    /// Copies out the shard that `rank` owns.
    ///
    /// # Errors
    /// Returns [`KdError::Collective`](crate::KdError::Collective) wrapping
    /// [`CollectiveError::InvalidRank`] when `rank >= workers`.
    pub fn carve(points: &[Point], rank: usize, workers: NonZeroUsize) -> Result<Self> {
        let range = shard_range(points.len(), rank, workers)?;
        Ok(Self::new(range.start as Ordinal, points[range].to_vec()))
    }

    /// Splits `points` into one shard per worker, in rank order.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use kdsearch_core::{Point, Shard};
    ///
    /// let points: Vec<Point> = (0..5).map(|i| Point::new(vec![f64::from(i)], 0)).collect();
    /// let shards = Shard::split(points, NonZeroUsize::new(2).expect("non-zero"));
    /// assert_eq!(shards.iter().map(Shard::len).collect::<Vec<_>>(), vec![2, 3]);
    /// assert_eq!(shards[1].first_ordinal(), 2);
    /// ```
    #[must_use]
    pub fn split(mut points: Vec<Point>, workers: NonZeroUsize) -> Vec<Self> {
        let total = points.len();
        let mut shards: Vec<Self> = (0..workers.get())
            .rev()
            .filter_map(|rank| shard_range(total, rank, workers).ok())
            .map(|range| Self::new(range.start as Ordinal, points.split_off(range.start)))
            .collect();
        shards.reverse();
        shards
    }

    /// Global ordinal of the first point in the shard.
    #[must_use]
    #[rustfmt::skip]
    pub fn first_ordinal(&self) -> Ordinal { self.first_ordinal }

    /// Points owned by the shard.
    #[must_use]
    #[rustfmt::skip]
    pub fn points(&self) -> &[Point] { &self.points }

    /// Number of points owned by the shard.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.points.len() }

    /// Whether the shard owns no points.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub(crate) fn into_points(self) -> Vec<Point> {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use rstest::rstest;

    use super::{Shard, shard_range};
    use crate::{CollectiveError, point::Point};

    fn workers(count: usize) -> NonZeroUsize {
        NonZeroUsize::new(count).expect("worker count must be non-zero")
    }

    #[rstest]
    #[case::even(12, 4, vec![0..3, 3..6, 6..9, 9..12])]
    #[case::remainder(10, 3, vec![0..3, 3..6, 6..10])]
    #[case::fewer_points_than_workers(2, 4, vec![0..0, 0..0, 0..0, 0..2])]
    #[case::no_points(0, 2, vec![0..0, 0..0])]
    #[case::single_worker(7, 1, vec![0..7])]
    fn ranges_cover_the_input_in_order(
        #[case] total: usize,
        #[case] count: usize,
        #[case] expected: Vec<std::ops::Range<usize>>,
    ) {
        let ranges: Vec<_> = (0..count)
            .map(|rank| shard_range(total, rank, workers(count)).expect("rank is valid"))
            .collect();
        assert_eq!(ranges, expected);
    }

    #[test]
    fn rejects_ranks_outside_the_cluster() {
        assert_eq!(
            shard_range(10, 3, workers(3)),
            Err(CollectiveError::InvalidRank { rank: 3, size: 3 })
        );
    }

    #[test]
    fn split_matches_carve() {
        let points: Vec<Point> = (0..11).map(|i| Point::new(vec![f64::from(i)], i64::from(i))).collect();
        let split = Shard::split(points.clone(), workers(4));
        for (rank, shard) in split.iter().enumerate() {
            let carved = Shard::carve(&points, rank, workers(4)).expect("rank is valid");
            assert_eq!(&carved, shard);
        }
        assert_eq!(split.iter().map(Shard::len).sum::<usize>(), 11);
    }
}
