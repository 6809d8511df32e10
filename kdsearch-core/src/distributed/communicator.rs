//! Message-passing seam between distributed workers.

use std::ops::Range;

use crate::{CollectiveError, query::Neighbour};

/// Collective operations a distributed query needs from its runtime.
///
/// One value represents one participant. Every participant must call each
/// collective in the same order with the same `root`; the root receives the
/// gathered data and every other rank receives `None`.
///
/// Implementations may be backed by threads, processes, or hosts. Any failure
/// to complete a collective is reported as a [`CollectiveError`] and ends the
/// query that issued it.
pub trait Communicator {
    /// Rank of this participant, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of participants.
    fn size(&self) -> usize;

    /// Gathers one count per rank on `root`, indexed by rank.
    ///
    /// # Errors
    /// Returns a [`CollectiveError`] when a participant is missing or the
    /// exchange is malformed.
    fn gather_count(
        &mut self,
        root: usize,
        count: usize,
    ) -> Result<Option<Vec<usize>>, CollectiveError>;

    /// Gathers every rank's candidates on `root` into one buffer, placing
    /// each rank's contribution at the offsets described by `layout`.
    ///
    /// `layout` is required on the root and ignored elsewhere.
    ///
    /// # Errors
    /// Returns a [`CollectiveError`] when a participant is missing, a
    /// contribution disagrees with its announced count, or the root has no
    /// layout.
    fn gather_candidates(
        &mut self,
        root: usize,
        local: &[Neighbour],
        layout: Option<&GatherLayout>,
    ) -> Result<Option<Vec<Neighbour>>, CollectiveError>;
}

/// Receive counts and displacements for a variable-length gather.
///
/// # Examples
/// ```
/// use kdsearch_core::GatherLayout;
///
/// let layout = GatherLayout::from_counts(vec![2, 0, 3]);
/// assert_eq!(layout.total(), 5);
/// assert_eq!(layout.counts(), &[2, 0, 3]);
/// assert_eq!(layout.slot(0), Some(0..2));
/// assert_eq!(layout.slot(1), Some(2..2));
/// assert_eq!(layout.slot(2), Some(2..5));
/// assert_eq!(layout.slot(3), None);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GatherLayout {
    counts: Vec<usize>,
    displacements: Vec<usize>,
    total: usize,
}

impl GatherLayout {
    /// Computes displacements as the exclusive prefix sum of `counts`.
    #[must_use]
    pub fn from_counts(counts: Vec<usize>) -> Self {
        let mut total = 0;
        let displacements = counts
            .iter()
            .map(|count| {
                let offset = total;
                total += count;
                offset
            })
            .collect();
        Self {
            counts,
            displacements,
            total,
        }
    }

    /// Number of ranks described by the layout.
    #[must_use]
    #[rustfmt::skip]
    pub fn participants(&self) -> usize { self.counts.len() }

    /// Total number of gathered elements.
    #[must_use]
    #[rustfmt::skip]
    pub fn total(&self) -> usize { self.total }

    /// Per-rank counts.
    #[must_use]
    #[rustfmt::skip]
    pub fn counts(&self) -> &[usize] { &self.counts }

    /// Buffer range reserved for `rank`.
    #[must_use]
    pub fn slot(&self, rank: usize) -> Option<Range<usize>> {
        let start = *self.displacements.get(rank)?;
        let count = *self.counts.get(rank)?;
        Some(start..start + count)
    }
}
