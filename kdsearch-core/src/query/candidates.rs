//! Bounded, sorted candidate list used by every traversal and by the merge.

use super::Neighbour;

/// Keeps the best `capacity` neighbours seen so far, in ascending order.
#[derive(Clone, Debug)]
pub(crate) struct CandidateList {
    capacity: usize,
    items: Vec<Neighbour>,
}

impl CandidateList {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
        }
    }

    #[rustfmt::skip]
    pub(crate) fn is_full(&self) -> bool { self.items.len() >= self.capacity }

    #[rustfmt::skip]
    pub(crate) fn worst(&self) -> Option<&Neighbour> { self.items.last() }

    /// Inserts `candidate` at its sorted position, dropping whatever falls
    /// past the capacity. Returns whether the candidate was kept.
    pub(crate) fn offer(&mut self, candidate: Neighbour) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.is_full() && self.worst().is_some_and(|worst| candidate >= *worst) {
            return false;
        }
        let position = self.items.partition_point(|held| *held < candidate);
        self.items.insert(position, candidate);
        self.items.truncate(self.capacity);
        true
    }

    /// Whether a subtree whose splitting plane lies `plane_distance` away may
    /// still hold a point that belongs in the list.
    ///
    /// Equality admits the subtree so equal-distance points can still win on
    /// ordinal.
    pub(crate) fn admits(&self, plane_distance: f64) -> bool {
        match self.worst() {
            Some(worst) if self.is_full() => plane_distance <= worst.distance,
            _ => self.capacity > 0,
        }
    }

    pub(crate) fn into_vec(self) -> Vec<Neighbour> {
        self.items
    }
}
