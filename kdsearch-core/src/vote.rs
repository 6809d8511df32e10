//! Majority-vote classification over a neighbour list.

use crate::{point::Label, query::Neighbour};

/// Nearest neighbours of a target together with their majority label.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    neighbours: Vec<Neighbour>,
    predicted_label: Option<Label>,
}

impl Classification {
    /// Tallies the labels of `neighbours`, which should already be sorted.
    #[must_use]
    pub fn from_neighbours(neighbours: Vec<Neighbour>) -> Self {
        let predicted_label = majority_label(&neighbours);
        Self {
            neighbours,
            predicted_label,
        }
    }

    /// Neighbours ordered nearest first.
    #[must_use]
    #[rustfmt::skip]
    pub fn neighbours(&self) -> &[Neighbour] { &self.neighbours }

    /// Majority label, or `None` when there are no neighbours.
    #[must_use]
    #[rustfmt::skip]
    pub fn predicted_label(&self) -> Option<Label> { self.predicted_label }
}

/// Returns the most frequent label among `neighbours`.
///
/// When several labels share the highest count, the one that appears first in
/// `neighbours` wins; for a sorted neighbour list that is the label of the
/// nearest tied point. Returns `None` for an empty list.
///
/// # Examples
/// ```
/// use kdsearch_core::{Neighbour, majority_label};
///
/// let neighbours = [
///     Neighbour { ordinal: 4, label: 2, distance: 0.1 },
///     Neighbour { ordinal: 1, label: 7, distance: 0.2 },
///     Neighbour { ordinal: 9, label: 7, distance: 0.3 },
/// ];
/// assert_eq!(majority_label(&neighbours), Some(7));
/// assert_eq!(majority_label(&neighbours[..2]), Some(2));
/// assert_eq!(majority_label(&[]), None);
/// ```
#[must_use]
pub fn majority_label(neighbours: &[Neighbour]) -> Option<Label> {
    // K is small, so a first-seen ordered tally beats hashing.
    let mut tally: Vec<(Label, usize)> = Vec::new();
    for neighbour in neighbours {
        match tally.iter_mut().find(|(label, _)| *label == neighbour.label) {
            Some((_, count)) => *count += 1,
            None => tally.push((neighbour.label, 1)),
        }
    }

    let mut winner: Option<(Label, usize)> = None;
    for (label, count) in tally {
        if winner.is_none_or(|(_, best)| count > best) {
            winner = Some((label, count));
        }
    }
    winner.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::majority_label;
    use crate::query::Neighbour;

    fn labelled(labels: &[i64]) -> Vec<Neighbour> {
        labels
            .iter()
            .zip(0_u64..)
            .map(|(&label, ordinal)| Neighbour {
                ordinal,
                label,
                distance: ordinal as f64,
            })
            .collect()
    }

    #[rstest]
    #[case::single(&[3], Some(3))]
    #[case::clear_majority(&[1, 0, 0, 2, 0], Some(0))]
    #[case::two_way_tie(&[1, 0], Some(1))]
    #[case::tie_after_late_surge(&[5, 6, 6, 5], Some(5))]
    #[case::three_way_tie(&[9, 8, 7], Some(9))]
    #[case::negative_labels(&[-1, -2, -2], Some(-2))]
    #[case::empty(&[], None)]
    fn picks_the_most_frequent_label(#[case] labels: &[i64], #[case] expected: Option<i64>) {
        assert_eq!(majority_label(&labelled(labels)), expected);
    }
}
