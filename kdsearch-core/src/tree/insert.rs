//! Lock-free point insertion into a live tree.

use std::sync::atomic::Ordering;

use super::{KdTree, node::Node};
use crate::{
    Result,
    point::{Ordinal, Point},
    telemetry,
};

impl KdTree {
    /// Inserts `point` into the tree without taking any locks.
    ///
    /// Safe to call from any number of threads at once. Each empty slot
    /// accepts exactly one node; a thread that loses the race for a slot keeps
    /// descending from the winner with the same allocation. The tree is never
    /// rebalanced, so heavy insertion can degrade its height.
    ///
    /// Returns the ordinal assigned to the point.
    ///
    /// # Errors
    /// Returns [`KdError::DimensionMismatch`](crate::KdError::DimensionMismatch)
    /// when the point does not carry exactly [`KdTree::dimensions`] features
    /// and [`KdError::NonFiniteCoordinate`](crate::KdError::NonFiniteCoordinate)
    /// when a feature is NaN or infinite. No slot is touched in either case.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use kdsearch_core::{KdTree, Point};
    ///
    /// let tree = KdTree::empty(NonZeroUsize::new(2).expect("non-zero"));
    /// std::thread::scope(|scope| {
    ///     for label in 0..4_i64 {
    ///         let tree = &tree;
    ///         scope.spawn(move || tree.insert(Point::new(vec![label as f64, 1.0], label)));
    ///     }
    /// });
    /// assert_eq!(tree.len(), 4);
    /// assert!(tree.check_axis_rule().is_ok());
    /// ```
    pub fn insert(&self, point: Point) -> Result<Ordinal> {
        let dimensions = self.dimensions.get();
        point.validate(dimensions)?;

        let ordinal = self.next_ordinal.fetch_add(1, Ordering::Relaxed);
        let mut node = Box::new(Node::leaf(point, ordinal));
        let mut slot = &self.root;
        let mut depth = 0usize;

        loop {
            match slot.load() {
                Some(current) => {
                    let axis = depth % dimensions;
                    (slot, _) = current.branch(node.point().coordinate(axis), axis);
                    depth += 1;
                }
                None => match slot.try_install(node) {
                    Ok(()) => break,
                    Err(returned) => {
                        telemetry::record_cas_retry();
                        node = returned;
                    }
                },
            }
        }

        self.len.fetch_add(1, Ordering::Release);
        Ok(ordinal)
    }
}
