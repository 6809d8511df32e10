//! Tree nodes and the atomic child slots that own them.

use std::{
    fmt, ptr,
    sync::atomic::{AtomicPtr, Ordering},
};

use crate::point::{Ordinal, Point};

/// A tree node: one point plus exclusively owned children.
///
/// Nodes are fully initialised before they become reachable and are never
/// mutated afterwards, apart from their empty child slots being filled.
pub(crate) struct Node {
    point: Point,
    ordinal: Ordinal,
    left: Slot,
    right: Slot,
}

impl Node {
    pub(crate) fn leaf(point: Point, ordinal: Ordinal) -> Self {
        Self::with_children(point, ordinal, None, None)
    }

    pub(crate) fn with_children(
        point: Point,
        ordinal: Ordinal,
        left: Option<Box<Self>>,
        right: Option<Box<Self>>,
    ) -> Self {
        Self {
            point,
            ordinal,
            left: Slot::from_option(left),
            right: Slot::from_option(right),
        }
    }

    #[rustfmt::skip]
    pub(crate) fn point(&self) -> &Point { &self.point }

    #[rustfmt::skip]
    pub(crate) fn ordinal(&self) -> Ordinal { self.ordinal }

    #[rustfmt::skip]
    pub(crate) fn left(&self) -> &Slot { &self.left }

    #[rustfmt::skip]
    pub(crate) fn right(&self) -> &Slot { &self.right }

    /// Splits the children into `(near, far)` for a coordinate on `axis`.
    ///
    /// Strictly smaller coordinates belong left; ties go right. Insertion and
    /// search share this predicate so they agree on where a point lives.
    #[inline]
    pub(crate) fn branch(&self, coordinate: f64, axis: usize) -> (&Slot, &Slot) {
        if coordinate < self.point.coordinate(axis) {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        }
    }
}

/// Single-owner child pointer that can be filled once without locking.
///
/// A non-null slot owns the node it points to. Readers load with `Acquire`,
/// and the only way to fill an empty slot concurrently is [`Slot::try_install`],
/// which publishes with `Release`.
pub(crate) struct Slot(AtomicPtr<Node>);

impl Slot {
    pub(crate) const fn empty() -> Self {
        Self(AtomicPtr::new(ptr::null_mut()))
    }

    pub(crate) fn from_option(node: Option<Box<Node>>) -> Self {
        match node {
            Some(node) => Self(AtomicPtr::new(Box::into_raw(node))),
            None => Self::empty(),
        }
    }

    /// Returns the node currently stored in the slot.
    pub(crate) fn load(&self) -> Option<&Node> {
        let raw = self.0.load(Ordering::Acquire);
        // SAFETY: non-null pointers in a slot come from `Box::into_raw` and are
        // only released through `&mut self` (`take`/`Drop`), so the node
        // outlives this shared borrow. The `Acquire` load pairs with the
        // `Release` publication in `try_install`, so the node is initialised.
        unsafe { raw.as_ref() }
    }

    /// Publishes `node` if the slot is still empty.
    ///
    /// On failure the node is handed back unchanged so the caller can keep
    /// descending with the same allocation.
    pub(crate) fn try_install(&self, node: Box<Node>) -> Result<(), Box<Node>> {
        let raw = Box::into_raw(node);
        match self
            .0
            .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            // SAFETY: the exchange failed, so `raw` was never published and this
            // call still holds the only pointer to the allocation.
            Err(_) => Err(unsafe { Box::from_raw(raw) }),
        }
    }

    /// Detaches the stored node, leaving the slot empty.
    pub(crate) fn take(&mut self) -> Option<Box<Node>> {
        let raw = std::mem::replace(self.0.get_mut(), ptr::null_mut());
        // SAFETY: `&mut self` guarantees no outstanding borrows from `load`, and
        // the pointer was produced by `Box::into_raw`.
        (!raw.is_null()).then(|| unsafe { Box::from_raw(raw) })
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        // Unlink children before each node drops so deep trees do not recurse.
        let mut pending: Vec<Box<Node>> = self.take().into_iter().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.load() {
            Some(node) => write!(f, "Slot({})", node.ordinal),
            None => f.write_str("Slot(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, Slot};
    use crate::point::Point;

    fn leaf(ordinal: u64) -> Box<Node> {
        Box::new(Node::leaf(Point::new(vec![ordinal as f64], 0), ordinal))
    }

    #[test]
    fn install_fills_an_empty_slot_once() {
        let slot = Slot::empty();
        assert!(slot.try_install(leaf(1)).is_ok());

        let rejected = slot.try_install(leaf(2)).expect_err("slot is occupied");
        assert_eq!(rejected.ordinal(), 2);
        assert_eq!(slot.load().map(Node::ordinal), Some(1));
    }

    #[test]
    fn take_empties_the_slot() {
        let mut slot = Slot::from_option(Some(leaf(3)));
        assert_eq!(slot.take().map(|node| node.ordinal()), Some(3));
        assert!(slot.load().is_none());
    }

    #[test]
    fn ties_branch_right() {
        let node = Node::leaf(Point::new(vec![2.0, 5.0], 0), 0);
        let (near, _) = node.branch(2.0, 0);
        assert!(std::ptr::eq(near, node.right()));
        let (near, _) = node.branch(1.5, 0);
        assert!(std::ptr::eq(near, node.left()));
    }

    #[test]
    fn dropping_a_degenerate_chain_does_not_overflow() {
        let mut root: Option<Box<Node>> = None;
        for ordinal in 0..200_000u64 {
            root = Some(Box::new(Node::with_children(
                Point::new(vec![0.0], 0),
                ordinal,
                root,
                None,
            )));
        }
        drop(Slot::from_option(root));
    }
}
