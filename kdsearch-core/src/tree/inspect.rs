//! Structural inspection helpers.
//!
//! Every walk uses an explicit stack: trees grown by insertion are not
//! balanced and may be arbitrarily deep.

use std::fmt;

use thiserror::Error;

use super::{KdTree, node::Node};
use crate::point::{Ordinal, Point};

/// Which side of an ancestor's splitting plane a point strayed across.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoundSide {
    /// The point lies in a right subtree but is below the splitting value.
    Lower,
    /// The point lies in a left subtree but is above the splitting value.
    Upper,
}

impl fmt::Display for BoundSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lower => f.write_str("lower"),
            Self::Upper => f.write_str("upper"),
        }
    }
}

/// A node whose coordinate breaks the ordering imposed by an ancestor.
#[derive(Clone, Debug, Error, PartialEq)]
#[error(
    "point {ordinal} at depth {depth} has {value} on axis {axis}, past the {side} bound {bound}"
)]
pub struct AxisRuleViolation {
    /// Ordinal of the misplaced point.
    pub ordinal: Ordinal,
    /// Depth of the misplaced node.
    pub depth: usize,
    /// Axis on which the bound is broken.
    pub axis: usize,
    /// Offending coordinate.
    pub value: f64,
    /// Splitting value inherited from an ancestor.
    pub bound: f64,
    /// Whether the inherited bound is a lower or upper limit.
    pub side: BoundSide,
}

/// A stored point together with where it sits in the tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeView<'a> {
    /// Distance from the root, which has depth zero.
    pub depth: usize,
    /// Ingestion-order index of the point.
    pub ordinal: Ordinal,
    /// The stored point.
    pub point: &'a Point,
}

impl KdTree {
    /// Returns the number of levels on the longest root-to-leaf path.
    ///
    /// An empty tree has height zero.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut tallest = 0;
        let mut stack: Vec<(&Node, usize)> = self.root().map(|root| (root, 1)).into_iter().collect();
        while let Some((node, level)) = stack.pop() {
            tallest = tallest.max(level);
            stack.extend(node.left().load().map(|child| (child, level + 1)));
            stack.extend(node.right().load().map(|child| (child, level + 1)));
        }
        tallest
    }

    /// Returns every stored point with its ordinal, in order of an in-order walk.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use kdsearch_core::{BuildMode, KdTree, Point};
    ///
    /// let points = vec![Point::new(vec![3.0], 0), Point::new(vec![1.0], 1), Point::new(vec![2.0], 2)];
    /// let tree = KdTree::build(points, NonZeroUsize::MIN, BuildMode::Sequential)?;
    /// let ordinals: Vec<u64> = tree.points().iter().map(|(ordinal, _)| *ordinal).collect();
    /// assert_eq!(ordinals, vec![1, 2, 0]);
    /// # Ok::<(), kdsearch_core::KdError>(())
    /// ```
    #[must_use]
    pub fn points(&self) -> Vec<(Ordinal, &Point)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<&Node> = Vec::new();
        let mut current = self.root();
        loop {
            while let Some(node) = current {
                stack.push(node);
                current = node.left().load();
            }
            let Some(node) = stack.pop() else {
                break;
            };
            out.push((node.ordinal(), node.point()));
            current = node.right().load();
        }
        out
    }

    /// Returns every node in pre-order: each node, then its left subtree,
    /// then its right subtree.
    ///
    /// # Examples
    /// ```
    /// use kdsearch_core::{BuildMode, KdTree, Point};
    ///
    /// let points = vec![Point::new(vec![3.0], 0), Point::new(vec![1.0], 1), Point::new(vec![2.0], 2)];
    /// let tree = KdTree::build(points, std::num::NonZeroUsize::MIN, BuildMode::Sequential)?;
    /// let layout: Vec<(usize, u64)> = tree.nodes().iter().map(|n| (n.depth, n.ordinal)).collect();
    /// assert_eq!(layout, vec![(0, 2), (1, 1), (1, 0)]);
    /// # Ok::<(), kdsearch_core::KdError>(())
    /// ```
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeView<'_>> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(&Node, usize)> = self.root().map(|root| (root, 0)).into_iter().collect();
        while let Some((node, depth)) = stack.pop() {
            out.push(NodeView {
                depth,
                ordinal: node.ordinal(),
                point: node.point(),
            });
            stack.extend(node.right().load().map(|child| (child, depth + 1)));
            stack.extend(node.left().load().map(|child| (child, depth + 1)));
        }
        out
    }

    /// Verifies the axis rule at every node.
    ///
    /// For a node at depth `d` with `axis = d % D`, every point in its left
    /// subtree must satisfy `p[axis] <= node[axis]` and every point in its
    /// right subtree `p[axis] >= node[axis]`. Each node is checked against the
    /// tightest bounds inherited from all of its ancestors.
    ///
    /// # Errors
    /// Returns the first [`AxisRuleViolation`] found.
    pub fn check_axis_rule(&self) -> Result<(), AxisRuleViolation> {
        let dimensions = self.dimensions().get();
        let unbounded = vec![(f64::NEG_INFINITY, f64::INFINITY); dimensions];
        let mut stack: Vec<(&Node, usize, Vec<(f64, f64)>)> = self
            .root()
            .map(|root| (root, 0, unbounded))
            .into_iter()
            .collect();

        while let Some((node, depth, bounds)) = stack.pop() {
            check_bounds(node, depth, &bounds)?;

            let axis = depth % dimensions;
            let split = node.point().coordinate(axis);
            if let Some(left) = node.left().load() {
                let mut narrowed = bounds.clone();
                narrowed[axis].1 = narrowed[axis].1.min(split);
                stack.push((left, depth + 1, narrowed));
            }
            if let Some(right) = node.right().load() {
                let mut narrowed = bounds;
                narrowed[axis].0 = narrowed[axis].0.max(split);
                stack.push((right, depth + 1, narrowed));
            }
        }
        Ok(())
    }
}

fn check_bounds(node: &Node, depth: usize, bounds: &[(f64, f64)]) -> Result<(), AxisRuleViolation> {
    for (axis, &(lower, upper)) in bounds.iter().enumerate() {
        let value = node.point().coordinate(axis);
        let breach = if value < lower {
            Some((lower, BoundSide::Lower))
        } else if value > upper {
            Some((upper, BoundSide::Upper))
        } else {
            None
        };
        if let Some((bound, side)) = breach {
            return Err(AxisRuleViolation {
                ordinal: node.ordinal(),
                depth,
                axis,
                value,
                bound,
                side,
            });
        }
    }
    Ok(())
}
