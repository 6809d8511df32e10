//! Depth-first search over an explicit stack.
//!
//! Visits nodes in exactly the order of the recursive walk, so pruning
//! decisions match as well. Tree height only costs heap, never call stack.

use super::{CandidateList, Neighbour, Search};
use crate::{telemetry, tree::Node};

enum Frame<'n> {
    Visit(&'n Node, usize),
    Cross {
        far: &'n Node,
        depth: usize,
        plane_distance: f64,
    },
}

pub(super) fn search(search_state: &Search<'_>, root: &Node, k: usize) -> Vec<Neighbour> {
    let mut list = CandidateList::new(k);
    let mut stack = vec![Frame::Visit(root, 0)];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Visit(node, depth) => {
                if let Some(candidate) = search_state.score(node) {
                    list.offer(candidate);
                }
                let split = search_state.split(node, depth);
                // The far side is decided only after the near side is exhausted.
                if let Some(far) = split.far {
                    stack.push(Frame::Cross {
                        far,
                        depth: depth + 1,
                        plane_distance: split.plane_distance,
                    });
                }
                if let Some(near) = split.near {
                    stack.push(Frame::Visit(near, depth + 1));
                }
            }
            Frame::Cross {
                far,
                depth,
                plane_distance,
            } => {
                if list.admits(plane_distance) {
                    stack.push(Frame::Visit(far, depth));
                } else {
                    telemetry::record_subtree_pruned();
                }
            }
        }
    }

    list.into_vec()
}
