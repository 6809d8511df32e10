//! Depth-first search by direct recursion.

use super::{CandidateList, Search};
use crate::{telemetry, tree::Node};

pub(super) fn search(search_state: &Search<'_>, node: &Node, depth: usize, list: &mut CandidateList) {
    if let Some(candidate) = search_state.score(node) {
        list.offer(candidate);
    }

    let split = search_state.split(node, depth);
    if let Some(near) = split.near {
        search(search_state, near, depth + 1, list);
    }
    if let Some(far) = split.far {
        if list.admits(split.plane_distance) {
            search(search_state, far, depth + 1, list);
        } else {
            telemetry::record_subtree_pruned();
        }
    }
}
