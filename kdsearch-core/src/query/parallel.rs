//! Fork-join search with a shared, lock-protected candidate list.

use std::sync::{Mutex, MutexGuard};

use super::{CandidateList, Neighbour, Search};
use crate::{KdError, Result, telemetry, tree::Node};

/// Depth below which sibling subtrees are searched as separate tasks.
pub(crate) const PARALLEL_QUERY_DEPTH: usize = 3;

const RESOURCE: &str = "query candidate list";

pub(super) fn search(search_state: &Search<'_>, root: &Node, k: usize) -> Result<Vec<Neighbour>> {
    let shared = Mutex::new(CandidateList::new(k));
    visit(search_state, root, 0, &shared)?;
    let list = shared
        .into_inner()
        .map_err(|_| KdError::LockPoisoned { resource: RESOURCE })?;
    Ok(list.into_vec())
}

fn lock(shared: &Mutex<CandidateList>) -> Result<MutexGuard<'_, CandidateList>> {
    shared
        .lock()
        .map_err(|_| KdError::LockPoisoned { resource: RESOURCE })
}

fn visit(
    search_state: &Search<'_>,
    node: &Node,
    depth: usize,
    shared: &Mutex<CandidateList>,
) -> Result<()> {
    if let Some(candidate) = search_state.score(node) {
        lock(shared)?.offer(candidate);
    }

    let split = search_state.split(node, depth);
    let near = || match split.near {
        Some(near) => visit(search_state, near, depth + 1, shared),
        None => Ok(()),
    };
    let far = || match split.far {
        Some(far) => cross(search_state, far, depth + 1, split.plane_distance, shared),
        None => Ok(()),
    };

    if depth < PARALLEL_QUERY_DEPTH {
        let (near, far) = rayon::join(near, far);
        near.and(far)
    } else {
        near()?;
        far()
    }
}

fn cross(
    search_state: &Search<'_>,
    far: &Node,
    depth: usize,
    plane_distance: f64,
    shared: &Mutex<CandidateList>,
) -> Result<()> {
    // Decide under the lock, search outside it.
    let admitted = lock(shared)?.admits(plane_distance);
    if admitted {
        visit(search_state, far, depth, shared)
    } else {
        telemetry::record_subtree_pruned();
        Ok(())
    }
}
