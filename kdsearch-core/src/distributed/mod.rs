//! Partition/search/merge nearest-neighbour search across workers.
//!
//! Each worker owns one [`Shard`], builds a local tree over it, and searches
//! that tree for its own best `k` candidates. The candidates then meet on the
//! coordinator in two collectives: every rank announces how many it has, and
//! a variable-length gather places them in one buffer at prefix-sum offsets.
//! The coordinator keeps the best `k` overall and votes on their labels.
//!
//! Workers share no memory. All communication goes through a
//! [`Communicator`]; [`ChannelCommunicator`] and [`run_local_cluster`] provide
//! an in-process implementation.

mod channel;
mod communicator;
mod partition;

#[cfg(test)]
mod tests;

pub use self::channel::{ChannelCommunicator, run_local_cluster};
pub use self::communicator::{Communicator, GatherLayout};
pub use self::partition::{Shard, shard_range};

use tracing::debug;

use crate::{
    KdTree, Result,
    query::{Neighbour, Traversal},
    vote::Classification,
};

/// Rank that gathers candidates and produces the final answer.
pub const COORDINATOR_RANK: usize = 0;

/// Searches a shard's tree and merges the results on the coordinator.
///
/// Returns `Some` on [`COORDINATOR_RANK`] and `None` on every other rank.
pub(crate) fn search_shard<C: Communicator>(
    communicator: &mut C,
    tree: &KdTree,
    target: &[f64],
    k: usize,
    traversal: Traversal,
) -> Result<Option<Classification>> {
    let local = tree.query_with(target, k, traversal)?;
    debug!(
        rank = communicator.rank(),
        shard_len = tree.len(),
        candidates = local.len(),
        "local search complete"
    );

    let counts = communicator.gather_count(COORDINATOR_RANK, local.len())?;
    let layout = counts.map(GatherLayout::from_counts);
    let gathered = communicator.gather_candidates(COORDINATOR_RANK, &local, layout.as_ref())?;
    Ok(gathered.map(|buffer| merge_candidates(buffer, k)))
}

/// Keeps the best `k` of the gathered candidates and votes on their labels.
pub(crate) fn merge_candidates(mut buffer: Vec<Neighbour>, k: usize) -> Classification {
    buffer.sort_unstable();
    buffer.truncate(k);
    Classification::from_neighbours(buffer)
}
