//! In-process [`Communicator`] over standard channels.

use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    panic,
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use tracing::debug;

use super::communicator::{Communicator, GatherLayout};
use crate::{
    CollectiveError,
    error::CollectivePhase,
    query::Neighbour,
};

#[derive(Debug)]
enum Envelope {
    Count { from: usize, count: usize },
    Candidates { from: usize, candidates: Vec<Neighbour> },
}

impl Envelope {
    fn phase(&self) -> CollectivePhase {
        match self {
            Self::Count { .. } => CollectivePhase::CountExchange,
            Self::Candidates { .. } => CollectivePhase::CandidateGather,
        }
    }

    fn sender(&self) -> usize {
        match self {
            Self::Count { from, .. } | Self::Candidates { from, .. } => *from,
        }
    }
}

/// One participant of an in-process cluster.
///
/// Each rank owns an inbox and a sender to every other rank. Messages that
/// arrive ahead of the phase the receiver is in are stashed until that phase
/// starts. A rank whose communicator is dropped before it contributes shows
/// up on the root as [`CollectiveError::MissingParticipant`].
#[derive(Debug)]
pub struct ChannelCommunicator {
    rank: usize,
    size: usize,
    inbox: Receiver<Envelope>,
    peers: Vec<Option<Sender<Envelope>>>,
    stash: VecDeque<Envelope>,
}

impl ChannelCommunicator {
    /// Creates a fully connected cluster of `size` participants, in rank order.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroUsize;
    /// use kdsearch_core::{ChannelCommunicator, Communicator};
    ///
    /// let cluster = ChannelCommunicator::cluster(NonZeroUsize::new(3).expect("non-zero"));
    /// assert_eq!(cluster.iter().map(Communicator::rank).collect::<Vec<_>>(), vec![0, 1, 2]);
    /// ```
    #[must_use]
    pub fn cluster(size: NonZeroUsize) -> Vec<Self> {
        let size = size.get();
        let (senders, inboxes): (Vec<Sender<Envelope>>, Vec<Receiver<Envelope>>) =
            (0..size).map(|_| mpsc::channel()).unzip();
        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| Self {
                rank,
                size,
                inbox,
                // No sender to self: the inbox must disconnect once every peer is gone.
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(peer, sender)| (peer != rank).then(|| sender.clone()))
                    .collect(),
                stash: VecDeque::new(),
            })
            .collect()
    }

    fn check_root(&self, root: usize) -> Result<(), CollectiveError> {
        if root >= self.size {
            return Err(CollectiveError::InvalidRank {
                rank: root,
                size: self.size,
            });
        }
        Ok(())
    }

    fn send(&self, to: usize, envelope: Envelope) -> Result<(), CollectiveError> {
        let sender = self
            .peers
            .get(to)
            .and_then(Option::as_ref)
            .ok_or(CollectiveError::InvalidRank {
                rank: to,
                size: self.size,
            })?;
        sender
            .send(envelope)
            .map_err(|_| CollectiveError::MissingParticipant { rank: to })
    }

    /// Returns the next message for `phase`, or `None` once every peer is gone.
    fn receive(&mut self, phase: CollectivePhase) -> Option<Envelope> {
        if let Some(position) = self.stash.iter().position(|held| held.phase() == phase) {
            return self.stash.remove(position);
        }
        loop {
            let envelope = self.inbox.recv().ok()?;
            if envelope.phase() == phase {
                return Some(envelope);
            }
            self.stash.push_back(envelope);
        }
    }
}

impl Communicator for ChannelCommunicator {
    #[rustfmt::skip]
    fn rank(&self) -> usize { self.rank }

    #[rustfmt::skip]
    fn size(&self) -> usize { self.size }

    fn gather_count(
        &mut self,
        root: usize,
        count: usize,
    ) -> Result<Option<Vec<usize>>, CollectiveError> {
        self.check_root(root)?;
        if self.rank != root {
            self.send(root, Envelope::Count {
                from: self.rank,
                count,
            })?;
            return Ok(None);
        }

        let phase = CollectivePhase::CountExchange;
        let mut counts: Vec<Option<usize>> = vec![None; self.size];
        counts[root] = Some(count);
        while let Some(missing) = counts.iter().position(Option::is_none) {
            match self.receive(phase) {
                Some(Envelope::Count { from, count }) => {
                    let Some(slot) = counts.get_mut(from).filter(|slot| slot.is_none()) else {
                        return Err(CollectiveError::UnexpectedMessage { rank: from, phase });
                    };
                    *slot = Some(count);
                }
                Some(other) => {
                    return Err(CollectiveError::UnexpectedMessage {
                        rank: other.sender(),
                        phase,
                    });
                }
                None => return Err(CollectiveError::MissingParticipant { rank: missing }),
            }
        }
        debug!(rank = self.rank, ?counts, "gathered candidate counts");
        Ok(Some(counts.into_iter().flatten().collect()))
    }

    fn gather_candidates(
        &mut self,
        root: usize,
        local: &[Neighbour],
        layout: Option<&GatherLayout>,
    ) -> Result<Option<Vec<Neighbour>>, CollectiveError> {
        self.check_root(root)?;
        if self.rank != root {
            self.send(root, Envelope::Candidates {
                from: self.rank,
                candidates: local.to_vec(),
            })?;
            return Ok(None);
        }

        let layout = layout.ok_or(CollectiveError::MissingLayout)?;
        let phase = CollectivePhase::CandidateGather;
        let mut buffer: Vec<Option<Neighbour>> = vec![None; layout.total()];
        let mut received = vec![false; self.size];
        place(&mut buffer, layout, root, local.to_vec())?;
        received[root] = true;

        while let Some(missing) = received.iter().position(|done| !done) {
            match self.receive(phase) {
                Some(Envelope::Candidates { from, candidates }) => {
                    let Some(done) = received.get_mut(from).filter(|done| !**done) else {
                        return Err(CollectiveError::UnexpectedMessage { rank: from, phase });
                    };
                    place(&mut buffer, layout, from, candidates)?;
                    *done = true;
                }
                Some(other) => {
                    return Err(CollectiveError::UnexpectedMessage {
                        rank: other.sender(),
                        phase,
                    });
                }
                None => return Err(CollectiveError::MissingParticipant { rank: missing }),
            }
        }
        debug!(
            rank = self.rank,
            total = layout.total(),
            counts = ?layout.counts(),
            "gathered candidates"
        );
        Ok(Some(buffer.into_iter().flatten().collect()))
    }
}

/// Copies one rank's contribution into its reserved slot.
fn place(
    buffer: &mut [Option<Neighbour>],
    layout: &GatherLayout,
    rank: usize,
    candidates: Vec<Neighbour>,
) -> Result<(), CollectiveError> {
    let slot = layout.slot(rank).ok_or(CollectiveError::InvalidRank {
        rank,
        size: layout.participants(),
    })?;
    if slot.len() != candidates.len() {
        return Err(CollectiveError::CountMismatch {
            rank,
            announced: slot.len(),
            received: candidates.len(),
        });
    }
    for (cell, candidate) in buffer[slot].iter_mut().zip(candidates) {
        *cell = Some(candidate);
    }
    Ok(())
}

/// Runs `job` once per rank of a fresh in-process cluster, each on its own
/// scoped thread, and returns the results in rank order.
///
/// A panic in any worker is resumed on the calling thread after every worker
/// has finished.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use kdsearch_core::{Communicator, run_local_cluster};
///
/// let counts = run_local_cluster(NonZeroUsize::new(3).expect("non-zero"), |mut comm| {
///     let rank = comm.rank();
///     comm.gather_count(0, rank * 10)
/// });
/// assert_eq!(counts[0], Ok(Some(vec![0, 10, 20])));
/// assert_eq!(counts[2], Ok(None));
/// ```
pub fn run_local_cluster<T, F>(workers: NonZeroUsize, job: F) -> Vec<T>
where
    T: Send,
    F: Fn(ChannelCommunicator) -> T + Sync,
{
    let job = &job;
    let outcomes: Vec<thread::Result<T>> = thread::scope(|scope| {
        let handles: Vec<_> = ChannelCommunicator::cluster(workers)
            .into_iter()
            .map(|communicator| scope.spawn(move || job(communicator)))
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });
    outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap_or_else(|payload| panic::resume_unwind(payload)))
        .collect()
}
