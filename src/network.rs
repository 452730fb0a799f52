use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, PoisonError,
};

use crate::{
    commit::{commit_path, CommitOutcome},
    min_cut::{self, MinCut},
    residual::{Capacity, NodeId, ResidualGraph},
    search::{self, AugmentingPath},
};

/// A residual graph shared between workers.
///
/// Searches read capacities and bump hint counters without taking any lock.
/// Commits go through a single mutex, the one critical section where
/// capacities change; it also guards the running flow total.
pub struct FlowNetwork<N: NodeId> {
    graph: ResidualGraph<N>,
    source: N,
    sink: N,
    commit_lock: Mutex<Capacity>,
    commits: AtomicUsize,
    stale_commits: AtomicUsize,
}

impl<N: NodeId> FlowNetwork<N> {
    pub fn new(graph: ResidualGraph<N>, source: N, sink: N) -> Self {
        Self {
            graph,
            source,
            sink,
            commit_lock: Mutex::new(0.0),
            commits: AtomicUsize::new(0),
            stale_commits: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &N {
        &self.source
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// The shared graph. Capacities read through it may be mid-commit.
    pub fn graph(&self) -> &ResidualGraph<N> {
        &self.graph
    }

    /// Looks for an augmenting path, leaving its hints acquired.
    pub fn find_path(&self) -> Option<AugmentingPath<N>> {
        search::find_augmenting_path(&self.graph, &self.source, &self.sink)
    }

    /// Checks for an augmenting path without keeping it.
    pub fn has_augmenting_path(&self) -> bool {
        match self.find_path() {
            Some(path) => {
                search::release_hints(&self.graph, &path);
                true
            }
            None => false,
        }
    }

    pub fn commit(&self, path: &AugmentingPath<N>) -> CommitOutcome {
        // Poisoning is ignored, a commit never panics halfway
        let mut total_flow = self
            .commit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let outcome = commit_path(&self.graph, path);
        match outcome {
            CommitOutcome::Applied(amount) => {
                *total_flow += amount;
                self.commits.fetch_add(1, Ordering::Relaxed);
            }
            CommitOutcome::Stale => {
                self.stale_commits.fetch_add(1, Ordering::Relaxed);
            }
        }
        outcome
    }

    /// Total flow pushed from source to sink so far.
    pub fn max_flow(&self) -> Capacity {
        *self
            .commit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }

    pub fn stale_commits(&self) -> usize {
        self.stale_commits.load(Ordering::Relaxed)
    }

    pub fn min_cut(&self) -> MinCut<N> {
        min_cut::min_cut(&self.graph, &self.source)
    }

    /// Flow readout from the residual capacity leading back out of the sink.
    /// Only matches [`Self::max_flow`] when no input edge leaves the sink.
    pub fn sink_inflow(&self) -> Capacity {
        min_cut::sink_inflow(&self.graph, &self.sink)
    }

    pub fn into_inner(self) -> ResidualGraph<N> {
        self.graph
    }
}
