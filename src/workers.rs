use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Instant,
};

use crate::{
    commit::CommitOutcome,
    network::FlowNetwork,
    residual::{Capacity, NodeId},
    search::AugmentingPath,
};

#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Concurrent search and commit loops per batch
    pub workers: usize,
    /// Batches to launch before giving up, unlimited if none
    pub max_rounds: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            max_rounds: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    pub rounds: usize,
    pub commits: usize,
    pub stale_commits: usize,
    /// Flow of the network after the run, including earlier runs
    pub flow: Capacity,
    /// No augmenting path is left
    pub converged: bool,
}

#[derive(Default, Clone, Copy)]
struct WorkerStats {
    commits: usize,
    stale_commits: usize,
}

/// Searches and commits until a search fails or someone else asks to stop.
fn worker_loop<N, F>(
    network: &FlowNetwork<N>,
    search: &F,
    stop: &AtomicBool,
    cancel: &AtomicBool,
) -> WorkerStats
where
    N: NodeId,
    F: Fn(&FlowNetwork<N>) -> Option<AugmentingPath<N>> + Sync,
{
    let mut stats = WorkerStats::default();

    while !stop.load(Ordering::Acquire) && !cancel.load(Ordering::Acquire) {
        let Some(path) = search(network) else {
            stop.store(true, Ordering::Release);
            break;
        };

        match network.commit(&path) {
            CommitOutcome::Applied(_) => stats.commits += 1,
            CommitOutcome::Stale => stats.stale_commits += 1,
        }
    }

    stats
}

/// Drives batches of concurrent workers over a [`FlowNetwork`] until the flow
/// is maximal.
///
/// A batch ends as soon as one of its workers fails to find a path. That
/// failure may be a false negative caused by a concurrent commit, so after
/// every batch a single uncontended search decides whether to launch another.
pub struct MaxFlowSolver {
    config: SolverConfig,
    cancel: Arc<AtomicBool>,
}

impl MaxFlowSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Uses `cancel` as the external stop request. Workers observe it between
    /// iterations, the driver between batches.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn run_batch<N, F>(&self, network: &FlowNetwork<N>, search: &F) -> WorkerStats
    where
        N: NodeId,
        F: Fn(&FlowNetwork<N>) -> Option<AugmentingPath<N>> + Sync,
    {
        let stop = AtomicBool::new(false);
        let workers = self.config.workers.max(1);
        let (stop, cancel) = (&stop, self.cancel.as_ref());

        thread::scope(|scope| {
            let handles = (0..workers)
                .map(|_| scope.spawn(move || worker_loop(network, search, stop, cancel)))
                .collect::<Vec<_>>();

            let mut total = WorkerStats::default();
            for (idx, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(stats) => {
                        total.commits += stats.commits;
                        total.stale_commits += stats.stale_commits;
                    }
                    Err(_) => log::error!("Worker {} panicked", idx),
                }
            }
            total
        })
    }

    pub fn run<N: NodeId>(&self, network: &FlowNetwork<N>) -> RunReport {
        self.run_with(network, |network| network.find_path())
    }

    /// Same as [`Self::run`], with workers looking for paths through `search`.
    fn run_with<N, F>(&self, network: &FlowNetwork<N>, search: F) -> RunReport
    where
        N: NodeId,
        F: Fn(&FlowNetwork<N>) -> Option<AugmentingPath<N>> + Sync,
    {
        let start = Instant::now();
        let mut report = RunReport::default();

        loop {
            if self.cancel.load(Ordering::Acquire) {
                log::warn!("Max flow computation cancelled");
                break;
            }

            report.rounds += 1;
            let stats = self.run_batch(network, &search);
            report.commits += stats.commits;
            report.stale_commits += stats.stale_commits;
            log::debug!(
                "Batch {}: {} commits, {} stale, flow {}",
                report.rounds,
                stats.commits,
                stats.stale_commits,
                network.max_flow()
            );

            if self.cancel.load(Ordering::Acquire) {
                log::warn!("Max flow computation cancelled");
                break;
            }

            if !network.has_augmenting_path() {
                report.converged = true;
                break;
            }

            if let Some(max_rounds) = self.config.max_rounds {
                if report.rounds >= max_rounds {
                    log::warn!("Stopping after {} batches without converging", max_rounds);
                    break;
                }
            }

            log::debug!("Augmenting path still present, relaunching workers");
        }

        report.flow = network.max_flow();
        if report.converged {
            log::info!(
                "Max flow {} after {} batches ({} commits, {} stale) in {:.2?}",
                report.flow,
                report.rounds,
                report.commits,
                report.stale_commits,
                start.elapsed()
            );
        }
        report
    }
}
