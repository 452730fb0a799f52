use crate::{
    residual::{Capacity, NodeId, ResidualGraph},
    search::AugmentingPath,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommitOutcome {
    /// The path carried this much flow
    Applied(Capacity),
    /// Another commit consumed the path first, nothing changed
    Stale,
}

impl CommitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommitOutcome::Applied(_))
    }
}

/// Applies `path` to the graph. Callers hold the commit lock of
/// [`crate::network::FlowNetwork`], so no two commits interleave.
///
/// Capacities are re-read from the graph rather than trusted from discovery
/// time. A path whose bottleneck dropped to zero meanwhile is rejected and
/// only its hints are released.
pub(crate) fn commit_path<N: NodeId>(
    graph: &ResidualGraph<N>,
    path: &AugmentingPath<N>,
) -> CommitOutcome {
    let mut bottleneck = Capacity::INFINITY;
    let mut resolved = true;
    for (from, to) in path.edges.iter() {
        match graph.edge(from, to) {
            Some(edge) => bottleneck = bottleneck.min(edge.capacity()),
            None => resolved = false,
        }
    }

    if !resolved || path.is_empty() || bottleneck <= 0.0 {
        for (from, to) in path.edges.iter() {
            if let Some(edge) = graph.edge(from, to) {
                edge.release_hint();
            }
        }
        log::trace!("Stale path of {} edges", path.len());
        return CommitOutcome::Stale;
    }

    for (from, to) in path.edges.iter() {
        // Both sides of a pair exist since construction
        let (Some(edge), Some(reverse)) = (graph.edge(from, to), graph.edge(to, from)) else {
            continue;
        };
        // Bottleneck edges end at exactly zero
        edge.set_capacity((edge.capacity() - bottleneck).max(0.0));
        reverse.set_capacity(reverse.capacity() + bottleneck);
        edge.release_hint();
    }

    log::trace!("Committed {} units along {} edges", bottleneck, path.len());
    CommitOutcome::Applied(bottleneck)
}
