use crate::residual::{Capacity, NodeId, ResidualEdge, ResidualGraph};
use rustc_hash::FxHashSet;

/// A source-to-sink path found by [`find_augmenting_path`].
///
/// Only endpoint pairs are kept: the commit re-resolves them against the
/// graph as it is at commit time. Every edge of the path still holds the
/// hint acquired during the search.
#[derive(Clone, Debug, PartialEq)]
pub struct AugmentingPath<N> {
    pub edges: Vec<(N, N)>,
    /// Bottleneck observed during the search, may be stale by commit time
    pub discovered_bottleneck: Capacity,
}

impl<N: NodeId> AugmentingPath<N> {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.edges
            .first()
            .map(|(from, _)| from)
            .into_iter()
            .chain(self.edges.iter().map(|(_, to)| to))
    }
}

struct Frame<'a, N> {
    candidates: Vec<&'a ResidualEdge<N>>,
    next: usize,
    // Edge used to enter this frame, none for the source
    entered_by: Option<&'a ResidualEdge<N>>,
}

fn sorted_candidates<'a, N: NodeId>(
    graph: &'a ResidualGraph<N>,
    node: &N,
) -> Vec<&'a ResidualEdge<N>> {
    let mut candidates = graph.outgoing(node).iter().collect::<Vec<_>>();
    // Least contended first, target id breaks ties
    candidates.sort_by(|a, b| {
        a.hint_count()
            .cmp(&b.hint_count())
            .then_with(|| a.to.cmp(&b.to))
    });
    candidates
}

/// Depth first search for a path of positive capacity edges from `source`
/// to `sink`, preferring the edges with the lowest hint count.
///
/// Each edge of the current path holds a hint, so concurrent searches see it as
/// more expensive and drift to other routes. The hints of a returned path are
/// released by the commit (or by [`release_hints`]); backtracked edges give
/// theirs back immediately.
pub fn find_augmenting_path<N: NodeId>(
    graph: &ResidualGraph<N>,
    source: &N,
    sink: &N,
) -> Option<AugmentingPath<N>> {
    if source == sink || !graph.contains_node(source) {
        return None;
    }

    let mut visited = FxHashSet::default();
    visited.insert(source.clone());

    let mut path: Vec<&ResidualEdge<N>> = vec![];
    let mut stack = vec![Frame {
        candidates: sorted_candidates(graph, source),
        next: 0,
        entered_by: None,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(&edge) = frame.candidates.get(frame.next) else {
            // Dead end, backtrack
            let frame = stack.pop()?;
            if let Some(edge) = frame.entered_by {
                edge.release_hint();
                path.pop();
            }
            continue;
        };
        frame.next += 1;

        if edge.capacity() <= 0.0 || visited.contains(&edge.to) {
            continue;
        }

        edge.acquire_hint();
        path.push(edge);
        visited.insert(edge.to.clone());

        if &edge.to == sink {
            let discovered_bottleneck = path
                .iter()
                .map(|edge| edge.capacity())
                .fold(Capacity::INFINITY, Capacity::min);
            return Some(AugmentingPath {
                edges: path
                    .iter()
                    .map(|edge| (edge.from.clone(), edge.to.clone()))
                    .collect(),
                discovered_bottleneck,
            });
        }

        stack.push(Frame {
            candidates: sorted_candidates(graph, &edge.to),
            next: 0,
            entered_by: Some(edge),
        });
    }

    None
}

/// Gives back the hints held by a path that will not be committed.
pub fn release_hints<N: NodeId>(graph: &ResidualGraph<N>, path: &AugmentingPath<N>) {
    for (from, to) in path.edges.iter() {
        if let Some(edge) = graph.edge(from, to) {
            edge.release_hint();
        }
    }
}
