use rustc_hash::FxHashSet;

use crate::residual::{Capacity, NodeId, ResidualGraph};

#[derive(Clone, Debug, PartialEq)]
pub struct CutEdge<N> {
    pub from: N,
    pub to: N,
    /// Capacity of the edge before any flow was pushed
    pub capacity: Capacity,
}

#[derive(Clone, Debug)]
pub struct MinCut<N> {
    pub source_side: FxHashSet<N>,
    pub edges: Vec<CutEdge<N>>,
}

impl<N> Default for MinCut<N> {
    fn default() -> Self {
        Self {
            source_side: FxHashSet::default(),
            edges: vec![],
        }
    }
}

impl<N: NodeId> MinCut<N> {
    pub fn capacity(&self) -> Capacity {
        self.edges.iter().map(|edge| edge.capacity).sum()
    }
}

/// Nodes reachable from `source` through positive residual capacity.
/// `None` if the source is not part of the graph.
pub fn source_side<N: NodeId>(graph: &ResidualGraph<N>, source: &N) -> Option<FxHashSet<N>> {
    if !graph.contains_node(source) {
        log::warn!("Source node {:?} not found in the network", source);
        return None;
    }

    let mut reachable_nodes = FxHashSet::default();
    reachable_nodes.insert(source.clone());
    let mut stack = vec![source];
    while let Some(node) = stack.pop() {
        for edge in graph.outgoing(node) {
            if edge.capacity() > 0.0 && !reachable_nodes.contains(&edge.to) {
                reachable_nodes.insert(edge.to.clone());
                stack.push(&edge.to);
            }
        }
    }

    Some(reachable_nodes)
}

/// Cut between the nodes reachable from `source` and the rest of the graph.
/// Minimum once no augmenting path is left. Empty for an unknown source.
///
/// Only input edges are reported, reverse sides created for the residual
/// graph carry no capacity of their own.
pub fn min_cut<N: NodeId>(graph: &ResidualGraph<N>, source: &N) -> MinCut<N> {
    let Some(source_side) = source_side(graph, source) else {
        return MinCut::default();
    };

    let mut edges = vec![];
    for node in source_side.iter() {
        for edge in graph.outgoing(node) {
            if edge.original > 0.0 && !source_side.contains(&edge.to) {
                edges.push(CutEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    capacity: edge.original,
                });
            }
        }
    }
    edges.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));

    MinCut { source_side, edges }
}

/// Sum of the residual capacities leaving `sink`. After augmentation these are
/// the reverse edges of the flow delivered, as long as no input edge leaves
/// the sink.
pub fn sink_inflow<N: NodeId>(graph: &ResidualGraph<N>, sink: &N) -> Capacity {
    graph.outgoing(sink).iter().map(|edge| edge.capacity()).sum()
}
