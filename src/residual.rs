use std::{
    fmt::{self, Debug},
    hash::Hash,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};

use rustc_hash::FxHashMap;
use thiserror::Error;

pub type Capacity = f64;

/// Anything usable as a node identifier.
pub trait NodeId: Clone + Eq + Hash + Ord + Debug + Send + Sync {}

impl<T: Clone + Eq + Hash + Ord + Debug + Send + Sync> NodeId for T {}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("invalid capacity {capacity} on edge {from} -> {to}")]
    InvalidCapacity {
        from: String,
        to: String,
        capacity: Capacity,
    },
}

pub(crate) fn is_valid_capacity(capacity: Capacity) -> bool {
    capacity.is_finite() && capacity >= 0.0
}

pub struct ResidualEdge<N> {
    pub from: N,
    pub to: N,
    /// Capacity given at construction, 0 for the reverse side of an input edge
    pub original: Capacity,
    // f64 bits, written only by commits
    capacity: AtomicU64,
    hint_count: AtomicUsize,
}

impl<N: Debug> Debug for ResidualEdge<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:?},{:?}, capacity={}, original={}, held={})",
            self.from,
            self.to,
            Capacity::from_bits(self.capacity.load(Ordering::Relaxed)),
            self.original,
            self.hint_count.load(Ordering::Relaxed)
        )
    }
}

impl<N: NodeId> ResidualEdge<N> {
    fn new(from: N, to: N, capacity: Capacity) -> Self {
        Self {
            from,
            to,
            original: capacity,
            capacity: AtomicU64::new(capacity.to_bits()),
            hint_count: AtomicUsize::new(0),
        }
    }

    /// Residual capacity. May be read while a commit is running, in which
    /// case it is either the old or the new value.
    pub fn capacity(&self) -> Capacity {
        Capacity::from_bits(self.capacity.load(Ordering::Relaxed))
    }

    pub(crate) fn set_capacity(&self, capacity: Capacity) {
        debug_assert!(capacity >= 0.0);
        self.capacity.store(capacity.to_bits(), Ordering::Relaxed);
    }

    /// Number of in-flight searches currently traversing this edge. Advisory only.
    pub fn hint_count(&self) -> usize {
        self.hint_count.load(Ordering::Relaxed)
    }

    pub fn acquire_hint(&self) {
        self.hint_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn release_hint(&self) {
        let _ = self
            .hint_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |hint| {
                hint.checked_sub(1)
            });
    }

    /// Flow currently carried by the edge, as seen from its construction capacity.
    pub fn flow(&self) -> Capacity {
        self.original - self.capacity()
    }
}

/// Residual capacities of a flow network.
///
/// Every input edge gets its reverse edge at construction, so the adjacency
/// never changes once the graph is built and only capacities and hints move.
/// Those are atomics: searches read them with no lock, while writers are
/// serialized by [`crate::network::FlowNetwork`].
#[derive(Debug)]
pub struct ResidualGraph<N: NodeId> {
    adj_list: FxHashMap<N, Vec<ResidualEdge<N>>>,
    edge_count: usize,
}

impl<N: NodeId> Default for ResidualGraph<N> {
    fn default() -> Self {
        Self {
            adj_list: FxHashMap::default(),
            edge_count: 0,
        }
    }
}

impl<N: NodeId> ResidualGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(from, to, capacity)` triples, skipping the invalid ones.
    /// Returns the graph and the number of skipped triples.
    pub fn from_triples(triples: impl IntoIterator<Item = (N, N, Capacity)>) -> (Self, usize) {
        let mut graph = Self::new();
        let mut skipped = 0;
        for (from, to, capacity) in triples {
            if let Err(err) = graph.add_edge(from, to, capacity) {
                log::warn!("Skipping edge: {}", err);
                skipped += 1;
            }
        }
        (graph, skipped)
    }

    pub fn add_node(&mut self, node: N) {
        self.adj_list.entry(node).or_default();
    }

    fn push_edge(&mut self, from: N, to: N, capacity: Capacity) {
        let edges = self.adj_list.entry(from.clone()).or_default();
        edges.push(ResidualEdge::new(from, to, capacity));
        self.edge_count += 1;
    }

    /// Adds `from -> to` with the given capacity, together with an empty
    /// `to -> from` if that pair is still unknown. A second edge on the same
    /// ordered pair is merged into the first one.
    pub fn add_edge(&mut self, from: N, to: N, capacity: Capacity) -> Result<(), GraphError> {
        if !is_valid_capacity(capacity) {
            return Err(GraphError::InvalidCapacity {
                from: format!("{:?}", from),
                to: format!("{:?}", to),
                capacity,
            });
        }

        self.add_node(from.clone());
        self.add_node(to.clone());

        match self.edge_mut(&from, &to) {
            Some(edge) => {
                edge.original += capacity;
                let merged = edge.capacity() + capacity;
                edge.set_capacity(merged);
            }
            None => self.push_edge(from.clone(), to.clone(), capacity),
        }

        if self.edge(&to, &from).is_none() {
            self.push_edge(to, from, 0.0);
        }
        Ok(())
    }

    pub fn edge(&self, from: &N, to: &N) -> Option<&ResidualEdge<N>> {
        self.adj_list.get(from)?.iter().find(|edge| &edge.to == to)
    }

    fn edge_mut(&mut self, from: &N, to: &N) -> Option<&mut ResidualEdge<N>> {
        self.adj_list
            .get_mut(from)?
            .iter_mut()
            .find(|edge| &edge.to == to)
    }

    pub fn outgoing(&self, node: &N) -> &[ResidualEdge<N>] {
        self.adj_list
            .get(node)
            .map(|edges| edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_node(&self, node: &N) -> bool {
        self.adj_list.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.adj_list.keys()
    }

    /// All residual edges, reverse sides included.
    pub fn edges(&self) -> impl Iterator<Item = &ResidualEdge<N>> {
        self.adj_list.values().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.adj_list.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Net flow leaving `node`: outgoing flow minus incoming flow, measured
    /// against construction capacities. Zero everywhere except source and sink
    /// once a valid flow has been pushed.
    pub fn net_outflow(&self, node: &N) -> Capacity {
        // Pushing b across u -> v lowers cap(u, v) and raises cap(v, u) by b,
        // so the outgoing residual deltas of a node are its net flow.
        self.outgoing(node).iter().map(|edge| edge.flow()).sum()
    }
}
