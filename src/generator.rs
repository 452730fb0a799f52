use rand::{rngs::StdRng, Rng, SeedableRng};
use rustc_hash::FxHashSet;

use crate::residual::Capacity;

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub nodes: usize,
    pub edges_per_node: usize,
    pub capacity_min: u32,
    pub capacity_max: u32,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            nodes: 200,
            edges_per_node: 40,
            capacity_min: 1,
            capacity_max: 20,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    pub fn source(&self) -> usize {
        0
    }

    pub fn sink(&self) -> usize {
        self.nodes.saturating_sub(1)
    }
}

const MAX_ATTEMPTS_FACTOR: usize = 10;

/// Random network on `0..nodes` with source `0` and sink `nodes - 1`.
///
/// Edges are unique ordered pairs, never self loops, never leaving the sink
/// and never entering the source. Dense requests may yield fewer edges than
/// `nodes * edges_per_node` since the number of attempts is bounded.
pub fn generate(config: &GeneratorConfig) -> Vec<(usize, usize, Capacity)> {
    if config.nodes < 2 {
        return vec![];
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (source, sink) = (config.source(), config.sink());
    let target_edges = config.nodes * config.edges_per_node;

    let mut seen = FxHashSet::default();
    let mut edges = vec![];
    let mut attempts = 0;
    while edges.len() < target_edges && attempts < target_edges * MAX_ATTEMPTS_FACTOR {
        attempts += 1;
        let u = rng.gen_range(0..config.nodes);
        let v = rng.gen_range(0..config.nodes);
        if u == sink || v == source || u == v || !seen.insert((u, v)) {
            continue;
        }
        edges.push((u, v));
    }

    let (capacity_min, capacity_max) = (
        config.capacity_min.min(config.capacity_max),
        config.capacity_min.max(config.capacity_max),
    );
    edges
        .into_iter()
        .map(|(u, v)| (u, v, rng.gen_range(capacity_min..=capacity_max) as Capacity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_structure_constraints() {
        let config = GeneratorConfig {
            nodes: 30,
            edges_per_node: 5,
            seed: 7,
            ..Default::default()
        };
        let edges = generate(&config);

        assert_eq!(edges.len(), 150);
        let mut pairs = FxHashSet::default();
        for &(u, v, capacity) in edges.iter() {
            assert_ne!(u, v);
            assert_ne!(u, config.sink());
            assert_ne!(v, config.source());
            assert!((1.0..=20.0).contains(&capacity));
            assert!(pairs.insert((u, v)));
        }
    }

    #[test]
    fn same_seed_same_network() {
        let config = GeneratorConfig {
            nodes: 20,
            edges_per_node: 3,
            seed: 42,
            ..Default::default()
        };
        assert_eq!(generate(&config), generate(&config));
    }

    #[test]
    fn tiny_networks() {
        let config = GeneratorConfig {
            nodes: 1,
            ..Default::default()
        };
        assert!(generate(&config).is_empty());

        // Only 0 -> 1 is allowed
        let config = GeneratorConfig {
            nodes: 2,
            edges_per_node: 3,
            ..Default::default()
        };
        assert_eq!(generate(&config).len(), 1);
    }
}
