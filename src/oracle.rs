use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::residual::{is_valid_capacity, Capacity, NodeId};

fn bfs_visit(
    adj_list: &[FxHashMap<usize, Capacity>],
    source: usize,
    target: usize,
) -> Option<Vec<usize>> {
    let mut parent = vec![None; adj_list.len()];
    let mut visited = vec![false; adj_list.len()];
    let mut queue = VecDeque::from([source]);
    visited[source] = true;

    while let Some(node) = queue.pop_front() {
        if node == target {
            let mut path = vec![node];
            let mut current = node;
            while let Some(prev) = parent[current] {
                path.push(prev);
                current = prev;
            }
            // Path is reversed
            return Some(path);
        }

        for (&head, &capacity) in adj_list[node].iter() {
            if capacity > 0.0 && !visited[head] {
                visited[head] = true;
                parent[head] = Some(node);
                queue.push_back(head);
            }
        }
    }

    None
}

/// Sequential Edmonds-Karp over the same triples the network is built from.
/// Reference value for validating the concurrent solver, invalid triples are
/// ignored the same way the graph construction ignores them.
pub fn edmonds_karp<N: NodeId>(
    triples: impl IntoIterator<Item = (N, N, Capacity)>,
    source: &N,
    sink: &N,
) -> Capacity {
    let mut mapping = FxHashMap::default();
    let mut adj_list: Vec<FxHashMap<usize, Capacity>> = vec![];

    let mut index_of = |node: N, adj_list: &mut Vec<FxHashMap<usize, Capacity>>| {
        *mapping.entry(node).or_insert_with(|| {
            adj_list.push(FxHashMap::default());
            adj_list.len() - 1
        })
    };

    for (from, to, capacity) in triples {
        if !is_valid_capacity(capacity) {
            continue;
        }
        let node = index_of(from, &mut adj_list);
        let target = index_of(to, &mut adj_list);
        *adj_list[node].entry(target).or_default() += capacity;
        adj_list[target].entry(node).or_insert(0.0);
    }

    let (Some(&source), Some(&sink)) = (mapping.get(source), mapping.get(sink)) else {
        return 0.0;
    };
    if source == sink {
        return 0.0;
    }

    let mut tot_flow = 0.0;
    while let Some(path) = bfs_visit(&adj_list, source, sink) {
        let mut max_flow = Capacity::INFINITY;
        for edge in path.windows(2) {
            let (node, next) = (edge[1], edge[0]);
            max_flow = max_flow.min(adj_list[node].get(&next).copied().unwrap_or(0.0));
        }
        if max_flow <= 0.0 {
            break;
        }
        tot_flow += max_flow;

        for edge in path.windows(2) {
            let (node, next) = (edge[1], edge[0]);
            if let Some(capacity) = adj_list[node].get_mut(&next) {
                *capacity -= max_flow;
            }
            if let Some(rev_capacity) = adj_list[next].get_mut(&node) {
                *rev_capacity += max_flow;
            }
        }
    }

    tot_flow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textbook_network() {
        // CLRS 26.1
        let edges = vec![
            ("s", "v1", 16.0),
            ("s", "v2", 13.0),
            ("v2", "v1", 4.0),
            ("v1", "v3", 12.0),
            ("v3", "v2", 9.0),
            ("v2", "v4", 14.0),
            ("v4", "v3", 7.0),
            ("v3", "t", 20.0),
            ("v4", "t", 4.0),
        ];
        assert_eq!(edmonds_karp(edges, &"s", &"t"), 23.0);
    }

    #[test]
    fn missing_endpoints_have_no_flow() {
        let edges = vec![(0, 1, 2.0)];
        assert_eq!(edmonds_karp(edges.clone(), &0, &5), 0.0);
        assert_eq!(edmonds_karp(edges.clone(), &5, &1), 0.0);
        assert_eq!(edmonds_karp(edges, &0, &0), 0.0);
    }

    #[test]
    fn invalid_triples_are_ignored() {
        let edges = vec![(0, 1, 2.0), (1, 2, -1.0), (0, 2, 1.0)];
        assert_eq!(edmonds_karp(edges, &0, &2), 1.0);
    }
}
