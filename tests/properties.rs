use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Barrier,
    },
    thread,
};

use concurrent_max_flow::{
    commit::CommitOutcome,
    generator::{generate, GeneratorConfig},
    network::FlowNetwork,
    oracle::edmonds_karp,
    residual::{Capacity, ResidualGraph},
    workers::{MaxFlowSolver, SolverConfig},
};

fn generated(config: &GeneratorConfig) -> (Vec<(usize, usize, Capacity)>, FlowNetwork<usize>) {
    let edges = generate(config);
    let (graph, skipped) = ResidualGraph::from_triples(edges.iter().copied());
    assert_eq!(skipped, 0);
    (edges, FlowNetwork::new(graph, config.source(), config.sink()))
}

fn small_config(seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        nodes: 60,
        edges_per_node: 6,
        seed,
        ..Default::default()
    }
}

#[test]
fn matches_reference_on_generated_networks() {
    let _ = env_logger::builder().is_test(true).try_init();

    for seed in 0..5 {
        let config = small_config(seed);
        let (edges, network) = generated(&config);
        let report = MaxFlowSolver::new(SolverConfig {
            workers: 4,
            max_rounds: None,
        })
        .run(&network);

        assert!(report.converged);
        assert_eq!(
            report.flow,
            edmonds_karp(edges, &config.source(), &config.sink()),
            "seed {}",
            seed
        );
    }
}

#[test]
fn flow_is_conserved_and_bounded() {
    let config = small_config(11);
    let (_, network) = generated(&config);
    MaxFlowSolver::new(SolverConfig {
        workers: 6,
        max_rounds: None,
    })
    .run(&network);
    let flow = network.max_flow();
    let graph = network.into_inner();

    for node in graph.nodes() {
        let net = graph.net_outflow(node);
        if *node == config.source() {
            assert_eq!(net, flow);
        } else if *node == config.sink() {
            assert_eq!(net, -flow);
        } else {
            assert_eq!(net, 0.0, "node {}", node);
        }
    }

    for edge in graph.edges() {
        assert!(edge.capacity() >= 0.0);
        let reverse_original = graph
            .edge(&edge.to, &edge.from)
            .map(|reverse| reverse.original)
            .unwrap_or(0.0);
        assert!(edge.capacity() <= edge.original + reverse_original);
        assert_eq!(edge.hint_count(), 0);
    }
}

#[test]
fn max_flow_equals_min_cut() {
    for seed in 20..24 {
        let (_, network) = generated(&small_config(seed));
        MaxFlowSolver::new(SolverConfig::default()).run(&network);
        let cut = network.min_cut();

        assert!(!cut.source_side.contains(network.sink()));
        assert_eq!(cut.capacity(), network.max_flow(), "seed {}", seed);
    }
}

#[test]
fn converged_network_needs_no_more_commits() {
    let (_, network) = generated(&small_config(3));
    let solver = MaxFlowSolver::new(SolverConfig {
        workers: 4,
        max_rounds: None,
    });
    let first = solver.run(&network);
    let commits = network.commits();

    let second = solver.run(&network);
    assert!(second.converged);
    assert_eq!(second.commits, 0);
    assert_eq!(second.stale_commits, 0);
    assert_eq!(network.commits(), commits);
    assert_eq!(second.flow, first.flow);
}

#[test]
fn shared_edge_is_consumed_once() {
    let (graph, _) = ResidualGraph::from_triples(vec![
        ("S", "A", 10.0),
        ("S", "B", 10.0),
        ("A", "C", 10.0),
        ("B", "C", 10.0),
        ("C", "T", 4.0),
    ]);
    let network = FlowNetwork::new(graph, "S", "T");

    let first = network.find_path().unwrap();
    let second = network.find_path().unwrap();
    // Hints steered the second search away from A
    assert_ne!(first, second);
    assert_eq!(first.discovered_bottleneck, 4.0);
    assert_eq!(second.discovered_bottleneck, 4.0);

    assert_eq!(network.commit(&first), CommitOutcome::Applied(4.0));
    assert_eq!(network.commit(&second), CommitOutcome::Stale);

    let graph = network.into_inner();
    assert_eq!(graph.edge(&"C", &"T").unwrap().capacity(), 0.0);
    assert_eq!(graph.edge(&"T", &"C").unwrap().capacity(), 4.0);
    assert!(graph.edges().all(|edge| edge.capacity() >= 0.0));
    assert!(graph.edges().all(|edge| edge.hint_count() == 0));
}

#[test]
fn racing_commits_of_one_path() {
    let (graph, _) = ResidualGraph::from_triples(vec![("S", "T", 4.0)]);
    let network = FlowNetwork::new(graph, "S", "T");
    let racers = 8;

    let paths = (0..racers)
        .map(|_| network.find_path().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(network.graph().edge(&"S", &"T").unwrap().hint_count(), racers);

    let barrier = Barrier::new(racers);
    let (barrier, network) = (&barrier, &network);
    let outcomes = thread::scope(|scope| {
        let handles = paths
            .iter()
            .map(|path| {
                scope.spawn(move || {
                    barrier.wait();
                    network.commit(path)
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_applied()).count(), 1);
    assert_eq!(network.stale_commits(), racers - 1);
    assert_eq!(network.max_flow(), 4.0);

    let graph = network.graph();
    let edge = graph.edge(&"S", &"T").unwrap();
    assert_eq!(edge.capacity(), 0.0);
    assert_eq!(edge.hint_count(), 0);
}

#[test]
fn outside_searches_run_alongside_workers() {
    let config = small_config(7);
    let (edges, network) = generated(&config);
    let done = AtomicBool::new(false);
    let (done, network) = (&done, &network);

    let (report, checks) = thread::scope(|scope| {
        let checker = scope.spawn(move || {
            let mut checks = 0usize;
            loop {
                network.has_augmenting_path();
                checks += 1;
                if done.load(Ordering::Acquire) {
                    break checks;
                }
            }
        });
        let report = MaxFlowSolver::new(SolverConfig {
            workers: 4,
            max_rounds: None,
        })
        .run(network);
        done.store(true, Ordering::Release);
        (report, checker.join().unwrap())
    });

    assert!(checks > 0);
    assert!(report.converged);
    assert_eq!(
        report.flow,
        edmonds_karp(edges, &config.source(), &config.sink())
    );
    assert!(network.graph().edges().all(|edge| edge.hint_count() == 0));
}
