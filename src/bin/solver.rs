use log::LevelFilter;
use concurrent_max_flow::{
    generator::{generate, GeneratorConfig},
    network::FlowNetwork,
    oracle::edmonds_karp,
    parser::ParsedNetwork,
    residual::{Capacity, ResidualGraph},
    workers::{MaxFlowSolver, SolverConfig},
};
use std::{
    path::PathBuf,
    process::exit,
    sync::{atomic::AtomicBool, Arc},
    time::Instant,
};
use structopt::StructOpt;

#[derive(StructOpt)]
struct Args {
    /// Network file, one `from to capacity` edge per line
    #[structopt(required_unless = "generate")]
    input: Option<PathBuf>,

    #[structopt(long, default_value = "0")]
    source: String,

    #[structopt(long, default_value = "T")]
    sink: String,

    /// Worker threads per batch, defaults to the available parallelism
    #[structopt(short, long)]
    threads: Option<usize>,

    #[structopt(long)]
    max_rounds: Option<usize>,

    /// Print the edges of the minimum cut
    #[structopt(short, long)]
    min_cut: bool,

    /// Compare the result against a sequential Edmonds-Karp run
    #[structopt(short, long)]
    check: bool,

    /// Solve a random network with this many nodes instead of reading one
    #[structopt(long)]
    generate: Option<usize>,

    #[structopt(long, default_value = "40")]
    edges_per_node: usize,

    #[structopt(long, default_value = "0")]
    seed: u64,

    /// Save the generated network
    #[structopt(long)]
    write_network: Option<PathBuf>,

    #[structopt(short, long)]
    verbose: bool,
}

// Mimalloc allocator
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

struct ConsoleLogger {
    start: Instant,
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{:.2?} {} - {}",
                self.start.elapsed(),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

fn load_edges(args: &Args) -> Result<(Vec<(String, String, Capacity)>, String, String), String> {
    if let Some(nodes) = args.generate {
        let config = GeneratorConfig {
            nodes,
            edges_per_node: args.edges_per_node,
            seed: args.seed,
            ..Default::default()
        };
        let edges = generate(&config)
            .into_iter()
            .map(|(u, v, capacity)| (u.to_string(), v.to_string(), capacity))
            .collect::<Vec<_>>();
        log::info!("Generated {} edges on {} nodes", edges.len(), nodes);

        if let Some(path) = &args.write_network {
            ParsedNetwork::write(path, &edges).map_err(|err| err.to_string())?;
        }
        return Ok((
            edges,
            config.source().to_string(),
            config.sink().to_string(),
        ));
    }

    let Some(input) = &args.input else {
        return Err("no input network".to_string());
    };
    let parsed = ParsedNetwork::from_file(input).map_err(|err| err.to_string())?;
    if parsed.skipped > 0 {
        log::warn!("Skipped {} malformed lines", parsed.skipped);
    }
    Ok((parsed.edges, args.source.clone(), args.sink.clone()))
}

fn main() {
    let args = Args::from_args();

    let console_logger = ConsoleLogger {
        start: Instant::now(),
    };
    let console_logger = Box::leak(Box::new(console_logger));

    if log::set_logger(console_logger).is_ok() {
        log::set_max_level(match () {
            #[cfg(feature = "verbose")]
            () => LevelFilter::Debug,
            #[cfg(not(feature = "verbose"))]
            () if args.verbose => LevelFilter::Debug,
            #[cfg(not(feature = "verbose"))]
            () => LevelFilter::Warn,
        });
    }

    let (edges, source, sink) = match load_edges(&args) {
        Ok(loaded) => loaded,
        Err(err) => {
            log::error!("{}", err);
            exit(2);
        }
    };

    let (graph, _) = ResidualGraph::from_triples(edges.iter().cloned());
    log::info!(
        "Network with {} nodes and {} residual edges",
        graph.node_count(),
        graph.edge_count()
    );
    let network = FlowNetwork::new(graph, source.clone(), sink.clone());

    let cancel = Arc::new(AtomicBool::new(false));
    for signal in [libc::SIGINT, libc::SIGTERM] {
        if let Err(err) = signal_hook::flag::register(signal, cancel.clone()) {
            log::warn!("Cannot install signal handler: {}", err);
        }
    }

    let mut config = SolverConfig::default();
    if let Some(threads) = args.threads {
        config.workers = threads;
    }
    config.max_rounds = args.max_rounds;

    let solver = MaxFlowSolver::new(config).with_cancel_flag(cancel);
    let report = solver.run(&network);
    if !report.converged {
        log::warn!("Computation interrupted, the flow is not maximal");
    }

    println!("{}", report.flow);

    if args.min_cut {
        let cut = network.min_cut();
        for edge in cut.edges.iter() {
            println!("{} {} {}", edge.from, edge.to, edge.capacity);
        }
        log::info!(
            "Cut of {} edges, {} nodes on the source side, capacity {}",
            cut.edges.len(),
            cut.source_side.len(),
            cut.capacity()
        );
    }

    if args.check {
        let expected = edmonds_karp(edges, &source, &sink);
        if (expected - report.flow).abs() > 1e-9 * expected.abs().max(1.0) {
            log::error!("Max flow mismatch: expected {}, got {}", expected, report.flow);
            exit(1);
        }
        log::info!("Max flow matches the reference value");
    }
}
