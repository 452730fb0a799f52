use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::Path,
};

use thiserror::Error;

use crate::residual::{is_valid_capacity, Capacity, ResidualGraph};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read network: {0}")]
    Io(#[from] io::Error),
}

/// Network description as `from to capacity` lines.
#[derive(Clone, Debug, Default)]
pub struct ParsedNetwork {
    pub edges: Vec<(String, String, Capacity)>,
    /// Malformed lines that were ignored
    pub skipped: usize,
}

impl ParsedNetwork {
    pub fn from_file(file: impl AsRef<Path>) -> Result<Self, ParseError> {
        Self::new(File::open(file)?)
    }

    pub fn new(input: impl io::Read) -> Result<Self, ParseError> {
        let input = BufReader::new(input);
        let mut network = ParsedNetwork::default();

        for (idx, line) in input.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts = line.split_whitespace().collect::<Vec<_>>();
            let &[from, to, capacity] = parts.as_slice() else {
                log::warn!(
                    "Skipping malformed line {}: {} (expected 3 fields, got {})",
                    idx + 1,
                    line,
                    parts.len()
                );
                network.skipped += 1;
                continue;
            };

            match capacity.parse::<Capacity>() {
                Ok(capacity) if is_valid_capacity(capacity) => {
                    network
                        .edges
                        .push((from.to_string(), to.to_string(), capacity));
                }
                Ok(capacity) => {
                    // Negative, NaN or infinite
                    log::warn!("Skipping line {}: invalid capacity {}", idx + 1, capacity);
                    network.skipped += 1;
                }
                Err(err) => {
                    log::warn!("Skipping line {}: {} ({})", idx + 1, line, err);
                    network.skipped += 1;
                }
            }
        }

        Ok(network)
    }

    pub fn into_graph(self) -> ResidualGraph<String> {
        let (graph, _) = ResidualGraph::from_triples(self.edges);
        graph
    }

    pub fn write(file: impl AsRef<Path>, edges: &[(String, String, Capacity)]) -> Result<(), ParseError> {
        let mut output = File::create(file)?;
        for (from, to, capacity) in edges {
            writeln!(output, "{} {} {}", from, to, capacity)?;
        }
        Ok(())
    }
}
