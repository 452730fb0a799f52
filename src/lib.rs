pub mod commit;
pub mod min_cut;
pub mod network;
pub mod residual;
pub mod search;
pub mod workers;

pub mod generator;
pub mod oracle;
pub mod parser;
