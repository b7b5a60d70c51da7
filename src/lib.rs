//! cpdv library crate: consecutive packet delay variation extraction and
//! plotting, shared by the `cpdv-extract` and `cpdv-diagram` binaries and
//! the benchmarks.

pub mod binning;
pub mod capture;
pub mod cli;
pub mod config;
pub mod delta;
pub mod diagram;
pub mod display;
pub mod extract;
pub mod flow;
pub mod plot;
pub mod protocol;
pub mod sequence;
pub mod tsv;

/// Log level for a `-v` count.
pub fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Install the global `tracing` subscriber.
pub fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_target(false)
        .init();
}
