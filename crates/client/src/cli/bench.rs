//! Benchmark CLI arguments.

use clap::Parser;

use crate::bench::BenchConfig;

/// Repeats the CRUD cycle and reports latency statistics.
#[derive(Debug, Parser)]
pub struct BenchArgs {
    /// CRUD cycles per worker.
    #[arg(long, short = 'n', default_value_t = 10)]
    pub iterations: usize,
    /// Concurrent workers.
    #[arg(long, short = 'c', default_value_t = 1)]
    pub concurrency: usize,
    /// Attach a generated JSON payload of at least this many KiB.
    #[arg(long, default_value_t = 0)]
    pub payload_kb: usize,
}

impl BenchArgs {
    pub fn config(&self) -> BenchConfig {
        BenchConfig {
            iterations: self.iterations,
            concurrency: self.concurrency,
            payload_kb: self.payload_kb,
        }
    }
}
