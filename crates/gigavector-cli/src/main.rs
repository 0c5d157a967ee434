#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_precision_loss)]
//! `GigaVector` CLI - benchmark harness and interactive REPL.
//!
//! Usage:
//!   `gigavector repl`
//!   `gigavector bench`
//!   `gigavector bench --dims 128,256`

mod bench;
mod repl;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gigavector")]
#[command(author, version, about = "GigaVector CLI - benchmark harness and REPL")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive REPL over an in-process namespace manager
    Repl,

    /// Measure per-operation latency of the distance kernels
    Bench {
        /// Vector dimensions to measure, comma-separated
        #[arg(long, value_delimiter = ',', default_value = "16,32,64,128,256,512")]
        dims: Vec<usize>,

        /// Iterations per (metric, dimension) pair
        #[arg(long, default_value = "20000")]
        iterations: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Repl => repl::run(),
        Commands::Bench { dims, iterations } => {
            bench::run(&dims, iterations);
            Ok(())
        }
    }
}
