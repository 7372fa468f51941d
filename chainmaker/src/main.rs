//! Chain Maker
//!
//! A CLI tool that makes a blockchain node cluster configuration (genesis,
//! account keys and per-node configs) from a declarative request and packages
//! it as a distributable tar or zip archive.
//!
//! ```sh
//! chainmaker init                                   # Generate default chain.toml
//! chainmaker make -c chain.toml                     # Make and package the chain
//! chainmaker make testchain -a Full:1,Participant:5 # Or configure from flags
//! ```

mod account_types;
mod chain;
mod cmd;
mod config;
mod error;
mod keys;
mod output;
mod provision;
mod telemetry;

use clap::Parser;
use cmd::{Cli, Commands};

#[allow(clippy::print_stderr)]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { output, force } => cmd::init::run(&output, force),
        Commands::Make(args) => cmd::make::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
