//! CLI definitions and command implementations for the chain maker.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod init;
pub mod make;

/// Chain maker — generate and package blockchain node cluster configurations.
#[derive(Debug, Parser)]
#[command(name = "chainmaker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a default TOML configuration file.
    Init {
        /// Output path for the configuration file.
        #[arg(short, long, default_value = "chain.toml")]
        output: PathBuf,

        /// Overwrite the file if it already exists.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Make a chain and package it for distribution.
    Make(MakeArgs),
}

/// Arguments of `chainmaker make`. Flags override the configuration file.
#[derive(Debug, Args)]
pub struct MakeArgs {
    /// Name of the chain to make.
    pub name: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(short, long, env = "CHAINMAKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Artifact format: tar, zip or kubernetes.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Account types as Role:Count, comma separated (e.g. Full:1,Participant:5).
    #[arg(short, long, value_delimiter = ',')]
    pub account_types: Vec<String>,

    /// Built-in chain type (simplechain, devchain, sprawlchain).
    #[arg(long)]
    pub chain_type: Option<String>,

    /// Validators CSV for known-accounts mode.
    #[arg(long)]
    pub validators_csv: Option<PathBuf>,

    /// Accounts CSV for known-accounts mode.
    #[arg(long)]
    pub accounts_csv: Option<PathBuf>,

    /// Directory chains and archives are written to.
    #[arg(long)]
    pub chains_dir: Option<PathBuf>,

    /// Replace an existing chain directory.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Debug output.
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}
