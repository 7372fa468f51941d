//! `chainmaker make` command — make a chain and package it.
//!
//! Loads `.env` and the optional TOML configuration, applies command-line
//! overrides, then runs the [`Provisioner`] with the filesystem maker, the
//! mnemonic key client and the archive packager.

use dotenvy::dotenv;

use super::MakeArgs;
use crate::chain::LocalMaker;
use crate::config::{Config, load_config};
use crate::error::Error;
use crate::keys::MnemonicKeyClient;
use crate::output::ArchivePackager;
use crate::provision::Provisioner;
use crate::telemetry::{Telemetry, log_level};

/// Merge command-line overrides into the loaded configuration.
fn apply_overrides(config: &mut Config, args: MakeArgs) {
    let chain = &mut config.chain;
    if let Some(name) = args.name {
        chain.name = name;
    }
    if let Some(output) = args.output {
        chain.output = output;
    }
    if !args.account_types.is_empty() {
        chain.account_types = args.account_types;
    }
    if args.chain_type.is_some() {
        chain.chain_type = args.chain_type;
    }
    if args.validators_csv.is_some() {
        chain.validators_csv = args.validators_csv;
    }
    if args.accounts_csv.is_some() {
        chain.accounts_csv = args.accounts_csv;
    }
    if let Some(chains_dir) = args.chains_dir {
        chain.chains_dir = chains_dir;
    }
    chain.force |= args.force;
    chain.verbose = args.verbose;
    chain.debug = args.debug;
}

/// Execute the `make` command.
///
/// # Errors
///
/// Returns an error if configuration loading or any provisioning stage
/// fails.
pub fn run(args: MakeArgs) -> Result<(), Error> {
    // Load .env variables
    dotenv().ok();

    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_log_level(log_level(args.verbose, args.debug))
        .register();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, args);

    let chains_dir = config.chain.chains_dir.clone();
    let provisioner = Provisioner::new(
        MnemonicKeyClient::new(config.keys),
        LocalMaker,
        ArchivePackager::new(chains_dir),
    );
    // The provisioner logs the artifact path; its advisory must stay last.
    provisioner.provision(&config.chain)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::*;
    use crate::cmd::{Cli, Commands};

    fn make_args(argv: &[&str]) -> MakeArgs {
        let cli = Cli::try_parse_from(["chainmaker", "make"].iter().chain(argv)).unwrap();
        match cli.command {
            Commands::Make(args) => args,
            Commands::Init { .. } => unreachable!(),
        }
    }

    #[test]
    fn flags_override_file_values() {
        let mut config: Config = toml::from_str(
            "[chain]\nname = \"file\"\noutput = \"zip\"\naccount_types = [\"Full:1\"]\nforce = true\n",
        )
        .unwrap();
        apply_overrides(
            &mut config,
            make_args(&["cli", "-a", "Validator:2", "--chains-dir", "out", "-d"]),
        );
        assert_eq!(config.chain.name, "cli");
        assert_eq!(config.chain.output, "zip");
        assert_eq!(config.chain.account_types, ["Validator:2"]);
        assert_eq!(config.chain.chains_dir, PathBuf::from("out"));
        assert!(config.chain.force);
        assert!(config.chain.debug);
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let mut config: Config =
            toml::from_str("[chain]\nname = \"file\"\nchain_type = \"devchain\"\n").unwrap();
        let before = config.chain.clone();
        apply_overrides(&mut config, make_args(&[]));
        assert_eq!(config.chain, before);
    }
}
