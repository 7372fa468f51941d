//! Resolved chain configuration and chain-type templates.

use std::path::PathBuf;

use crate::config::ChainRequest;
use crate::error::Error;
use crate::output::OutputFormat;

/// Registry every chain image is pulled from.
pub const DEFAULT_REGISTRY: &str = "quay.io";

/// Database image run by every node of a chain.
pub const IMAGE_DB: &str = concat!("chainmaker/db:", env!("CARGO_PKG_VERSION"));

/// Ports exposed by every node: ABCI, P2P and RPC.
pub const EXPOSED_PORTS: [u16; 3] = [1337, 46656, 46657];

/// Built-in chain types and the account types each expands to.
const CHAIN_TYPES: &[(&str, &[&str])] = &[
    ("simplechain", &["Full:1"]),
    ("devchain", &["Full:1", "Developer:2"]),
    (
        "sprawlchain",
        &["Root:1", "Full:1", "Validator:4", "Participant:10"],
    ),
];

/// Account types for the chain-type template `name`, if it exists.
#[must_use]
pub fn chain_type_template(name: &str) -> Option<&'static [&'static str]> {
    CHAIN_TYPES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, account_types)| *account_types)
}

/// Names of every built-in chain type.
pub fn chain_type_names() -> impl Iterator<Item = &'static str> {
    CHAIN_TYPES.iter().map(|(name, _)| *name)
}

/// A fully-resolved chain configuration.
///
/// Built from a [`ChainRequest`] by [`ChainSpec::from_request`], which also
/// applies the chain-wide container defaults. The request itself is left
/// untouched, so one request can serve as a template for many calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    /// Chain identifier, also the chain directory and archive name.
    pub name: String,
    /// Requested artifact format.
    pub output: OutputFormat,
    /// `"Role:Count"` descriptors, possibly empty.
    pub account_types: Vec<String>,
    /// Chain-type template name.
    pub chain_type: Option<String>,
    /// Validators CSV for known-accounts mode.
    pub validators_csv: Option<PathBuf>,
    /// Accounts CSV for known-accounts mode.
    pub accounts_csv: Option<PathBuf>,
    /// Directory holding materialized chains and their artifacts.
    pub chains_dir: PathBuf,
    /// Replace an existing chain directory.
    pub force: bool,
    /// Log every file written.
    pub verbose: bool,
    /// Container image for every node.
    pub image: String,
    /// Ports every node container exposes.
    pub exposed_ports: Vec<u16>,
    /// Whether nodes keep their state on a persistent data volume.
    pub data_container: bool,
    /// Container entrypoint override; empty means the image default.
    pub entrypoint: String,
}

impl ChainSpec {
    /// Resolve `request` and apply the chain-wide defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the chain name is empty or contains
    /// characters other than ASCII alphanumerics, `-` and `_`.
    pub fn from_request(request: &ChainRequest) -> Result<Self, Error> {
        validate_name(&request.name)?;
        Ok(Self {
            name: request.name.clone(),
            output: OutputFormat::from(request.output.as_str()),
            account_types: request.account_types.clone(),
            chain_type: request.chain_type.clone(),
            validators_csv: request.validators_csv.clone(),
            accounts_csv: request.accounts_csv.clone(),
            chains_dir: request.chains_dir.clone(),
            force: request.force,
            verbose: request.verbose || request.debug,
            image: format!("{DEFAULT_REGISTRY}/{IMAGE_DB}"),
            exposed_ports: EXPOSED_PORTS.to_vec(),
            data_container: true,
            entrypoint: String::new(),
        })
    }

    /// Directory the chain's files are materialized into.
    #[must_use]
    pub fn chain_dir(&self) -> PathBuf {
        self.chains_dir.join(&self.name)
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::config("chain name is required"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::config(format!(
            "chain name '{name}' may only contain ASCII letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}
