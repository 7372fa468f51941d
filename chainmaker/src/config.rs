//! Configuration loading and default template generation.
//!
//! This module provides:
//!
//! - [`ChainRequest`] — the declarative description of one chain.
//! - [`Config`] — the whole TOML file: a `[chain]` request plus `[keys]`.
//! - [`load_config`] — Reads and parses a TOML configuration file.
//! - [`generate_default_config`] — Produces a commented TOML template.
//!
//! # Configuration File Format
//!
//! ```toml
//! [chain]
//! name = "testchain"
//! output = "tar"
//! account_types = ["Full:1", "Participant:5"]
//!
//! [keys]
//! mnemonic = "$CHAIN_MNEMONIC"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::keys::KeysConfig;

/// Directory chains are written to when none is configured.
pub const DEFAULT_CHAINS_DIR: &str = "chains";

/// Output format used when none is configured.
pub const DEFAULT_OUTPUT: &str = "tar";

/// A request to make one chain.
///
/// Read-only to the provisioning flow: defaults are applied on a resolved
/// copy, see [`ChainSpec`](crate::chain::ChainSpec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainRequest {
    /// Chain name (required).
    pub name: String,
    /// Requested output format: `tar`, `zip` or `kubernetes`.
    pub output: String,
    /// `"Role:Count"` account-type descriptors.
    pub account_types: Vec<String>,
    /// Chain-type template name, e.g. `simplechain`.
    pub chain_type: Option<String>,
    /// Validators CSV for known-accounts mode.
    pub validators_csv: Option<PathBuf>,
    /// Accounts CSV for known-accounts mode.
    pub accounts_csv: Option<PathBuf>,
    /// Directory chains and artifacts are written to.
    pub chains_dir: PathBuf,
    /// Replace an existing chain directory.
    pub force: bool,
    /// Verbose output.
    #[serde(skip)]
    pub verbose: bool,
    /// Debug output.
    #[serde(skip)]
    pub debug: bool,
}

impl Default for ChainRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            output: DEFAULT_OUTPUT.to_owned(),
            account_types: Vec::new(),
            chain_type: None,
            validators_csv: None,
            accounts_csv: None,
            chains_dir: PathBuf::from(DEFAULT_CHAINS_DIR),
            force: false,
            verbose: false,
            debug: false,
        }
    }
}

/// Full configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The chain to make.
    pub chain: ChainRequest,
    /// Key derivation settings.
    pub keys: KeysConfig,
}

/// Load configuration from a TOML file at the given path.
///
/// Missing fields fall back to their defaults; the key mnemonic defaults to
/// the `CHAIN_MNEMONIC` environment variable.
///
/// # Errors
///
/// Returns an error if the file cannot be resolved, read, or parsed.
pub fn load_config(path: &Path) -> Result<Config, Error> {
    let config_path = path.canonicalize().map_err(|e| {
        Error::config_with(
            format!("failed to resolve config path '{}'", path.display()),
            e,
        )
    })?;
    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        Error::config_with(
            format!("failed to read config file '{}'", config_path.display()),
            e,
        )
    })?;
    toml::from_str(&content).map_err(|e| {
        Error::config_with(
            format!("failed to parse TOML config '{}'", config_path.display()),
            e,
        )
    })
}

/// Generate a default TOML configuration template.
#[must_use]
pub fn generate_default_config() -> String {
    String::from(
        r#"# Chain maker configuration

[chain]
# Chain name; also names the chain directory and the packaged archive.
name = "mychain"

# Artifact format: "tar" or "zip" ("kubernetes" is not implemented yet).
output = "tar"

# Account types as "Role:Count". Roles: Root, Full, Developer, Participant,
# Validator. Full and Validator accounts are bonded validators at genesis.
account_types = ["Full:1", "Participant:5"]

# Alternatively, a built-in chain type: simplechain, devchain, sprawlchain.
# Ignored when account_types is set.
# chain_type = "simplechain"

# Where chains are materialized and archives written.
chains_dir = "chains"

# Replace an existing chain directory of the same name.
force = false

# ── Account keys ─────────────────────────────────────────────────────
# Every account key is derived from one BIP-39 mnemonic.
# Values support environment variable references: "$VAR" or "${VAR}"

[keys]
mnemonic = "$CHAIN_MNEMONIC"
# passphrase = "$CHAIN_MNEMONIC_PASSPHRASE"
derivation_path = "m/44'/60'/0'/0"
"#,
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn default_template_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.chain.name, "mychain");
        assert_eq!(config.chain.output, "tar");
        assert_eq!(config.chain.account_types, ["Full:1", "Participant:5"]);
        assert_eq!(config.keys, KeysConfig::default());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = toml::from_str("[chain]\nname = \"x\"\n").unwrap();
        assert_eq!(config.chain.output, DEFAULT_OUTPUT);
        assert_eq!(config.chain.chains_dir, PathBuf::from(DEFAULT_CHAINS_DIR));
        assert!(config.chain.account_types.is_empty());
        assert_eq!(config.keys.mnemonic, "$CHAIN_MNEMONIC");
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(toml::from_str::<Config>("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn load_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = load_config(&missing).unwrap_err();
        assert!(err.to_string().starts_with("config: failed to resolve"), "{err}");

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[chain\n").unwrap();
        let err = load_config(&broken).unwrap_err();
        assert!(err.to_string().contains("failed to parse TOML"), "{err}");
    }

    #[test]
    fn loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.toml");
        fs::write(
            &path,
            "[chain]\nname = \"testchain\"\noutput = \"zip\"\nchain_type = \"simplechain\"\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.chain.output, "zip");
        assert_eq!(config.chain.chain_type.as_deref(), Some("simplechain"));
    }
}
