//! Chain materialization: genesis, account keys and node configs on disk.
//!
//! [`LocalMaker`] lays a chain out as
//!
//! ```text
//! <chains_dir>/<name>/
//!   genesis.json
//!   accounts.json
//!   <name>_<role>_<nnn>/
//!     genesis.json
//!     priv_validator.json
//!     config.toml
//! ```
//!
//! so every account directory can be shipped to its operator on its own.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::spec::{ChainSpec, chain_type_names, chain_type_template};
use crate::account_types::{self, Role};
use crate::error::Error;
use crate::keys::{AccountKey, KeyClient};

/// A materialized chain: its root directory and every file written under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainFiles {
    /// Chain name.
    pub name: String,
    /// Directory holding the chain's files.
    pub root: PathBuf,
    /// Paths of every written file, relative to `root`, in write order.
    pub files: Vec<PathBuf>,
}

/// Chain-maker collaborator: turns a [`ChainSpec`] into files on disk.
pub trait ChainMaker {
    /// Materialize the chain described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Maker`] if the account composition is invalid or the
    /// files cannot be written, and propagates key-derivation errors.
    fn make(&self, spec: &ChainSpec, keys: &dyn KeyClient) -> Result<ChainFiles, Error>;
}

/// Writes chains below [`ChainSpec::chains_dir`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMaker;

#[derive(Debug, Serialize)]
struct GenesisAccount<'a> {
    name: &'a str,
    public_key: &'a str,
    amount: u64,
    permissions: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct GenesisValidator<'a> {
    name: &'a str,
    public_key: &'a str,
    amount: u64,
    unbond_to: &'a str,
}

#[derive(Debug, Serialize)]
struct Genesis<'a> {
    chain_id: &'a str,
    accounts: Vec<GenesisAccount<'a>>,
    validators: Vec<GenesisValidator<'a>>,
}

#[derive(Debug, Serialize)]
struct AccountEntry<'a> {
    name: &'a str,
    role: Role,
    public_key: &'a str,
}

#[derive(Debug, Serialize)]
struct NodeConfig<'a> {
    chain_id: &'a str,
    moniker: &'a str,
    validator: bool,
    container: ContainerConfig<'a>,
}

#[derive(Debug, Serialize)]
struct ContainerConfig<'a> {
    image: &'a str,
    ports: &'a [u16],
    data_container: bool,
    entrypoint: &'a str,
}

#[derive(Debug)]
struct Account {
    name: String,
    role: Role,
    key: AccountKey,
}

impl LocalMaker {
    /// Account-type descriptors the chain is built from.
    fn account_types(spec: &ChainSpec) -> Result<Vec<String>, Error> {
        if spec.validators_csv.is_some() || spec.accounts_csv.is_some() {
            return Err(Error::Maker(
                "importing known validators/accounts from CSV is not supported, \
                 use account types or a chain type"
                    .into(),
            ));
        }
        if !spec.account_types.is_empty() {
            if let Some(chain_type) = &spec.chain_type {
                tracing::debug!(chain_type = %chain_type, "explicit account types given, ignoring chain type");
            }
            return Ok(spec.account_types.clone());
        }
        match &spec.chain_type {
            Some(chain_type) => chain_type_template(chain_type)
                .map(|types| types.iter().map(|t| (*t).to_owned()).collect())
                .ok_or_else(|| {
                    let known: Vec<&str> = chain_type_names().collect();
                    Error::Maker(format!(
                        "unknown chain type '{chain_type}', expected one of [{}]",
                        known.join(",")
                    ))
                }),
            None => Err(Error::Maker(
                "no account types or chain type given; pass --account-types or --chain-type"
                    .into(),
            )),
        }
    }

    /// Expand descriptors into named accounts, one key each.
    fn accounts(
        spec: &ChainSpec,
        account_types: &[String],
        keys: &dyn KeyClient,
    ) -> Result<Vec<Account>, Error> {
        let descriptors = account_types::parse_all(account_types)
            .map_err(|e| Error::maker_with("invalid account types", e))?;
        let mut plan = Vec::with_capacity(descriptors.len());
        let mut total = 0usize;
        for descriptor in &descriptors {
            let role: Role = descriptor.role.parse().map_err(Error::Maker)?;
            let count = usize::try_from(descriptor.count)
                .map_err(|_| Error::Maker(format!("too many '{descriptor}' accounts")))?;
            total = total
                .checked_add(count)
                .ok_or_else(|| Error::Maker("too many accounts".into()))?;
            plan.push((role, count));
        }
        if total == 0 {
            return Err(Error::Maker("chain would contain no accounts".into()));
        }

        let mut keys = keys.derive_keys(total)?.into_iter();
        let mut accounts = Vec::with_capacity(total);
        for (role, count) in plan {
            let prefix = format!("{}_{}", spec.name, role.as_str().to_lowercase());
            let already = accounts.iter().filter(|a: &&Account| a.role == role).count();
            for index in already..already + count {
                let key = keys
                    .next()
                    .ok_or_else(|| Error::Keys("key client returned too few keys".into()))?;
                accounts.push(Account {
                    name: format!("{prefix}_{index:03}"),
                    role,
                    key,
                });
            }
        }
        Ok(accounts)
    }

    fn prepare_dir(spec: &ChainSpec) -> Result<PathBuf, Error> {
        let root = spec.chain_dir();
        if root.exists() {
            if !spec.force {
                return Err(Error::Maker(format!(
                    "'{}' already exists, use --force to overwrite",
                    root.display()
                )));
            }
            fs::remove_dir_all(&root)
                .map_err(|e| Error::maker_with(format!("failed to remove '{}'", root.display()), e))?;
        }
        fs::create_dir_all(&root)
            .map_err(|e| Error::maker_with(format!("failed to create '{}'", root.display()), e))?;
        Ok(root)
    }
}

/// Records every file written below a chain root.
struct ChainWriter<'a> {
    root: &'a Path,
    files: Vec<PathBuf>,
    verbose: bool,
}

impl ChainWriter<'_> {
    fn write(&mut self, rel: PathBuf, contents: &[u8]) -> Result<(), Error> {
        let path = self.root.join(&rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::maker_with(format!("failed to create '{}'", parent.display()), e)
            })?;
        }
        fs::write(&path, contents)
            .map_err(|e| Error::maker_with(format!("failed to write '{}'", path.display()), e))?;
        if self.verbose {
            tracing::info!(file = %path.display(), "wrote");
        }
        self.files.push(rel);
        Ok(())
    }

    fn write_json<T: Serialize>(&mut self, rel: PathBuf, value: &T) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| Error::maker_with(format!("failed to encode '{}'", rel.display()), e))?;
        self.write(rel, &json)
    }

    fn write_toml<T: Serialize>(&mut self, rel: PathBuf, value: &T) -> Result<(), Error> {
        let toml = toml::to_string_pretty(value)
            .map_err(|e| Error::maker_with(format!("failed to encode '{}'", rel.display()), e))?;
        self.write(rel, toml.as_bytes())
    }
}

impl ChainMaker for LocalMaker {
    fn make(&self, spec: &ChainSpec, keys: &dyn KeyClient) -> Result<ChainFiles, Error> {
        let account_types = Self::account_types(spec)?;
        let accounts = Self::accounts(spec, &account_types, keys)?;
        tracing::debug!(accounts = accounts.len(), types = ?account_types, "accounts planned");

        let genesis = Genesis {
            chain_id: &spec.name,
            accounts: accounts
                .iter()
                .map(|a| {
                    let defaults = a.role.defaults();
                    GenesisAccount {
                        name: &a.name,
                        public_key: &a.key.public_key,
                        amount: defaults.amount,
                        permissions: defaults.permissions,
                    }
                })
                .collect(),
            validators: accounts
                .iter()
                .filter(|a| a.role.defaults().power > 0)
                .map(|a| GenesisValidator {
                    name: &a.name,
                    public_key: &a.key.public_key,
                    amount: a.role.defaults().power,
                    unbond_to: &a.key.public_key,
                })
                .collect(),
        };
        let genesis_json = serde_json::to_vec_pretty(&genesis)
            .map_err(|e| Error::maker_with("failed to encode genesis", e))?;

        let root = Self::prepare_dir(spec)?;
        let mut writer = ChainWriter {
            root: &root,
            files: Vec::new(),
            verbose: spec.verbose,
        };
        writer.write(PathBuf::from("genesis.json"), &genesis_json)?;
        let entries: Vec<AccountEntry<'_>> = accounts
            .iter()
            .map(|a| AccountEntry {
                name: &a.name,
                role: a.role,
                public_key: &a.key.public_key,
            })
            .collect();
        writer.write_json(PathBuf::from("accounts.json"), &entries)?;

        for account in &accounts {
            let dir = PathBuf::from(&account.name);
            writer.write(dir.join("genesis.json"), &genesis_json)?;
            writer.write_json(dir.join("priv_validator.json"), &account.key)?;
            writer.write_toml(
                dir.join("config.toml"),
                &NodeConfig {
                    chain_id: &spec.name,
                    moniker: &account.name,
                    validator: account.role.defaults().power > 0,
                    container: ContainerConfig {
                        image: &spec.image,
                        ports: &spec.exposed_ports,
                        data_container: spec.data_container,
                        entrypoint: &spec.entrypoint,
                    },
                },
            )?;
        }

        let files = writer.files;
        tracing::debug!(root = %root.display(), files = files.len(), "chain materialized");
        Ok(ChainFiles {
            name: spec.name.clone(),
            root,
            files,
        })
    }
}
