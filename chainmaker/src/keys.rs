//! Key management for generated chain accounts.
//!
//! [`MnemonicKeyClient`] derives every account key of a chain from a single
//! BIP-39 mnemonic via the [`kobe`] crate family, so a chain can be
//! regenerated with identical keys from the same phrase.
//!
//! The mnemonic is resolved and validated once in [`KeyClient::init`]. Later
//! calls are no-ops, so one client can serve many provisioning runs.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default BIP-44 derivation root; account `i` is derived at `<root>/i`.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0";

/// Environment reference used when no mnemonic is configured.
pub const DEFAULT_MNEMONIC_REF: &str = "$CHAIN_MNEMONIC";

/// `[keys]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// BIP-39 mnemonic, or a `$VAR` / `${VAR}` reference to one.
    pub mnemonic: String,
    /// Optional BIP-39 passphrase, may also be an env reference.
    pub passphrase: Option<String>,
    /// Derivation root for account keys.
    pub derivation_path: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            mnemonic: DEFAULT_MNEMONIC_REF.to_owned(),
            passphrase: None,
            derivation_path: DEFAULT_DERIVATION_PATH.to_owned(),
        }
    }
}

/// Key material for one generated account.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AccountKey {
    /// Hex-encoded public key.
    pub public_key: String,
    /// 0x-prefixed hex private key.
    pub private_key: String,
}

impl std::fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Key-management collaborator used during chain construction.
pub trait KeyClient {
    /// Make the key subsystem ready. Must be idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Keys`] if the subsystem is unavailable.
    fn init(&self) -> Result<(), Error>;

    /// Derive `count` distinct account keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Keys`] if the client is not initialized or
    /// derivation fails.
    fn derive_keys(&self, count: usize) -> Result<Vec<AccountKey>, Error>;
}

/// Resolve an environment-variable reference (`$VAR` or `${VAR}`), returning
/// the literal string unchanged if it does not match either pattern.
fn resolve_env(value: &str) -> Result<String, Error> {
    let var_name = if let Some(inner) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(inner)
    } else {
        value
            .strip_prefix('$')
            .filter(|v| !v.is_empty() && v.chars().all(|c| c.is_alphanumeric() || c == '_'))
    };
    match var_name {
        Some(var_name) => std::env::var(var_name).map_err(|_| {
            Error::Keys(format!(
                "env var '{var_name}' not found (referenced as '{value}')"
            ))
        }),
        None => Ok(value.to_owned()),
    }
}

#[derive(Debug)]
struct Seed {
    mnemonic: String,
    passphrase: Option<String>,
}

/// [`KeyClient`] deriving account keys from a configured mnemonic.
#[derive(Debug)]
pub struct MnemonicKeyClient {
    config: KeysConfig,
    seed: OnceLock<Seed>,
}

impl MnemonicKeyClient {
    /// Creates an uninitialized client from the `[keys]` configuration.
    #[must_use]
    pub const fn new(config: KeysConfig) -> Self {
        Self {
            config,
            seed: OnceLock::new(),
        }
    }

    fn resolve_seed(&self) -> Result<Seed, Error> {
        let mnemonic = resolve_env(&self.config.mnemonic)?;
        let passphrase = self
            .config
            .passphrase
            .as_deref()
            .map(resolve_env)
            .transpose()?;
        kobe::Wallet::from_mnemonic(&mnemonic, passphrase.as_deref())
            .map_err(|e| Error::Keys(format!("mnemonic parse error: {e}")))?;
        Ok(Seed {
            mnemonic,
            passphrase,
        })
    }
}

impl KeyClient for MnemonicKeyClient {
    fn init(&self) -> Result<(), Error> {
        if self.seed.get().is_some() {
            return Ok(());
        }
        let seed = self.resolve_seed()?;
        // A concurrent init may have won; both seeds come from the same config.
        let _ = self.seed.set(seed);
        tracing::debug!(path = %self.config.derivation_path, "key client initialized");
        Ok(())
    }

    fn derive_keys(&self, count: usize) -> Result<Vec<AccountKey>, Error> {
        let seed = self
            .seed
            .get()
            .ok_or_else(|| Error::Keys("key client is not initialized".into()))?;
        let wallet = kobe::Wallet::from_mnemonic(&seed.mnemonic, seed.passphrase.as_deref())
            .map_err(|e| Error::Keys(format!("mnemonic parse error: {e}")))?;
        let deriver = kobe_eth::Deriver::new(&wallet);
        let root = self.config.derivation_path.trim_end_matches('/');

        (0..count)
            .map(|index| {
                let path = format!("{root}/{index}");
                let derived = deriver
                    .derive_path(&path)
                    .map_err(|e| Error::Keys(format!("key derivation error at '{path}': {e}")))?;
                Ok(AccountKey {
                    public_key: derived.public_key_hex.to_string(),
                    private_key: format!("0x{}", derived.private_key_hex.as_str()),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn client(mnemonic: &str) -> MnemonicKeyClient {
        MnemonicKeyClient::new(KeysConfig {
            mnemonic: mnemonic.into(),
            ..KeysConfig::default()
        })
    }

    #[test]
    fn derive_requires_init() {
        let err = client(TEST_MNEMONIC).derive_keys(1).unwrap_err();
        assert!(matches!(err, Error::Keys(_)), "{err}");
    }

    #[test]
    fn init_is_idempotent() {
        let keys = client(TEST_MNEMONIC);
        keys.init().unwrap();
        keys.init().unwrap();
        assert_eq!(keys.derive_keys(2).unwrap().len(), 2);
    }

    #[test]
    fn derives_distinct_deterministic_keys() {
        let keys = client(TEST_MNEMONIC);
        keys.init().unwrap();
        let first = keys.derive_keys(3).unwrap();
        let second = keys.derive_keys(3).unwrap();
        assert_eq!(first, second);
        assert_ne!(first[0].public_key, first[1].public_key);
        assert_ne!(first[1].public_key, first[2].public_key);
        assert!(first.iter().all(|k| k.private_key.starts_with("0x")));
    }

    #[test]
    fn invalid_mnemonic_fails_init() {
        let err = client("not a real mnemonic").init().unwrap_err();
        assert!(matches!(err, Error::Keys(_)), "{err}");
    }

    #[test]
    fn missing_env_reference_fails_init() {
        let err = client("$CHAINMAKER_TEST_MNEMONIC_THAT_IS_NEVER_SET")
            .init()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "keys: env var 'CHAINMAKER_TEST_MNEMONIC_THAT_IS_NEVER_SET' not found \
             (referenced as '$CHAINMAKER_TEST_MNEMONIC_THAT_IS_NEVER_SET')"
        );
    }

    #[test]
    fn literal_values_pass_through() {
        assert_eq!(resolve_env("plain words").unwrap(), "plain words");
        assert_eq!(resolve_env("$").unwrap(), "$");
        assert_eq!(resolve_env("$not-a-var").unwrap(), "$not-a-var");
        assert!(resolve_env("${CHAINMAKER_TEST_UNSET_VAR}").is_err());
    }

    #[test]
    fn debug_output_hides_private_key() {
        let key = AccountKey {
            public_key: "02ab".into(),
            private_key: "0xsecret".into(),
        };
        assert!(!format!("{key:?}").contains("secret"));
    }
}
