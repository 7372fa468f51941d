//! Unified error types for the chain maker.
//!
//! Every variant names the provisioning stage that failed, so the
//! top-level `Error: <stage>: <detail>` line tells the operator where the
//! flow stopped.

use thiserror::Error;

use crate::account_types::AccountTypeError;
use crate::output::OutputError;

/// Top-level error type for the chain maker application.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be resolved, read, or parsed, or the
    /// request itself is invalid.
    #[error("config: {0}")]
    Config(String),

    /// Key-management subsystem could not be initialized or used.
    #[error("keys: {0}")]
    Keys(String),

    /// The chain maker failed to materialize the chain's files.
    #[error("maker: {0}")]
    Maker(String),

    /// The requested output format cannot be produced.
    #[error("output: {0}")]
    Output(#[from] OutputError),

    /// Writing the tar or zip artifact failed.
    #[error("package: {0}")]
    Package(String),

    /// The account-type descriptor list could not be tallied.
    #[error("account types: {0}")]
    AccountTypes(#[from] AccountTypeError),
}

impl Error {
    /// Configuration error with a plain message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Configuration error wrapping an underlying cause.
    pub fn config_with(msg: impl AsRef<str>, err: impl std::fmt::Display) -> Self {
        Self::Config(format!("{}: {err}", msg.as_ref()))
    }

    /// Maker error wrapping an underlying cause.
    pub fn maker_with(msg: impl AsRef<str>, err: impl std::fmt::Display) -> Self {
        Self::Maker(format!("{}: {err}", msg.as_ref()))
    }

    /// Packaging error wrapping an underlying cause.
    pub fn package_with(msg: impl AsRef<str>, err: impl std::fmt::Display) -> Self {
        Self::Package(format!("{}: {err}", msg.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_stage() {
        let err = Error::maker_with("failed to write 'genesis.json'", "disk full");
        assert_eq!(
            err.to_string(),
            "maker: failed to write 'genesis.json': disk full"
        );
        assert_eq!(Error::config("bad name").to_string(), "config: bad name");
    }
}
