//! End-to-end chain provisioning.
//!
//! [`Provisioner`] sequences one chain through key initialization, default
//! resolution, materialization, packaging and the validator check. Every
//! step finishes before the next starts and any error stops the run.

use crate::account_types;
use crate::chain::{ChainMaker, ChainSpec};
use crate::config::ChainRequest;
use crate::error::Error;
use crate::keys::KeyClient;
use crate::output::{self, Artifact, Packager};

/// Outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// The packaged chain.
    pub artifact: Artifact,
    /// Validator-capable accounts, when account types were given.
    pub validators: Option<u64>,
}

impl ProvisionReport {
    /// Whether the chain was made without any validator-capable account.
    #[must_use]
    pub const fn lacks_validators(&self) -> bool {
        matches!(self.validators, Some(0))
    }
}

/// Provisions chains with a fixed set of collaborators.
///
/// The key client is initialized on every call; [`KeyClient::init`] is
/// idempotent, so one provisioner can make many chains.
#[derive(Debug)]
pub struct Provisioner<K, M, P> {
    keys: K,
    maker: M,
    packager: P,
}

impl<K, M, P> Provisioner<K, M, P>
where
    K: KeyClient,
    M: ChainMaker,
    P: Packager,
{
    /// Creates a provisioner from its collaborators.
    #[must_use]
    pub const fn new(keys: K, maker: M, packager: P) -> Self {
        Self {
            keys,
            maker,
            packager,
        }
    }

    /// Make, package and check the chain described by `request`.
    ///
    /// A malformed account type is reported even though the artifact has
    /// already been written by then.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error: key initialization, request
    /// validation, chain construction, packaging, or the account-type tally.
    pub fn provision(&self, request: &ChainRequest) -> Result<ProvisionReport, Error> {
        let _span = tracing::info_span!("provision", chain = %request.name).entered();
        self.keys.init()?;

        tracing::info!(chain = %request.name, "making chain");
        let spec = ChainSpec::from_request(request)?;
        tracing::debug!(
            image = %spec.image,
            ports = ?spec.exposed_ports,
            data_container = spec.data_container,
            "chain defaults applied"
        );

        let files = self.maker.make(&spec, &self.keys)?;
        tracing::debug!(root = %files.root.display(), files = files.files.len(), "chain made");

        let artifact = output::package(&spec.output, &files, &self.packager)?;
        tracing::info!(
            chain = %spec.name,
            format = %spec.output,
            path = %artifact.path.display(),
            "chain packaged"
        );

        // Last, so it follows any verbose or debug output.
        let validators = if request.account_types.is_empty() {
            None
        } else {
            Some(account_types::count_validators(&request.account_types)?)
        };
        let report = ProvisionReport {
            artifact,
            validators,
        };
        if report.lacks_validators() {
            tracing::warn!(
                chain = %spec.name,
                "the chain has no Full or Validator accounts with validator permissions \
                 and will need further modification to run; make it with Full or \
                 Validator account types"
            );
        }
        Ok(report)
    }
}
