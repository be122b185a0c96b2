use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Status stored with a ledger record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    Trusted,
    Untrusted,
    Unknown,
    Unsupported,
}

/// Artifact description written to the ledger on notarization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerArtifact {
    pub kind: String,
    pub name: String,
    pub hash: String,
    pub size: u64,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
}

/// A record as stored in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub artifact: LedgerArtifact,
    pub status: LedgerStatus,
    pub signer_id: String,
    #[serde(default)]
    pub revoked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ledger: String,
}

impl LedgerRecord {
    /// A record counts as revoked when it carries a non-zero revocation time
    pub fn is_revoked(&self) -> bool {
        self.revoked
            .is_some_and(|at| at.timestamp() != 0 || at.timestamp_subsec_nanos() != 0)
    }
}

/// Result of a ledger lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedArtifact {
    pub record: LedgerRecord,
    /// Whether the ledger proof for the record checked out
    pub verified: bool,
}

/// Receipt of a successful notarization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignReceipt {
    pub tx_id: u64,
}

/// Ledger failures
///
/// `NotFound` is an expected outcome (the dependency was never notarized)
/// and drives classification rather than aborting.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("artifact not found in the ledger")]
    NotFound,

    #[error("ledger request failed: {0}")]
    Backend(String),
}

/// Ledger port for the notarization store
///
/// The store itself (tamper evidence, proofs, transport) lives outside this
/// crate. The trust policy engine only loads and signs artifacts through it.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Looks up the record notarized for `hash` by `signer_id`
    ///
    /// # Errors
    /// Returns `LedgerError::NotFound` if no such record exists, or
    /// `LedgerError::Backend` if the ledger cannot be queried.
    async fn load_artifact(&self, hash: &str, signer_id: &str) -> Result<LoadedArtifact, LedgerError>;

    /// Notarizes `artifact` under `signer_id` with the given status
    ///
    /// # Errors
    /// Returns `LedgerError::Backend` if the record cannot be written.
    async fn sign(
        &self,
        artifact: LedgerArtifact,
        signer_id: &str,
        status: LedgerStatus,
    ) -> Result<SignReceipt, LedgerError>;
}
