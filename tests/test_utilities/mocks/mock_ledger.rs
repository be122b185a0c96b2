use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use vcn_bom::prelude::*;
use vcn_bom::ports::outbound::{
    LedgerArtifact, LedgerError, LedgerRecord, LedgerStatus, LoadedArtifact, SignReceipt,
};

/// Mock Ledger keeping records in memory, keyed by hash
#[derive(Default)]
pub struct MockLedger {
    records: Mutex<HashMap<String, LedgerRecord>>,
    unverified: Vec<String>,
    fail_sign: bool,
    signed: Mutex<Vec<(LedgerArtifact, String)>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, hash: &str, status: LedgerStatus) -> Self {
        self.insert(hash, status, None);
        self
    }

    pub fn with_revoked(self, hash: &str) -> Self {
        let revoked = chrono::DateTime::from_timestamp(1_600_000_000, 0);
        self.insert(hash, LedgerStatus::Trusted, revoked);
        self
    }

    /// Makes the proof of `hash` fail verification
    pub fn with_unverified(mut self, hash: &str) -> Self {
        self.insert(hash, LedgerStatus::Trusted, None);
        self.unverified.push(hash.to_string());
        self
    }

    pub fn with_sign_failure(mut self) -> Self {
        self.fail_sign = true;
        self
    }

    /// Artifacts notarized so far, with the signer they were signed as
    pub fn signed(&self) -> Vec<(LedgerArtifact, String)> {
        self.signed.lock().unwrap().clone()
    }

    fn insert(&self, hash: &str, status: LedgerStatus, revoked: Option<chrono::DateTime<chrono::Utc>>) {
        let record = LedgerRecord {
            artifact: LedgerArtifact {
                kind: "mock".to_string(),
                name: String::new(),
                hash: hash.to_string(),
                size: 0,
                content_type: "text/plain; charset=utf-8".to_string(),
                metadata: BTreeMap::new(),
            },
            status,
            signer_id: String::new(),
            revoked,
            ledger: "mock".to_string(),
        };
        self.records.lock().unwrap().insert(hash.to_string(), record);
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn load_artifact(
        &self,
        hash: &str,
        signer_id: &str,
    ) -> std::result::Result<LoadedArtifact, LedgerError> {
        let records = self.records.lock().unwrap();
        let mut record = records.get(hash).cloned().ok_or(LedgerError::NotFound)?;
        record.signer_id = signer_id.to_string();

        Ok(LoadedArtifact {
            record,
            verified: !self.unverified.iter().any(|h| h == hash),
        })
    }

    async fn sign(
        &self,
        artifact: LedgerArtifact,
        signer_id: &str,
        status: LedgerStatus,
    ) -> std::result::Result<SignReceipt, LedgerError> {
        if self.fail_sign {
            return Err(LedgerError::Backend("mock ledger refused the write".to_string()));
        }
        self.insert(&artifact.hash, status, None);
        let mut signed = self.signed.lock().unwrap();
        signed.push((artifact, signer_id.to_string()));
        Ok(SignReceipt {
            tx_id: signed.len() as u64,
        })
    }
}
