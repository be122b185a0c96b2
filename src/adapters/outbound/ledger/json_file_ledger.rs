use crate::ports::outbound::{
    Ledger, LedgerArtifact, LedgerError, LedgerRecord, LedgerStatus, LoadedArtifact, SignReceipt,
};
use crate::shared::error::BomError;
use crate::shared::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

const LEDGER_NAME: &str = "local";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    last_tx: u64,
    /// Records keyed `vcn.<signer>.<hash>`
    #[serde(default)]
    records: BTreeMap<String, LedgerRecord>,
}

/// JsonFileLedger adapter keeping notarization records in a local JSON file
///
/// The file carries no proofs, so every loaded record reports as verified.
/// Each successful `sign` rewrites the whole file through a temporary file
/// in the same directory.
pub struct JsonFileLedger {
    path: PathBuf,
    state: Mutex<LedgerFile>,
}

impl JsonFileLedger {
    /// Opens the ledger at `path`, starting empty when the file does not exist yet
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| BomError::FileReadError {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
            serde_json::from_str(&content).map_err(|e| BomError::FileReadError {
                path: path.to_path_buf(),
                details: format!("invalid ledger file: {}", e),
            })?
        } else {
            LedgerFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key(signer_id: &str, hash: &str) -> String {
        format!("vcn.{}.{}", signer_id, hash)
    }

    fn persist(&self, state: &LedgerFile) -> std::result::Result<(), LedgerError> {
        let backend = |e: &dyn std::fmt::Display| LedgerError::Backend(format!("{}: {}", self.path.display(), e));

        let content = serde_json::to_string_pretty(state).map_err(|e| backend(&e))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| backend(&e))?;
        file.write_all(content.as_bytes()).map_err(|e| backend(&e))?;
        file.persist(&self.path).map_err(|e| backend(&e.error))?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for JsonFileLedger {
    async fn load_artifact(&self, hash: &str, signer_id: &str) -> std::result::Result<LoadedArtifact, LedgerError> {
        let state = self.state.lock().await;
        let record = state
            .records
            .get(&Self::key(signer_id, hash))
            .ok_or(LedgerError::NotFound)?;

        Ok(LoadedArtifact {
            record: record.clone(),
            verified: true,
        })
    }

    async fn sign(
        &self,
        artifact: LedgerArtifact,
        signer_id: &str,
        status: LedgerStatus,
    ) -> std::result::Result<SignReceipt, LedgerError> {
        let mut state = self.state.lock().await;
        let key = Self::key(signer_id, &artifact.hash);
        let previous = state.records.insert(
            key.clone(),
            LedgerRecord {
                artifact,
                status,
                signer_id: signer_id.to_string(),
                revoked: None,
                ledger: LEDGER_NAME.to_string(),
            },
        );
        state.last_tx += 1;

        if let Err(e) = self.persist(&state) {
            // Keep memory and file in step
            state.last_tx -= 1;
            match previous {
                Some(record) => state.records.insert(key, record),
                None => state.records.remove(&key),
            };
            return Err(e);
        }

        debug!(key = %key, tx_id = state.last_tx, "Record notarized");
        Ok(SignReceipt { tx_id: state.last_tx })
    }
}
