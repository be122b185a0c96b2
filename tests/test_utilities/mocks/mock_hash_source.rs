use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use vcn_bom::prelude::*;

/// Mock HashSource answering from a fixed `name@version` table
#[derive(Default)]
pub struct MockHashSource {
    hashes: HashMap<String, String>,
    failures: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl MockHashSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a SHA-256 digest made of `byte` repeated
    pub fn with_hash(mut self, name: &str, version: &str, byte: u8) -> Self {
        self.hashes
            .insert(format!("{}@{}", name, version), Self::hex(byte));
        self
    }

    pub fn with_failure(mut self, name: &str, version: &str, message: &str) -> Self {
        self.failures
            .insert(format!("{}@{}", name, version), message.to_string());
        self
    }

    pub fn hex(byte: u8) -> String {
        format!("{:02x}", byte).repeat(32)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HashSource for MockHashSource {
    async fn resolve(&self, name: &str, version: &str) -> Result<ContentHash> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let key = format!("{}@{}", name, version);

        if let Some(message) = self.failures.get(&key) {
            anyhow::bail!("{}", message);
        }
        match self.hashes.get(&key) {
            Some(hex) => ContentHash::new(HashType::Sha256, hex.clone()),
            None => anyhow::bail!("{} is unknown to the hash authority", key),
        }
    }
}
