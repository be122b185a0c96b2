use super::http::{build_client, get_text_with_retry, DEFAULT_MAX_RETRIES};
use crate::bom::domain::ContentHash;
use crate::bom::services::HashCombiner;
use crate::ports::outbound::HashSource;
use crate::shared::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Default Go checksum database: server name followed by its public key
pub const DEFAULT_SUMDB: &str =
    "sum.golang.org+033de0ae+Ac4zctda0e5eza+HJyk9SxEdh+s3Ux18htTTAD8OuAn8";

/// SumDbClient adapter resolving Go module hashes from the checksum database
///
/// Issues `GET https://<server>/lookup/<module>@<version>` and takes the
/// module line of the returned record. The record's signed tree note is not
/// verified here.
pub struct SumDbClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl SumDbClient {
    /// Creates a client for the database described by `key`
    ///
    /// `key` has the `GOSUMDB` form `<server>+<key hash>+<key>`; only the
    /// server part before the first `+` is used.
    pub fn new(key: &str, timeout: Duration) -> Result<Self> {
        let server = key.split('+').next().unwrap_or_default().trim();
        if server.is_empty() || server == "off" {
            anyhow::bail!("Invalid checksum database '{}'", key);
        }

        Ok(Self {
            client: build_client(timeout)?,
            base_url: format!("https://{}", server),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Uses `GOSUMDB` when set, `key` otherwise
    pub fn from_env_or(key: &str, timeout: Duration) -> Result<Self> {
        match std::env::var("GOSUMDB") {
            Ok(from_env) if !from_env.trim().is_empty() => Self::new(&from_env, timeout),
            _ => Self::new(key, timeout),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Escapes a module path or version for use in a lookup URL
    ///
    /// Upper-case letters become `!` followed by the lower-case letter, so
    /// paths stay unambiguous on case-insensitive file systems.
    pub fn escape(component: &str) -> Result<String> {
        if component.contains('!') {
            anyhow::bail!("'{}' contains a '!' and cannot be escaped", component);
        }

        let mut escaped = String::with_capacity(component.len());
        for c in component.chars() {
            if c.is_ascii_uppercase() {
                escaped.push('!');
                escaped.push(c.to_ascii_lowercase());
            } else {
                escaped.push(c);
            }
        }
        Ok(escaped)
    }

    fn lookup_url(&self, module: &str, version: &str) -> Result<String> {
        Ok(format!(
            "{}/lookup/{}@{}",
            self.base_url,
            Self::escape(module)?,
            Self::escape(version)?
        ))
    }

    /// Finds the `<module> <version> h1:<hash>` line in a lookup record
    fn parse_record(record: &str, module: &str, version: &str) -> Result<ContentHash> {
        let hash = record
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .find(|fields| fields.len() == 3 && fields[0] == module && fields[1] == version)
            .map(|fields| fields[2])
            .ok_or_else(|| {
                anyhow::anyhow!("no hash for {}@{} in checksum database record", module, version)
            })?;

        HashCombiner::decode_mod_hash(hash)
    }
}

#[async_trait]
impl HashSource for SumDbClient {
    async fn resolve(&self, name: &str, version: &str) -> Result<ContentHash> {
        let url = self.lookup_url(name, version)?;
        let record = get_text_with_retry(&self.client, &url, self.max_retries).await?;
        Self::parse_record(&record, name, version)
    }
}
