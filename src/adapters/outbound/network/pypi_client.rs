use super::http::{build_client, get_text_with_retry, DEFAULT_MAX_RETRIES};
use crate::bom::domain::{ContentHash, HashType};
use crate::bom::services::HashCombiner;
use crate::ports::outbound::HashSource;
use crate::shared::security::validate_url_component;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Default PyPI JSON API root
pub const DEFAULT_PYPI_URL: &str = "https://pypi.org/pypi";

#[derive(Debug, Deserialize)]
struct PyPiRelease {
    #[serde(default)]
    urls: Vec<PyPiFile>,
}

#[derive(Debug, Deserialize)]
struct PyPiFile {
    #[serde(default)]
    digests: PyPiDigests,
}

#[derive(Debug, Default, Deserialize)]
struct PyPiDigests {
    #[serde(default)]
    md5: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
}

/// PyPiHashSource adapter fetching release digests from the PyPI JSON API
///
/// A release usually ships several files (wheels, sdist). Their digests are
/// combined into one canonical hash. SHA-256 is used when the first file
/// publishes it, MD5 otherwise.
pub struct PyPiHashSource {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl PyPiHashSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    fn release_url(&self, name: &str, version: &str) -> Result<String> {
        // Security: Validate URL components before using them
        validate_url_component(name, "Package name")?;
        validate_url_component(version, "Version")?;

        Ok(format!(
            "{}/{}/{}/json",
            self.base_url,
            urlencoding::encode(name),
            urlencoding::encode(version)
        ))
    }

    fn release_hash(release: &PyPiRelease) -> Result<ContentHash> {
        let Some(first) = release.urls.first() else {
            return Ok(ContentHash::none());
        };

        let use_sha256 = first.digests.sha256.as_deref().is_some_and(|d| !d.is_empty());
        let (hash_type, digests): (HashType, Vec<&str>) = if use_sha256 {
            (
                HashType::Sha256,
                release
                    .urls
                    .iter()
                    .map(|f| f.digests.sha256.as_deref().unwrap_or_default())
                    .collect(),
            )
        } else {
            (
                HashType::Md5,
                release
                    .urls
                    .iter()
                    .map(|f| f.digests.md5.as_deref().unwrap_or_default())
                    .collect(),
            )
        };

        HashCombiner::combine_as(hash_type, &digests)
    }
}

#[async_trait]
impl HashSource for PyPiHashSource {
    async fn resolve(&self, name: &str, version: &str) -> Result<ContentHash> {
        let url = self.release_url(name, version)?;
        let body = get_text_with_retry(&self.client, &url, self.max_retries)
            .await
            .with_context(|| format!("Cannot query PyPI for {} {}", name, version))?;

        let release: PyPiRelease = serde_json::from_str(&body)
            .with_context(|| format!("Malformed PyPI response for {} {}", name, version))?;

        Self::release_hash(&release)
            .with_context(|| format!("Malformed digest in PyPI release {} {}", name, version))
    }
}
