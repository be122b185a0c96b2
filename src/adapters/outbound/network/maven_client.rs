use super::http::{build_client, get_text_with_retry, DEFAULT_MAX_RETRIES};
use crate::bom::domain::{ContentHash, HashType};
use crate::ports::outbound::HashSource;
use crate::shared::security::validate_url_component;
use crate::shared::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Default Maven Central repository root
pub const DEFAULT_MAVEN_REPO: &str = "https://repo1.maven.org/maven2";

const SHA1_HEX_LEN: usize = 40;

/// MavenChecksumSource adapter reading published `.jar.sha1` files
///
/// Dependencies are addressed as `groupId:artifactId`, since the group is
/// part of the repository layout.
pub struct MavenChecksumSource {
    client: reqwest::Client,
    repo_url: String,
    max_retries: u32,
}

impl MavenChecksumSource {
    pub fn new(repo_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            repo_url: repo_url.trim_end_matches('/').to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Builds `<repo>/<group path>/<artifact>/<version>/<artifact>-<version>.jar.sha1`
    fn checksum_url(&self, coordinate: &str, version: &str) -> Result<String> {
        let (group, artifact) = coordinate.split_once(':').ok_or_else(|| {
            anyhow::anyhow!("Maven coordinate '{}' is not groupId:artifactId", coordinate)
        })?;

        validate_url_component(group, "Group ID")?;
        validate_url_component(artifact, "Artifact ID")?;
        validate_url_component(version, "Version")?;

        Ok(format!(
            "{repo}/{group}/{artifact}/{version}/{artifact}-{version}.jar.sha1",
            repo = self.repo_url,
            group = group.replace('.', "/"),
            artifact = artifact,
            version = version
        ))
    }

    /// The checksum file holds the hex digest, optionally followed by a file name
    fn parse_checksum(body: &str, url: &str) -> Result<ContentHash> {
        let digest = body.trim_start().get(..SHA1_HEX_LEN).unwrap_or_default();
        if digest.len() < SHA1_HEX_LEN || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("malformed SHA1 hash at {}", url);
        }
        ContentHash::new(HashType::Sha1, digest)
    }
}

#[async_trait]
impl HashSource for MavenChecksumSource {
    async fn resolve(&self, name: &str, version: &str) -> Result<ContentHash> {
        let url = self.checksum_url(name, version)?;
        let body = get_text_with_retry(&self.client, &url, self.max_retries).await?;
        Self::parse_checksum(&body, &url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MavenChecksumSource {
        MavenChecksumSource::new("https://repo.example.org/maven2/", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_checksum_url() {
        assert_eq!(
            source().checksum_url("org.apache.commons:commons-lang3", "3.12.0").unwrap(),
            "https://repo.example.org/maven2/org/apache/commons/commons-lang3/3.12.0/commons-lang3-3.12.0.jar.sha1"
        );
    }

    #[test]
    fn test_checksum_url_requires_group() {
        assert!(source().checksum_url("commons-lang3", "3.12.0").is_err());
    }

    #[test]
    fn test_parse_checksum() {
        let body = "C5F4B2C52F2E6D0C0E6B3A4F3F0C1D2E3F4A5B6C  commons-lang3-3.12.0.jar\n";
        let hash = MavenChecksumSource::parse_checksum(body, "url").unwrap();
        assert_eq!(hash.hash_type(), HashType::Sha1);
        assert_eq!(hash.value(), "c5f4b2c52f2e6d0c0e6b3a4f3f0c1d2e3f4a5b6c");
    }

    #[test]
    fn test_parse_checksum_too_short() {
        let err = MavenChecksumSource::parse_checksum("abc123", "https://x/y.sha1").unwrap_err();
        assert!(err.to_string().contains("malformed SHA1 hash at https://x/y.sha1"));
    }

    #[test]
    fn test_parse_checksum_not_hex() {
        let body = "<html>404 Not Found, the page you requested</html>";
        assert!(MavenChecksumSource::parse_checksum(body, "url").is_err());
    }
}
