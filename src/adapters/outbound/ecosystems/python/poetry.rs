use super::normalize_name;
use crate::adapters::outbound::ecosystems::{manifest_error, read_manifest};
use crate::bom::domain::{ArtifactKind, Dependency};
use crate::bom::services::HashCombiner;
use crate::ports::outbound::Artifact;
use crate::shared::error::BomError;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
struct PoetryLock {
    #[serde(default)]
    package: Vec<LockedPackage>,
    #[serde(default)]
    metadata: LockMetadata,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
    /// Lock format 2.0 keeps the file list on the package itself
    #[serde(default)]
    files: Option<Vec<LockedFile>>,
}

#[derive(Debug, Default, Deserialize)]
struct LockMetadata {
    #[serde(default)]
    files: HashMap<String, Vec<LockedFile>>,
}

#[derive(Debug, Deserialize)]
struct LockedFile {
    hash: String,
}

/// PoetryArtifact reads packages and file hashes from a `poetry.lock`
pub struct PoetryArtifact {
    path: PathBuf,
    lock_file: PathBuf,
    dependencies: OnceCell<Vec<Dependency>>,
}

impl PoetryArtifact {
    pub fn new(path: &Path, lock_file: PathBuf) -> Self {
        Self {
            path: path.to_path_buf(),
            lock_file,
            dependencies: OnceCell::new(),
        }
    }

    fn load(&self) -> Result<Vec<Dependency>> {
        let content = read_manifest(&self.lock_file, "poetry.lock")?;
        parse_poetry_lock(&content, &self.lock_file)
    }
}

/// Parses `[[package]]` entries, matching each to its file hashes
///
/// Hashes come from the package's own `files` list, or from
/// `[metadata.files]` in older lock files. A package without files gets no
/// hash.
pub(crate) fn parse_poetry_lock(content: &str, path: &Path) -> Result<Vec<Dependency>> {
    let lock: PoetryLock = toml::from_str(content).map_err(|e| manifest_error("python", path, e))?;

    let metadata_files: HashMap<String, &Vec<LockedFile>> = lock
        .metadata
        .files
        .iter()
        .map(|(name, files)| (normalize_name(name), files))
        .collect();

    let mut dependencies = Vec::with_capacity(lock.package.len());
    for package in &lock.package {
        let files = package
            .files
            .as_ref()
            .or_else(|| metadata_files.get(&normalize_name(&package.name)).copied());
        let hashes: Vec<&str> = files
            .map(|files| files.iter().map(|f| f.hash.as_str()).collect())
            .unwrap_or_default();

        let hash = HashCombiner::combine(&hashes).map_err(|e| BomError::MalformedHash {
            dependency: format!("{}@{}", package.name, package.version),
            details: e.to_string(),
        })?;
        dependencies.push(Dependency::new(package.name.as_str(), package.version.as_str(), hash)?);
    }

    Ok(dependencies)
}

#[async_trait]
impl Artifact for PoetryArtifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Python
    }

    async fn dependencies(&self) -> Result<&[Dependency]> {
        self.dependencies
            .get_or_try_init(|| async { self.load() })
            .await
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::domain::HashType;

    const LEGACY_LOCK: &str = r#"
[[package]]
name = "certifi"
version = "2023.7.22"
description = "Python package for providing Mozilla's CA Bundle."
optional = false
python-versions = ">=3.6"

[[package]]
name = "typing_extensions"
version = "4.7.1"
optional = false
python-versions = ">=3.7"

[[package]]
name = "local-lib"
version = "0.1.0"
optional = false
python-versions = "*"

[metadata]
lock-version = "1.1"
python-versions = "^3.8"
content-hash = "abc"

[metadata.files]
certifi = [
    {file = "certifi-2023.7.22-py3-none-any.whl", hash = "sha256:0f0f0f0f"},
    {file = "certifi-2023.7.22.tar.gz", hash = "sha256:f0f0f0f0"},
]
typing-extensions = [
    {file = "typing_extensions-4.7.1-py3-none-any.whl", hash = "md5:12345678"},
]
"#;

    #[test]
    fn test_parse_legacy_metadata_files() {
        let dependencies = parse_poetry_lock(LEGACY_LOCK, Path::new("poetry.lock")).unwrap();
        assert_eq!(dependencies.len(), 3);

        assert_eq!(dependencies[0].name(), "certifi");
        assert_eq!(dependencies[0].hash(), "ffffffff");
        assert_eq!(dependencies[0].hash_type(), HashType::Sha256);

        // Matched through name normalization
        assert_eq!(dependencies[1].hash(), "12345678");
        assert_eq!(dependencies[1].hash_type(), HashType::Md5);

        assert!(dependencies[2].content_hash().is_none());
    }

    #[test]
    fn test_parse_inline_package_files() {
        let lock = r#"
[[package]]
name = "idna"
version = "3.4"
files = [
    {file = "idna-3.4-py3-none-any.whl", hash = "sha256:abcdef01"},
]

[metadata]
lock-version = "2.0"
"#;
        let dependencies = parse_poetry_lock(lock, Path::new("poetry.lock")).unwrap();
        assert_eq!(dependencies.len(), 1);
        assert_eq!(dependencies[0].version(), "3.4");
        assert_eq!(dependencies[0].hash(), "abcdef01");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let err = parse_poetry_lock("[[package]\nname=", Path::new("poetry.lock")).unwrap_err();
        assert!(err.to_string().contains("Failed to parse python manifest"));
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let lock = r#"
[[package]]
name = "idna"
version = "3.4"
files = [{file = "idna.whl", hash = "sha256:xyz"}]
"#;
        assert!(parse_poetry_lock(lock, Path::new("poetry.lock")).is_err());
    }
}
