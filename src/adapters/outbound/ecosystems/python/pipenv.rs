use crate::adapters::outbound::ecosystems::{manifest_error, read_manifest};
use crate::bom::domain::{ArtifactKind, Dependency};
use crate::bom::services::HashCombiner;
use crate::ports::outbound::Artifact;
use crate::shared::error::BomError;
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// PipenvArtifact reads the `default` section of a `Pipfile.lock`
pub struct PipenvArtifact {
    path: PathBuf,
    lock_file: PathBuf,
    dependencies: OnceCell<Vec<Dependency>>,
}

impl PipenvArtifact {
    pub fn new(path: &Path, lock_file: PathBuf) -> Self {
        Self {
            path: path.to_path_buf(),
            lock_file,
            dependencies: OnceCell::new(),
        }
    }

    fn load(&self) -> Result<Vec<Dependency>> {
        let content = read_manifest(&self.lock_file, "Pipfile.lock")?;
        parse_pipfile_lock(&content, &self.lock_file)
    }
}

/// Parses every package of the `default` section
///
/// Each package lists one tagged hash per distributed file; they are
/// combined into one digest. The `==` pin prefix is stripped from versions.
pub(crate) fn parse_pipfile_lock(content: &str, path: &Path) -> Result<Vec<Dependency>> {
    let error = |details: String| manifest_error("python", path, details);

    let lock: Value = serde_json::from_str(content).map_err(|e| error(e.to_string()))?;
    let packages = lock
        .get("default")
        .and_then(Value::as_object)
        .ok_or_else(|| error("missing \"default\" section".to_string()))?;

    let mut dependencies = Vec::with_capacity(packages.len());
    for (name, package) in packages {
        let hashes = package
            .get("hashes")
            .and_then(Value::as_array)
            .ok_or_else(|| error(format!("package {}: missing \"hashes\" list", name)))?
            .iter()
            .map(|hash| {
                hash.as_str()
                    .ok_or_else(|| error(format!("package {}: hash entries must be strings", name)))
            })
            .collect::<Result<Vec<&str>>>()?;

        let version = package
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| error(format!("package {}: missing \"version\"", name)))?;
        let version = version.strip_prefix("==").unwrap_or(version);

        let hash = HashCombiner::combine(&hashes).map_err(|e| BomError::MalformedHash {
            dependency: format!("{}@{}", name, version),
            details: e.to_string(),
        })?;
        dependencies.push(Dependency::new(name.as_str(), version, hash)?);
    }

    Ok(dependencies)
}

#[async_trait]
impl Artifact for PipenvArtifact {
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
    use std::fs;
    use tempfile::TempDir;

    const LOCK: &str = r#"{
        "_meta": {"hash": {"sha256": "ignored"}},
        "default": {
            "certifi": {
                "hashes": [
                    "sha256:0f0f0f0f",
                    "sha256:f0f0f0f0"
                ],
                "index": "pypi",
                "version": "==2023.7.22"
            },
            "idna": {
                "hashes": ["sha256:12345678"],
                "version": "==3.4"
            }
        },
        "develop": {
            "pytest": {"hashes": ["sha256:00000000"], "version": "==7.4.0"}
        }
    }"#;

    #[test]
    fn test_parse_default_section_only() {
        let dependencies = parse_pipfile_lock(LOCK, Path::new("Pipfile.lock")).unwrap();
        assert_eq!(dependencies.len(), 2);

        let certifi = dependencies.iter().find(|d| d.name() == "certifi").unwrap();
        assert_eq!(certifi.version(), "2023.7.22");
        assert_eq!(certifi.hash(), "ffffffff");
        assert_eq!(certifi.hash_type(), HashType::Sha256);
        assert!(dependencies.iter().all(|d| d.name() != "pytest"));
    }

    #[test]
    fn test_missing_hashes_is_error() {
        let lock = r#"{"default": {"requests": {"version": "==2.31.0"}}}"#;
        let err = parse_pipfile_lock(lock, Path::new("Pipfile.lock")).unwrap_err();
        assert!(err.to_string().contains("requests"));
    }

    #[test]
    fn test_non_string_hash_is_error() {
        let lock = r#"{"default": {"requests": {"hashes": [42], "version": "==2.31.0"}}}"#;
        assert!(parse_pipfile_lock(lock, Path::new("Pipfile.lock")).is_err());
    }

    #[test]
    fn test_mismatched_hash_lengths_is_error() {
        let lock = r#"{"default": {"six": {"hashes": ["sha256:00ff", "sha256:00"], "version": "==1.16.0"}}}"#;
        let err = parse_pipfile_lock(lock, Path::new("Pipfile.lock")).unwrap_err();
        assert!(err.to_string().contains("six@1.16.0"));
    }

    #[test]
    fn test_unknown_hash_algorithm_is_error() {
        let lock = r#"{"default": {"six": {"hashes": ["sha256:00ff", "blake2b:ff00"], "version": "==1.16.0"}}}"#;
        let err = parse_pipfile_lock(lock, Path::new("Pipfile.lock")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("six@1.16.0"));
        assert!(message.contains("blake2b"));
    }

    #[test]
    fn test_missing_default_section_is_error() {
        assert!(parse_pipfile_lock("{}", Path::new("Pipfile.lock")).is_err());
    }

    #[tokio::test]
    async fn test_dependencies_are_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let lock_file = temp_dir.path().join("Pipfile.lock");
        fs::write(&lock_file, LOCK).unwrap();

        let artifact = PipenvArtifact::new(temp_dir.path(), lock_file);
        let first = artifact.dependencies().await.unwrap().to_vec();
        let second = artifact.dependencies().await.unwrap().to_vec();
        assert_eq!(first, second);
    }
}
