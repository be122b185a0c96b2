//! Node extractor driven by `npm ls`

use super::EcosystemContext;
use crate::bom::domain::{ArtifactKind, ContentHash, Dependency, HashType};
use crate::ports::outbound::Artifact;
use crate::shared::error::BomError;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{info, warn};
use walkdir::WalkDir;

const LOCK_FILE: &str = "package-lock.json";

/// An installed package reported by `npm ls`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

/// NodeArtifact digests every installed package of an npm project
pub struct NodeArtifact {
    path: PathBuf,
    ctx: EcosystemContext,
    dependencies: OnceCell<Vec<Dependency>>,
}

/// Accepts a directory holding a `package-lock.json`
pub fn detect(path: &Path, ctx: &EcosystemContext) -> Result<Option<Box<dyn Artifact>>> {
    if !path.is_dir() || !path.join(LOCK_FILE).is_file() {
        return Ok(None);
    }
    Ok(Some(Box::new(NodeArtifact {
        path: path.to_path_buf(),
        ctx: ctx.clone(),
        dependencies: OnceCell::new(),
    })))
}

impl NodeArtifact {
    async fn load(&self) -> Result<Vec<Dependency>> {
        let output = self
            .ctx
            .runner
            .run("npm", &["ls", "-a", "-l", "-p", "--json"], Some(&self.path))
            .await?;
        let listing: Value = serde_json::from_slice(&output).map_err(|e| BomError::ToolFailure {
            tool: "npm ls".to_string(),
            details: format!("unexpected output: {}", e),
        })?;

        let packages = collect_packages(&listing);
        info!(packages = packages.len(), "Digesting installed npm packages");

        self.ctx
            .pool()
            .run(packages, |package: InstalledPackage| async move {
                let InstalledPackage { name, version, path } = package;
                let hash = tokio::task::spawn_blocking(move || digest_directory(&path))
                    .await
                    .context("Digest task failed")??;
                Dependency::new(name, version, hash)
            })
            .await
    }
}

/// Walks the nested `dependencies` objects, keeping the first entry per (name, version)
pub(crate) fn collect_packages(listing: &Value) -> Vec<InstalledPackage> {
    let mut seen = HashSet::new();
    let mut packages = Vec::new();
    collect_into(listing, &mut seen, &mut packages);
    packages
}

fn collect_into(node: &Value, seen: &mut HashSet<(String, String)>, packages: &mut Vec<InstalledPackage>) {
    let Some(children) = node.get("dependencies").and_then(Value::as_object) else {
        return;
    };

    for (name, child) in children {
        let version = child.get("version").and_then(Value::as_str);
        let path = child.get("path").and_then(Value::as_str);
        match (version, path) {
            (Some(version), Some(path)) => {
                if seen.insert((name.clone(), version.to_string())) {
                    packages.push(InstalledPackage {
                        name: name.clone(),
                        version: version.to_string(),
                        path: PathBuf::from(path),
                    });
                }
            }
            _ => warn!(package = %name, "Package is not installed, skipping it"),
        }
        collect_into(child, seen, packages);
    }
}

/// Digests a directory tree as SHA-256 over its sorted file manifest
///
/// Each manifest line is `<sha256 of file> <path relative to dir>`, using
/// `/` as the separator on every platform.
pub(crate) fn digest_directory(dir: &Path) -> Result<ContentHash> {
    let mut lines = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.with_context(|| format!("Cannot walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let mut file = File::open(entry.path()).map_err(|e| BomError::FileReadError {
            path: entry.path().to_path_buf(),
            details: e.to_string(),
        })?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;

        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        lines.push(format!("{} {}", hex::encode(hasher.finalize()), relative));
    }
    lines.sort();

    let mut manifest = Sha256::new();
    for line in &lines {
        manifest.update(line.as_bytes());
        manifest.update(b"\n");
    }
    ContentHash::from_bytes(HashType::Sha256, &manifest.finalize())
}

#[async_trait]
impl Artifact for NodeArtifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Node
    }

    async fn dependencies(&self) -> Result<&[Dependency]> {
        self.dependencies
            .get_or_try_init(|| self.load())
            .await
            .map(Vec::as_slice)
    }
}
