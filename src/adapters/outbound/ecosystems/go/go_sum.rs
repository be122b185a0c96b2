use crate::adapters::outbound::ecosystems::{manifest_error, read_manifest};
use crate::bom::domain::{ArtifactKind, Dependency};
use crate::bom::services::HashCombiner;
use crate::ports::outbound::Artifact;
use crate::shared::error::BomError;
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// GoSumArtifact reads module hashes straight from a `go.sum` file
pub struct GoSumArtifact {
    path: PathBuf,
    go_sum: PathBuf,
    dependencies: OnceCell<Vec<Dependency>>,
}

impl GoSumArtifact {
    pub fn new(path: &Path, go_sum: PathBuf) -> Self {
        Self {
            path: path.to_path_buf(),
            go_sum,
            dependencies: OnceCell::new(),
        }
    }

    fn load(&self) -> Result<Vec<Dependency>> {
        let content = read_manifest(&self.go_sum, "go.sum")?;
        parse_go_sum(&content, &self.go_sum)
    }
}

/// Parses `<module> <version> h1:<hash>` lines
///
/// `/go.mod` lines hash the module's manifest rather than its content and
/// are skipped. The first line for a (module, version) pair wins.
pub(crate) fn parse_go_sum(content: &str, path: &Path) -> Result<Vec<Dependency>> {
    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let [name, version, hash] = fields.as_slice() else {
            return Err(manifest_error(
                "go",
                path,
                format!("line {}: expected 3 fields, found {}", index + 1, fields.len()),
            ));
        };
        if version.ends_with("/go.mod") {
            continue;
        }
        if !seen.insert((name.to_string(), version.to_string())) {
            continue;
        }

        let hash = HashCombiner::decode_mod_hash(hash).map_err(|e| BomError::MalformedHash {
            dependency: format!("{}@{}", name, version),
            details: e.to_string(),
        })?;
        dependencies.push(Dependency::new(*name, *version, hash)?);
    }

    Ok(dependencies)
}

#[async_trait]
impl Artifact for GoSumArtifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Go
    }

    async fn dependencies(&self) -> Result<&[Dependency]> {
        self.dependencies
            .get_or_try_init(|| async { self.load() })
            .await
            .map(Vec::as_slice)
    }
}
