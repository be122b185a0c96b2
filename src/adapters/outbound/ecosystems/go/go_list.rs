use super::go_sum::parse_go_sum;
use crate::adapters::outbound::ecosystems::{read_manifest, EcosystemContext};
use crate::bom::domain::{ArtifactKind, Dependency};
use crate::ports::outbound::{Artifact, CommandRunner, HashSource};
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Template printing the module of every non-standard package
const LIST_TEMPLATE: &str = "{{if not .Standard}}{{.Module.Path}} {{.Module.Version}}{{end}}";

/// GoListArtifact lists module dependencies with `go list` and resolves their
/// hashes against the checksum database
pub struct GoListArtifact {
    path: PathBuf,
    go_sum: Option<PathBuf>,
    ctx: EcosystemContext,
    dependencies: OnceCell<Vec<Dependency>>,
}

impl GoListArtifact {
    pub fn new(path: &Path, ctx: &EcosystemContext, go_sum: Option<PathBuf>) -> Self {
        Self {
            path: path.to_path_buf(),
            go_sum,
            ctx: ctx.clone(),
            dependencies: OnceCell::new(),
        }
    }

    async fn list_modules(&self) -> Result<Vec<(String, String)>> {
        let output = self
            .ctx
            .runner
            .run(
                "go",
                &["list", "--deps", "-f", LIST_TEMPLATE, "./..."],
                Some(&self.path),
            )
            .await?;
        Ok(parse_module_list(&String::from_utf8_lossy(&output)))
    }

    async fn load(&self) -> Result<Vec<Dependency>> {
        let modules = match (self.list_modules().await, &self.go_sum) {
            (Ok(modules), _) => modules,
            (Err(e), Some(go_sum)) => {
                warn!(error = %e, "go list failed, falling back to {}", go_sum.display());
                let content = read_manifest(go_sum, "go.sum")?;
                return parse_go_sum(&content, go_sum);
            }
            (Err(e), None) => return Err(e),
        };
        info!(modules = modules.len(), "Resolving Go module hashes");

        let sumdb = Arc::clone(&self.ctx.sumdb);
        let resolved = self
            .ctx
            .pool()
            .run(modules, move |(name, version)| {
                let sumdb = Arc::clone(&sumdb);
                async move { resolve_module(sumdb.as_ref(), name, version).await }
            })
            .await?;

        Ok(resolved.into_iter().flatten().collect())
    }
}

/// Parses `<module> <version>` lines, dropping the main module and duplicates
pub(crate) fn parse_module_list(output: &str) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [name, version] => Some((name.to_string(), version.to_string())),
                _ => None,
            }
        })
        .filter(|pair| seen.insert(pair.clone()))
        .collect()
}

/// Looks up one module; a failed lookup is logged and the module is left out
///
/// Modules that were moved or renamed upstream are absent from the checksum
/// database, and one of them must not abort the whole scan.
async fn resolve_module(sumdb: &dyn HashSource, name: String, version: String) -> Result<Option<Dependency>> {
    match sumdb.resolve(&name, &version).await {
        Ok(hash) => Ok(Some(Dependency::new(name, version, hash)?)),
        Err(e) => {
            warn!(module = %name, version = %version, error = %e, "Checksum database lookup failed, skipping module");
            Ok(None)
        }
    }
}

#[async_trait]
impl Artifact for GoListArtifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Go
    }

    async fn dependencies(&self) -> Result<&[Dependency]> {
        self.dependencies
            .get_or_try_init(|| self.load())
            .await
            .map(Vec::as_slice)
    }
}
