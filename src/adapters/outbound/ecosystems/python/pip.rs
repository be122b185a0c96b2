use super::normalize_name;
use crate::adapters::outbound::ecosystems::{read_manifest, EcosystemContext};
use crate::bom::domain::{ArtifactKind, Dependency};
use crate::ports::outbound::{Artifact, CommandRunner, HashSource};
use crate::shared::error::BomError;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const INTERPRETERS: [&str; 2] = ["python", "python3"];

/// PipArtifact resolves a `requirements.txt` against the active environment
///
/// Versions come from the installed distributions, hashes from the package
/// index, and the transitive set is discovered by following each package's
/// `Requires:` list.
pub struct PipArtifact {
    path: PathBuf,
    requirements: PathBuf,
    ctx: EcosystemContext,
    dependencies: OnceCell<Vec<Dependency>>,
}

/// One resolved package together with the prerequisites it declares
struct ResolvedPackage {
    dependency: Dependency,
    requires: Vec<String>,
}

/// Installed distributions and the names already queued for resolution
///
/// Only the dispatcher touches this, so it needs no locking.
struct PendingSet {
    installed: HashMap<String, (String, String)>,
    seen: HashSet<String>,
}

impl PendingSet {
    fn new(installed: HashMap<String, (String, String)>) -> Self {
        Self {
            installed,
            seen: HashSet::new(),
        }
    }

    /// Returns the `(name, version)` task for `name` the first time it is asked for
    fn claim(&mut self, name: &str) -> Option<(String, String)> {
        let key = normalize_name(name);
        if !self.seen.insert(key.clone()) {
            return None;
        }
        match self.installed.get(&key) {
            Some(installed) => Some(installed.clone()),
            None => {
                warn!(module = %name, "Module is not installed, ignoring it");
                None
            }
        }
    }
}

impl PipArtifact {
    pub fn new(path: &Path, requirements: PathBuf, ctx: &EcosystemContext) -> Self {
        Self {
            path: path.to_path_buf(),
            requirements,
            ctx: ctx.clone(),
            dependencies: OnceCell::new(),
        }
    }

    /// Finds a working interpreter and lists the installed distributions
    async fn installed_packages(&self) -> Result<(&'static str, String)> {
        let mut last_error = None;
        for interpreter in INTERPRETERS {
            match self
                .ctx
                .runner
                .run(interpreter, &["-m", "pip", "list", "-v"], Some(&self.path))
                .await
            {
                Ok(output) => return Ok((interpreter, String::from_utf8_lossy(&output).into_owned())),
                Err(e) => {
                    debug!(interpreter, error = %e, "Interpreter not usable");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("no Python interpreter configured"))
            .context("Cannot list installed Python packages"))
    }

    async fn load(&self) -> Result<Vec<Dependency>> {
        let requirements = parse_requirements(&read_manifest(&self.requirements, "requirements.txt")?);
        let (python, listing) = self.installed_packages().await?;

        let mut pending = PendingSet::new(parse_pip_list(&listing));
        let tasks: Vec<(String, String)> = requirements.iter().filter_map(|name| pending.claim(name)).collect();
        info!(top_level = tasks.len(), "Resolving Python requirements");

        let runner = Arc::clone(&self.ctx.runner);
        let pypi = Arc::clone(&self.ctx.pypi);
        let dir = self.path.clone();
        let resolved = self
            .ctx
            .pool()
            .run_expanding(
                tasks,
                move |(name, version): (String, String)| {
                    let runner = Arc::clone(&runner);
                    let pypi = Arc::clone(&pypi);
                    let dir = dir.clone();
                    async move { resolve_package(runner.as_ref(), pypi.as_ref(), python, &dir, name, version).await }
                },
                |package: &ResolvedPackage| {
                    package
                        .requires
                        .iter()
                        .filter_map(|name| pending.claim(name))
                        .collect()
                },
            )
            .await?;

        Ok(resolved.into_iter().map(|package| package.dependency).collect())
    }
}

async fn resolve_package(
    runner: &dyn CommandRunner,
    pypi: &dyn HashSource,
    python: &str,
    dir: &Path,
    name: String,
    version: String,
) -> Result<ResolvedPackage> {
    let hash = pypi
        .resolve(&name, &version)
        .await
        .map_err(|e| BomError::HashLookup {
            dependency: format!("{}@{}", name, version),
            details: format!("{:#}", e),
        })?;

    let show = runner
        .run(python, &["-m", "pip", "show", name.as_str()], Some(dir))
        .await
        .with_context(|| format!("Cannot read prerequisites of {}", name))?;
    let requires = parse_requires(&String::from_utf8_lossy(&show));

    Ok(ResolvedPackage {
        dependency: Dependency::new(name, version, hash)?,
        requires,
    })
}

/// Extracts top-level distribution names from a requirements file
///
/// Version specifiers, extras, environment markers and comments are
/// dropped; option lines (`-r`, `--hash`, ...) are ignored.
pub(crate) fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() || line.starts_with('-') {
                return None;
            }
            let end = line
                .find(|c: char| "=<>~!;[( \t".contains(c))
                .unwrap_or(line.len());
            let name = line[..end].trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Parses `pip list -v` output into normalized name -> (name, version)
///
/// The first two lines are the column header and its underline.
pub(crate) fn parse_pip_list(output: &str) -> HashMap<String, (String, String)> {
    output
        .lines()
        .skip(2)
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let version = fields.next()?;
            Some((normalize_name(name), (name.to_string(), version.to_string())))
        })
        .collect()
}

/// Reads the comma-separated `Requires:` line of `pip show`
pub(crate) fn parse_requires(output: &str) -> Vec<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Requires:"))
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Artifact for PipArtifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Python
    }

    async fn dependencies(&self) -> Result<&[Dependency]> {
        self.dependencies
            .get_or_try_init(|| self.load())
            .await
            .map(Vec::as_slice)
    }
}
