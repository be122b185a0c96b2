//! .NET extractor reading NuGet `packages.lock.json` files

use super::{files_with_extension, manifest_error, read_manifest, EcosystemContext};
use crate::bom::domain::{ArtifactKind, Dependency, HashType};
use crate::bom::services::HashCombiner;
use crate::ports::outbound::{Artifact, CommandRunner};
use crate::shared::error::BomError;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

const LOCK_FILE: &str = "packages.lock.json";
const PROJECT_EXTENSIONS: [&str; 2] = ["csproj", "vbproj"];

#[derive(Debug, Deserialize)]
struct LockFile {
    /// Target framework -> package name -> locked package
    #[serde(default)]
    dependencies: BTreeMap<String, BTreeMap<String, LockedPackage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockedPackage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    resolved: Option<String>,
    #[serde(default)]
    content_hash: Option<String>,
}

/// Where the list of projects comes from
#[derive(Debug, Clone)]
enum ProjectSource {
    Solution(PathBuf),
    Projects(Vec<PathBuf>),
}

/// DotNetArtifact collects NuGet packages of a solution or of single projects
pub struct DotNetArtifact {
    path: PathBuf,
    dir: PathBuf,
    source: ProjectSource,
    runner: Arc<dyn CommandRunner>,
    dependencies: OnceCell<Vec<Dependency>>,
}

/// Accepts a `.sln`/`.csproj`/`.vbproj` file, or a directory holding one
pub fn detect(path: &Path, ctx: &EcosystemContext) -> Result<Option<Box<dyn Artifact>>> {
    let (dir, source) = if path.is_file() {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        match extension.as_str() {
            "sln" => (dir, ProjectSource::Solution(path.to_path_buf())),
            ext if PROJECT_EXTENSIONS.contains(&ext) => (dir, ProjectSource::Projects(vec![path.to_path_buf()])),
            _ => return Ok(None),
        }
    } else if path.is_dir() {
        if let Some(solution) = files_with_extension(path, &["sln"])?.into_iter().next() {
            (path.to_path_buf(), ProjectSource::Solution(solution))
        } else {
            let projects = files_with_extension(path, &PROJECT_EXTENSIONS)?;
            if projects.is_empty() {
                return Ok(None);
            }
            (path.to_path_buf(), ProjectSource::Projects(projects))
        }
    } else {
        return Ok(None);
    };

    Ok(Some(Box::new(DotNetArtifact {
        path: path.to_path_buf(),
        dir,
        source,
        runner: Arc::clone(&ctx.runner),
        dependencies: OnceCell::new(),
    })))
}

impl DotNetArtifact {
    fn projects(&self) -> Result<Vec<PathBuf>> {
        match &self.source {
            ProjectSource::Projects(projects) => Ok(projects.clone()),
            ProjectSource::Solution(solution) => {
                let content = read_manifest(solution, "solution file")?;
                let base = solution.parent().unwrap_or(&self.dir);
                Ok(parse_solution(&content).into_iter().map(|p| base.join(p)).collect())
            }
        }
    }

    async fn load(&self) -> Result<Vec<Dependency>> {
        let lock_files: Vec<PathBuf> = self
            .projects()?
            .iter()
            .map(|project| project.parent().unwrap_or(&self.dir).join(LOCK_FILE))
            .collect();

        if lock_files.iter().any(|lock| !lock.is_file()) {
            info!(dir = %self.dir.display(), "Lock file missing, running dotnet restore");
            self.runner
                .run("dotnet", &["restore", "--use-lock-file"], Some(&self.dir))
                .await?;
        }

        let mut seen = HashSet::new();
        let mut dependencies = Vec::new();
        for lock_file in &lock_files {
            let content = read_manifest(lock_file, LOCK_FILE)?;
            parse_lock_file(&content, lock_file, &mut seen, &mut dependencies)?;
        }
        Ok(dependencies)
    }
}

/// Extracts C# and VB project paths from a solution's `Project(` lines
pub(crate) fn parse_solution(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .filter(|line| line.trim_start().starts_with("Project("))
        .filter_map(|line| {
            let (_, declaration) = line.split_once('=')?;
            let path = declaration.split(',').nth(1)?.trim().trim_matches('"');
            let is_project = Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PROJECT_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)));
            is_project.then(|| PathBuf::from(path.replace('\\', "/")))
        })
        .collect()
}

/// Appends the packages of one lock file, skipping pairs already in `seen`
///
/// Project references are the solution's own projects and are left out.
pub(crate) fn parse_lock_file(
    content: &str,
    path: &Path,
    seen: &mut HashSet<(String, String)>,
    dependencies: &mut Vec<Dependency>,
) -> Result<()> {
    let lock: LockFile = serde_json::from_str(content).map_err(|e| manifest_error(".Net", path, e))?;

    for packages in lock.dependencies.values() {
        for (name, package) in packages {
            if package.kind == "Project" {
                continue;
            }
            let version = package
                .resolved
                .as_deref()
                .ok_or_else(|| manifest_error(".Net", path, format!("package {}: missing \"resolved\"", name)))?;
            if !seen.insert((name.clone(), version.to_string())) {
                continue;
            }

            let dependency = format!("{}@{}", name, version);
            let content_hash = package.content_hash.as_deref().ok_or_else(|| BomError::MalformedHash {
                dependency: dependency.clone(),
                details: "missing contentHash".to_string(),
            })?;
            let hash = HashCombiner::from_base64(HashType::Sha512, content_hash).map_err(|e| {
                BomError::MalformedHash {
                    dependency,
                    details: e.to_string(),
                }
            })?;
            dependencies.push(Dependency::new(name.as_str(), version, hash)?);
        }
    }
    Ok(())
}

#[async_trait]
impl Artifact for DotNetArtifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::DotNet
    }

    async fn dependencies(&self) -> Result<&[Dependency]> {
        self.dependencies
            .get_or_try_init(|| self.load())
            .await
            .map(Vec::as_slice)
    }
}
