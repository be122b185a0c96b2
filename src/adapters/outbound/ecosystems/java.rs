//! Java extractor driving `mvn dependency:tree` and Maven Central checksums

use super::{manifest_error, read_manifest, EcosystemContext};
use crate::bom::domain::{ArtifactKind, Dependency};
use crate::ports::outbound::{Artifact, HashSource};
use crate::shared::error::BomError;
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::OnceCell;
use tracing::{info, warn};

const POM: &str = "pom.xml";
const GRAPH_FILE: &str = "dependency-tree.graphml";

/// Where the project's POM lives
#[derive(Debug, Clone)]
enum PomSource {
    File(PathBuf),
    /// POM packed inside a JAR, extracted on demand
    Jar { jar: PathBuf, entry: String },
}

/// A node of the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MavenCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// MavenArtifact lists dependencies with Maven and fetches their SHA-1 checksums
pub struct MavenArtifact {
    path: PathBuf,
    source: PomSource,
    ctx: EcosystemContext,
    dependencies: OnceCell<Vec<Dependency>>,
}

/// Accepts a `pom.xml`, a directory holding one, or a `.jar` that embeds one
pub fn detect(path: &Path, ctx: &EcosystemContext) -> Result<Option<Box<dyn Artifact>>> {
    let source = if path.is_dir() {
        let pom = path.join(POM);
        if !pom.is_file() {
            return Ok(None);
        }
        PomSource::File(pom)
    } else if path.file_name().is_some_and(|name| name == POM) {
        PomSource::File(path.to_path_buf())
    } else if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
    {
        match find_pom_entry(path)? {
            Some(entry) => PomSource::Jar {
                jar: path.to_path_buf(),
                entry,
            },
            None => return Ok(None),
        }
    } else {
        return Ok(None);
    };

    Ok(Some(Box::new(MavenArtifact {
        path: path.to_path_buf(),
        source,
        ctx: ctx.clone(),
        dependencies: OnceCell::new(),
    })))
}

fn find_pom_entry(jar: &Path) -> Result<Option<String>> {
    let file = File::open(jar).with_context(|| format!("Cannot open {}", jar.display()))?;
    let archive = zip::ZipArchive::new(file).with_context(|| format!("{} is not a JAR archive", jar.display()))?;
    let entry = archive
        .file_names()
        .filter(|name| *name == POM || name.ends_with("/pom.xml"))
        .min_by_key(|name| name.len())
        .map(str::to_string);
    Ok(entry)
}

fn extract_entry(jar: &Path, entry: &str, target: &Path) -> Result<()> {
    let file = File::open(jar).with_context(|| format!("Cannot open {}", jar.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut pom = archive
        .by_name(entry)
        .with_context(|| format!("Cannot read {} from {}", entry, jar.display()))?;
    let mut out = File::create(target).map_err(|e| BomError::FileWriteError {
        path: target.to_path_buf(),
        details: e.to_string(),
    })?;
    std::io::copy(&mut pom, &mut out)?;
    Ok(())
}

impl MavenArtifact {
    async fn load(&self) -> Result<Vec<Dependency>> {
        let work_dir = TempDir::new().context("Cannot create a temporary directory for Maven")?;

        let pom = match &self.source {
            PomSource::File(pom) => pom.clone(),
            PomSource::Jar { jar, entry } => {
                let target = work_dir.path().join(POM);
                extract_entry(jar, entry, &target)?;
                target
            }
        };
        let pom_dir = pom.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let graph = work_dir.path().join(GRAPH_FILE);

        let pom_arg = pom.to_string_lossy().into_owned();
        let output_arg = format!("-DoutputFile={}", graph.display());
        self.ctx
            .runner
            .run(
                "mvn",
                &[
                    "dependency:tree",
                    "-DoutputType=graphml",
                    "-f",
                    pom_arg.as_str(),
                    "-DappendOutput=true",
                    output_arg.as_str(),
                ],
                Some(&pom_dir),
            )
            .await?;

        let coordinates = parse_graphml(&read_manifest(&graph, "dependency graph")?, &pom)?;
        info!(dependencies = coordinates.len(), "Resolving Maven checksums");
        resolve_coordinates(&self.ctx, coordinates).await
    }
}

/// Reads `groupId:artifactId:packaging:version[:scope]` node labels
///
/// The first node is the project itself and is skipped. Nodes with an
/// empty coordinate field are logged and skipped.
pub(crate) fn parse_graphml(content: &str, pom: &Path) -> Result<Vec<MavenCoordinate>> {
    let document = roxmltree::Document::parse(content).map_err(|e| manifest_error("JavaMaven", pom, e))?;

    let mut seen = HashSet::new();
    let mut coordinates = Vec::new();
    let labels = document
        .descendants()
        .filter(|node| node.tag_name().name() == "NodeLabel")
        .skip(1);

    for label in labels {
        let text = label.text().unwrap_or_default().trim();
        let fields: Vec<&str> = text.split(':').collect();
        if fields.len() < 4 {
            return Err(manifest_error(
                "JavaMaven",
                pom,
                format!("unexpected dependency label '{}'", text),
            ));
        }
        // With a classifier the version moves one field to the right
        let version = if fields.len() >= 6 { fields[4] } else { fields[3] };
        let (group_id, artifact_id) = (fields[0], fields[1]);

        if group_id.is_empty() || artifact_id.is_empty() || version.is_empty() {
            warn!(label = %text, "Dependency with an empty coordinate field, skipping");
            continue;
        }

        let coordinate = MavenCoordinate {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
        };
        if seen.insert(coordinate.clone()) {
            coordinates.push(coordinate);
        }
    }

    Ok(coordinates)
}

async fn resolve_coordinates(ctx: &EcosystemContext, coordinates: Vec<MavenCoordinate>) -> Result<Vec<Dependency>> {
    let maven = Arc::clone(&ctx.maven);
    ctx.pool()
        .run(coordinates, move |coordinate: MavenCoordinate| {
            let maven = Arc::clone(&maven);
            async move { resolve_coordinate(maven.as_ref(), coordinate).await }
        })
        .await
}

async fn resolve_coordinate(maven: &dyn HashSource, coordinate: MavenCoordinate) -> Result<Dependency> {
    let name = format!("{}:{}", coordinate.group_id, coordinate.artifact_id);
    let hash = maven
        .resolve(&name, &coordinate.version)
        .await
        .map_err(|e| BomError::HashLookup {
            dependency: format!("{}@{}", name, coordinate.version),
            details: format!("{:#}", e),
        })?;
    Dependency::new(coordinate.artifact_id, coordinate.version, hash)
}

#[async_trait]
impl Artifact for MavenArtifact {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Java
    }

    async fn dependencies(&self) -> Result<&[Dependency]> {
        self.dependencies
            .get_or_try_init(|| self.load())
            .await
            .map(Vec::as_slice)
    }
}
