use crate::bom::domain::ResolvedDependency;
use crate::ports::outbound::BomFormatter;
use crate::shared::Result;
use chrono::{SecondsFormat, Utc};
use std::fmt::Write;
use std::path::Path;

const SPDX_VERSION: &str = "SPDX-2.2";
const DATA_LICENSE: &str = "CC0-1.0";
const DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";
const NAMESPACE_ROOT: &str = "http://spdx.org/spdxdocs";
const NO_ASSERTION: &str = "NOASSERTION";

/// Document-level values that change on every run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub name: String,
    pub namespace: String,
    pub created: String,
}

impl DocumentInfo {
    /// Names the document after the artifact and stamps it with the current time
    pub fn for_artifact(artifact_path: &Path) -> Self {
        let resolved = artifact_path
            .canonicalize()
            .unwrap_or_else(|_| artifact_path.to_path_buf());
        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| resolved.to_string_lossy().into_owned());

        Self {
            namespace: format!("{}/{}-{}", NAMESPACE_ROOT, name, uuid::Uuid::new_v4()),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            name,
        }
    }
}

/// Accumulates `Tag: value` lines
struct TagWriter {
    out: String,
}

impl TagWriter {
    fn mandatory(&mut self, tag: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            anyhow::bail!("no value for mandatory tag {}", tag);
        }
        self.line(tag, value);
        Ok(())
    }

    fn optional(&mut self, tag: &str, value: &str) {
        if !value.is_empty() {
            self.line(tag, value);
        }
    }

    fn line(&mut self, tag: &str, value: &str) {
        // Writing to a String cannot fail
        let _ = writeln!(self.out, "{}: {}", tag, value);
    }
}

/// SpdxFormatter adapter for generating SPDX 2.2 tag:value documents
///
/// This adapter implements the BomFormatter port. Licensing fields are
/// always `NOASSERTION`; the trust level goes into `PackageComment`.
pub struct SpdxFormatter {
    creator: String,
}

impl SpdxFormatter {
    pub fn new() -> Self {
        Self {
            creator: format!("Tool: {}-{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }

    /// Renders the document with fixed document-level values
    pub fn render(&self, document: &DocumentInfo, dependencies: &[ResolvedDependency]) -> Result<String> {
        let mut writer = TagWriter { out: String::new() };

        writer.mandatory("SPDXVersion", SPDX_VERSION)?;
        writer.mandatory("DataLicense", DATA_LICENSE)?;
        writer.mandatory("SPDXID", DOCUMENT_ID)?;
        writer.mandatory("DocumentName", &document.name)?;
        writer.mandatory("DocumentNamespace", &document.namespace)?;
        writer.mandatory("Creator", &self.creator)?;
        writer.mandatory("Created", &document.created)?;

        writer.out.push_str("\n##### Software components\n\n");

        for (index, resolved) in dependencies.iter().enumerate() {
            let dependency = resolved.dependency();
            let checksum = if dependency.content_hash().is_none() {
                String::new()
            } else {
                format!("{}: {}", dependency.hash_type(), dependency.hash())
            };
            let component = |e: anyhow::Error| e.context(format!("component {}", dependency.name()));

            writer.mandatory("PackageName", dependency.name()).map_err(component)?;
            writer.mandatory("SPDXID", &format!("SPDXRef-Package-{}", index + 1))?;
            writer.optional("PackageVersion", dependency.version());
            writer.mandatory("PackageDownloadLocation", NO_ASSERTION)?;
            writer.mandatory("FilesAnalyzed", "false")?;
            if checksum.is_empty() {
                anyhow::bail!(
                    "no value for mandatory tag PackageChecksum for component {}",
                    dependency.name()
                );
            }
            writer.mandatory("PackageChecksum", &checksum)?;
            writer.mandatory("PackageLicenseConcluded", NO_ASSERTION)?;
            writer.mandatory("PackageLicenseDeclared", NO_ASSERTION)?;
            writer.mandatory("PackageCopyrightText", NO_ASSERTION)?;
            writer.optional("PackageComment", resolved.trust_level().name());
            writer.out.push('\n');
        }

        Ok(writer.out)
    }
}

impl Default for SpdxFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl BomFormatter for SpdxFormatter {
    fn format(&self, artifact_path: &Path, dependencies: &[ResolvedDependency]) -> Result<String> {
        self.render(&DocumentInfo::for_artifact(artifact_path), dependencies)
    }
}
