use crate::bom::domain::{ArtifactKind, ResolvedDependency, TrustLevel};
use std::path::PathBuf;

/// BomResponse - Internal response DTO from BOM generation use case
#[derive(Debug, Clone)]
pub struct BomResponse {
    /// Ecosystem the artifact was detected as
    pub kind: ArtifactKind,
    /// Every dependency with its trust level, in extraction order
    pub dependencies: Vec<ResolvedDependency>,
    /// Where the side file was written
    pub bom_file: PathBuf,
    /// Where the SPDX document was written, if it was requested and written
    pub spdx_file: Option<PathBuf>,
}

impl BomResponse {
    pub fn new(
        kind: ArtifactKind,
        dependencies: Vec<ResolvedDependency>,
        bom_file: PathBuf,
        spdx_file: Option<PathBuf>,
    ) -> Self {
        Self {
            kind,
            dependencies,
            bom_file,
            spdx_file,
        }
    }

    /// Number of dependencies resolved at `level`
    pub fn count(&self, level: TrustLevel) -> usize {
        self.dependencies
            .iter()
            .filter(|dep| dep.trust_level() == level)
            .count()
    }
}
