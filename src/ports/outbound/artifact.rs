use crate::bom::domain::{ArtifactKind, Dependency};
use crate::shared::Result;
use async_trait::async_trait;
use std::path::Path;

/// Artifact port: a build artifact whose dependencies are being discovered
///
/// Each ecosystem extractor implements this port. The artifact facade
/// returns one as a trait object so callers never branch on the ecosystem.
#[async_trait]
pub trait Artifact: Send + Sync {
    /// Path the artifact was detected at
    fn path(&self) -> &Path;

    /// Ecosystem tag, also used as the notarization kind
    fn kind(&self) -> ArtifactKind;

    /// Returns the full dependency list of the artifact
    ///
    /// The list is computed on first call and cached for the lifetime of
    /// the artifact. Later calls return the same slice without re-scanning.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A manifest cannot be read or has a malformed field
    /// - An external tool fails or is missing
    /// - A hash authority cannot be reached while resolving hashes
    async fn dependencies(&self) -> Result<&[Dependency]>;
}
