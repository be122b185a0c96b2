use crate::adapters::outbound::ecosystems::{EcosystemContext, DETECTORS};
use crate::ports::outbound::Artifact;
use crate::shared::Result;
use std::path::Path;
use tracing::debug;

/// Factory turning an artifact path into the matching ecosystem extractor
///
/// Detectors are tried in a fixed priority order (Go, Python, .NET, Java,
/// Node) and the first one that claims the path wins. Detection never runs
/// external tools, so trying every detector is cheap.
pub struct ArtifactFactory;

impl ArtifactFactory {
    /// Detects the ecosystem of `path`
    ///
    /// # Returns
    /// The artifact of the first matching ecosystem, or `None` when no
    /// ecosystem recognizes the path.
    ///
    /// # Errors
    /// Returns an error if a detector cannot inspect the path (unreadable
    /// directory, truncated executable header, ...).
    ///
    /// # Examples
    /// ```no_run
    /// use std::path::Path;
    /// use std::sync::Arc;
    /// use vcn_bom::application::factories::ArtifactFactory;
    /// use vcn_bom::prelude::*;
    ///
    /// # fn demo(ctx: EcosystemContext) -> vcn_bom::shared::Result<()> {
    /// if let Some(artifact) = ArtifactFactory::detect(Path::new("."), &ctx)? {
    ///     println!("detected {}", artifact.kind());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn detect(path: &Path, ctx: &EcosystemContext) -> Result<Option<Box<dyn Artifact>>> {
        for (name, detector) in DETECTORS {
            if let Some(artifact) = detector(path, ctx)? {
                debug!(ecosystem = name, path = %path.display(), "Artifact detected");
                return Ok(Some(artifact));
            }
        }
        Ok(None)
    }
}
