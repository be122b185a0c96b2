use crate::bom::domain::ResolvedDependency;
use crate::shared::Result;
use std::path::Path;

/// BomFormatter port for rendering the final dependency list
pub trait BomFormatter {
    /// Formats the BOM of the artifact at `artifact_path`
    ///
    /// # Errors
    /// Returns an error if a mandatory field has no value for some dependency
    fn format(&self, artifact_path: &Path, dependencies: &[ResolvedDependency]) -> Result<String>;
}
