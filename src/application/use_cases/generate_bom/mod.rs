use crate::adapters::outbound::ecosystems::EcosystemContext;
use crate::adapters::outbound::filesystem::{BomFileWriter, FileSystemWriter, StdoutPresenter};
use crate::adapters::outbound::formatters::SpdxFormatter;
use crate::application::dto::{BomRequest, BomResponse};
use crate::application::factories::ArtifactFactory;
use crate::bom::domain::{Dependency, ResolvedDependency, TrustLevel};
use crate::bom::services::TrustPolicyEngine;
use crate::ports::outbound::{Artifact, BomFormatter, Ledger, OutputPresenter, ProgressReporter};
use crate::shared::error::BomError;
use crate::shared::security::validate_artifact_path;
use crate::shared::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// SPDX destination that selects stdout instead of a file
pub const STDOUT_DESTINATION: &str = "-";

/// GenerateBomUseCase - Core use case for BOM discovery and trust evaluation
///
/// Detects the artifact ecosystem, extracts the dependency list, evaluates
/// it against the ledger and writes the `.bom` side file (plus an optional
/// SPDX document) once the policy has passed.
///
/// # Type Parameters
/// * `L` - Ledger implementation
pub struct GenerateBomUseCase<L> {
    ledger: L,
    context: EcosystemContext,
    progress_reporter: Arc<dyn ProgressReporter>,
}

impl<L: Ledger> GenerateBomUseCase<L> {
    /// Creates a new GenerateBomUseCase with injected dependencies
    pub fn new(
        ledger: L,
        context: EcosystemContext,
        progress_reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            ledger,
            context,
            progress_reporter,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Executes the BOM generation use case
    ///
    /// Parameters are checked before anything is scanned, so a bad trust
    /// level never costs a dependency resolution pass.
    ///
    /// # Errors
    /// - `BomError::InvalidParameter` or `BomError::InvalidArtifactPath` for a bad request
    /// - `BomError::UnsupportedArtifact` when no ecosystem recognizes the path
    /// - `BomError::TrustPolicyViolation` when the policy rejects dependencies
    /// - Any extraction, ledger or side file failure
    pub async fn execute(&self, request: BomRequest) -> Result<BomResponse> {
        Self::validate_request(&request)?;

        let artifact = self.detect_artifact(&request.artifact_path)?;

        let dependencies = self.resolve_dependencies(artifact.as_ref()).await?;
        warn_hashless(dependencies, &request.policy.signer_id);

        let engine = TrustPolicyEngine::new(&self.ledger);
        let resolved = engine
            .auth_dependencies(artifact.kind(), dependencies, &request.policy)
            .await?;

        BomFileWriter::new(request.bom_file.clone()).write(&resolved)?;
        info!(path = %request.bom_file.display(), "BOM side file written");

        let spdx_file = match &request.spdx_file {
            Some(path) => self.write_spdx(artifact.path(), &resolved, path)?,
            None => None,
        };

        let response = BomResponse::new(artifact.kind(), resolved, request.bom_file, spdx_file);
        self.report_summary(&response);
        Ok(response)
    }

    fn validate_request(request: &BomRequest) -> Result<()> {
        TrustLevel::try_from(request.policy.trust_level)?;

        if request.policy.signer_id.trim().is_empty() {
            return Err(BomError::InvalidParameter {
                name: "signer ID".to_string(),
                details: "a signer ID is required to look up dependencies in the ledger"
                    .to_string(),
            }
            .into());
        }

        validate_artifact_path(&request.artifact_path)
    }

    fn detect_artifact(&self, path: &Path) -> Result<Box<dyn Artifact>> {
        let artifact = ArtifactFactory::detect(path, &self.context)?.ok_or_else(|| {
            BomError::UnsupportedArtifact {
                path: path.to_path_buf(),
            }
        })?;

        self.progress_reporter.report(&format!(
            "🔍 Detected {} artifact: {}",
            artifact.kind(),
            path.display()
        ));
        Ok(artifact)
    }

    async fn resolve_dependencies<'a>(
        &self,
        artifact: &'a dyn Artifact,
    ) -> Result<&'a [Dependency]> {
        self.progress_reporter.report("📦 Resolving dependencies...");

        let dependencies = artifact.dependencies().await?;

        self.progress_reporter.report(&format!(
            "✅ Found {} dependenc{}",
            dependencies.len(),
            plural(dependencies.len())
        ));
        Ok(dependencies)
    }

    /// Renders and writes the SPDX document, `-` meaning stdout
    ///
    /// Rendering errors are fatal. A write failure only warns: by then the
    /// policy has passed and any notarization is already recorded.
    fn write_spdx(
        &self,
        artifact_path: &Path,
        resolved: &[ResolvedDependency],
        output: &Path,
    ) -> Result<Option<PathBuf>> {
        self.progress_reporter.report("📝 Outputting SPDX...");

        let document = SpdxFormatter::new().format(artifact_path, resolved)?;

        let presenter: Box<dyn OutputPresenter> = if output == Path::new(STDOUT_DESTINATION) {
            Box::new(StdoutPresenter::new())
        } else {
            Box::new(FileSystemWriter::new(output.to_path_buf()))
        };

        match presenter.present(&document) {
            Ok(()) => Ok(Some(output.to_path_buf())),
            Err(e) => {
                warn!(path = %output.display(), error = %e, "Cannot output SPDX");
                self.progress_reporter
                    .report_error(&format!("⚠️  Warning: Cannot output SPDX: {}", e));
                Ok(None)
            }
        }
    }

    fn report_summary(&self, response: &BomResponse) {
        let total = response.dependencies.len();
        self.progress_reporter.report_completion(&format!(
            "Success: {} dependenc{} ({} trusted, {} unsupported, {} untrusted)",
            total,
            plural(total),
            response.count(TrustLevel::Trusted),
            response.count(TrustLevel::Unsupported),
            response.count(TrustLevel::Untrusted),
        ));
    }
}

/// Dependencies without a content hash all map to the ledger key `vcn.<signer>.`
fn warn_hashless(dependencies: &[Dependency], signer_id: &str) {
    for dependency in dependencies.iter().filter(|d| d.content_hash().is_none()) {
        warn!(
            name = dependency.name(),
            version = dependency.version(),
            key = %format!("vcn.{}.", signer_id),
            "Dependency has no content hash and shares its ledger key with every other hashless dependency"
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}
