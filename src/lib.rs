//! vcn-bom - Bill of Materials discovery with ledger-backed trust evaluation
//!
//! This library discovers the third-party dependencies of a build artifact
//! (Go binaries and modules, Python projects, .NET solutions, Maven projects
//! and npm projects), resolves a content hash for each of them, and checks
//! every dependency against a notarization ledger before writing a BOM.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`bom`): Hash model, dependency model and the trust policy
//! - **Application Layer** (`application`): Artifact detection and the BOM use case
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Ecosystem extractors, hash authorities, ledger, output
//! - **Shared** (`shared`): Common utilities, error types and the worker pool
//!
//! # Example
//!
//! ```no_run
//! use vcn_bom::prelude::*;
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<()> {
//! let timeout = Duration::from_secs(60);
//! let context = EcosystemContext::new(
//!     Arc::new(SystemCommandRunner::new(None)),
//!     Arc::new(CachingHashSource::new(SumDbClient::from_env_or(DEFAULT_SUMDB, timeout)?)),
//!     Arc::new(CachingHashSource::new(PyPiHashSource::new(DEFAULT_PYPI_URL, timeout)?)),
//!     Arc::new(CachingHashSource::new(MavenChecksumSource::new(DEFAULT_MAVEN_REPO, timeout)?)),
//! );
//! let ledger = JsonFileLedger::open(Path::new("ledger.json"))?;
//! let use_case = GenerateBomUseCase::new(ledger, context, Arc::new(StderrProgressReporter::new()));
//!
//! let policy = TrustPolicyOptions {
//!     signer_id: "ci@example.com".to_string(),
//!     trust_level: TrustLevel::Trusted.as_i64(),
//!     auto_notarize: false,
//!     max_unsupported: UnsupportedThreshold::new(0),
//! };
//! let request = BomRequest::new(PathBuf::from("."), policy, PathBuf::from(DEFAULT_BOM_FILE));
//! let response = use_case.execute(request).await?;
//! println!("{} dependencies", response.dependencies.len());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod bom;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::ecosystems::EcosystemContext;
    pub use crate::adapters::outbound::filesystem::{
        BomFileWriter, FileSystemReader, FileSystemWriter, StdoutPresenter, DEFAULT_BOM_FILE,
    };
    pub use crate::adapters::outbound::formatters::{DocumentInfo, SpdxFormatter};
    pub use crate::adapters::outbound::ledger::JsonFileLedger;
    pub use crate::adapters::outbound::network::{
        CachingHashSource, MavenChecksumSource, PyPiHashSource, SumDbClient, DEFAULT_MAVEN_REPO,
        DEFAULT_PYPI_URL, DEFAULT_SUMDB,
    };
    pub use crate::adapters::outbound::process::SystemCommandRunner;
    pub use crate::application::dto::{BomRequest, BomResponse};
    pub use crate::application::factories::ArtifactFactory;
    pub use crate::application::use_cases::GenerateBomUseCase;
    pub use crate::bom::domain::{
        ArtifactKind, ContentHash, Dependency, HashType, ResolvedDependency, TrustLevel,
    };
    pub use crate::bom::policies::UnsupportedThreshold;
    pub use crate::bom::services::{HashCombiner, TrustPolicyEngine, TrustPolicyOptions};
    pub use crate::ports::outbound::{
        Artifact, BomFormatter, CommandRunner, HashSource, Ledger, OutputPresenter,
        ProgressReporter,
    };
    pub use crate::shared::error::{BomError, ExitCode};
    pub use crate::shared::Result;
}
