//! Ecosystem extractors
//!
//! Each submodule exposes a `detect` function that turns an artifact path
//! into an [`Artifact`] when the path belongs to that ecosystem. Detection
//! only inspects file names and headers; manifests are parsed and external
//! tools are run when `dependencies()` is first called.

pub mod dotnet;
pub mod go;
pub mod java;
pub mod node;
pub mod python;

use super::filesystem::FileSystemReader;
use crate::ports::outbound::{Artifact, CommandRunner, HashSource, ProgressReporter};
use crate::shared::error::BomError;
use crate::shared::worker_pool::{WorkerPool, DEFAULT_WORKERS};
use crate::shared::Result;
use std::path::Path;
use std::sync::Arc;

/// Collaborators shared by every extractor
#[derive(Clone)]
pub struct EcosystemContext {
    pub runner: Arc<dyn CommandRunner>,
    pub sumdb: Arc<dyn HashSource>,
    pub pypi: Arc<dyn HashSource>,
    pub maven: Arc<dyn HashSource>,
    pub workers: usize,
    pub progress: Option<Arc<dyn ProgressReporter>>,
}

impl EcosystemContext {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        sumdb: Arc<dyn HashSource>,
        pypi: Arc<dyn HashSource>,
        maven: Arc<dyn HashSource>,
    ) -> Self {
        Self {
            runner,
            sumdb,
            pypi,
            maven,
            workers: DEFAULT_WORKERS,
            progress: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Builds a fresh pool for one resolution pass
    pub fn pool(&self) -> WorkerPool {
        let pool = WorkerPool::new(self.workers);
        match &self.progress {
            Some(progress) => pool.with_progress(Arc::clone(progress)),
            None => pool,
        }
    }
}

/// Signature shared by the per-ecosystem detectors
pub type Detector = fn(&Path, &EcosystemContext) -> Result<Option<Box<dyn Artifact>>>;

/// Detectors in priority order: Go, Python, .NET, Java, Node
///
/// The first detector that claims a path wins. A directory holding both a
/// `go.sum` and a `package-lock.json` is therefore analyzed as a Go module.
pub const DETECTORS: [(&str, Detector); 5] = [
    ("go", go::detect),
    ("python", python::detect),
    (".Net", dotnet::detect),
    ("JavaMaven", java::detect),
    ("node", node::detect),
];

/// Reads a manifest through the filesystem reader's checks
pub(crate) fn read_manifest(path: &Path, description: &str) -> Result<String> {
    FileSystemReader::new().read_manifest(path, description)
}

/// Wraps a manifest parse problem with its ecosystem and location
pub(crate) fn manifest_error(ecosystem: &str, path: &Path, details: impl ToString) -> anyhow::Error {
    BomError::ManifestParse {
        ecosystem: ecosystem.to_string(),
        path: path.to_path_buf(),
        details: details.to_string(),
    }
    .into()
}

/// Lists the files directly inside `dir` whose extension is one of `extensions`, sorted
pub(crate) fn files_with_extension(dir: &Path, extensions: &[&str]) -> Result<Vec<std::path::PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)));
        if matches && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
