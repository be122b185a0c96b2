//! Python extractors, tried in order: `Pipfile.lock`, `poetry.lock`, `requirements.txt`

mod pip;
mod pipenv;
mod poetry;

pub use pip::PipArtifact;
pub use pipenv::PipenvArtifact;
pub use poetry::PoetryArtifact;

use super::EcosystemContext;
use crate::ports::outbound::Artifact;
use crate::shared::Result;
use std::path::Path;

pub fn detect(path: &Path, ctx: &EcosystemContext) -> Result<Option<Box<dyn Artifact>>> {
    if !path.is_dir() {
        return Ok(None);
    }

    let pipfile_lock = path.join("Pipfile.lock");
    if pipfile_lock.is_file() {
        return Ok(Some(Box::new(PipenvArtifact::new(path, pipfile_lock))));
    }

    let poetry_lock = path.join("poetry.lock");
    if poetry_lock.is_file() {
        return Ok(Some(Box::new(PoetryArtifact::new(path, poetry_lock))));
    }

    let requirements = path.join("requirements.txt");
    if requirements.is_file() {
        return Ok(Some(Box::new(PipArtifact::new(path, requirements, ctx))));
    }

    Ok(None)
}

/// Normalizes a distribution name for comparison (`Foo_Bar` matches `foo-bar`)
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}
