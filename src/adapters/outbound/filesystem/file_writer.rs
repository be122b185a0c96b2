use crate::ports::outbound::OutputPresenter;
use crate::shared::error::BomError;
use crate::shared::Result;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// FileSystemWriter adapter for writing output to files
///
/// This adapter implements the OutputPresenter port for file output. It is
/// used for the SPDX document and, through [`super::BomFileWriter`], for the
/// side file.
pub struct FileSystemWriter {
    output_path: PathBuf,
}

impl FileSystemWriter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn write_error(&self, details: impl Into<String>) -> BomError {
        BomError::FileWriteError {
            path: self.output_path.clone(),
            details: details.into(),
        }
    }

    /// Refuses destinations that would redirect the write elsewhere
    ///
    /// The parent directory must exist and resolve, and the destination
    /// itself must not be a symbolic link (dangling links included).
    fn check_destination(&self) -> Result<()> {
        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                return Err(self
                    .write_error(format!("Parent directory does not exist: {}", parent.display()))
                    .into());
            }
            parent
                .canonicalize()
                .map_err(|e| self.write_error(format!("Failed to validate parent directory: {}", e)))?;
        }

        match fs::symlink_metadata(&self.output_path) {
            Ok(metadata) if metadata.is_symlink() => Err(self
                .write_error(
                    "Security: Output path is a symbolic link. For security reasons, writing to symbolic links is not allowed.",
                )
                .into()),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self
                .write_error(format!("Failed to read file metadata: {}", e))
                .into()),
        }
    }
}

impl OutputPresenter for FileSystemWriter {
    fn present(&self, content: &str) -> Result<()> {
        self.check_destination()?;
        fs::write(&self.output_path, content).map_err(|e| self.write_error(e.to_string()))?;

        debug!(path = %self.output_path.display(), bytes = content.len(), "Output written");
        Ok(())
    }
}

/// StdoutPresenter adapter for writing output to stdout
///
/// This adapter implements the OutputPresenter port for stdout output.
pub struct StdoutPresenter;

impl StdoutPresenter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdoutPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPresenter for StdoutPresenter {
    fn present(&self, content: &str) -> Result<()> {
        io::stdout()
            .write_all(content.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to write to stdout: {}", e))?;
        Ok(())
    }
}
