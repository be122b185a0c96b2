use crate::shared::error::BomError;
use crate::shared::security::{validate_file_size, validate_regular_file, MAX_FILE_SIZE};
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// FileSystemReader adapter for reading manifests from the file system
///
/// Every manifest an extractor parses goes through this reader, so the same
/// checks apply to lock files, solution files and tool output alike.
pub struct FileSystemReader;

impl FileSystemReader {
    pub fn new() -> Self {
        Self
    }

    /// Safely read a file with security checks:
    /// - Reject symbolic links
    /// - Check file size limits
    /// - Validate file is a regular file
    ///
    /// # Errors
    /// Returns `BomError::FileReadError` naming the file and the failed check
    pub fn read_manifest(&self, path: &Path, file_type: &str) -> Result<String> {
        let to_read_error = |details: String| BomError::FileReadError {
            path: path.to_path_buf(),
            details,
        };

        let metadata = validate_regular_file(path, file_type).map_err(|e| to_read_error(e.to_string()))?;
        validate_file_size(metadata.len(), path, MAX_FILE_SIZE).map_err(|e| to_read_error(e.to_string()))?;

        fs::read_to_string(path)
            .map_err(|e| to_read_error(format!("Failed to read {}: {}", file_type, e)).into())
    }
}

impl Default for FileSystemReader {
    fn default() -> Self {
        Self::new()
    }
}
