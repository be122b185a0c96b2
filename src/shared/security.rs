use crate::shared::error::BomError;
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum manifest size for security (100 MB)
/// This prevents DoS attacks via excessively large files
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validates that a path exists and is a regular file (not a directory or symlink)
///
/// # Security
/// Uses `symlink_metadata()` so a symlink is rejected instead of followed.
///
/// # Errors
/// Returns an error if:
/// - The path doesn't exist
/// - The path is a symbolic link
/// - The path is not a regular file
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<fs::Metadata> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", file_description, e))?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, symbolic links are not allowed.",
            path.display()
        );
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    Ok(metadata)
}

/// Validates file size is within acceptable limits
///
/// # Errors
/// Returns an error if the file size exceeds the maximum
pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            file_size,
            max_size
        );
    }
    Ok(())
}

/// Validates the artifact path given on the command line
///
/// The artifact may be a directory (source tree) or a file (executable,
/// solution, POM, JAR), but never a symbolic link.
///
/// # Errors
/// Returns `BomError::InvalidArtifactPath` describing the problem
pub fn validate_artifact_path(path: &Path) -> Result<()> {
    let invalid = |reason: String| BomError::InvalidArtifactPath {
        path: path.to_path_buf(),
        reason,
    };

    if !path.exists() {
        return Err(invalid("Path does not exist".to_string()).into());
    }

    let metadata = fs::symlink_metadata(path)
        .map_err(|e| invalid(format!("Failed to read path metadata: {}", e)))?;

    if metadata.is_symlink() {
        return Err(invalid(
            "Security: Artifact path is a symbolic link. For security reasons, symbolic links are not allowed."
                .to_string(),
        )
        .into());
    }

    if !metadata.is_dir() && !metadata.is_file() {
        return Err(invalid("Neither a file nor a directory".to_string()).into());
    }

    path.canonicalize()
        .map_err(|e| invalid(format!("Failed to canonicalize path: {}", e)))?;

    Ok(())
}

/// Validates a package name or version before it is placed in a URL path
///
/// # Security
/// Prevents URL injection through crafted manifest entries.
pub fn validate_url_component(component: &str, component_type: &str) -> Result<()> {
    if component.is_empty() {
        anyhow::bail!("{} must not be empty", component_type);
    }

    if component.contains('/') || component.contains('\\') {
        anyhow::bail!(
            "Security: {} contains path separators which are not allowed",
            component_type
        );
    }

    if component.contains("..") {
        anyhow::bail!(
            "Security: {} contains '..' which is not allowed",
            component_type
        );
    }

    if component.contains('#') || component.contains('?') || component.contains('@') {
        anyhow::bail!(
            "Security: {} contains URL-unsafe characters",
            component_type
        );
    }

    Ok(())
}
