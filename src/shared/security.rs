use crate::shared::error::SbomError;
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum size of a repository snapshot document (100 MB)
pub const MAX_SNAPSHOT_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum size of a single artifact read from disk (1 GB)
pub const MAX_ARTIFACT_SIZE: u64 = 1024 * 1024 * 1024;

fn security_error(path: &Path, reason: impl Into<String>, hint: &str) -> anyhow::Error {
    SbomError::SecurityError {
        path: path.to_path_buf(),
        reason: reason.into(),
        hint: hint.to_string(),
    }
    .into()
}

/// Validates that a path is not a symbolic link
///
/// # Security
/// Uses `symlink_metadata()` so the link itself is inspected, not its target.
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| SbomError::FileReadError {
        path: path.to_path_buf(),
        details: format!("Failed to read metadata for {}: {}", operation, e),
    })?;

    if metadata.is_symlink() {
        return Err(security_error(
            path,
            format!("{} operations on symbolic links are not allowed", operation),
            "Pass the resolved path instead of a symbolic link",
        ));
    }

    Ok(())
}

/// Validates that a path exists and is a regular file (not a directory or symlink)
///
/// # Errors
/// Returns an error if the path doesn't exist, is a symbolic link, or is not a regular file
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    validate_not_symlink(path, &format!("{} read", file_description))?;

    if !path.is_file() {
        return Err(security_error(
            path,
            format!("{} is not a regular file", file_description),
            "Point the option at a file, not a directory",
        ));
    }

    Ok(())
}

/// Validates file size is within acceptable limits
pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        return Err(security_error(
            path,
            format!(
                "File is too large ({} bytes). Maximum allowed size is {} bytes",
                file_size, max_size
            ),
            "Check that the path refers to the intended file",
        ));
    }
    Ok(())
}

/// Reads a regular file after the symlink, type and size checks.
pub fn read_validated(path: &Path, file_description: &str, max_size: u64) -> Result<Vec<u8>> {
    validate_regular_file(path, file_description)?;
    let size = fs::metadata(path)?.len();
    validate_file_size(size, path, max_size)?;
    fs::read(path).map_err(|e| {
        SbomError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
        .into()
    })
}
