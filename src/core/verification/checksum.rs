//! Checksum calculation for emitted documents
//!
//! Documents are hashed byte for byte: two reports are identical exactly
//! when their checksums are.

use crate::domain::{Result, TallyError};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Calculate SHA-256 checksum of raw bytes
///
/// # Returns
///
/// Returns a hex-encoded SHA-256 checksum string (64 characters).
///
/// # Examples
///
/// ```
/// use tally::core::verification::checksum::calculate_checksum_bytes;
///
/// let checksum = calculate_checksum_bytes(b"<submission/>");
/// assert_eq!(checksum.len(), 64);
/// ```
pub fn calculate_checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{result:x}")
}

/// Path of the checksum file written next to a document
pub fn checksum_path(document: &Path) -> PathBuf {
    let mut name = document.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Writes `<checksum>  <file name>` next to the document, `sha256sum` style
pub fn write_checksum_file(document: &Path, checksum: &str) -> Result<PathBuf> {
    let path = checksum_path(document);
    let file_name = document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    std::fs::write(&path, format!("{checksum}  {file_name}\n")).map_err(|e| {
        TallyError::Io(format!(
            "Failed to write checksum file {}: {e}",
            path.display()
        ))
    })?;
    Ok(path)
}

/// Checks a document file against its checksum file
pub fn verify_checksum_file(document: &Path) -> Result<bool> {
    let bytes = std::fs::read(document)?;
    let recorded = std::fs::read_to_string(checksum_path(document))?;
    let expected = recorded.split_whitespace().next().unwrap_or_default();
    Ok(calculate_checksum_bytes(&bytes) == expected)
}
