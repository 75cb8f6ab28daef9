//! Byte-for-byte backups of registry files
//!
//! A backup sits next to its original as `<file>.backup` and is overwritten
//! by the next mutation of the same file.

use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::util::write_atomic;

/// Errors while creating, verifying or restoring a backup
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("No backup found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Hash mismatch for {}: expected {expected}, got {actual}", path.display())]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Backup {} is not a readable profile file: {message}", path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("IO error for {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl BackupError {
    fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// A backup copy on disk together with the digest of its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    /// File that was copied
    pub original: PathBuf,
    /// Location of the copy
    pub path: PathBuf,
    pub sha256: String,
    pub len: u64,
}

impl BackupArtifact {
    /// Re-read the copy and check it still matches the recorded digest
    ///
    /// # Errors
    /// Returns an error if the copy is missing, unreadable or changed
    pub fn verify(&self) -> Result<(), BackupError> {
        let bytes = read_backup(&self.path)?;
        let actual = hash_content(&bytes);
        if actual != self.sha256 || bytes.len() as u64 != self.len {
            return Err(BackupError::HashMismatch {
                path: self.path.clone(),
                expected: self.sha256.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// `<file>.backup` next to `original`
#[must_use]
pub fn backup_path(original: &Path) -> PathBuf {
    let mut name = original
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(".backup");
    original.with_file_name(name)
}

/// SHA-256 of `content` as lowercase hex
#[must_use]
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Write `content`, the bytes just read from `original`, to its backup path
///
/// The copy is verified before returning.
///
/// # Errors
/// Returns an error if the copy cannot be written or does not read back
/// identically
pub fn create_backup(original: &Path, content: &[u8]) -> Result<BackupArtifact, BackupError> {
    let path = backup_path(original);
    write_atomic(&path, content, original).map_err(|e| BackupError::io(&path, &e))?;

    let artifact = BackupArtifact {
        original: original.to_path_buf(),
        path,
        sha256: hash_content(content),
        len: content.len() as u64,
    };
    artifact.verify()?;
    tracing::debug!(
        backup = %artifact.path.display(),
        sha256 = %artifact.sha256,
        "backup written"
    );
    Ok(artifact)
}

/// Copy the backup of `original` back over it
///
/// The backup must be valid UTF-8; after the write the original is re-read
/// and compared against the backup digest.
///
/// # Errors
/// Returns an error if there is no backup, it is not text, or the restored
/// file does not match
pub fn restore_backup(original: &Path) -> Result<BackupArtifact, BackupError> {
    let path = backup_path(original);
    let content = read_backup(&path)?;
    if let Err(e) = std::str::from_utf8(&content) {
        return Err(BackupError::Invalid {
            path,
            message: e.to_string(),
        });
    }

    let artifact = BackupArtifact {
        original: original.to_path_buf(),
        path,
        sha256: hash_content(&content),
        len: content.len() as u64,
    };

    let template = if original.exists() {
        original
    } else {
        artifact.path.as_path()
    };
    write_atomic(original, &content, template).map_err(|e| BackupError::io(original, &e))?;

    let restored = fs::read(original).map_err(|e| BackupError::io(original, &e))?;
    let actual = hash_content(&restored);
    if actual != artifact.sha256 {
        return Err(BackupError::HashMismatch {
            path: original.to_path_buf(),
            expected: artifact.sha256,
            actual,
        });
    }

    tracing::debug!(file = %original.display(), "restored from backup");
    Ok(artifact)
}

fn read_backup(path: &Path) -> Result<Vec<u8>, BackupError> {
    fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            BackupError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            BackupError::io(path, &e)
        }
    })
}
