//! Utility functions

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{ProfileError, ProfileResult};

/// Validate a profile name for use as an INI section header
///
/// Names are case-sensitive and may contain most characters, but anything
/// that would break the header line or not survive a trim is rejected.
///
/// # Errors
/// Returns an error if the name is invalid
pub fn validate_name(name: &str) -> ProfileResult<()> {
    if name.trim().is_empty() {
        return Err(ProfileError::InvalidName("name cannot be empty".to_string()));
    }

    if name.trim() != name {
        return Err(ProfileError::InvalidName(format!(
            "name cannot start or end with whitespace: {name:?}"
        )));
    }

    if name.contains(['[', ']']) {
        return Err(ProfileError::InvalidName(format!(
            "name cannot contain brackets: {name}"
        )));
    }

    if name.contains(['\n', '\r', '\0']) {
        return Err(ProfileError::InvalidName(
            "name cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Replace `path` with `bytes` through a temporary file in the same directory
///
/// The parent directory is created if needed. Permission bits are copied
/// from `template` when it exists; a new file keeps the temporary file's
/// owner-only mode. Symlinks are written through.
///
/// # Errors
/// Returns an error if the directory, temporary file, or rename fails
pub fn write_atomic(path: &Path, bytes: &[u8], template: &Path) -> io::Result<()> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(template) {
        fs::set_permissions(tmp.path(), metadata.permissions())?;
    }
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_normal() {
        assert!(validate_name("work").is_ok());
        assert!(validate_name("my-profile_2").is_ok());
        assert!(validate_name("Prod Account").is_ok());
        assert!(validate_name(&"a".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_name_rejects_empty() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_validate_name_rejects_header_breakers() {
        assert!(validate_name("a]b").is_err());
        assert!(validate_name("[a").is_err());
        assert!(validate_name("a\nb").is_err());
        assert!(validate_name(" padded").is_err());
    }

    #[test]
    fn test_write_atomic_creates_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".aws").join("credentials");
        write_atomic(&path, b"[default]\n", &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"[default]\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&path, b"new", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_through_symlink() {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().join("real");
        let link = dir.path().join("link");
        fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_atomic(&link, b"new", &link).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "new");
    }
}
