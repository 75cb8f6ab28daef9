//! Error types for profile operations

use std::path::PathBuf;
use thiserror::Error;

use crate::identity::ValidationFailure;

/// Result type for profile operations
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur while reading or changing the profile registry
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The shared credentials file does not exist
    #[error("No AWS credentials file found at {}", path.display())]
    CredentialsMissing { path: PathBuf },

    /// Profile is not present in either registry file
    #[error("Profile '{name}' not found. Available profiles: {}", format_available(available))]
    ProfileNotFound { name: String, available: Vec<String> },

    /// Identity check against the external tool failed
    #[error("Profile validation failed: {0}")]
    Validation(ValidationFailure),

    /// Backup or write of a registry file failed
    #[error("Failed to update {}: {message}", path.display())]
    Mutation { path: PathBuf, message: String },

    /// Attempt to delete the `default` profile
    #[error("The 'default' profile cannot be deleted")]
    ProtectedProfile,

    /// Profile name cannot be represented as an INI section
    #[error("Invalid profile name: {0}")]
    InvalidName(String),

    /// Operator interrupted an interactive prompt
    #[error("Operation cancelled")]
    Cancelled,

    /// Backup artifact missing or corrupt
    #[error("Backup error: {0}")]
    Backup(#[from] crate::backup::BackupError),

    /// Home directory not found and no explicit file locations given
    #[error("Home directory not found")]
    HomeNotFound,

    /// File I/O error while reading
    #[error("I/O error for {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl ProfileError {
    /// Get the error code for CLI/JSON responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CredentialsMissing { .. } => "CREDENTIALS_MISSING",
            Self::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Mutation { .. } => "MUTATION_FAILED",
            Self::ProtectedProfile => "PROTECTED_PROFILE",
            Self::InvalidName(_) => "INVALID_NAME",
            Self::Cancelled => "CANCELLED",
            Self::Backup(_) => "BACKUP_FAILED",
            Self::HomeNotFound => "HOME_NOT_FOUND",
            Self::Io { .. } => "IO_ERROR",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn mutation(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Mutation {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<crate::prompt::PromptError> for ProfileError {
    fn from(err: crate::prompt::PromptError) -> Self {
        match err {
            crate::prompt::PromptError::Cancelled => Self::Cancelled,
            crate::prompt::PromptError::Io(e) => Self::Io {
                path: PathBuf::from("<stdin>"),
                message: e.to_string(),
            },
        }
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "(none)".to_string()
    } else {
        available.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_available() {
        let err = ProfileError::ProfileNotFound {
            name: "ghost".into(),
            available: vec!["default".into(), "work".into()],
        };
        assert_eq!(
            err.to_string(),
            "Profile 'ghost' not found. Available profiles: default, work"
        );
        assert_eq!(err.code(), "PROFILE_NOT_FOUND");
    }

    #[test]
    fn test_not_found_with_empty_registry() {
        let err = ProfileError::ProfileNotFound {
            name: "ghost".into(),
            available: vec![],
        };
        assert!(err.to_string().ends_with("(none)"));
    }
}
