//! Runtime settings
//!
//! Everything is taken from the environment: the registry file locations
//! follow the AWS CLI's own overrides, the rest is tool-specific.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ProfileError, ProfileResult};

/// Environment variable holding the per-process profile override
pub const PROFILE_ENV_VAR: &str = "AWS_PROFILE";

/// Name of the distinguished profile
pub const DEFAULT_PROFILE: &str = "default";

/// Bound on a single external tool invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overrides the credentials file location (AWS CLI convention)
pub const CREDENTIALS_FILE_ENV: &str = "AWS_SHARED_CREDENTIALS_FILE";

/// Overrides the config file location (AWS CLI convention)
pub const CONFIG_FILE_ENV: &str = "AWS_CONFIG_FILE";

/// Overrides the external `aws` executable
pub const AWS_BIN_ENV: &str = "AWSPROFILE_AWS_BIN";

/// Overrides the external tool timeout, in whole seconds
pub const TIMEOUT_ENV: &str = "AWSPROFILE_TIMEOUT_SECS";

/// Locations of the two registry files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsPaths {
    /// Shared credentials file (`~/.aws/credentials`)
    pub credentials: PathBuf,
    /// Config file (`~/.aws/config`)
    pub config: PathBuf,
}

impl AwsPaths {
    /// Both files inside a single directory
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            credentials: dir.join("credentials"),
            config: dir.join("config"),
        }
    }

    /// Conventional locations under a home directory
    #[must_use]
    pub fn under_home(home: &Path) -> Self {
        Self::in_dir(&home.join(".aws"))
    }
}

/// Settings for one invocation of the tool
#[derive(Debug, Clone)]
pub struct Settings {
    pub paths: AwsPaths,
    /// External identity-check executable
    pub aws_binary: String,
    /// Bound on each external invocation
    pub timeout: Duration,
}

impl Settings {
    /// Load settings from the process environment
    ///
    /// # Errors
    /// Returns an error if no home directory can be found and the file
    /// locations are not overridden
    pub fn from_env() -> ProfileResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Load settings from an arbitrary variable lookup
    ///
    /// # Errors
    /// Returns an error if a registry file location cannot be determined
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> ProfileResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_paths = home.as_deref().map(AwsPaths::under_home);
        let credentials = match non_empty(CREDENTIALS_FILE_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_paths
                .as_ref()
                .map(|p| p.credentials.clone())
                .ok_or(ProfileError::HomeNotFound)?,
        };
        let config = match non_empty(CONFIG_FILE_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_paths
                .as_ref()
                .map(|p| p.config.clone())
                .ok_or(ProfileError::HomeNotFound)?,
        };

        let aws_binary = non_empty(AWS_BIN_ENV).unwrap_or_else(|| "aws".to_string());

        let timeout = match non_empty(TIMEOUT_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!("Ignoring invalid {TIMEOUT_ENV}={raw:?}");
                    DEFAULT_TIMEOUT
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            paths: AwsPaths {
                credentials,
                config,
            },
            aws_binary,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_under_home() {
        let settings = Settings::from_lookup(lookup(&[]), Some(PathBuf::from("/home/me"))).unwrap();
        assert_eq!(
            settings.paths.credentials,
            PathBuf::from("/home/me/.aws/credentials")
        );
        assert_eq!(settings.paths.config, PathBuf::from("/home/me/.aws/config"));
        assert_eq!(settings.aws_binary, "aws");
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_file_overrides() {
        let settings = Settings::from_lookup(
            lookup(&[
                (CREDENTIALS_FILE_ENV, "/tmp/creds"),
                (CONFIG_FILE_ENV, "/tmp/conf"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(settings.paths.credentials, PathBuf::from("/tmp/creds"));
        assert_eq!(settings.paths.config, PathBuf::from("/tmp/conf"));
    }

    #[test]
    fn test_missing_home_without_overrides() {
        let result = Settings::from_lookup(lookup(&[]), None);
        assert!(matches!(result, Err(ProfileError::HomeNotFound)));
    }

    #[test]
    fn test_tool_overrides() {
        let settings = Settings::from_lookup(
            lookup(&[(AWS_BIN_ENV, "/opt/aws/bin/aws"), (TIMEOUT_ENV, "3")]),
            Some(PathBuf::from("/home/me")),
        )
        .unwrap();
        assert_eq!(settings.aws_binary, "/opt/aws/bin/aws");
        assert_eq!(settings.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let settings = Settings::from_lookup(
            lookup(&[(TIMEOUT_ENV, "soon")]),
            Some(PathBuf::from("/home/me")),
        )
        .unwrap();
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
    }
}
