//! Profile registry reader
//!
//! Folds the credentials file and the config file into one registry keyed
//! by profile name. The credentials file uses bare section names; the config
//! file uses `profile <name>` for everything except `default`.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{ProfileError, ProfileResult};
use crate::ini::IniDocument;
use crate::settings::{AwsPaths, DEFAULT_PROFILE};

/// Keys that belong in the credentials file; everything else goes to config
pub const CREDENTIAL_KEYS: &[&str] = &[
    "aws_access_key_id",
    "aws_secret_access_key",
    "aws_session_token",
    "aws_security_token",
];

const CONFIG_PROFILE_PREFIX: &str = "profile ";

/// Whether a key is stored in the credentials file
#[must_use]
pub fn is_credential_key(key: &str) -> bool {
    CREDENTIAL_KEYS.contains(&key)
}

/// Section name used for a profile in the config file
#[must_use]
pub fn config_section_name(profile: &str) -> String {
    if profile == DEFAULT_PROFILE {
        DEFAULT_PROFILE.to_string()
    } else {
        format!("{CONFIG_PROFILE_PREFIX}{profile}")
    }
}

/// Profile named by a config file section, if the section names one
#[must_use]
pub fn profile_from_config_section(section: &str) -> Option<String> {
    if section == DEFAULT_PROFILE {
        return Some(DEFAULT_PROFILE.to_string());
    }
    let name = section.strip_prefix(CONFIG_PROFILE_PREFIX)?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Key/value settings of one profile, in file order
#[derive(Debug, Clone, Default, Eq)]
pub struct ProfileSettings {
    entries: Vec<(String, String)>,
}

impl ProfileSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a key, keeping its position if already present
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Split into (credentials file entries, config file entries)
    #[must_use]
    pub fn split_by_file(&self) -> (Vec<(String, String)>, Vec<(String, String)>) {
        self.entries
            .iter()
            .cloned()
            .partition(|(k, _)| is_credential_key(k))
    }
}

// Content equality: same keys with the same values, in any order
impl PartialEq for ProfileSettings {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProfileSettings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut settings = Self::new();
        for (k, v) in iter {
            settings.insert(k, v);
        }
        settings
    }
}

/// Which registry files a profile was found in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileOrigin {
    pub credentials: bool,
    pub config: bool,
}

/// All profiles found in the two registry files
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, ProfileSettings>,
    origins: BTreeMap<String, ProfileOrigin>,
    /// Credentials file path, recorded when that file does not exist
    missing_credentials: Option<PathBuf>,
    warnings: Vec<String>,
}

impl ProfileRegistry {
    /// Profile names, sorted ascending
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProfileSettings> {
        self.profiles.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    #[must_use]
    pub fn origin(&self, name: &str) -> Option<ProfileOrigin> {
        self.origins.get(name).copied()
    }

    /// Look up a profile, failing with the list of available names
    ///
    /// # Errors
    /// Returns `CredentialsMissing` when there is no credentials file, and
    /// `ProfileNotFound` if the profile is not in the registry
    pub fn require(&self, name: &str) -> ProfileResult<&ProfileSettings> {
        if let Some(path) = &self.missing_credentials {
            return Err(ProfileError::CredentialsMissing { path: path.clone() });
        }
        self.get(name).ok_or_else(|| ProfileError::ProfileNotFound {
            name: name.to_string(),
            available: self.names(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProfileSettings)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// True when the credentials file does not exist
    #[must_use]
    pub fn credentials_missing(&self) -> bool {
        self.missing_credentials.is_some()
    }

    /// Lines and sections skipped while parsing
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Read both registry files into a single registry
///
/// A missing credentials file yields an empty registry with
/// `credentials_missing` set. Malformed content is skipped with a warning.
///
/// # Errors
/// Returns an error only if an existing file cannot be read
pub fn read_profiles(paths: &AwsPaths) -> ProfileResult<ProfileRegistry> {
    let mut registry = ProfileRegistry::default();

    let Some(credentials) = load_lossy(&paths.credentials, &mut registry.warnings)? else {
        tracing::debug!(path = %paths.credentials.display(), "credentials file not found");
        registry.missing_credentials = Some(paths.credentials.clone());
        return Ok(registry);
    };

    let (sections, warnings) = credentials.sections();
    record_warnings(&paths.credentials, warnings, &mut registry.warnings);
    for section in sections {
        let origin = registry.origins.entry(section.name.clone()).or_default();
        origin.credentials = true;
        let settings = registry.profiles.entry(section.name).or_default();
        for (key, value) in section.entries {
            settings.insert(key, value);
        }
    }

    if let Some(config) = load_lossy(&paths.config, &mut registry.warnings)? {
        let (sections, warnings) = config.sections();
        record_warnings(&paths.config, warnings, &mut registry.warnings);
        for section in sections {
            let Some(name) = profile_from_config_section(&section.name) else {
                continue;
            };
            let origin = registry.origins.entry(name.clone()).or_default();
            origin.config = true;
            let settings = registry.profiles.entry(name).or_default();
            for (key, value) in section.entries {
                if is_credential_key(&key) && settings.get(&key).is_some() {
                    continue;
                }
                settings.insert(key, value);
            }
        }
    }

    tracing::debug!(count = registry.len(), "profiles loaded");
    Ok(registry)
}

/// Read a registry file strictly. `None` if it does not exist.
pub(crate) fn load_document(path: &Path) -> ProfileResult<Option<(IniDocument, Vec<u8>)>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ProfileError::io(path, &e)),
    };
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| ProfileError::mutation(path, format!("file is not valid UTF-8: {e}")))?;
    Ok(Some((IniDocument::parse(text), bytes)))
}

fn load_lossy(path: &Path, warnings: &mut Vec<String>) -> ProfileResult<Option<IniDocument>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ProfileError::io(path, &e)),
    };
    let text = String::from_utf8_lossy(&bytes);
    if let std::borrow::Cow::Owned(_) = text {
        let message = format!("{}: invalid UTF-8 replaced", path.display());
        tracing::warn!("{message}");
        warnings.push(message);
    }
    Ok(Some(IniDocument::parse(&text)))
}

fn record_warnings(
    path: &Path,
    found: Vec<crate::ini::ParseWarning>,
    warnings: &mut Vec<String>,
) {
    for warning in found {
        let message = format!("{}: {warning}", path.display());
        tracing::warn!("{message}");
        warnings.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_pair(dir: &TempDir, credentials: &str, config: &str) -> AwsPaths {
        let paths = AwsPaths::in_dir(dir.path());
        fs::write(&paths.credentials, credentials).unwrap();
        fs::write(&paths.config, config).unwrap();
        paths
    }

    #[test]
    fn test_config_section_names() {
        assert_eq!(config_section_name("default"), "default");
        assert_eq!(config_section_name("work"), "profile work");
        assert_eq!(profile_from_config_section("profile work"), Some("work".into()));
        assert_eq!(profile_from_config_section("default"), Some("default".into()));
        assert_eq!(profile_from_config_section("profile default"), Some("default".into()));
        assert_eq!(profile_from_config_section("sso-session corp"), None);
        assert_eq!(profile_from_config_section("profile "), None);
    }

    #[test]
    fn test_missing_credentials_file() {
        let dir = TempDir::new().unwrap();
        let registry = read_profiles(&AwsPaths::in_dir(dir.path())).unwrap();
        assert!(registry.is_empty());
        assert!(registry.credentials_missing());
        assert!(matches!(
            registry.require("default"),
            Err(ProfileError::CredentialsMissing { .. })
        ));
    }

    #[test]
    fn test_merges_both_files() {
        let dir = TempDir::new().unwrap();
        let paths = write_pair(
            &dir,
            "[work]\naws_access_key_id = AKIA2\naws_secret_access_key = s2\nregion = us-west-1\n",
            "[profile work]\nregion = us-west-2\noutput = json\naws_access_key_id = IGNORED\n[profile sso]\nsso_session = corp\n[sso-session corp]\nsso_region = us-east-1\n",
        );
        let registry = read_profiles(&paths).unwrap();

        assert_eq!(registry.names(), vec!["sso", "work"]);
        let work = registry.get("work").unwrap();
        assert_eq!(work.get("aws_access_key_id"), Some("AKIA2"));
        assert_eq!(work.get("region"), Some("us-west-2"));
        assert_eq!(work.get("output"), Some("json"));
        assert_eq!(
            registry.origin("work"),
            Some(ProfileOrigin {
                credentials: true,
                config: true
            })
        );
        assert_eq!(
            registry.origin("sso"),
            Some(ProfileOrigin {
                credentials: false,
                config: true
            })
        );
    }

    #[test]
    fn test_require_reports_available() {
        let dir = TempDir::new().unwrap();
        let paths = write_pair(&dir, "[default]\nk = v\n[work]\nk = v\n", "");
        let registry = read_profiles(&paths).unwrap();
        match registry.require("ghost") {
            Err(ProfileError::ProfileNotFound { available, .. }) => {
                assert_eq!(available, vec!["default", "work"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_corrupted_file_is_partial() {
        let dir = TempDir::new().unwrap();
        let paths = AwsPaths::in_dir(dir.path());
        fs::write(
            &paths.credentials,
            b"stray\n[ok]\nk = v\n[ok]\nk = w\n\xff\xfe[broken\n[fine]\nx = 1\n".as_slice(),
        )
        .unwrap();
        let registry = read_profiles(&paths).unwrap();
        assert_eq!(registry.names(), vec!["fine", "ok"]);
        assert_eq!(registry.get("ok").unwrap().get("k"), Some("v"));
        assert!(!registry.warnings().is_empty());
    }

    #[test]
    fn test_settings_equality_ignores_order() {
        let a: ProfileSettings = [("region", "x"), ("output", "json")].into_iter().collect();
        let b: ProfileSettings = [("output", "json"), ("region", "x")].into_iter().collect();
        let c: ProfileSettings = [("output", "json")].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_split_by_file() {
        let settings: ProfileSettings = [
            ("aws_access_key_id", "AKIA"),
            ("region", "eu-west-1"),
            ("aws_secret_access_key", "s"),
            ("output", "json"),
        ]
        .into_iter()
        .collect();
        let (creds, config) = settings.split_by_file();
        assert_eq!(creds.len(), 2);
        assert_eq!(config.len(), 2);
        assert_eq!(config[0].0, "region");
    }
}
