//! Active profile selection

use serde::Serialize;

use crate::aws_cli::AwsCli;
use crate::error::ProfileResult;
use crate::mutate::{MutationReport, ProfileMutator};
use crate::settings::{DEFAULT_PROFILE, PROFILE_ENV_VAR};
use crate::store::ProfileRegistry;

/// In-process profile override, seeded from `AWS_PROFILE`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    override_profile: Option<String>,
}

impl SessionContext {
    #[must_use]
    pub fn new(override_profile: Option<String>) -> Self {
        Self { override_profile }
    }

    /// Seed from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Seed from an arbitrary variable lookup. An empty value counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup(PROFILE_ENV_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self::new(value)
    }

    #[must_use]
    pub fn override_profile(&self) -> Option<&str> {
        self.override_profile.as_deref()
    }

    pub fn set_override(&mut self, name: impl Into<String>) {
        self.override_profile = Some(name.into());
    }

    /// Drop the override, returning what it was
    pub fn clear(&mut self) -> Option<String> {
        self.override_profile.take()
    }
}

/// Where the active profile name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfileSource {
    #[serde(rename = "AWS_PROFILE")]
    Override,
    #[serde(rename = "aws-cli")]
    AwsCli,
    #[serde(rename = "fallback")]
    Fallback,
}

/// Resolved active profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveProfile {
    pub name: String,
    pub source: ProfileSource,
}

/// Profile the session resolves to, with its source
///
/// The override wins; otherwise the tool's own view from `configure list`;
/// otherwise `default`.
#[must_use]
pub fn resolve_current(session: &SessionContext, aws: &AwsCli) -> ActiveProfile {
    if let Some(name) = session.override_profile() {
        return ActiveProfile {
            name: name.to_string(),
            source: ProfileSource::Override,
        };
    }

    let reported = match aws.configure_list() {
        Ok(output) => parse_active_profile(&output),
        Err(e) => {
            tracing::debug!(error = %e, "could not ask the aws CLI for the active profile");
            None
        }
    };
    match reported {
        Some(name) => ActiveProfile {
            name,
            source: ProfileSource::AwsCli,
        },
        None => ActiveProfile {
            name: DEFAULT_PROFILE.to_string(),
            source: ProfileSource::Fallback,
        },
    }
}

/// Name of the profile the session resolves to
#[must_use]
pub fn current_profile(session: &SessionContext, aws: &AwsCli) -> String {
    resolve_current(session, aws).name
}

/// Profile name from `aws configure list` output
///
/// Looks for the row whose first column is `profile` and takes the value
/// column, ignoring the tool's "not set" placeholders.
#[must_use]
pub fn parse_active_profile(list_output: &str) -> Option<String> {
    list_output.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        if tokens.next()? != "profile" {
            return None;
        }
        let value = tokens.next()?;
        if value.starts_with("<not") || value == "None" {
            return None;
        }
        Some(value.to_string())
    })
}

/// Make `name` the session's profile without touching any file
///
/// # Errors
/// `ProfileNotFound` if the registry does not contain `name`
pub fn switch_ephemeral(
    session: &mut SessionContext,
    registry: &ProfileRegistry,
    name: &str,
) -> ProfileResult<()> {
    registry.require(name)?;
    session.set_override(name);
    tracing::debug!(profile = name, "session override set");
    Ok(())
}

/// Copy the merged settings of `name` into `default`
///
/// Switching to `default` itself writes nothing.
///
/// # Errors
/// `ProfileNotFound` if `name` does not exist, or a write error
pub fn switch_persistent(mutator: &ProfileMutator, name: &str) -> ProfileResult<MutationReport> {
    let registry = mutator.read()?;
    let settings = registry.require(name)?.clone();
    if name == DEFAULT_PROFILE {
        return Ok(MutationReport::default());
    }
    mutator.upsert_profile(DEFAULT_PROFILE, &settings)
}

/// Drop the session override
pub fn clear(session: &mut SessionContext) -> Option<String> {
    session.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AwsPaths;
    use std::fs;
    use tempfile::TempDir;

    const LIST_OUTPUT: &str = "      Name                    Value             Type    Location
      ----                    -----             ----    --------
   profile                     work           manual    --profile
access_key     ****************ABCD shared-credentials-file
secret_key     ****************WXYZ shared-credentials-file
    region                eu-west-1      config-file    ~/.aws/config
";

    #[test]
    fn test_from_lookup() {
        let session = SessionContext::from_lookup(|k| (k == "AWS_PROFILE").then(|| "work".into()));
        assert_eq!(session.override_profile(), Some("work"));

        let empty = SessionContext::from_lookup(|_| Some("  ".into()));
        assert_eq!(empty.override_profile(), None);
    }

    #[test]
    fn test_set_and_clear() {
        let mut session = SessionContext::default();
        session.set_override("work");
        assert_eq!(session.override_profile(), Some("work"));
        assert_eq!(clear(&mut session), Some("work".to_string()));
        assert_eq!(session.override_profile(), None);
    }

    #[test]
    fn test_parse_active_profile() {
        assert_eq!(parse_active_profile(LIST_OUTPUT), Some("work".to_string()));
    }

    #[test]
    fn test_parse_active_profile_placeholders() {
        let not_set = "   profile                <not set>             None    None\n";
        assert_eq!(parse_active_profile(not_set), None);
        assert_eq!(parse_active_profile("profile None\n"), None);
        assert_eq!(parse_active_profile("region us-east-1\n"), None);
        assert_eq!(parse_active_profile(""), None);
    }

    #[test]
    fn test_current_profile_prefers_override() {
        let session = SessionContext::new(Some("work".to_string()));
        let aws = AwsCli::new("/nonexistent/dir/aws", std::time::Duration::from_secs(1));
        assert_eq!(current_profile(&session, &aws), "work");
        assert_eq!(resolve_current(&session, &aws).source, ProfileSource::Override);
    }

    #[test]
    fn test_current_profile_without_tool() {
        let aws = AwsCli::new("/nonexistent/dir/aws", std::time::Duration::from_secs(1));
        let active = resolve_current(&SessionContext::default(), &aws);
        assert_eq!(active.name, "default");
        assert_eq!(active.source, ProfileSource::Fallback);
    }

    #[cfg(unix)]
    #[test]
    fn test_current_profile_placeholder_is_fallback() {
        use crate::aws_cli::test_support::fake_aws;

        let dir = TempDir::new().unwrap();
        let aws = AwsCli::new(
            fake_aws(dir.path(), "echo '   profile   <not set>   None   None'")
                .display()
                .to_string(),
            std::time::Duration::from_secs(5),
        );
        let active = resolve_current(&SessionContext::default(), &aws);
        assert_eq!(active.name, "default");
        assert_eq!(active.source, ProfileSource::Fallback);
    }

    #[test]
    fn test_profile_source_json() {
        assert_eq!(serde_json::to_value(ProfileSource::Override).unwrap(), "AWS_PROFILE");
        assert_eq!(serde_json::to_value(ProfileSource::AwsCli).unwrap(), "aws-cli");
        assert_eq!(serde_json::to_value(ProfileSource::Fallback).unwrap(), "fallback");
    }

    #[cfg(unix)]
    #[test]
    fn test_current_profile_from_tool() {
        use crate::aws_cli::test_support::fake_aws;

        let dir = TempDir::new().unwrap();
        let script = format!("cat <<'EOF'\n{LIST_OUTPUT}EOF");
        let aws = AwsCli::new(
            fake_aws(dir.path(), &script).display().to_string(),
            std::time::Duration::from_secs(5),
        );
        let active = resolve_current(&SessionContext::default(), &aws);
        assert_eq!(active.name, "work");
        assert_eq!(active.source, ProfileSource::AwsCli);
    }

    fn mutator() -> (TempDir, ProfileMutator) {
        let dir = TempDir::new().unwrap();
        let paths = AwsPaths::in_dir(dir.path());
        fs::write(
            &paths.credentials,
            "[default]\naws_access_key_id = AKIADEFAULT\n\n[work]\naws_access_key_id = AKIAWORK\naws_secret_access_key = secretwork\n",
        )
        .unwrap();
        fs::write(
            &paths.config,
            "[default]\nregion = us-east-1\n\n[profile work]\nregion = eu-west-1\n",
        )
        .unwrap();
        (dir, ProfileMutator::new(paths))
    }

    #[test]
    fn test_switch_ephemeral() {
        let (_dir, mutator) = mutator();
        let registry = mutator.read().unwrap();
        let mut session = SessionContext::default();

        switch_ephemeral(&mut session, &registry, "work").unwrap();
        assert_eq!(session.override_profile(), Some("work"));

        let err = switch_ephemeral(&mut session, &registry, "ghost").unwrap_err();
        assert_eq!(err.code(), "PROFILE_NOT_FOUND");
        assert_eq!(session.override_profile(), Some("work"));
    }

    #[test]
    fn test_switch_persistent_copies_into_default() {
        let (_dir, mutator) = mutator();
        switch_persistent(&mutator, "work").unwrap();

        let registry = mutator.read().unwrap();
        assert_eq!(registry.get("default"), registry.get("work"));
        assert_eq!(
            registry.get("default").unwrap().get("aws_secret_access_key"),
            Some("secretwork")
        );
    }

    #[test]
    fn test_switch_persistent_unknown() {
        let (_dir, mutator) = mutator();
        let before = fs::read(&mutator.paths().credentials).unwrap();
        assert!(switch_persistent(&mutator, "ghost").is_err());
        assert_eq!(fs::read(&mutator.paths().credentials).unwrap(), before);
    }

    #[test]
    fn test_switch_persistent_to_default_writes_nothing() {
        let (_dir, mutator) = mutator();
        let report = switch_persistent(&mutator, "default").unwrap();
        assert!(report.is_empty());
    }
}
