//! Identity validation through `aws sts get-caller-identity`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::aws_cli::{AwsCli, AwsCliError, CommandOutput};

/// Account and principal a profile resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub account_id: String,
    /// Principal ARN
    pub arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Identity {
    /// Short principal name, see [`extract_username`]
    #[must_use]
    pub fn username(&self) -> &str {
        extract_username(&self.arn)
    }
}

/// Why an identity check did not produce an [`Identity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Tool ran and exited non-zero (bad or expired credentials)
    Invalid,
    /// Tool did not finish within the bound
    Timeout,
    /// Exit zero but output was not the expected JSON object
    MalformedResponse,
    /// Executable not found
    ToolMissing,
    /// Anything else
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "Invalid"),
            Self::Timeout => write!(f, "Timeout"),
            Self::MalformedResponse => write!(f, "Malformed response"),
            Self::ToolMissing => write!(f, "Tool missing"),
            Self::Unknown => write!(f, "Error"),
        }
    }
}

/// Failed identity check with a human-readable detail
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{detail}")]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl ValidationFailure {
    #[must_use]
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallerIdentity {
    #[serde(rename = "Account")]
    account: String,
    #[serde(rename = "Arn")]
    arn: String,
    #[serde(rename = "UserId", default)]
    user_id: Option<String>,
}

/// Text after the last `/` of an ARN, else after the last `:`, else the input
#[must_use]
pub fn extract_username(arn: &str) -> &str {
    if let Some((_, tail)) = arn.rsplit_once('/') {
        tail
    } else if let Some((_, tail)) = arn.rsplit_once(':') {
        tail
    } else {
        arn
    }
}

/// Check a configured profile
///
/// # Errors
/// Returns a [`ValidationFailure`] classifying why no identity was obtained
pub fn validate(aws: &AwsCli, profile: &str) -> Result<Identity, ValidationFailure> {
    let result = aws.run(&[
        "sts",
        "get-caller-identity",
        "--profile",
        profile,
        "--output",
        "json",
    ]);
    classify(aws, result)
}

/// Credential variables from the operator's shell that would be mixed
/// into an explicitly supplied key pair
const SHELL_CREDENTIAL_VARS: &[&str] = &[
    "AWS_SESSION_TOKEN",
    "AWS_SECURITY_TOKEN",
    "AWS_DEFAULT_PROFILE",
    "AWS_CREDENTIAL_EXPIRATION",
];

/// Check a key pair that is not written to any file yet
///
/// # Errors
/// Returns a [`ValidationFailure`] classifying why no identity was obtained
pub fn validate_keys(
    aws: &AwsCli,
    access_key_id: &str,
    secret_access_key: &str,
    region: Option<&str>,
) -> Result<Identity, ValidationFailure> {
    let mut env = vec![
        ("AWS_ACCESS_KEY_ID", access_key_id),
        ("AWS_SECRET_ACCESS_KEY", secret_access_key),
    ];
    if let Some(region) = region {
        env.push(("AWS_REGION", region));
    }
    let result = aws.run_with_env(
        &["sts", "get-caller-identity", "--output", "json"],
        &env,
        SHELL_CREDENTIAL_VARS,
    );
    classify(aws, result)
}

/// Decode `get-caller-identity` JSON output
///
/// # Errors
/// Returns `MalformedResponse` if the output is not an object carrying
/// `Account` and `Arn` strings
pub fn parse_identity(stdout: &str) -> Result<Identity, ValidationFailure> {
    let raw: CallerIdentity = serde_json::from_str(stdout).map_err(|e| {
        ValidationFailure::new(
            FailureKind::MalformedResponse,
            format!("Invalid JSON response from AWS: {e}"),
        )
    })?;
    Ok(Identity {
        account_id: raw.account,
        arn: raw.arn,
        user_id: raw.user_id,
    })
}

fn classify(
    aws: &AwsCli,
    result: Result<CommandOutput, AwsCliError>,
) -> Result<Identity, ValidationFailure> {
    match result {
        Ok(output) if output.success => parse_identity(&output.stdout),
        Ok(output) => {
            let stderr = output.stderr.trim();
            let detail = if stderr.is_empty() {
                "Unknown error"
            } else {
                stderr
            };
            Err(ValidationFailure::new(FailureKind::Invalid, detail))
        }
        Err(AwsCliError::Timeout { timeout }) => Err(ValidationFailure::new(
            FailureKind::Timeout,
            format!("AWS call timed out (>{timeout:?})"),
        )),
        Err(AwsCliError::NotFound { .. }) => Err(ValidationFailure::new(
            FailureKind::ToolMissing,
            format!("AWS CLI not found ({}) - please install it", aws.binary()),
        )),
        Err(other) => Err(ValidationFailure::new(FailureKind::Unknown, other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_username() {
        assert_eq!(
            extract_username("arn:aws:iam::123456789012:user/testuser"),
            "testuser"
        );
        assert_eq!(
            extract_username("arn:aws:sts::123456789012:assumed-role/role-name/session-name"),
            "session-name"
        );
        assert_eq!(extract_username("arn:aws:iam::123456789012:root"), "root");
        assert_eq!(extract_username("simple"), "simple");
    }

    #[test]
    fn test_parse_identity() {
        let identity = parse_identity(
            r#"{"UserId": "AIDAEXAMPLE", "Account": "123456789012", "Arn": "arn:aws:iam::123456789012:user/testuser"}"#,
        )
        .unwrap();
        assert_eq!(identity.account_id, "123456789012");
        assert_eq!(identity.username(), "testuser");
        assert_eq!(identity.user_id.as_deref(), Some("AIDAEXAMPLE"));
    }

    #[test]
    fn test_parse_identity_shape_mismatch() {
        for input in ["not json", "[]", r#"{"Account": "1"}"#, r#"{"Account": 1, "Arn": "x"}"#] {
            let err = parse_identity(input).unwrap_err();
            assert_eq!(err.kind, FailureKind::MalformedResponse, "input: {input}");
        }
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::super::*;
        use crate::aws_cli::test_support::fake_aws;
        use std::time::Duration;
        use tempfile::TempDir;

        fn aws(body: &str, timeout: Duration) -> (TempDir, AwsCli) {
            let dir = TempDir::new().unwrap();
            let bin = fake_aws(dir.path(), body);
            (dir, AwsCli::new(bin.display().to_string(), timeout))
        }

        #[test]
        fn test_success() {
            let (_dir, aws) = aws(
                r#"echo '{"Account": "123456789012", "Arn": "arn:aws:iam::123456789012:user/testuser"}'"#,
                Duration::from_secs(5),
            );
            let identity = validate(&aws, "work").unwrap();
            assert_eq!(identity.account_id, "123456789012");
            assert_eq!(identity.username(), "testuser");
        }

        #[test]
        fn test_passes_profile_argument() {
            let (_dir, aws) = aws(
                r#"[ "$4" = "work" ] || exit 9; echo '{"Account": "1", "Arn": "a"}'"#,
                Duration::from_secs(5),
            );
            assert!(validate(&aws, "work").is_ok());
            assert_eq!(validate(&aws, "other").unwrap_err().kind, FailureKind::Invalid);
        }

        #[test]
        fn test_invalid_credentials() {
            let (_dir, aws) = aws(
                "echo 'The security token included in the request is invalid.' >&2; exit 254",
                Duration::from_secs(5),
            );
            let err = validate(&aws, "bad").unwrap_err();
            assert_eq!(err.kind, FailureKind::Invalid);
            assert!(err.detail.contains("security token"));
        }

        #[test]
        fn test_invalid_without_stderr() {
            let (_dir, aws) = aws("exit 1", Duration::from_secs(5));
            let err = validate(&aws, "bad").unwrap_err();
            assert_eq!(err.detail, "Unknown error");
        }

        #[test]
        fn test_timeout_is_distinct() {
            let (_dir, aws) = aws("exec sleep 5", Duration::from_millis(200));
            let err = validate(&aws, "slow").unwrap_err();
            assert_eq!(err.kind, FailureKind::Timeout);
            assert!(err.detail.contains("timed out"));
        }

        #[test]
        fn test_malformed_response() {
            let (_dir, aws) = aws("echo 'Account: 1'", Duration::from_secs(5));
            let err = validate(&aws, "odd").unwrap_err();
            assert_eq!(err.kind, FailureKind::MalformedResponse);
        }

        #[test]
        fn test_tool_missing() {
            let aws = AwsCli::new("/nonexistent/dir/aws", Duration::from_secs(1));
            let err = validate(&aws, "any").unwrap_err();
            assert_eq!(err.kind, FailureKind::ToolMissing);
            assert!(err.detail.contains("not found"));
        }

        #[test]
        fn test_validate_keys_uses_environment() {
            let (_dir, aws) = aws(
                r#"[ "$AWS_ACCESS_KEY_ID" = "AKIANEW" ] && [ "$AWS_REGION" = "eu-west-1" ] || exit 1
echo '{"Account": "42", "Arn": "arn:aws:iam::42:user/new"}'"#,
                Duration::from_secs(5),
            );
            let identity = validate_keys(&aws, "AKIANEW", "secret", Some("eu-west-1")).unwrap();
            assert_eq!(identity.username(), "new");
            assert!(validate_keys(&aws, "AKIAOTHER", "secret", Some("eu-west-1")).is_err());
        }
    }
}
