//! Text and JSON views of profiles and identities

use serde::Serialize;
use std::borrow::Cow;

use awsprofile_core::{FailureKind, Identity, ProfileRegistry, ValidationFailure};

pub const RULE_WIDE: usize = 60;
pub const RULE_NARROW: usize = 40;

pub type Check = Result<Identity, ValidationFailure>;

pub fn banner() -> String {
    format!(
        "\n🔧 AWS Profile Manager v{}\n{}",
        env!("CARGO_PKG_VERSION"),
        "=".repeat(RULE_WIDE)
    )
}

fn failure_icon(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Invalid => "❌",
        FailureKind::Timeout => "⏱️ ",
        FailureKind::MalformedResponse | FailureKind::ToolMissing | FailureKind::Unknown => "⚠️ ",
    }
}

/// `Account:` / `User:` lines for a successful check, `Account:` / `Status:`
/// for a failed one
pub fn identity_lines(check: &Check, indent: &str) -> Vec<String> {
    match check {
        Ok(identity) => vec![
            format!("{indent}Account: {}", identity.account_id),
            format!("{indent}User: {}", identity.username()),
        ],
        Err(failure) => vec![
            format!("{indent}Account: {}", failure.kind),
            format!(
                "{indent}Status: {} {}",
                failure_icon(failure.kind),
                failure.detail
            ),
        ],
    }
}

/// One numbered entry of the profile list
pub fn profile_entry(
    index: usize,
    name: &str,
    is_current: bool,
    note: Option<&str>,
    check: Option<&Check>,
) -> Vec<String> {
    let marker = if is_current { "✅" } else { "  " };
    let heading = match note {
        Some(note) => format!("{marker} {index:2}. {name} ({note})"),
        None => format!("{marker} {index:2}. {name}"),
    };
    let mut lines = vec![heading];
    if let Some(check) = check {
        lines.extend(identity_lines(check, "       "));
    }
    lines
}

/// Annotation for profiles that live in only one of the two files
pub fn origin_note(registry: &ProfileRegistry, name: &str) -> Option<&'static str> {
    let origin = registry.origin(name)?;
    match (origin.credentials, origin.config) {
        (false, true) => Some("config only"),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileView<'a> {
    pub name: &'a str,
    pub current: bool,
    pub in_credentials: bool,
    pub in_config: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<&'a str>,
    #[serde(flatten)]
    pub check: Option<CheckView<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckView<'a> {
    Valid { identity: &'a Identity },
    Failed { error: &'a ValidationFailure },
}

impl<'a> CheckView<'a> {
    pub fn from_check(check: &'a Check) -> Self {
        match check {
            Ok(identity) => Self::Valid { identity },
            Err(error) => Self::Failed { error },
        }
    }
}

/// Quote a value for POSIX shells when it is not a plain word
pub fn shell_quote(value: &str) -> Cow<'_, str> {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '/' | '+'));
    if plain {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            account_id: "123456789012".to_string(),
            arn: "arn:aws:iam::123456789012:user/testuser".to_string(),
            user_id: None,
        }
    }

    #[test]
    fn test_identity_lines_success() {
        let lines = identity_lines(&Ok(identity()), "   ");
        assert_eq!(lines, vec!["   Account: 123456789012", "   User: testuser"]);
    }

    #[test]
    fn test_identity_lines_failure() {
        let failure = ValidationFailure::new(FailureKind::Timeout, "AWS call timed out (>10s)");
        let lines = identity_lines(&Err(failure), "");
        assert_eq!(lines[0], "Account: Timeout");
        assert!(lines[1].contains("AWS call timed out (>10s)"));
    }

    #[test]
    fn test_profile_entry_marks_current() {
        let lines = profile_entry(2, "work", true, Some("config only"), None);
        assert_eq!(lines, vec!["✅  2. work (config only)"]);
        let lines = profile_entry(10, "dev", false, None, None);
        assert_eq!(lines, vec!["   10. dev"]);
    }

    #[test]
    fn test_check_view_json() {
        let check: Check = Ok(identity());
        let value = serde_json::to_value(CheckView::from_check(&check)).unwrap();
        assert_eq!(value["status"], "valid");
        assert_eq!(value["identity"]["account_id"], "123456789012");

        let check: Check = Err(ValidationFailure::new(FailureKind::Invalid, "bad"));
        let value = serde_json::to_value(CheckView::from_check(&check)).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"]["kind"], "invalid");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("work"), "work");
        assert_eq!(shell_quote("team-a.prod_1"), "team-a.prod_1");
        assert_eq!(shell_quote("Prod Account"), "'Prod Account'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$(rm)"), "'$(rm)'");
    }
}
