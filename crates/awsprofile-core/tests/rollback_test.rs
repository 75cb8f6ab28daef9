//! Byte-for-byte rollback tests
//!
//! A mutation followed by a restore must give back the original files exactly.

use awsprofile_core::backup::{backup_path, hash_content};
use awsprofile_core::prompt::LinePrompter;
use awsprofile_core::{AwsPaths, ProfileMutator, ProfileSettings, SessionContext};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Compute SHA256 hash of file content
fn hash_file(path: &Path) -> Option<String> {
    fs::read(path).ok().map(|content| hash_content(&content))
}

fn snapshot(paths: &AwsPaths) -> (Option<String>, Option<String>) {
    (hash_file(&paths.credentials), hash_file(&paths.config))
}

/// Files with CRLF endings, comments, nested values and unrelated sections
fn create_awkward_files(dir: &Path) -> AwsPaths {
    let paths = AwsPaths::in_dir(dir);
    fs::write(
        &paths.credentials,
        "# managed by hand\r\n[default]\r\naws_access_key_id=AKIADEFAULT\r\naws_secret_access_key=secret\r\n\r\n[ci]\r\naws_access_key_id = AKIACI\r\n",
    )
    .expect("Failed to write credentials");
    fs::write(
        &paths.config,
        "[default]\r\nregion = us-east-1\r\ns3 =\r\n    max_concurrent_requests = 20\r\n\r\n[profile ci]\r\nregion = us-east-2\r\n\r\n[sso-session corp]\r\nsso_start_url = https://example.awsapps.com/start\r\n",
    )
    .expect("Failed to write config");
    paths
}

#[test]
fn test_upsert_then_restore_is_exact() {
    let temp_dir = TempDir::new().unwrap();
    let paths = create_awkward_files(temp_dir.path());
    let original = snapshot(&paths);
    let mutator = ProfileMutator::new(paths.clone());

    let settings: ProfileSettings = [("aws_access_key_id", "AKIANEW"), ("region", "eu-north-1")]
        .into_iter()
        .collect();
    mutator.upsert_profile("ci", &settings).unwrap();
    assert_ne!(snapshot(&paths), original);

    mutator.restore_backups().unwrap();
    assert_eq!(snapshot(&paths), original);
}

#[test]
fn test_remove_then_restore_is_exact() {
    let temp_dir = TempDir::new().unwrap();
    let paths = create_awkward_files(temp_dir.path());
    let original = snapshot(&paths);
    let mutator = ProfileMutator::new(paths.clone());

    mutator
        .remove_profile(
            "ci",
            &mut SessionContext::default(),
            &mut LinePrompter::new(&b"yes\n"[..], Vec::new()),
        )
        .unwrap();
    mutator.restore_backups().unwrap();

    assert_eq!(snapshot(&paths), original);
}

#[test]
fn test_written_files_keep_crlf() {
    let temp_dir = TempDir::new().unwrap();
    let paths = create_awkward_files(temp_dir.path());
    let mutator = ProfileMutator::new(paths.clone());

    mutator
        .upsert_profile("new", &[("region", "sa-east-1")].into_iter().collect())
        .unwrap();

    let config = fs::read_to_string(&paths.config).unwrap();
    assert!(config.ends_with("\r\n\r\n[profile new]\r\nregion = sa-east-1\r\n"));
    assert!(config.starts_with(
        "[default]\r\nregion = us-east-1\r\ns3 =\r\n    max_concurrent_requests = 20\r\n"
    ));

    let registry = mutator.read().unwrap();
    assert_eq!(
        registry.get("default").unwrap().get("s3"),
        Some("\nmax_concurrent_requests = 20")
    );
}

#[test]
fn test_second_mutation_replaces_backup() {
    let temp_dir = TempDir::new().unwrap();
    let paths = create_awkward_files(temp_dir.path());
    let mutator = ProfileMutator::new(paths.clone());

    mutator
        .upsert_profile("one", &[("region", "a")].into_iter().collect())
        .unwrap();
    let after_first = fs::read(&paths.config).unwrap();
    mutator
        .upsert_profile("two", &[("region", "b")].into_iter().collect())
        .unwrap();

    assert_eq!(fs::read(backup_path(&paths.config)).unwrap(), after_first);
}
