//! Writes to the registry files
//!
//! Every write re-reads the file, backs it up, edits the one section
//! concerned and replaces the file atomically. The two files are handled
//! one after the other with no transaction across them.

use std::path::{Path, PathBuf};

use crate::backup::{self, BackupArtifact, BackupError};
use crate::error::{ProfileError, ProfileResult};
use crate::ini::IniDocument;
use crate::prompt::{is_affirmative, Prompter};
use crate::session::SessionContext;
use crate::settings::{AwsPaths, DEFAULT_PROFILE};
use crate::store::{self, config_section_name, read_profiles, ProfileRegistry, ProfileSettings};
use crate::util::{validate_name, write_atomic};

/// Files touched by a mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    /// Files rewritten, in write order
    pub written: Vec<PathBuf>,
    /// Subset of `written` that did not exist before
    pub created: Vec<PathBuf>,
    pub backups: Vec<BackupArtifact>,
}

impl MutationReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

/// Outcome of a confirmed removal request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed(MutationReport),
    /// The operator did not confirm; nothing was changed
    Aborted,
}

/// Editor for the credentials and config files at `paths`
#[derive(Debug, Clone)]
pub struct ProfileMutator {
    paths: AwsPaths,
}

impl ProfileMutator {
    #[must_use]
    pub fn new(paths: AwsPaths) -> Self {
        Self { paths }
    }

    #[must_use]
    pub fn paths(&self) -> &AwsPaths {
        &self.paths
    }

    /// Fresh read of both files
    ///
    /// # Errors
    /// See [`store::read_profiles`]
    pub fn read(&self) -> ProfileResult<ProfileRegistry> {
        read_profiles(&self.paths)
    }

    /// Create or overwrite `name` with exactly `settings`
    ///
    /// Credential keys go to the credentials file, everything else to the
    /// config file. Files and their directory are created when absent.
    ///
    /// # Errors
    /// Returns an error for an invalid name, or if a file cannot be read,
    /// backed up or written
    pub fn upsert_profile(
        &self,
        name: &str,
        settings: &ProfileSettings,
    ) -> ProfileResult<MutationReport> {
        validate_name(name)?;
        let (credentials, config) = settings.split_by_file();
        let mut report = MutationReport::default();

        // A file gets no empty section it did not already have
        self.rewrite(&self.paths.credentials, &mut report, |doc| {
            if credentials.is_empty() && !doc.has_section(name) {
                return false;
            }
            doc.upsert_section(name, &credentials);
            true
        })?;

        let section = config_section_name(name);
        self.rewrite(&self.paths.config, &mut report, |doc| {
            let folded = name == DEFAULT_PROFILE && doc.remove_section("profile default");
            if config.is_empty() && !folded && !doc.has_section(&section) {
                return false;
            }
            doc.upsert_section(&section, &config);
            true
        })?;

        tracing::info!(profile = name, files = report.written.len(), "profile saved");
        Ok(report)
    }

    /// Delete `name` from both files after the operator types `yes`
    ///
    /// Clears the session override when it named the removed profile.
    ///
    /// # Errors
    /// `ProtectedProfile` for `default`, `ProfileNotFound` for an unknown
    /// name, `Cancelled` when the prompt is interrupted, or a write error
    pub fn remove_profile(
        &self,
        name: &str,
        session: &mut SessionContext,
        prompter: &mut dyn Prompter,
    ) -> ProfileResult<Removal> {
        if name == DEFAULT_PROFILE {
            return Err(ProfileError::ProtectedProfile);
        }
        self.read()?.require(name)?;

        let answer = prompter.ask(&format!(
            "Are you sure you want to delete profile '{name}'? Type 'yes' to confirm: "
        ))?;
        if !is_affirmative(&answer) {
            tracing::debug!(profile = name, "removal not confirmed");
            return Ok(Removal::Aborted);
        }

        let mut report = MutationReport::default();
        self.rewrite(&self.paths.credentials, &mut report, |doc| {
            doc.remove_section(name)
        })?;
        let section = config_section_name(name);
        self.rewrite(&self.paths.config, &mut report, |doc| {
            doc.remove_section(&section)
        })?;

        if session.override_profile() == Some(name) {
            session.clear();
        }

        tracing::info!(profile = name, "profile removed");
        Ok(Removal::Removed(report))
    }

    /// Copy both backups back over their files
    ///
    /// Each backup is checked after the copy. A file without a backup is
    /// left alone; having no backup at all is an error.
    ///
    /// # Errors
    /// `Backup` if neither file has a backup or a restore fails
    pub fn restore_backups(&self) -> ProfileResult<Vec<PathBuf>> {
        let mut restored = Vec::new();
        for path in [&self.paths.credentials, &self.paths.config] {
            if !backup::backup_path(path).exists() {
                tracing::debug!(file = %path.display(), "no backup to restore");
                continue;
            }
            backup::restore_backup(path)?;
            restored.push(path.clone());
        }

        if restored.is_empty() {
            return Err(BackupError::NotFound {
                path: backup::backup_path(&self.paths.credentials),
            }
            .into());
        }
        Ok(restored)
    }

    /// Re-read `path`, back it up if it exists, apply `edit`, and write it
    /// back when `edit` reports a change
    fn rewrite<F>(&self, path: &Path, report: &mut MutationReport, edit: F) -> ProfileResult<()>
    where
        F: FnOnce(&mut IniDocument) -> bool,
    {
        let (mut doc, existed) = match store::load_document(path)? {
            Some((doc, bytes)) => {
                let artifact = backup::create_backup(path, &bytes)
                    .map_err(|e| ProfileError::mutation(path, format!("backup failed: {e}")))?;
                report.backups.push(artifact);
                (doc, true)
            }
            None => (IniDocument::default(), false),
        };

        if !edit(&mut doc) {
            return Ok(());
        }

        write_atomic(path, doc.render().as_bytes(), path)
            .map_err(|e| ProfileError::mutation(path, e))?;
        tracing::debug!(file = %path.display(), created = !existed, "registry file written");

        report.written.push(path.to_path_buf());
        if !existed {
            report.created.push(path.to_path_buf());
        }
        Ok(())
    }
}
