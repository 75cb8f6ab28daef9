//! CLI command handlers
//!
//! One module per command. Handlers print through [`crate::context::AppContext`]
//! and return `anyhow::Result` so `main` can report failures uniformly.

pub mod config;
pub mod create;
pub mod current;
pub mod delete;
pub mod interactive;
pub mod list;
pub mod restore;
pub mod shell;
pub mod switch;
pub mod validate;

use awsprofile_core::identity;

use crate::context::AppContext;
use crate::render::Check;

/// Identity check for `name`, or `None` when checks are disabled
pub(crate) fn check_profile(ctx: &AppContext, name: &str) -> Option<Check> {
    ctx.validate.then(|| identity::validate(&ctx.aws, name))
}

/// Backups and newly created files of a write
pub(crate) fn report_mutation(ctx: &AppContext, report: &awsprofile_core::MutationReport) {
    for artifact in &report.backups {
        ctx.say(format!("💾 Backup saved: {}", artifact.path.display()));
    }
    for path in &report.created {
        ctx.say(format!("📄 Created {}", path.display()));
    }
}
