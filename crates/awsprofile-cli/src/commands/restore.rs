//! Restore command
//!
//! Handles: awsprofile restore [--force]

use awsprofile_core::prompt::is_affirmative;
use awsprofile_core::ProfileError;

use crate::context::AppContext;

pub fn execute(ctx: &AppContext, force: bool) -> anyhow::Result<()> {
    if !force {
        let answer = ctx
            .prompter()
            .ask("Restore credentials and config from their backups? Type 'yes' to confirm: ")
            .map_err(ProfileError::from)?;
        if !is_affirmative(&answer) {
            ctx.say("Restore cancelled.");
            return Ok(());
        }
    }

    for path in ctx.mutator.restore_backups()? {
        ctx.say(format!("✅ Restored {}", path.display()));
    }
    Ok(())
}
