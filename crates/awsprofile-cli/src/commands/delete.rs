//! Delete command
//!
//! Handles: awsprofile delete <name>

use awsprofile_core::settings::{DEFAULT_PROFILE, PROFILE_ENV_VAR};
use awsprofile_core::{Prompter, Removal};

use super::report_mutation;
use crate::context::AppContext;

pub fn execute(ctx: &mut AppContext, name: &str) -> anyhow::Result<()> {
    let mut prompter = ctx.prompter();
    let had_override = ctx.session.override_profile().is_some();
    run(ctx, name, prompter.as_mut())?;
    if had_override && ctx.session.override_profile().is_none() {
        ctx.emit_shell(&format!("unset {PROFILE_ENV_VAR}"));
    }
    Ok(())
}

/// Confirm and delete. Shell output is left to the caller, which knows
/// when the session ends.
pub fn run(ctx: &mut AppContext, name: &str, prompter: &mut dyn Prompter) -> anyhow::Result<()> {
    let was_current = ctx.session.override_profile() == Some(name);

    match ctx.mutator.remove_profile(name, &mut ctx.session, prompter)? {
        Removal::Aborted => {
            ctx.say("Deletion cancelled.");
        }
        Removal::Removed(report) => {
            ctx.say(format!("✅ Profile '{name}' deleted"));
            report_mutation(ctx, &report);
            if was_current {
                ctx.say(format!(
                    "💡 '{name}' was the active profile; now using '{DEFAULT_PROFILE}'"
                ));
            }
        }
    }
    Ok(())
}
