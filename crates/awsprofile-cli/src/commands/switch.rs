//! Switch and clear commands
//!
//! Handles: awsprofile -s <name> [--persist], awsprofile clear

use awsprofile_core::session::{self, switch_ephemeral, switch_persistent};
use awsprofile_core::settings::{DEFAULT_PROFILE, PROFILE_ENV_VAR};
use awsprofile_core::{identity, ProfileError};

use super::report_mutation;
use crate::context::AppContext;
use crate::render::{identity_lines, shell_quote};

pub fn execute(ctx: &mut AppContext, name: &str, persist: bool) -> anyhow::Result<()> {
    let registry = ctx.registry()?;
    registry.require(name)?;

    let identity = if ctx.validate {
        ctx.say(format!("🔍 Testing profile '{name}'..."));
        Some(identity::validate(&ctx.aws, name).map_err(ProfileError::Validation)?)
    } else {
        None
    };

    if persist {
        let report = switch_persistent(&ctx.mutator, name)?;
        if report.is_empty() {
            ctx.say(format!("✅ '{name}' is already the default profile"));
        } else {
            ctx.say(format!("✅ Copied profile '{name}' into '{DEFAULT_PROFILE}'"));
            report_mutation(ctx, &report);
        }
        let had_override = session::clear(&mut ctx.session).is_some();
        ctx.emit_shell(&format!("unset {PROFILE_ENV_VAR}"));
        if had_override && !ctx.shell {
            ctx.say(format!(
                "💡 {PROFILE_ENV_VAR} is set in your shell and takes precedence: unset {PROFILE_ENV_VAR}"
            ));
        }
    } else {
        switch_ephemeral(&mut ctx.session, &registry, name)?;
        ctx.say(format!("✅ Successfully switched to profile '{name}'"));
        ctx.emit_shell(&format!("export {PROFILE_ENV_VAR}={}", shell_quote(name)));
    }

    if let Some(identity) = identity {
        for line in identity_lines(&Ok(identity), "   ") {
            ctx.say(line);
        }
    }

    if !ctx.shell && !persist {
        print_shell_hint(ctx, name);
    }
    Ok(())
}

pub fn execute_clear(ctx: &mut AppContext) -> anyhow::Result<()> {
    match session::clear(&mut ctx.session) {
        Some(previous) => ctx.say(format!(
            "✅ Cleared profile '{previous}'; falling back to '{DEFAULT_PROFILE}'"
        )),
        None => ctx.say(format!(
            "ℹ️  No profile override set; already using '{DEFAULT_PROFILE}'"
        )),
    }

    if ctx.shell {
        ctx.emit_shell(&format!("unset {PROFILE_ENV_VAR}"));
    } else {
        ctx.say("\n💡 To clear it in your current shell:");
        ctx.say(format!("   unset {PROFILE_ENV_VAR}"));
    }
    Ok(())
}

fn print_shell_hint(ctx: &AppContext, name: &str) {
    ctx.say("\n💡 To use this profile in your current shell:");
    ctx.say(format!("   export {PROFILE_ENV_VAR}={}", shell_quote(name)));
    ctx.say("\n💡 Or set up the 'awsp' shell function once:");
    ctx.say("   awsprofile setup-shell");
}
