//! List command
//!
//! Handles: awsprofile list [--names] [--json] [--from-cli]

use serde_json::json;

use awsprofile_core::session::current_profile;
use awsprofile_core::ProfileRegistry;

use super::check_profile;
use crate::context::AppContext;
use crate::render::{
    banner, identity_lines, origin_note, profile_entry, Check, CheckView, ProfileView, RULE_NARROW,
};

pub fn execute(
    ctx: &AppContext,
    names_only: bool,
    json_output: bool,
    from_cli: bool,
) -> anyhow::Result<()> {
    let registry = ctx.registry()?;
    let names = if from_cli {
        ctx.aws.list_profiles()?
    } else {
        registry.names()
    };

    if names_only {
        for name in &names {
            println!("{name}");
        }
        return Ok(());
    }

    if json_output {
        return print_json(ctx, &registry, &names);
    }

    if names.is_empty() {
        if !ctx.hint_if_missing(&registry) {
            ctx.say("No profiles found.");
        }
        return Ok(());
    }

    show_profiles(ctx, &registry, &names);
    Ok(())
}

/// Banner, the current profile, and the numbered list used by the menu
pub fn show_profiles(ctx: &AppContext, registry: &ProfileRegistry, names: &[String]) {
    let current = current_profile(&ctx.session, &ctx.aws);
    let checks: Vec<Option<Check>> = names.iter().map(|n| check_profile(ctx, n)).collect();

    ctx.say(banner());
    ctx.say(format!("📍 Current profile: {current}"));
    let current_check = match names.iter().position(|n| *n == current) {
        Some(idx) => checks[idx].clone(),
        None => check_profile(ctx, &current),
    };
    if let Some(check) = &current_check {
        for line in identity_lines(check, "   ") {
            ctx.say(line);
        }
    }

    ctx.say(format!("\n📋 Available profiles ({} total):", names.len()));
    ctx.say("-".repeat(RULE_NARROW));
    for (idx, (name, check)) in names.iter().zip(&checks).enumerate() {
        let lines = profile_entry(
            idx + 1,
            name,
            *name == current,
            origin_note(registry, name),
            check.as_ref(),
        );
        for line in lines {
            ctx.say(line);
        }
    }
}

fn print_json(ctx: &AppContext, registry: &ProfileRegistry, names: &[String]) -> anyhow::Result<()> {
    let current = current_profile(&ctx.session, &ctx.aws);
    let checks: Vec<Option<Check>> = names.iter().map(|n| check_profile(ctx, n)).collect();

    let profiles: Vec<ProfileView> = names
        .iter()
        .zip(&checks)
        .map(|(name, check)| {
            let origin = registry.origin(name).unwrap_or_default();
            ProfileView {
                name,
                current: *name == current,
                in_credentials: origin.credentials,
                in_config: origin.config,
                region: registry.get(name).and_then(|s| s.get("region")),
                check: check.as_ref().map(CheckView::from_check),
            }
        })
        .collect();

    let output = json!({
        "current": current,
        "credentials_file": ctx.settings.paths.credentials,
        "credentials_missing": registry.credentials_missing(),
        "profiles": profiles,
        "warnings": registry.warnings(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
