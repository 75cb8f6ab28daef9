//! Current command
//!
//! Handles: awsprofile current [--json]

use serde_json::json;

use awsprofile_core::session::resolve_current;

use super::check_profile;
use crate::context::AppContext;
use crate::render::{identity_lines, CheckView};

pub fn execute(ctx: &AppContext, json_output: bool) -> anyhow::Result<()> {
    let active = resolve_current(&ctx.session, &ctx.aws);
    let current = active.name.as_str();
    let check = check_profile(ctx, current);

    if json_output {
        let mut output = json!({
            "profile": current,
            "source": active.source,
        });
        if let Some(check) = &check {
            output["check"] = serde_json::to_value(CheckView::from_check(check))?;
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    ctx.say(format!("📍 Current profile: {current}"));
    if let Some(check) = &check {
        for line in identity_lines(check, "   ") {
            ctx.say(line);
        }
    }
    Ok(())
}
