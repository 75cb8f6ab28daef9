//! Validate command
//!
//! Handles: awsprofile validate <name>

use awsprofile_core::{identity, ProfileError};

use crate::context::AppContext;
use crate::render::identity_lines;

pub fn execute(ctx: &AppContext, name: &str) -> anyhow::Result<()> {
    ctx.registry()?.require(name)?;

    ctx.say(format!("🔍 Testing profile '{name}'..."));
    let identity = identity::validate(&ctx.aws, name).map_err(ProfileError::Validation)?;

    ctx.say(format!("✅ Profile '{name}' is valid"));
    for line in identity_lines(&Ok(identity.clone()), "   ") {
        ctx.say(line);
    }
    ctx.say(format!("   ARN: {}", identity.arn));
    Ok(())
}
