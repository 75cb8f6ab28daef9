//! Config command
//!
//! Handles: awsprofile config <profile> <key> [value]

use anyhow::bail;

use crate::context::AppContext;

pub fn execute(ctx: &AppContext, profile: &str, key: &str, value: Option<&str>) -> anyhow::Result<()> {
    match value {
        None => match ctx.aws.configure_get(profile, key)? {
            Some(current) => {
                println!("{current}");
                Ok(())
            }
            None => bail!("'{key}' is not set for profile '{profile}'"),
        },
        Some(value) => {
            ctx.aws.configure_set(profile, key, value)?;
            ctx.say(format!("✅ Set {key} = {value} for profile '{profile}'"));
            Ok(())
        }
    }
}
