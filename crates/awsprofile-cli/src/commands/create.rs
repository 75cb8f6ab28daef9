//! Create command
//!
//! Handles: awsprofile create <name> [--access-key-id] [--region] [--output] [--force]
//!
//! All input is gathered and the keys are checked before any file is
//! touched, so an interrupted prompt leaves both files as they were.

use anyhow::bail;

use awsprofile_core::util::validate_name;
use awsprofile_core::{identity, ProfileError, ProfileSettings, Prompter};

use super::report_mutation;
use crate::context::AppContext;
use crate::render::identity_lines;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_OUTPUT: &str = "json";

pub struct CreateArgs {
    pub name: String,
    pub access_key_id: Option<String>,
    pub region: Option<String>,
    pub output: Option<String>,
    pub force: bool,
}

impl CreateArgs {
    /// Everything prompted, as from the interactive menu
    pub fn prompted(name: String) -> Self {
        Self {
            name,
            access_key_id: None,
            region: None,
            output: None,
            force: false,
        }
    }
}

pub fn execute(ctx: &AppContext, args: &CreateArgs) -> anyhow::Result<()> {
    let mut prompter = ctx.prompter();
    run(ctx, args, prompter.as_mut())
}

pub fn run(ctx: &AppContext, args: &CreateArgs, prompter: &mut dyn Prompter) -> anyhow::Result<()> {
    let name = args.name.as_str();
    validate_name(name)?;

    if !args.force && ctx.registry()?.contains(name) {
        let answer = prompter
            .ask(&format!("Profile '{name}' already exists. Overwrite? (y/n): "))
            .map_err(ProfileError::from)?;
        if !matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes") {
            ctx.say("Profile creation cancelled.");
            return Ok(());
        }
    }

    ctx.say(format!("\n🆕 Creating profile '{name}'"));

    let access_key_id = match &args.access_key_id {
        Some(key) => key.trim().to_string(),
        None => prompter
            .ask("AWS Access Key ID: ")
            .map_err(ProfileError::from)?,
    };
    if access_key_id.is_empty() {
        bail!("Access Key ID cannot be empty");
    }

    let secret_access_key = prompter
        .ask_secret("AWS Secret Access Key: ")
        .map_err(ProfileError::from)?;
    if secret_access_key.is_empty() {
        bail!("Secret Access Key cannot be empty");
    }

    let region = match &args.region {
        Some(region) => region.trim().to_string(),
        None => prompter
            .ask_with_default("Default region", DEFAULT_REGION)
            .map_err(ProfileError::from)?,
    };
    let output = match &args.output {
        Some(output) => output.trim().to_string(),
        None => prompter
            .ask_with_default("Default output format", DEFAULT_OUTPUT)
            .map_err(ProfileError::from)?,
    };

    let checked = if ctx.validate {
        ctx.say("🔍 Validating credentials...");
        let region = (!region.is_empty()).then_some(region.as_str());
        Some(
            identity::validate_keys(&ctx.aws, &access_key_id, &secret_access_key, region)
                .map_err(ProfileError::Validation)?,
        )
    } else {
        None
    };

    let mut settings = ProfileSettings::new();
    settings.insert("aws_access_key_id", access_key_id);
    settings.insert("aws_secret_access_key", secret_access_key);
    if !region.is_empty() {
        settings.insert("region", region);
    }
    if !output.is_empty() {
        settings.insert("output", output);
    }

    let report = ctx.mutator.upsert_profile(name, &settings)?;

    ctx.say(format!("✅ Profile '{name}' saved"));
    if let Some(identity) = checked {
        for line in identity_lines(&Ok(identity), "   ") {
            ctx.say(line);
        }
    }
    report_mutation(ctx, &report);
    Ok(())
}
