//! Interactive menu
//!
//! Handles: awsprofile (no arguments)
//!
//! A failed operation or bad input is reported and the menu shown again;
//! only `q`, a "no" to continuing, or closed input ends the loop.

use awsprofile_core::session::switch_ephemeral;
use awsprofile_core::settings::PROFILE_ENV_VAR;
use awsprofile_core::{identity, PromptError, Prompter};

use super::{create, delete, list};
use crate::context::AppContext;
use crate::render::{identity_lines, shell_quote};

enum Choice {
    Switch(usize),
    Create,
    Delete,
    Refresh,
    Quit,
}

fn parse_choice(input: &str, count: usize) -> Result<Choice, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "q" | "quit" => Ok(Choice::Quit),
        "r" => Ok(Choice::Refresh),
        "c" => Ok(Choice::Create),
        "d" => Ok(Choice::Delete),
        other => match other.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => Ok(Choice::Switch(n - 1)),
            Ok(_) => Err(format!("❌ Please enter a number between 1 and {count}")),
            Err(_) => Err(
                "❌ Please enter a valid number, 'c' to create, 'd' to delete, 'r' to refresh, or 'q' to quit"
                    .to_string(),
            ),
        },
    }
}

pub fn execute(ctx: &mut AppContext) -> anyhow::Result<()> {
    let mut prompter = ctx.prompter();
    let initial = ctx.session.override_profile().map(String::from);

    run(ctx, prompter.as_mut())?;

    let selected = ctx.session.override_profile().map(String::from);
    if selected != initial {
        match &selected {
            Some(name) => ctx.emit_shell(&format!("export {PROFILE_ENV_VAR}={}", shell_quote(name))),
            None => ctx.emit_shell(&format!("unset {PROFILE_ENV_VAR}")),
        }
        if let (Some(name), false) = (&selected, ctx.shell) {
            ctx.say(format!("\n💡 To keep '{name}' in your current shell:"));
            ctx.say(format!("   export {PROFILE_ENV_VAR}={}", shell_quote(name)));
        }
    }
    Ok(())
}

fn run(ctx: &mut AppContext, prompter: &mut dyn Prompter) -> anyhow::Result<()> {
    loop {
        let registry = ctx.registry()?;
        let names = registry.names();
        if names.is_empty() {
            if !ctx.hint_if_missing(&registry) {
                ctx.say("No profiles found.");
            }
            return Ok(());
        }

        list::show_profiles(ctx, &registry, &names);
        ctx.say("\n🔄 Options:");
        ctx.say(format!("   1-{}: Switch to profile", names.len()));
        ctx.say("   c: Create a new profile");
        ctx.say("   d: Delete a profile");
        ctx.say("   r: Refresh profile list");
        ctx.say("   q: Quit");

        let input = match prompter.ask("\nSelect option: ") {
            Ok(input) => input,
            Err(PromptError::Cancelled) => {
                ctx.say("\n👋 Goodbye!");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let choice = match parse_choice(&input, names.len()) {
            Ok(choice) => choice,
            Err(message) => {
                ctx.say(message);
                continue;
            }
        };

        match choice {
            Choice::Quit => {
                ctx.say("👋 Goodbye!");
                return Ok(());
            }
            Choice::Refresh => ctx.say("🔄 Refreshing..."),
            Choice::Switch(idx) => {
                if switch(ctx, &registry, &names[idx]) && !keep_going(ctx, prompter) {
                    return Ok(());
                }
            }
            Choice::Create => {
                if let Some(name) = ask_name(ctx, prompter, "New profile name: ") {
                    let result = create::run(ctx, &create::CreateArgs::prompted(name), prompter);
                    report(ctx, result);
                }
            }
            Choice::Delete => {
                if let Some(name) = ask_name(ctx, prompter, "Profile to delete (name or number): ") {
                    let name = resolve_name(&name, &names);
                    let result = delete::run(ctx, &name, prompter);
                    report(ctx, result);
                }
            }
        }
    }
}

/// Validate if enabled, then set the session override. Returns success.
fn switch(ctx: &mut AppContext, registry: &awsprofile_core::ProfileRegistry, name: &str) -> bool {
    let checked = if ctx.validate {
        ctx.say(format!("🔍 Testing profile '{name}'..."));
        match identity::validate(&ctx.aws, name) {
            Ok(identity) => Some(identity),
            Err(failure) => {
                ctx.say(format!("❌ Profile '{name}' validation failed:"));
                ctx.say(format!("   {failure}"));
                return false;
            }
        }
    } else {
        None
    };

    if let Err(e) = switch_ephemeral(&mut ctx.session, registry, name) {
        ctx.say(format!("❌ {e}"));
        return false;
    }

    ctx.say(format!("✅ Successfully switched to profile '{name}'"));
    if let Some(identity) = checked {
        for line in identity_lines(&Ok(identity), "   ") {
            ctx.say(line);
        }
    }
    true
}

fn keep_going(ctx: &AppContext, prompter: &mut dyn Prompter) -> bool {
    match prompter.ask("\nContinue managing profiles? (y/n): ") {
        Ok(answer) => !matches!(answer.to_ascii_lowercase().as_str(), "n" | "no"),
        Err(_) => {
            ctx.say("\n👋 Goodbye!");
            false
        }
    }
}

fn ask_name(ctx: &AppContext, prompter: &mut dyn Prompter, prompt: &str) -> Option<String> {
    match prompter.ask(prompt) {
        Ok(name) if !name.is_empty() => Some(name),
        Ok(_) => {
            ctx.say("❌ Profile name cannot be empty");
            None
        }
        Err(_) => None,
    }
}

/// A menu number refers to the listed profile; anything else is a name
fn resolve_name(input: &str, names: &[String]) -> String {
    match input.parse::<usize>() {
        Ok(n) if (1..=names.len()).contains(&n) => names[n - 1].clone(),
        _ => input.to_string(),
    }
}

fn report(ctx: &AppContext, result: anyhow::Result<()>) {
    if let Err(e) = result {
        ctx.say(format!("❌ {e}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert!(matches!(parse_choice("q", 3), Ok(Choice::Quit)));
        assert!(matches!(parse_choice(" Q ", 3), Ok(Choice::Quit)));
        assert!(matches!(parse_choice("r", 3), Ok(Choice::Refresh)));
        assert!(matches!(parse_choice("c", 3), Ok(Choice::Create)));
        assert!(matches!(parse_choice("d", 3), Ok(Choice::Delete)));
        assert!(matches!(parse_choice("1", 3), Ok(Choice::Switch(0))));
        assert!(matches!(parse_choice("3", 3), Ok(Choice::Switch(2))));
    }

    #[test]
    fn test_parse_choice_rejects() {
        let err = parse_choice("4", 3).err().unwrap();
        assert!(err.contains("between 1 and 3"));
        assert!(parse_choice("0", 3).is_err());
        let err = parse_choice("work", 3).err().unwrap();
        assert!(err.contains("valid number"));
    }

    #[test]
    fn test_resolve_name() {
        let names = vec!["default".to_string(), "work".to_string()];
        assert_eq!(resolve_name("2", &names), "work");
        assert_eq!(resolve_name("work", &names), "work");
        assert_eq!(resolve_name("7", &names), "7");
    }
}
