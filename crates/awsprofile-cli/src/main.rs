//! awsprofile CLI - view, switch, create and delete AWS profiles
//!
//! Provides `awsprofile list`, `awsprofile -s <profile>`, `awsprofile create`
//! and the other commands; with no arguments it starts an interactive menu.

mod commands;
mod context;
mod prompt;
mod render;

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use awsprofile_core::Interrupt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use context::AppContext;

/// Environment variable holding a `tracing` filter directive
const LOG_ENV: &str = "AWSPROFILE_LOG";

#[derive(Parser)]
#[command(name = "awsprofile")]
#[command(about = "AWS Profile Switcher - view and switch between AWS profiles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Switch to a profile
    #[arg(short = 's', long = "switch", value_name = "PROFILE")]
    switch: Option<String>,

    /// Copy the profile into `default` instead of only setting AWS_PROFILE
    #[arg(long, requires = "switch")]
    persist: bool,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Print shell commands on stdout for `eval`; messages go to stderr
    #[arg(long, global = true)]
    pub shell: bool,

    /// Skip the STS identity check
    #[arg(long, global = true)]
    pub no_validate: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path of the aws executable
    #[arg(long, global = true, value_name = "PATH")]
    pub aws_bin: Option<String>,

    /// Seconds to wait for each aws call
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all profiles with their account information
    List {
        /// Print profile names only, one per line
        #[arg(long, conflicts_with = "json")]
        names: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Ask the aws CLI for profile names instead of reading the files
        #[arg(long)]
        from_cli: bool,
    },
    /// Show the active profile
    Current {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop the AWS_PROFILE override and fall back to `default`
    Clear,
    /// Create or overwrite a profile
    Create {
        /// Profile name
        name: String,
        /// Access key ID (prompted if omitted)
        #[arg(long)]
        access_key_id: Option<String>,
        /// Default region (prompted if omitted)
        #[arg(long)]
        region: Option<String>,
        /// Default output format (prompted if omitted)
        #[arg(long)]
        output: Option<String>,
        /// Overwrite an existing profile without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Delete a profile from both files
    Delete {
        /// Profile name
        name: String,
    },
    /// Check a profile's credentials
    Validate {
        /// Profile name
        name: String,
    },
    /// Read or write one setting through the aws CLI
    Config {
        /// Profile name
        profile: String,
        /// Setting key, e.g. `region`
        key: String,
        /// New value; omit to print the current one
        value: Option<String>,
    },
    /// Restore both files from their last backups
    Restore {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Print the shell integration snippet
    ShellInit,
    /// Append the shell integration snippet to a shell rc file
    SetupShell {
        /// Rc file to update (defaults to ~/.zshrc or ~/.bashrc from $SHELL)
        #[arg(long, value_name = "FILE")]
        rc: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    if cli.switch.is_some() && cli.command.is_some() {
        Cli::command()
            .error(
                ErrorKind::ArgumentConflict,
                "--switch cannot be combined with a subcommand",
            )
            .exit();
    }
    init_logging(cli.global.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Ctrl-C while a prompt waits cancels that prompt; anywhere else it ends
/// the process with the usual SIGINT status
fn listen_for_interrupt(interrupt: Interrupt) {
    let spawned = std::thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::debug!(error = %e, "no interrupt listener");
                    return;
                }
            };
            runtime.block_on(async {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if !interrupt.raise() {
                        std::process::exit(130);
                    }
                    eprintln!("\n^C (press Enter to cancel)");
                }
            });
        });
    if let Err(e) = spawned {
        tracing::debug!(error = %e, "no interrupt listener");
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::ShellInit) => {
            commands::shell::execute_init();
            return Ok(());
        }
        Some(Commands::SetupShell { rc }) => return commands::shell::execute_setup(rc.as_deref()),
        _ => {}
    }

    let interrupt = Interrupt::default();
    listen_for_interrupt(interrupt.clone());
    let mut ctx = AppContext::from_args(&cli.global, interrupt)?;

    if let Some(name) = cli.switch {
        return commands::switch::execute(&mut ctx, &name, cli.persist);
    }

    match cli.command {
        None => commands::interactive::execute(&mut ctx),
        Some(Commands::List {
            names,
            json,
            from_cli,
        }) => commands::list::execute(&ctx, names, json, from_cli),
        Some(Commands::Current { json }) => commands::current::execute(&ctx, json),
        Some(Commands::Clear) => commands::switch::execute_clear(&mut ctx),
        Some(Commands::Create {
            name,
            access_key_id,
            region,
            output,
            force,
        }) => commands::create::execute(
            &ctx,
            &commands::create::CreateArgs {
                name,
                access_key_id,
                region,
                output,
                force,
            },
        ),
        Some(Commands::Delete { name }) => commands::delete::execute(&mut ctx, &name),
        Some(Commands::Validate { name }) => commands::validate::execute(&ctx, &name),
        Some(Commands::Config {
            profile,
            key,
            value,
        }) => commands::config::execute(&ctx, &profile, &key, value.as_deref()),
        Some(Commands::Restore { force }) => commands::restore::execute(&ctx, force),
        // handled before the context is built
        Some(Commands::ShellInit | Commands::SetupShell { .. }) => Ok(()),
    }
}
