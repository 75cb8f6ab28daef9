//! Per-invocation state shared by the command handlers

use std::fmt::Display;
use std::time::Duration;

use awsprofile_core::{
    AwsCli, Interrupt, ProfileMutator, ProfileRegistry, ProfileResult, Prompter, SessionContext,
    Settings,
};

use crate::prompt::terminal_prompter;
use crate::GlobalArgs;

pub struct AppContext {
    pub settings: Settings,
    pub aws: AwsCli,
    pub mutator: ProfileMutator,
    pub session: SessionContext,
    /// Emit eval-able shell lines on stdout, everything else on stderr
    pub shell: bool,
    pub validate: bool,
    interrupt: Interrupt,
}

impl AppContext {
    /// Build from the environment, with command-line flags taking precedence
    pub fn from_args(args: &GlobalArgs, interrupt: Interrupt) -> anyhow::Result<Self> {
        let mut settings = Settings::from_env()?;
        if let Some(bin) = &args.aws_bin {
            settings.aws_binary.clone_from(bin);
        }
        if let Some(secs) = args.timeout {
            anyhow::ensure!(secs > 0, "--timeout must be at least 1 second");
            settings.timeout = Duration::from_secs(secs);
        }
        tracing::debug!(
            credentials = %settings.paths.credentials.display(),
            config = %settings.paths.config.display(),
            aws = %settings.aws_binary,
            "settings loaded"
        );

        Ok(Self {
            aws: AwsCli::from_settings(&settings),
            mutator: ProfileMutator::new(settings.paths.clone()),
            session: SessionContext::from_env(),
            settings,
            shell: args.shell,
            validate: !args.no_validate,
            interrupt,
        })
    }

    /// Fresh read of both registry files
    pub fn registry(&self) -> ProfileResult<ProfileRegistry> {
        self.mutator.read()
    }

    /// Human-readable line; stderr in shell mode so stdout stays eval-able
    pub fn say(&self, text: impl Display) {
        if self.shell {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }

    /// Shell command line, printed only in shell mode
    pub fn emit_shell(&self, line: &str) {
        if self.shell {
            println!("{line}");
        }
    }

    pub fn prompter(&self) -> Box<dyn Prompter> {
        terminal_prompter(&self.interrupt)
    }

    /// Print the setup hint when the credentials file is missing
    pub fn hint_if_missing(&self, registry: &ProfileRegistry) -> bool {
        if !registry.credentials_missing() {
            return false;
        }
        self.say(format!(
            "❌ No AWS credentials file found at {}",
            self.settings.paths.credentials.display()
        ));
        self.say("💡 Run 'aws configure' to set up your first profile.");
        true
    }
}
