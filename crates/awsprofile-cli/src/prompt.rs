//! Terminal prompts
//!
//! A real terminal gets `dialoguer` prompts with hidden secret entry; piped
//! input is read line by line so scripts and tests can answer prompts.

use std::io::{self, IsTerminal};

use awsprofile_core::{Interrupt, LinePrompter, PromptError, Prompter};
use dialoguer::{Input, Password};

pub fn terminal_prompter(interrupt: &Interrupt) -> Box<dyn Prompter> {
    if io::stdin().is_terminal() {
        Box::new(DialoguerPrompter {
            interrupt: interrupt.clone(),
        })
    } else {
        Box::new(LinePrompter::stdio().with_interrupt(interrupt.clone()))
    }
}

pub struct DialoguerPrompter {
    interrupt: Interrupt,
}

impl Prompter for DialoguerPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        let answer: String = self.interrupt.watch(|| {
            Input::new()
                .with_prompt(clean(prompt))
                .allow_empty(true)
                .interact_text()
                .map_err(convert)
        })?;
        Ok(answer.trim().to_string())
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String, PromptError> {
        // Password reads a cooked line, so Ctrl-C arrives as a signal
        let answer = self.interrupt.watch(|| {
            Password::new()
                .with_prompt(clean(prompt))
                .allow_empty_password(true)
                .interact()
                .map_err(convert)
        })?;
        Ok(answer.trim().to_string())
    }

    fn ask_with_default(&mut self, prompt: &str, default: &str) -> Result<String, PromptError> {
        let answer: String = self.interrupt.watch(|| {
            Input::new()
                .with_prompt(clean(prompt))
                .default(default.to_string())
                .interact_text()
                .map_err(convert)
        })?;
        Ok(answer.trim().to_string())
    }
}

/// dialoguer adds its own separator after the prompt
fn clean(prompt: &str) -> String {
    prompt
        .trim()
        .trim_end_matches(':')
        .trim_end()
        .to_string()
}

fn convert(err: dialoguer::Error) -> PromptError {
    let dialoguer::Error::IO(err) = err;
    match err.kind() {
        io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof => PromptError::Cancelled,
        _ => PromptError::Io(err),
    }
}
