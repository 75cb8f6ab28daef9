//! Operator input
//!
//! Operations that need an answer from the operator take a `&mut dyn Prompter`
//! so the terminal front end and tests can supply their own.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors from reading an answer
#[derive(Debug, Error)]
pub enum PromptError {
    /// Input was interrupted or closed
    #[error("input cancelled")]
    Cancelled,

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Source of operator answers
pub trait Prompter {
    /// Show `prompt` and return the trimmed answer
    ///
    /// # Errors
    /// `Cancelled` on interrupt or end of input
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError>;

    /// Like [`Prompter::ask`] without echoing the answer
    ///
    /// # Errors
    /// `Cancelled` on interrupt or end of input
    fn ask_secret(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.ask(prompt)
    }

    /// Ask with a fallback used when the answer is empty
    ///
    /// # Errors
    /// `Cancelled` on interrupt or end of input
    fn ask_with_default(&mut self, prompt: &str, default: &str) -> Result<String, PromptError> {
        let answer = self.ask(&format!("{prompt} [{default}]: "))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }
}

/// Operator interrupt (Ctrl-C), shared between a signal listener and the
/// prompters
///
/// A line read that is restarted after the signal still completes; the
/// answer it returns is then replaced by `Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
    waiting: Arc<AtomicBool>,
}

impl Interrupt {
    /// Record an interrupt. Returns whether a prompt is waiting for input
    /// and will report it; `false` means nobody is listening.
    pub fn raise(&self) -> bool {
        self.raised.store(true, Ordering::SeqCst);
        self.waiting.load(Ordering::SeqCst)
    }

    /// Run one blocking read, turning an interrupt raised meanwhile into
    /// `Cancelled`
    ///
    /// # Errors
    /// `Cancelled` if interrupted, otherwise whatever `read` returns
    pub fn watch<T>(
        &self,
        read: impl FnOnce() -> Result<T, PromptError>,
    ) -> Result<T, PromptError> {
        self.raised.store(false, Ordering::SeqCst);
        self.waiting.store(true, Ordering::SeqCst);
        let result = read();
        self.waiting.store(false, Ordering::SeqCst);
        if self.raised.swap(false, Ordering::SeqCst) {
            return Err(PromptError::Cancelled);
        }
        result
    }
}

/// Only the full word `yes` (any case) counts as confirmation
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Line-oriented prompter over any reader and writer
///
/// End of input is reported as `Cancelled`.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
    interrupt: Interrupt,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            interrupt: Interrupt::default(),
        }
    }

    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

impl LinePrompter<io::StdinLock<'static>, io::Stderr> {
    /// Read from stdin, prompting on stderr
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let interrupt = self.interrupt.clone();
        interrupt.watch(|| {
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => Err(PromptError::Cancelled),
                Ok(_) => Ok(line.trim().to_string()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(PromptError::Cancelled),
                Err(e) => Err(PromptError::Io(e)),
            }
        })
    }
}
