//! External `aws` CLI invocation
//!
//! Every call is bounded by the configured timeout. The child never sees the
//! parent's `AWS_PROFILE`; callers pass `--profile` explicitly.

use std::io::{BufReader, ErrorKind, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::settings::{Settings, DEFAULT_TIMEOUT, PROFILE_ENV_VAR};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors from running the external tool
#[derive(Debug, Error)]
pub enum AwsCliError {
    /// Executable could not be located
    #[error("{binary} not found")]
    NotFound { binary: String },

    /// Child did not exit within the bound and was killed
    #[error("timed out after {}s", timeout.as_secs_f32())]
    Timeout { timeout: Duration },

    /// Child exited non-zero
    #[error("exited with status {}: {stderr}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    Failed { code: Option<i32>, stderr: String },

    /// Spawn or wait failed for another reason
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of a finished child
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    fn into_success(self) -> Result<Self, AwsCliError> {
        if self.success {
            Ok(self)
        } else {
            Err(AwsCliError::Failed {
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Handle on the external `aws` executable
#[derive(Debug, Clone)]
pub struct AwsCli {
    binary: String,
    timeout: Duration,
}

impl Default for AwsCli {
    fn default() -> Self {
        Self::new("aws", DEFAULT_TIMEOUT)
    }
}

impl AwsCli {
    #[must_use]
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.aws_binary.clone(), settings.timeout)
    }

    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run with the given arguments and wait at most `timeout`
    ///
    /// # Errors
    /// Returns an error if the binary is missing, the wait times out, or
    /// the process cannot be spawned or waited on. A non-zero exit is not
    /// an error here; inspect `CommandOutput::success`.
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput, AwsCliError> {
        self.run_with_env(args, &[], &[])
    }

    /// Like [`AwsCli::run`], setting `env` and removing `remove` from the
    /// child's environment
    ///
    /// # Errors
    /// See [`AwsCli::run`]
    pub fn run_with_env(
        &self,
        args: &[&str],
        env: &[(&str, &str)],
        remove: &[&str],
    ) -> Result<CommandOutput, AwsCliError> {
        tracing::debug!(binary = %self.binary, ?args, "running external tool");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .env_remove(PROFILE_ENV_VAR)
            .env("AWS_PAGER", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for key in remove {
            command.env_remove(key);
        }
        for (key, value) in env {
            command.env(key, value);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(AwsCliError::NotFound {
                    binary: self.binary.clone(),
                })
            }
            Err(err) => return Err(AwsCliError::Io(err)),
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("missing stdout pipe"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("missing stderr pipe"))?;
        let stdout_reader = spawn_drain(stdout);
        let stderr_reader = spawn_drain(stderr);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() > deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::debug!(binary = %self.binary, "external tool timed out");
                        return Err(AwsCliError::Timeout {
                            timeout: self.timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(AwsCliError::Io(err)),
            }
        };

        // A grandchild can hold the pipes open after the child exits
        let stdout = self.collect(&stdout_reader, deadline)?;
        let stderr = self.collect(&stderr_reader, deadline)?;
        tracing::debug!(code = ?status.code(), "external tool finished");

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            stdout,
            stderr,
        })
    }

    fn collect(&self, reader: &Receiver<String>, deadline: Instant) -> Result<String, AwsCliError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match reader.recv_timeout(remaining) {
            Ok(text) => Ok(text),
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(binary = %self.binary, "output pipe still open at the deadline");
                Err(AwsCliError::Timeout {
                    timeout: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Ok(String::new()),
        }
    }

    /// Profile names the tool itself knows about (`configure list-profiles`)
    ///
    /// # Errors
    /// Returns an error if the tool fails or exits non-zero
    pub fn list_profiles(&self) -> Result<Vec<String>, AwsCliError> {
        let output = self.run(&["configure", "list-profiles"])?.into_success()?;
        let mut names: Vec<String> = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Read one configuration key for a profile; `None` if it is not set
    ///
    /// # Errors
    /// Returns an error if the tool cannot be run
    pub fn configure_get(&self, profile: &str, key: &str) -> Result<Option<String>, AwsCliError> {
        let output = self.run(&["configure", "get", key, "--profile", profile])?;
        if !output.success {
            // `configure get` exits 1 for an unset key
            return Ok(None);
        }
        let value = output.stdout.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    /// Write one configuration key for a profile
    ///
    /// # Errors
    /// Returns an error if the tool fails or exits non-zero
    pub fn configure_set(&self, profile: &str, key: &str, value: &str) -> Result<(), AwsCliError> {
        self.run(&["configure", "set", key, value, "--profile", profile])?
            .into_success()?;
        Ok(())
    }

    /// Raw `configure list` output, used to find the tool's active profile
    ///
    /// # Errors
    /// Returns an error if the tool fails or exits non-zero
    pub fn configure_list(&self) -> Result<String, AwsCliError> {
        Ok(self.run(&["configure", "list"])?.into_success()?.stdout)
    }
}

/// Read `pipe` to the end on its own thread
fn spawn_drain(pipe: impl Read + Send + 'static) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(drain(pipe));
    });
    rx
}

fn drain(pipe: impl Read) -> String {
    let mut buf = String::new();
    let mut reader = BufReader::new(pipe);
    let _ = reader.read_to_string(&mut buf);
    buf
}
