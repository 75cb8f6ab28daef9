//! awsprofile core - AWS profile registry, validation and switching
//!
//! This crate reads and edits the shared credentials and config files,
//! checks profiles through the `aws` CLI, and resolves the active profile.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::unused_self,
    clippy::cast_possible_truncation
)]

pub mod aws_cli;
pub mod backup;
pub mod error;
pub mod identity;
pub mod ini;
pub mod mutate;
pub mod prompt;
pub mod session;
pub mod settings;
pub mod store;
pub mod util;

pub use aws_cli::AwsCli;
pub use error::{ProfileError, ProfileResult};
pub use identity::{FailureKind, Identity, ValidationFailure};
pub use mutate::{MutationReport, ProfileMutator, Removal};
pub use prompt::{Interrupt, LinePrompter, PromptError, Prompter};
pub use session::{ActiveProfile, ProfileSource, SessionContext};
pub use settings::{AwsPaths, Settings};
pub use store::{ProfileRegistry, ProfileSettings};
