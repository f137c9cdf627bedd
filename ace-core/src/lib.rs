//! # ace-core: seam between the ACE adaptation loop and task adapters
//!
//! The agentic context engineering loop (generate, reflect, curate a
//! playbook) is an external collaborator. This crate carries only what a
//! task adapter needs to plug into it:
//!
//! - [`types`]: samples, generator outputs, environment results and the
//!   [`TaskEnvironment`] trait
//! - [`config`]: layered configuration via `figment`
//! - [`prompt`]: Handlebars-backed prompt templates
//! - [`error`]: `thiserror`-based error types

pub mod config;
pub mod error;
pub mod prompt;
pub mod types;

pub use config::{AceConfig, EvaluationConfig, LoggingConfig, load_config};
pub use error::{ConfigError, PromptError};
pub use prompt::PromptRegistry;
pub use types::{EnvironmentResult, GeneratorOutput, Sample, TaskEnvironment};
