//! Error types for the ACE framework seam.
//!
//! Uses `thiserror` for public API error types. Task adapters define their
//! own top-level error enums and wrap these with `#[from]`.

use std::path::PathBuf;

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from prompt template registration and rendering.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Template '{name}' failed to compile: {message}")]
    Compile { name: String, message: String },

    #[error("Template '{name}' failed to render: {message}")]
    Render { name: String, message: String },
}
