//! Living Books — simulator error types.

use livingbooks_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the simulator.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The manifest file could not be read, or stdin failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid YAML for a storybook.
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// An input line could not be understood.
    #[error("unrecognised input: {0}")]
    Input(String),

    /// The coordinator rejected its configuration or the inbox closed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
