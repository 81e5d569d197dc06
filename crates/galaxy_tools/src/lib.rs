//! # Galaxy Development Tools
//!
//! Command-line tools for development:
//! - Config validation and export
//! - Seeded battle batches

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod battle;
pub mod validate;

use galaxy_core::error::GameError;
use thiserror::Error;

/// Errors surfaced by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The core rejected the input.
    #[error(transparent)]
    Core(#[from] GameError),

    /// A command-line argument did not parse.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Output could not be encoded.
    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result alias for the tools.
pub type Result<T> = std::result::Result<T, ToolError>;
