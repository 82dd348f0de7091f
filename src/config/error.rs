//! Error definitions for layout loading

use crate::board::BoardError;
use crate::codetext::CodeTextError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read layout file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse layout: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed fine but describes an unusable keyboard
    #[error("Invalid layout: {0}")]
    Invalid(String),

    #[error("Board error: {0}")]
    Board(#[from] BoardError),

    #[error("Code text error: {0}")]
    CodeText(#[from] CodeTextError),
}
