//! Error definitions for packets and buttons

use crate::codetext::CodeTextError;
use thiserror::Error;

/// Configuration errors of packets and buttons
///
/// Raised while templates are built, never while touches are dispatched.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Values outside the range the keyboard understands
    #[error("Invalid external data: {0}")]
    InvalidExternalData(String),

    /// A button or packet refers to something that was never defined
    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    #[error("Code text error: {0}")]
    CodeText(#[from] CodeTextError),
}
