//! Error definitions for the code-text index

use thiserror::Error;

/// Errors raised while the code-text collections are assembled
///
/// Lookups never fail: a miss is simply no match.
#[derive(Debug, Error)]
pub enum CodeTextError {
    /// Two varias registered under the same id
    #[error("Duplicate varia id: {0}")]
    DuplicateVaria(String),

    /// Two shortcut lists or sets registered under the same id
    #[error("Duplicate shortcut id: {0}")]
    DuplicateShortCut(String),

    /// A trigger code used twice inside one varia
    #[error("Duplicate trigger code: {0}")]
    DuplicateCode(String),

    /// A varia without any group cannot be selected
    #[error("Varia without groups: {0}")]
    EmptyVaria(String),

    /// A shortcut set refers to a list that was never added
    #[error("Unknown shortcut list: {0}")]
    UnknownShortCut(String),

    /// Shortcut sets only aggregate base lists
    #[error("Shortcut set cannot contain another set: {0}")]
    NestedSet(String),

    /// A modify roll needs at least one non-empty string
    #[error("Invalid modify roll: {0}")]
    InvalidRoll(String),
}
