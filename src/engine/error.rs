//! Error definitions for the board engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Touch events could not be delivered
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// The engine task panicked or was cancelled
    #[error("Thread error: {0}")]
    ThreadError(String),

    /// The engine was already shut down
    #[error("Engine not running: {0}")]
    NotRunning(String),
}
