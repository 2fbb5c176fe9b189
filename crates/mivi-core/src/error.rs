//! Error types for mivi-core.

use thiserror::Error;

/// Error type for mivi-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Key index {0} out of range. Must be between 0 and 127")]
    KeyOutOfRange(u8),

    #[error("Velocity {0} out of range. Must be between 1 and 127")]
    VelocityOutOfRange(u8),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
