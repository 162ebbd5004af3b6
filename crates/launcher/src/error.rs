//! Run-level errors.
//!
//! Only problems detected before the first remote call abort a run. Errors
//! inside one (account, store) unit are captured in the report instead.

use thiserror::Error;

use campaign_launcher_core::ValidationError;

/// Errors that abort a whole launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The request is incomplete or inconsistent.
    #[error("invalid campaign request: {0}")]
    Validation(#[from] ValidationError),

    /// The launch time cannot be represented.
    #[error("cannot schedule launch: {0}")]
    Schedule(String),

    /// Cancelled before any unit started.
    #[error("run cancelled before it started")]
    Cancelled,
}

/// Result type alias for launch operations.
pub type Result<T> = std::result::Result<T, LaunchError>;
