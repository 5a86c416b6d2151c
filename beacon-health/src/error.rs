//! Health error types

use thiserror::Error;

use crate::duration::DurationError;

/// Errors that can occur while configuring or running the health endpoint
#[derive(Debug, Error)]
pub enum HealthError {
    /// The configured address is not of the form `host:port`
    #[error("invalid health address '{address}': {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    /// The lameduck value could not be parsed as a duration
    #[error("unable to parse lameduck duration value: '{value}': {source}")]
    InvalidLameduck {
        value: String,
        source: DurationError,
    },

    /// Failed to bind to the specified address
    #[error("Failed to bind health server to {address}: {source}")]
    BindError {
        address: String,
        source: std::io::Error,
    },

    /// Health server encountered a runtime error
    #[error("Health server error: {0}")]
    ServerError(String),

    /// The endpoint has been shut down and cannot be started again
    #[error("Health server has already been shut down")]
    Closed,
}
