//! Session errors

use crate::config::ConfigError;
use thiserror::Error;

/// Errors returned by [`RateController`](crate::RateController) and [`SessionHandle`](crate::SessionHandle)
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Controller not configured with a connection")]
    NotConfigured,

    #[error("Session already running")]
    AlreadyRunning,

    #[error("Session not running")]
    NotRunning,

    #[error("Session closed")]
    Closed,

    #[error("Policy percentage {0} out of range 0..=100")]
    InvalidPolicy(u8),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to spawn session thread: {0}")]
    Spawn(#[from] std::io::Error),
}
