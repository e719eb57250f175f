//! Error taxonomy for the ALSA stream facade and mixer controls, plus
//! the transient device-I/O variants that wrap `alsa`'s own error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlsaError {
    #[error("stream is not open")]
    NotInitialized,
    #[error("operation not valid for the current stream state")]
    InvalidState,
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("feature not available: {0}")]
    Unavailable(&'static str),
    #[error("ALSA device error: {0}")]
    Device(#[from] alsa::Error),
}

pub type Result<T> = std::result::Result<T, AlsaError>;
