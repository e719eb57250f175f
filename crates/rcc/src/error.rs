//! Error taxonomy for the tuner facade: the four host-visible result kinds
//! plus the transient/IO failures that can occur while validating or
//! executing an operation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TunerError {
    #[error("tuner is not initialized or has been closed")]
    NotInitialized,
    #[error("operation not valid for the current tuner state or class")]
    InvalidState,
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("feature not available: {0}")]
    Unavailable(&'static str),
    #[error("serial endpoint error: {0}")]
    Serial(#[from] rcc_serial::SerialError),
}

pub type Result<T> = std::result::Result<T, TunerError>;
