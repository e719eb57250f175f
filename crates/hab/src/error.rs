//! Error taxonomy for the HFP bridge engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HabError {
    #[error("HFP session is not running")]
    NotInitialized,
    #[error("operation not valid while a session is {0}")]
    InvalidState(&'static str),
    #[error("ALSA device error: {0}")]
    Device(#[from] alsa::Error),
    #[error("resampler error: {0}")]
    Resample(#[from] rubato::ResampleError),
    #[error("resampler construction error: {0}")]
    ResamplerConstruction(#[from] rubato::ResamplerConstructionError),
    #[error("audio processing module error: {0:?}")]
    Apm(webrtc_audio_processing::Error),
}

pub type Result<T> = std::result::Result<T, HabError>;
