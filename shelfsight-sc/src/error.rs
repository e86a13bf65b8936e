//! Error types for shelfsight-sc

use shelfsight_core::Error as CoreError;
use thiserror::Error;

/// Audio output errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Audio format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<AudioError> for CoreError {
    fn from(err: AudioError) -> Self {
        CoreError::Audio(err.to_string())
    }
}
