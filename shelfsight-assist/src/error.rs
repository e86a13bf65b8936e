//! Error types for shelfsight-assist

use crate::state::TransitionError;
use shelfsight_core::Error as CoreError;
use shelfsight_eye::VisionError;
use shelfsight_llm::DescribeError;
use shelfsight_sc::AudioError;
use shelfsight_spk::SpeechError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Assistant is not running")]
    Closed,

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Description error: {0}")]
    Describe(#[from] DescribeError),

    #[error("State error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<AssistError> for CoreError {
    fn from(err: AssistError) -> Self {
        CoreError::Session(err.to_string())
    }
}
