//! shelfsight-spk: spoken feedback for the shelfsight assistant
//!
//! All spoken cues (the "Stop" alert, idle nudges, result narration,
//! tutorial paragraphs) go through one [`SpeechChannel`]. The channel holds
//! at most one outstanding utterance; issuing a new one cancels the previous
//! one first. Every utterance is an awaitable that resolves exactly once.

pub mod error;
pub mod config;
pub mod engines;
pub mod channel;

pub use error::SpeechError;
pub use config::{SpeechConfig, TtsEngineKind, VoiceConfig};
pub use engines::{build_engine, SpeechEngine};
pub use engines::console::ConsoleSpeechEngine;
pub use engines::native::NativeSpeechEngine;
pub use engines::silent::SilentSpeechEngine;
pub use channel::{SpeechChannel, SpeechOutcome, Utterance};
