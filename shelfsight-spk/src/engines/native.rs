//! Native platform TTS engine
//!
//! Drives the platform's command-line synthesizer: espeak-ng (or espeak)
//! on Linux, `say` on macOS. The child process is killed when the speak
//! future is dropped, so cancelling an utterance silences it at once.

use crate::config::SpeechConfig;
use crate::engines::{sanitize_text, SpeechEngine};
use crate::error::SpeechError;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Which command-line synthesizer is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeProgram {
    EspeakNg,
    Espeak,
    Say,
}

impl NativeProgram {
    fn binary(&self) -> &'static str {
        match self {
            NativeProgram::EspeakNg => "espeak-ng",
            NativeProgram::Espeak => "espeak",
            NativeProgram::Say => "say",
        }
    }

    /// Probe the system for a usable synthesizer
    pub fn detect() -> Option<Self> {
        let candidates: &[NativeProgram] = if cfg!(target_os = "macos") {
            &[NativeProgram::Say, NativeProgram::EspeakNg]
        } else {
            &[NativeProgram::EspeakNg, NativeProgram::Espeak]
        };

        candidates.iter().copied().find(|program| {
            std::process::Command::new(program.binary())
                .arg("--version")
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
                .is_ok()
        })
    }
}

/// Native TTS engine (platform-specific)
pub struct NativeSpeechEngine {
    program: Option<NativeProgram>,
    voice: Option<String>,
    language: String,
    rate: u32,
    volume: f32,
    pitch: f32,
    max_text_len: usize,
}

impl NativeSpeechEngine {
    pub fn new(config: &SpeechConfig) -> Self {
        let program = NativeProgram::detect();
        match program {
            Some(p) => info!("Native TTS engine initialized ({})", p.binary()),
            None => warn!("Native TTS engine not available"),
        }
        Self::with_program(program, config)
    }

    pub fn with_program(program: Option<NativeProgram>, config: &SpeechConfig) -> Self {
        Self {
            program,
            voice: config.voice.name.clone(),
            language: config.voice.language.clone(),
            rate: config.rate,
            volume: config.volume,
            pitch: config.pitch,
            max_text_len: config.max_text_len,
        }
    }

    /// Command-line arguments for one utterance
    pub fn arguments(&self, program: NativeProgram, text: &str) -> Vec<String> {
        let mut args = Vec::new();
        match program {
            NativeProgram::EspeakNg | NativeProgram::Espeak => {
                args.push("-s".to_string());
                args.push(self.rate.to_string());

                // amplitude 0-200, 100 is normal
                let amplitude = ((self.volume * 200.0).round() as u32).min(200);
                args.push("-a".to_string());
                args.push(amplitude.to_string());

                // pitch 0-99, 50 is normal
                let pitch = ((50.0 + self.pitch * 49.0).round().max(0.0) as u32).min(99);
                args.push("-p".to_string());
                args.push(pitch.to_string());

                args.push("-v".to_string());
                args.push(
                    self.voice
                        .clone()
                        .unwrap_or_else(|| self.language.to_ascii_lowercase()),
                );
            }
            NativeProgram::Say => {
                args.push("-r".to_string());
                args.push(self.rate.to_string());
                if let Some(ref voice) = self.voice {
                    args.push("-v".to_string());
                    args.push(voice.clone());
                }
            }
        }
        args.push("--".to_string());
        args.push(text.to_string());
        args
    }
}

#[async_trait]
impl SpeechEngine for NativeSpeechEngine {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let program = self
            .program
            .ok_or_else(|| SpeechError::Engine("Native TTS engine not available".to_string()))?;

        let sanitized = sanitize_text(text, self.max_text_len);
        if sanitized.is_empty() {
            return Err(SpeechError::Synthesizer("Text is empty after sanitization".to_string()));
        }

        debug!("{} speaking {} chars", program.binary(), sanitized.len());
        let status = Command::new(program.binary())
            .args(self.arguments(program, &sanitized))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to run {}: {}", program.binary(), e)))?;

        if !status.success() {
            return Err(SpeechError::Engine(format!(
                "{} exited with {}",
                program.binary(),
                status
            )));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn name(&self) -> &str {
        "native"
    }
}
