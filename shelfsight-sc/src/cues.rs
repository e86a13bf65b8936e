//! Short sound cues around a capture
//!
//! Cues are best-effort: a missing file or player is logged and skipped,
//! never surfaced as an error to the capture flow.

use crate::config::AudioConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Named sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCue {
    /// Snapshot taken
    Shutter,
    /// Description request outstanding; loops until stopped
    Processing,
    /// Description received
    Complete,
}

impl SoundCue {
    pub fn file_name(&self) -> &'static str {
        match self {
            SoundCue::Shutter => "shutter.wav",
            SoundCue::Processing => "processing.wav",
            SoundCue::Complete => "complete.wav",
        }
    }

    pub fn loops(&self) -> bool {
        matches!(self, SoundCue::Processing)
    }
}

/// Plays sound cues without blocking the caller
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: SoundCue);

    fn stop(&self, cue: SoundCue);

    /// Stop every cue still playing
    fn stop_all(&self);
}

/// Plays nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCuePlayer;

impl CuePlayer for NullCuePlayer {
    fn play(&self, _cue: SoundCue) {}

    fn stop(&self, _cue: SoundCue) {}

    fn stop_all(&self) {}
}

/// Plays cue files through an external player program (aplay, afplay)
pub struct CommandCuePlayer {
    program: String,
    cue_dir: PathBuf,
    playing: Mutex<HashMap<SoundCue, JoinHandle<()>>>,
}

impl CommandCuePlayer {
    pub fn new(program: impl Into<String>, cue_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            cue_dir,
            playing: Mutex::new(HashMap::new()),
        }
    }

    fn default_program() -> &'static str {
        if cfg!(target_os = "macos") {
            "afplay"
        } else {
            "aplay"
        }
    }

    pub fn is_playing(&self, cue: SoundCue) -> bool {
        self.playing
            .lock()
            .get(&cue)
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl CuePlayer for CommandCuePlayer {
    fn play(&self, cue: SoundCue) {
        let path = self.cue_dir.join(cue.file_name());
        if !path.is_file() {
            debug!("Cue file {} missing, skipping", path.display());
            return;
        }

        let program = self.program.clone();
        let task = tokio::spawn(async move {
            loop {
                // the child dies with the task when the cue is stopped
                let status = Command::new(&program)
                    .arg(&path)
                    .stdout(std::process::Stdio::null())
                    .stderr(std::process::Stdio::null())
                    .kill_on_drop(true)
                    .status()
                    .await;
                match status {
                    Ok(status) if status.success() => {}
                    Ok(status) => {
                        warn!("{} exited with {} playing {}", program, status, path.display());
                        return;
                    }
                    Err(e) => {
                        warn!("Failed to run {}: {}", program, e);
                        return;
                    }
                }
                if !cue.loops() {
                    return;
                }
            }
        });

        if let Some(previous) = self.playing.lock().insert(cue, task) {
            previous.abort();
        }
    }

    fn stop(&self, cue: SoundCue) {
        if let Some(task) = self.playing.lock().remove(&cue) {
            task.abort();
        }
    }

    fn stop_all(&self) {
        for (_, task) in self.playing.lock().drain() {
            task.abort();
        }
    }
}

impl Drop for CommandCuePlayer {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Build the configured cue player
pub fn build_cue_player(config: &AudioConfig) -> Arc<dyn CuePlayer> {
    match config.cue_dir {
        Some(ref dir) => {
            let program = config
                .cue_player
                .clone()
                .unwrap_or_else(|| CommandCuePlayer::default_program().to_string());
            Arc::new(CommandCuePlayer::new(program, dir.clone()))
        }
        None => Arc::new(NullCuePlayer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_files() {
        assert_eq!(SoundCue::Shutter.file_name(), "shutter.wav");
        assert!(SoundCue::Processing.loops());
        assert!(!SoundCue::Complete.loops());
    }

    #[tokio::test]
    async fn test_missing_cue_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let player = CommandCuePlayer::new("aplay", dir.path().to_path_buf());
        player.play(SoundCue::Shutter);
        assert!(!player.is_playing(SoundCue::Shutter));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_looping_cue_runs_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("processing.wav"), b"RIFF").unwrap();
        // `true` exits successfully at once, so the cue keeps looping
        let player = CommandCuePlayer::new("true", dir.path().to_path_buf());
        player.play(SoundCue::Processing);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(player.is_playing(SoundCue::Processing));

        player.stop(SoundCue::Processing);
        assert!(!player.is_playing(SoundCue::Processing));
    }

    #[test]
    fn test_build_without_cue_dir() {
        let player = build_cue_player(&AudioConfig::default());
        player.play(SoundCue::Complete);
        player.stop_all();
    }
}
