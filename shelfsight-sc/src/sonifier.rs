//! Centering sonification

use crate::error::AudioError;
use crate::tone::{ToneGenerator, ToneOutput};
use shelfsight_core::Settings;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Map a centeredness score linearly onto `[min_hz, max_hz]`
pub fn frequency_for(score: f32, min_hz: f32, max_hz: f32) -> f32 {
    let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
    min_hz + score * (max_hz - min_hz)
}

/// Owns the session's tone generator
///
/// The generator exists only between `start()` and `dispose()`. While
/// suspended (a capture is in flight) every update keeps the tone muted.
pub struct Sonifier {
    output: Arc<dyn ToneOutput>,
    generator: Option<Box<dyn ToneGenerator>>,
    suspended: bool,
    teardown_grace: Duration,
}

impl Sonifier {
    pub fn new(output: Arc<dyn ToneOutput>, teardown_grace: Duration) -> Self {
        Self {
            output,
            generator: None,
            suspended: false,
            teardown_grace,
        }
    }

    /// Create the session's tone generator, silent until the first update
    pub fn start(&mut self, settings: &Settings) -> Result<(), AudioError> {
        if self.generator.is_some() {
            self.dispose();
        }
        let generator = self.output.open(settings.min_frequency_hz, 0.0)?;
        self.generator = Some(generator);
        self.suspended = false;
        info!("Tone generator started ({})", self.output.name());
        Ok(())
    }

    /// Drive the tone from a centeredness score
    ///
    /// Returns the frequency set, or None when the tone stays muted.
    pub fn set_centeredness(&mut self, score: f32, settings: &Settings) -> Option<f32> {
        let generator = self.generator.as_ref()?;
        if self.suspended || !settings.sounds_enabled {
            generator.set_gain(0.0);
            return None;
        }

        let frequency = frequency_for(score, settings.min_frequency_hz, settings.max_frequency_hz);
        generator.set_frequency(frequency);
        generator.set_gain(settings.beep_volume);
        Some(frequency)
    }

    /// Silence the tone immediately
    pub fn mute(&mut self) {
        if let Some(ref generator) = self.generator {
            generator.set_gain(0.0);
        }
    }

    /// Mute and ignore updates until `resume()`
    pub fn suspend(&mut self) {
        self.suspended = true;
        self.mute();
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Ramp to silence, then release the generator after the grace delay
    pub fn dispose(&mut self) {
        let Some(generator) = self.generator.take() else {
            return;
        };
        generator.set_gain(0.0);

        let grace = self.teardown_grace;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(grace).await;
                    generator.shutdown();
                    debug!("Tone generator released");
                });
            }
            Err(_) => generator.shutdown(),
        }
        info!("Tone generator disposed");
    }

    pub fn is_active(&self) -> bool {
        self.generator.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn frequency(&self) -> Option<f32> {
        self.generator.as_ref().map(|g| g.frequency())
    }

    pub fn gain(&self) -> Option<f32> {
        self.generator.as_ref().map(|g| g.gain())
    }
}

impl Drop for Sonifier {
    fn drop(&mut self) {
        if let Some(generator) = self.generator.take() {
            generator.set_gain(0.0);
            generator.shutdown();
        }
    }
}
