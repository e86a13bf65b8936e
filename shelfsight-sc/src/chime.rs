//! Loading chime played while the detection model loads

use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::tone::{ToneGenerator, ToneOutput};
use std::time::Duration;
use tracing::debug;

/// Steady tone; stopped with the same ramp-then-release as the sonifier
pub struct LoadingChime {
    generator: Option<Box<dyn ToneGenerator>>,
    teardown_grace: Duration,
}

impl LoadingChime {
    pub fn start(
        output: &dyn ToneOutput,
        config: &AudioConfig,
        teardown_grace: Duration,
    ) -> Result<Self, AudioError> {
        let generator = output.open(config.chime_frequency_hz, config.chime_gain)?;
        debug!("Loading chime started at {} Hz", config.chime_frequency_hz);
        Ok(Self {
            generator: Some(generator),
            teardown_grace,
        })
    }

    /// Chime that plays nothing, used when sounds are disabled
    pub fn silent() -> Self {
        Self {
            generator: None,
            teardown_grace: Duration::ZERO,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.generator.as_ref().map(|g| g.gain() > 0.0).unwrap_or(false)
    }

    /// Ramp to silence and release after the grace delay
    pub async fn stop(mut self) {
        if let Some(generator) = self.generator.take() {
            generator.set_gain(0.0);
            tokio::time::sleep(self.teardown_grace).await;
            generator.shutdown();
            debug!("Loading chime stopped");
        }
    }
}

impl Drop for LoadingChime {
    fn drop(&mut self) {
        if let Some(generator) = self.generator.take() {
            generator.set_gain(0.0);
            generator.shutdown();
        }
    }
}
