//! Continuous tone generators

use crate::error::AudioError;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Frequency and gain shared between the controller and the audio thread
#[derive(Debug)]
pub struct ToneParams {
    frequency_bits: AtomicU32,
    gain_bits: AtomicU32,
}

impl ToneParams {
    pub fn new(frequency_hz: f32, gain: f32) -> Self {
        Self {
            frequency_bits: AtomicU32::new(frequency_hz.to_bits()),
            gain_bits: AtomicU32::new(gain.to_bits()),
        }
    }

    pub fn frequency(&self) -> f32 {
        f32::from_bits(self.frequency_bits.load(Ordering::Relaxed))
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain_bits.load(Ordering::Relaxed))
    }

    pub fn set_frequency(&self, hz: f32) {
        if hz.is_finite() && hz > 0.0 {
            self.frequency_bits.store(hz.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn set_gain(&self, gain: f32) {
        let gain = if gain.is_finite() { gain.clamp(0.0, 1.0) } else { 0.0 };
        self.gain_bits.store(gain.to_bits(), Ordering::Relaxed);
    }
}

/// One running tone
pub trait ToneGenerator: Send + Sync {
    fn set_frequency(&self, hz: f32);

    /// Target gain; implementations glide towards it
    fn set_gain(&self, gain: f32);

    fn frequency(&self) -> f32;

    fn gain(&self) -> f32;

    /// Release the audio resources; the generator is unusable afterwards
    fn shutdown(self: Box<Self>);
}

/// Creates tone generators
pub trait ToneOutput: Send + Sync {
    fn open(&self, frequency_hz: f32, gain: f32) -> Result<Box<dyn ToneGenerator>, AudioError>;

    fn name(&self) -> &str;
}

/// Output that only tracks tone parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct NullToneOutput;

struct NullTone {
    params: Arc<ToneParams>,
}

impl ToneGenerator for NullTone {
    fn set_frequency(&self, hz: f32) {
        self.params.set_frequency(hz);
    }

    fn set_gain(&self, gain: f32) {
        self.params.set_gain(gain);
    }

    fn frequency(&self) -> f32 {
        self.params.frequency()
    }

    fn gain(&self) -> f32 {
        self.params.gain()
    }

    fn shutdown(self: Box<Self>) {}
}

impl ToneOutput for NullToneOutput {
    fn open(&self, frequency_hz: f32, gain: f32) -> Result<Box<dyn ToneGenerator>, AudioError> {
        let params = Arc::new(ToneParams::new(frequency_hz, 0.0));
        params.set_gain(gain);
        Ok(Box::new(NullTone { params }))
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Sine oscillator with a short gain glide to avoid clicks
pub struct SineRenderer {
    params: Arc<ToneParams>,
    sample_rate: f32,
    phase: f32,
    current_gain: f32,
    glide: f32,
}

impl SineRenderer {
    /// Gain glide time constant
    const GLIDE_SECS: f32 = 0.01;

    pub fn new(params: Arc<ToneParams>, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        Self {
            params,
            sample_rate,
            phase: 0.0,
            current_gain: 0.0,
            glide: 1.0 - (-1.0 / (sample_rate * Self::GLIDE_SECS)).exp(),
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let target = self.params.gain();
        self.current_gain += (target - self.current_gain) * self.glide;

        let sample = (self.phase * TAU).sin() * self.current_gain;
        self.phase = (self.phase + self.params.frequency() / self.sample_rate).fract();
        sample
    }

    /// Fill a mono buffer
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn current_gain(&self) -> f32 {
        self.current_gain
    }
}
