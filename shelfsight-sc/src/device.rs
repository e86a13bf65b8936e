//! Tone output on the system audio device (cpal)
//!
//! cpal streams are not `Send`, so each tone owns a dedicated thread that
//! builds the stream, keeps it alive and drops it on shutdown.

use crate::error::AudioError;
use crate::tone::{SineRenderer, ToneGenerator, ToneOutput, ToneParams};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info};

/// Opens tones on an output device
pub struct DeviceToneOutput {
    device_name: Option<String>,
}

impl DeviceToneOutput {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    fn find_device(host: &Host, name: Option<&str>) -> Result<Device, AudioError> {
        const MAX_DEVICES_TO_CHECK: usize = 100;

        match name {
            Some(name) => {
                let devices = host
                    .output_devices()
                    .map_err(|e| AudioError::Device(format!("Failed to enumerate devices: {}", e)))?;
                devices
                    .take(MAX_DEVICES_TO_CHECK)
                    .find(|d| d.name().map(|n| n == name || n.contains(name)).unwrap_or(false))
                    .ok_or_else(|| AudioError::Device(format!("Output device '{}' not found", name)))
            }
            None => host
                .default_output_device()
                .ok_or_else(|| AudioError::Device("No output device available".to_string())),
        }
    }

    fn build_stream(device_name: Option<&str>, params: Arc<ToneParams>) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = Self::find_device(&host, device_name)?;
        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Device(format!("Failed to get output config: {}", e)))?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(AudioError::Format(format!(
                "Unsupported sample format {:?}",
                supported.sample_format()
            )));
        }

        let config = supported.config();
        let channels = config.channels.max(1) as usize;
        let mut renderer = SineRenderer::new(params, config.sample_rate.0);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let sample = renderer.next_sample();
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                },
                move |err| {
                    error!("Audio output stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::Output(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::Output(format!("Failed to start stream: {}", e)))?;
        Ok(stream)
    }
}

struct DeviceTone {
    params: Arc<ToneParams>,
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ToneGenerator for DeviceTone {
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

    fn shutdown(self: Box<Self>) {
        self.running.store(false, Ordering::Release);
        self.thread.thread().unpark();
    }
}

impl ToneOutput for DeviceToneOutput {
    fn open(&self, frequency_hz: f32, gain: f32) -> Result<Box<dyn ToneGenerator>, AudioError> {
        let params = Arc::new(ToneParams::new(frequency_hz, 0.0));
        params.set_gain(gain);
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_params = params.clone();
        let thread_running = running.clone();
        let device_name = self.device_name.clone();
        let thread = std::thread::Builder::new()
            .name("shelfsight-tone".to_string())
            .spawn(move || match Self::build_stream(device_name.as_deref(), thread_params) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    while thread_running.load(Ordering::Acquire) {
                        std::thread::park_timeout(Duration::from_millis(50));
                    }
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        ready_rx
            .recv()
            .map_err(|_| AudioError::Output("Tone thread exited before starting".to_string()))??;
        info!("Tone output opened at {} Hz", frequency_hz);

        Ok(Box::new(DeviceTone {
            params,
            running,
            thread,
        }))
    }

    fn name(&self) -> &str {
        "device"
    }
}
