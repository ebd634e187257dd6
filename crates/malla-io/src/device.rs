//! Realtime audio output via `cpal`.
//!
//! The instrument only ever produces audio; there is no capture path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};

use crate::{Error, Result};

/// A discoverable output audio device.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub name: String,
    pub default_sample_rate: u32,
}

/// Requested realtime stream configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub buffer_size: u32,
    pub output_device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 512,
            output_device: None,
        }
    }
}

pub(crate) fn device_name(device: &Device) -> Result<String> {
    device
        .name()
        .map_err(|e| Error::Stream(e.to_string()))
}

/// List every output device the default host can see.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();
    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                let sample_rate = device
                    .default_output_config()
                    .map(|c| c.sample_rate().0)
                    .unwrap_or(44100);
                devices.push(AudioDevice {
                    name,
                    default_sample_rate: sample_rate,
                });
            }
        }
    }
    Ok(devices)
}

/// The host's default output device, if any.
pub fn default_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    Ok(host.default_output_device().and_then(|d| {
        d.name().ok().map(|name| AudioDevice {
            name,
            default_sample_rate: d
                .default_output_config()
                .map(|c| c.sample_rate().0)
                .unwrap_or(44100),
        })
    }))
}

fn find_output_device(host: &Host, name: Option<&str>) -> Result<Device> {
    match name {
        Some(search) => {
            let search_lower = search.to_lowercase();
            host.output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .find(|d| {
                    device_name(d)
                        .map(|n| n.to_lowercase().contains(&search_lower))
                        .unwrap_or(false)
                })
                .ok_or_else(|| Error::DeviceNotFound(search.to_string()))
        }
        None => host.default_output_device().ok_or(Error::NoDevice),
    }
}

/// A running (or not-yet-started) output-only audio stream.
pub struct AudioStream {
    host: Host,
    output_device: Device,
    config: StreamConfig,
    running: Arc<AtomicBool>,
    _stream: Option<Stream>,
}

impl AudioStream {
    /// Resolve the requested output device and build a (not-yet-playing)
    /// stream handle around it.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let host = cpal::default_host();
        let output_device = find_output_device(&host, config.output_device.as_deref())?;
        Ok(Self {
            host,
            output_device,
            config,
            running: Arc::new(AtomicBool::new(false)),
            _stream: None,
        })
    }

    /// The number of channels the resolved output device's default config
    /// exposes.
    pub fn output_channels(&self) -> u16 {
        self.output_device
            .default_output_config()
            .map(|c| c.channels())
            .unwrap_or(2)
    }

    /// A handle that [`AudioStream::stop`] and an external signal handler
    /// can both observe/clear.
    pub fn running_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Start the output stream, invoking `generate` once per audio-thread
    /// callback to fill the interleaved output buffer. Blocks the calling
    /// thread until [`Self::stop`] is called (or the external running
    /// handle is cleared).
    pub fn run_output<F>(&mut self, mut generate: F) -> Result<()>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let output_config = self
            .output_device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;

        self.running.store(true, Ordering::SeqCst);
        let callback_running = Arc::clone(&self.running);

        let stream = self
            .output_device
            .build_output_stream(
                &output_config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if callback_running.load(Ordering::Relaxed) {
                        generate(data);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| tracing::warn!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            host = self.host.id().name(),
            channels = self.output_channels(),
            "output stream started"
        );
        self._stream = Some(stream);

        while self.running.load(Ordering::SeqCst) {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        Ok(())
    }

    /// Signal the callback to stop and silence further output.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_devices_does_not_panic() {
        assert!(list_devices().is_ok());
    }

    #[test]
    fn default_device_does_not_panic() {
        assert!(default_device().is_ok());
    }

    #[test]
    fn default_stream_config_is_sensible() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert!(config.output_device.is_none());
    }
}
