//! Microphone capture for answer recording
//!
//! Captures mono 16kHz audio into a shared buffer and detects the end of
//! a single utterance by energy: once enough speech has been followed by
//! enough silence, the utterance is complete.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Minimum audio energy to count as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech length for a usable utterance (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends an utterance (0.5s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Captures audio from the default input device
pub struct AudioCapture {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device at the speech sample rate
    ///
    /// # Errors
    ///
    /// Returns error if no suitable input device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable capture config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone initialized"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing into the shared buffer
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let stream = device
            .build_input_stream(
                &self.config.clone(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "capture stream error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("capture started");
        Ok(())
    }

    /// Stop capturing
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("capture stopped");
        }
    }

    /// Take the captured samples, clearing the buffer
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Samples captured so far, without clearing
    #[must_use]
    pub fn peek_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Whether a capture stream is running
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }
}

/// Tracks energy across incoming samples to find the end of a single
/// utterance
#[derive(Debug, Default)]
pub struct Endpointer {
    speech_samples: usize,
    silence_run: usize,
}

impl Endpointer {
    /// Create a fresh endpointer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a block of samples; returns true once the utterance is over
    pub fn feed(&mut self, samples: &[f32]) -> bool {
        let energy = rms_energy(samples);

        if energy > ENERGY_THRESHOLD {
            self.speech_samples += samples.len();
            self.silence_run = 0;
        } else {
            self.silence_run += samples.len();
        }

        self.is_complete()
    }

    /// Whether enough speech followed by enough silence has been seen
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.speech_samples > MIN_SPEECH_SAMPLES && self.silence_run > SILENCE_SAMPLES
    }

    /// Whether any speech has been seen yet
    #[must_use]
    pub const fn heard_speech(&self) -> bool {
        self.speech_samples > 0
    }

    /// Reset for a new utterance
    pub fn reset(&mut self) {
        self.speech_samples = 0;
        self.silence_run = 0;
    }
}

/// RMS energy of a sample block
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Encode f32 samples as 16-bit WAV bytes for STT upload
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(duration_secs: f32, amplitude: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration_secs) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect()
    }

    fn silence(duration_secs: f32) -> Vec<f32> {
        vec![0.0; (SAMPLE_RATE as f32 * duration_secs) as usize]
    }

    #[test]
    fn energy_separates_speech_from_silence() {
        assert!(rms_energy(&silence(0.1)) < ENERGY_THRESHOLD);
        assert!(rms_energy(&tone(0.1, 0.3)) > ENERGY_THRESHOLD);
        assert!(rms_energy(&[]) < f32::EPSILON);
    }

    #[test]
    fn endpointer_requires_speech_then_silence() {
        let mut ep = Endpointer::new();

        // Silence alone never completes
        assert!(!ep.feed(&silence(1.0)));
        assert!(!ep.heard_speech());

        // Speech without trailing silence doesn't complete
        assert!(!ep.feed(&tone(0.5, 0.3)));
        assert!(ep.heard_speech());

        // Trailing silence completes the utterance
        assert!(ep.feed(&silence(0.6)));
        assert!(ep.is_complete());
    }

    #[test]
    fn endpointer_ignores_short_blips() {
        let mut ep = Endpointer::new();
        ep.feed(&tone(0.1, 0.3)); // below MIN_SPEECH_SAMPLES
        assert!(!ep.feed(&silence(1.0)));
    }

    #[test]
    fn endpointer_reset_starts_over() {
        let mut ep = Endpointer::new();
        ep.feed(&tone(0.5, 0.3));
        ep.feed(&silence(0.6));
        assert!(ep.is_complete());

        ep.reset();
        assert!(!ep.is_complete());
        assert!(!ep.heard_speech());
    }

    #[test]
    fn wav_encoding_round_trips() {
        let original: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0];
        let wav = samples_to_wav(&original, SAMPLE_RATE).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        let decoded: Vec<i16> = reader.samples::<i16>().map(std::result::Result::unwrap).collect();
        assert_eq!(decoded.len(), original.len());
    }
}
