//! Microphone capture and the local speech listener

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use super::segmenter::{PhraseSegmenter, rms_energy};
use super::{ListenError, Listener, SpeechToText};
use crate::config::VoiceConfig;
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// How long the ambient noise level is sampled before listening
const CALIBRATION: Duration = Duration::from_millis(500);

/// Interval between buffer drains while waiting for a phrase
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Speech must be this much louder than the ambient level
const AMBIENT_FACTOR: f32 = 1.5;

/// Captures mono audio from the default input device
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device at [`SAMPLE_RATE`]
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports mono 16kHz capture
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no mono 16kHz input config".to_string()))?
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone opened"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start filling the buffer from the microphone
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| tracing::error!(error = %err, "microphone stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop the input stream
    pub fn stop(&mut self) {
        self.stream = None;
    }

    /// Drain the samples captured since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

/// Record one phrase from the microphone
///
/// Samples ambient noise first, then waits up to `timeout` for speech to
/// start. Recording ends on trailing silence or once `phrase_limit` of audio
/// has been captured. Returns `None` if nobody spoke before the timeout.
///
/// # Errors
///
/// Returns error if the microphone cannot be opened
pub fn record_phrase(timeout: Duration, phrase_limit: Duration) -> Result<Option<Vec<f32>>> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;

    std::thread::sleep(CALIBRATION);
    let ambient = rms_energy(&capture.take_buffer());
    let mut segmenter = PhraseSegmenter::with_ambient(ambient * AMBIENT_FACTOR);
    tracing::debug!(ambient, threshold = segmenter.threshold(), "listening");

    let limit_samples = duration_samples(phrase_limit);
    let started = Instant::now();

    loop {
        std::thread::sleep(POLL_INTERVAL);

        if segmenter.push(&capture.take_buffer()) {
            break;
        }
        if segmenter.is_speaking() {
            if segmenter.len() >= limit_samples {
                tracing::debug!("phrase time limit reached");
                break;
            }
        } else if started.elapsed() >= timeout {
            capture.stop();
            return Ok(None);
        }
    }

    capture.stop();
    Ok(Some(segmenter.into_samples()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_samples(duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

/// Convert f32 samples to 16-bit mono WAV bytes
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
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let pcm = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(pcm)
            .map_err(|e| Error::Audio(e.to_string()))?;
    }
    writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;

    Ok(cursor.into_inner())
}

/// Listens on the default microphone and transcribes with Whisper
pub struct MicrophoneListener {
    stt: SpeechToText,
    timeout: Duration,
    phrase_limit: Duration,
}

impl MicrophoneListener {
    #[must_use]
    pub fn new(stt: SpeechToText, config: &VoiceConfig) -> Self {
        Self {
            stt,
            timeout: config.listen_timeout,
            phrase_limit: config.phrase_time_limit,
        }
    }
}

#[async_trait]
impl Listener for MicrophoneListener {
    async fn listen(&self) -> std::result::Result<String, ListenError> {
        let (timeout, phrase_limit) = (self.timeout, self.phrase_limit);
        let recorded = tokio::task::spawn_blocking(move || record_phrase(timeout, phrase_limit))
            .await
            .map_err(|e| ListenError::Service(e.to_string()))?
            .map_err(|e| ListenError::Service(e.to_string()))?;

        let Some(samples) = recorded else {
            return Err(ListenError::Timeout);
        };

        let wav = samples_to_wav(&samples, SAMPLE_RATE)
            .map_err(|e| ListenError::Service(e.to_string()))?;
        let transcript = self
            .stt
            .transcribe(&wav)
            .await
            .map_err(|e| ListenError::Service(e.to_string()))?;

        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(ListenError::Unintelligible);
        }

        tracing::info!(transcript, "heard");
        Ok(transcript.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_header() {
        let wav = samples_to_wav(&[0.0, 0.5, -0.5, 1.0], SAMPLE_RATE).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn test_wav_clamps_out_of_range_samples() {
        let wav = samples_to_wav(&[2.0, -2.0], SAMPLE_RATE).unwrap();
        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_duration_samples() {
        assert_eq!(duration_samples(Duration::from_secs(7)), 112_000);
        assert_eq!(duration_samples(Duration::from_millis(500)), 8000);
    }
}
