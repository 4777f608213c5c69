//! Voice input and output
//!
//! The assistant talks to audio through three narrow ports: a [`Listener`]
//! that turns one spoken phrase into text, a [`Speaker`] that reads text
//! aloud, and a [`Synthesizer`] that turns text into MP3 bytes. Local
//! implementations use the default microphone and speakers with remote
//! STT/TTS endpoints.

mod listen;
mod microphone;
mod playback;
mod segmenter;
mod speech;
mod stt;
mod tts;

pub use listen::{
    NOT_HEARD_PROMPT, NOT_UNDERSTOOD_PROMPT, SERVICE_ERROR_PROMPT, listen_with_retries,
};
pub use microphone::{AudioCapture, MicrophoneListener, SAMPLE_RATE, record_phrase, samples_to_wav};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3, tone};
pub use segmenter::{PhraseSegmenter, SegmentState, rms_energy};
pub use speech::{LocalSpeaker, speech_chunks, synthesize_chunked};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;

use async_trait::async_trait;
use thiserror::Error;

use crate::Result;

/// Why a single listen attempt produced no text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenError {
    /// Audio was captured but could not be transcribed to words
    #[error("speech was unintelligible")]
    Unintelligible,

    /// Nobody started speaking before the timeout
    #[error("no speech before timeout")]
    Timeout,

    /// The recognizer or audio device failed
    #[error("speech service error: {0}")]
    Service(String),
}

/// Captures one spoken phrase and returns its transcript
#[async_trait]
pub trait Listener: Send + Sync {
    /// Listen for a single phrase
    ///
    /// # Errors
    ///
    /// Returns [`ListenError`] when no transcript was produced
    async fn listen(&self) -> std::result::Result<String, ListenError>;
}

/// Reads text aloud
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Converts text to encoded speech audio
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` into MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the TTS request fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Speak `text` and log instead of failing
pub async fn say(speaker: &dyn Speaker, text: &str) {
    tracing::info!(text, "speaking");
    if let Err(e) = speaker.speak(text).await {
        tracing::warn!(error = %e, "failed to speak");
    }
}
