//! Text-to-speech (TTS) through an `OpenAI`-compatible endpoint

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::Synthesizer;
use crate::config::VoiceConfig;
use crate::{Error, Result};

/// Synthesizes MP3 speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    voice: String,
    speed: f64,
}

#[derive(serde::Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f64,
    response_format: &'static str,
}

impl TextToSpeech {
    /// Create a TTS client from the voice configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or empty
    pub fn new(config: &VoiceConfig, api_key: Option<&SecretString>) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.expose_secret())
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::from(k.to_string()))
            .ok_or_else(|| Error::Config("OPENAI_API_KEY required for TTS".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.audio_base_url.trim_end_matches('/').to_string(),
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            speed: config.tts_speed.clamp(0.25, 4.0),
        })
    }
}

#[async_trait]
impl Synthesizer for TextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Tts(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Tts(e.to_string()))?;
        tracing::debug!(chars = text.len(), bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}
