//! Error types for SummarizerX

use thiserror::Error;

/// Result type alias for SummarizerX operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in SummarizerX
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Document or article extraction error
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Completion endpoint error
    #[error("completion error: {0}")]
    Completion(String),

    /// Action needs an uploaded document
    #[error("no document uploaded")]
    NoDocument,

    /// Prompt was empty after trimming
    #[error("prompt is empty")]
    EmptyPrompt,

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Export (TXT/DOCX/PDF) error
    #[error("export error: {0}")]
    Export(String),

    /// Clipboard error
    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// Session not found
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Message index not found or not an assistant turn
    #[error("message not found: {0}")]
    MessageNotFound(usize),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
