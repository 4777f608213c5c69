//! TOML configuration file loading
//!
//! Supports `~/.config/summarizer-x/config.toml` as a persistent config source.
//! All fields are optional. The file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Completion endpoint configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Encyclopedia article source
    #[serde(default)]
    pub article: ArticleFileConfig,

    /// Export configuration
    #[serde(default)]
    pub export: ExportFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Completion endpoint configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// OpenAI-compatible base URL (e.g. `https://api.groq.com/openai/v1`)
    pub base_url: Option<String>,

    /// Model used by the document chat
    pub chat_model: Option<String>,

    /// Model used by the voice assistant
    pub voice_model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Base URL for the STT/TTS endpoints
    pub audio_base_url: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,

    /// Characters per spoken chunk
    pub speech_chunk_size: Option<usize>,

    /// Listen attempts before giving up
    pub max_listen_retries: Option<u32>,

    /// Seconds to wait for speech to start
    pub listen_timeout_secs: Option<u64>,

    /// Maximum seconds of a single phrase
    pub phrase_time_limit_secs: Option<u64>,
}

/// Article source configuration
#[derive(Debug, Default, Deserialize)]
pub struct ArticleFileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Export configuration
#[derive(Debug, Default, Deserialize)]
pub struct ExportFileConfig {
    /// Directory voice-flow exports are written to
    pub output_dir: Option<String>,

    /// Path to the `wkhtmltopdf` binary
    pub wkhtmltopdf: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub groq: Option<String>,
    pub openai: Option<String>,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Seconds before an idle chat session is dropped
    pub session_idle_secs: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config_file(&content).unwrap_or_else(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config file, using defaults"
            );
            ConfigFile::default()
        }),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the TOML is malformed
pub fn parse_config_file(content: &str) -> crate::Result<ConfigFile> {
    let config = toml::from_str(content)?;
    tracing::info!("loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/summarizer-x/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("summarizer-x").join("config.toml"))
}
