//! Configuration management for SummarizerX

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::Result;
use file::ConfigFile;

/// Default OpenAI-compatible completion endpoint (Groq)
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Model used by the document chat
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

/// Model used by the voice assistant
pub const DEFAULT_VOICE_MODEL: &str = "llama3-8b-8192";

/// Default STT/TTS endpoint
pub const DEFAULT_AUDIO_BASE_URL: &str = "https://api.openai.com/v1";

/// Default encyclopedia article root
pub const DEFAULT_ARTICLE_BASE_URL: &str = "https://en.wikipedia.org/wiki";

/// Characters per spoken chunk
pub const DEFAULT_SPEECH_CHUNK_SIZE: usize = 150;

/// Idle time after which an abandoned chat session is dropped
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(60 * 60);

/// SummarizerX configuration
#[derive(Debug)]
pub struct Config {
    /// Completion endpoint configuration
    pub llm: LlmConfig,

    /// Voice processing configuration
    pub voice: VoiceConfig,

    /// Article source configuration
    pub article: ArticleConfig,

    /// Export configuration
    pub export: ExportConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Completion endpoint configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,

    /// Model identifier for the document chat
    pub chat_model: String,

    /// Model identifier for the voice assistant
    pub voice_model: String,

    /// Request timeout
    pub timeout: Duration,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Base URL for STT/TTS endpoints
    pub audio_base_url: String,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// Characters per spoken chunk
    pub speech_chunk_size: usize,

    /// Listen attempts before the loop gives up
    pub max_listen_retries: u32,

    /// How long to wait for speech to start
    pub listen_timeout: Duration,

    /// Maximum length of a single phrase
    pub phrase_time_limit: Duration,
}

/// Article source configuration
#[derive(Debug, Clone)]
pub struct ArticleConfig {
    /// Root URL topics are appended to
    pub base_url: String,

    /// Fetch timeout
    pub timeout: Duration,
}

/// Export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory voice-flow exports are written to
    pub output_dir: PathBuf,

    /// Explicit `wkhtmltopdf` path; looked up on `PATH` when absent
    pub wkhtmltopdf: Option<PathBuf>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Sessions untouched this long are dropped
    pub session_idle_timeout: Duration,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// Groq API key (completion endpoint)
    pub groq: Option<SecretString>,

    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<SecretString>,
}

impl Config {
    /// Load configuration from the environment and the optional TOML file
    ///
    /// # Errors
    ///
    /// Returns error if a numeric environment override is malformed
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    ///
    /// Precedence is env > toml > default.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric environment override is malformed
    pub fn from_sources(fc: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_keys = ApiKeys {
            groq: env("GROQ_API_KEY").or(fc.api_keys.groq).map(SecretString::from),
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .map(SecretString::from),
        };

        let llm = LlmConfig {
            base_url: env("SUMMARIZER_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            chat_model: env("SUMMARIZER_CHAT_MODEL")
                .or(fc.llm.chat_model)
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            voice_model: env("SUMMARIZER_VOICE_MODEL")
                .or(fc.llm.voice_model)
                .unwrap_or_else(|| DEFAULT_VOICE_MODEL.to_string()),
            timeout: Duration::from_secs(fc.llm.timeout_secs.unwrap_or(60)),
        };

        let voice = VoiceConfig {
            audio_base_url: fc
                .voice
                .audio_base_url
                .unwrap_or_else(|| DEFAULT_AUDIO_BASE_URL.to_string()),
            stt_model: env("SUMMARIZER_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: env("SUMMARIZER_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: env("SUMMARIZER_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            tts_speed: parse_env(&env, "SUMMARIZER_TTS_SPEED")?
                .or(fc.voice.tts_speed)
                .unwrap_or(1.0),
            speech_chunk_size: parse_env(&env, "SUMMARIZER_SPEECH_CHUNK")?
                .or(fc.voice.speech_chunk_size)
                .unwrap_or(DEFAULT_SPEECH_CHUNK_SIZE),
            max_listen_retries: fc.voice.max_listen_retries.unwrap_or(3),
            listen_timeout: Duration::from_secs(fc.voice.listen_timeout_secs.unwrap_or(5)),
            phrase_time_limit: Duration::from_secs(fc.voice.phrase_time_limit_secs.unwrap_or(7)),
        };

        let article = ArticleConfig {
            base_url: env("SUMMARIZER_ARTICLE_BASE_URL")
                .or(fc.article.base_url)
                .unwrap_or_else(|| DEFAULT_ARTICLE_BASE_URL.to_string()),
            timeout: Duration::from_secs(fc.article.timeout_secs.unwrap_or(30)),
        };

        let export = ExportConfig {
            output_dir: env("SUMMARIZER_OUTPUT_DIR")
                .or(fc.export.output_dir)
                .map_or_else(|| PathBuf::from("."), PathBuf::from),
            wkhtmltopdf: env("SUMMARIZER_WKHTMLTOPDF")
                .or(fc.export.wkhtmltopdf)
                .map(PathBuf::from),
        };

        let server = ServerConfig {
            port: parse_env(&env, "SUMMARIZER_PORT")?
                .or(fc.server.port)
                .unwrap_or(8501),
            session_idle_timeout: parse_env(&env, "SUMMARIZER_SESSION_IDLE_SECS")?
                .or(fc.server.session_idle_secs)
                .map_or(DEFAULT_SESSION_IDLE, Duration::from_secs),
        };

        if api_keys.groq.is_none() {
            tracing::warn!("GROQ_API_KEY not set, completion requests will fail");
        }

        Ok(Self {
            llm,
            voice,
            article,
            export,
            server,
            api_keys,
        })
    }
}

fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| crate::Error::Config(format!("invalid value for {key}: {raw}")))
        })
        .transpose()
}
