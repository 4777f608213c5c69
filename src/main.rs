use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use summarizer_x::api::{ApiServer, ApiState};
use summarizer_x::assistant::VoiceAssistant;
use summarizer_x::clipboard::{Clipboard, SystemClipboard};
use summarizer_x::completion::{ChatCompletions, CompletionClient};
use summarizer_x::export::HtmlPdfRenderer;
use summarizer_x::extract::ArticleFetcher;
use summarizer_x::voice::{
    AudioCapture, AudioPlayback, LocalSpeaker, MicrophoneListener, SAMPLE_RATE, SpeechToText,
    Synthesizer, TextToSpeech, tone,
};
use summarizer_x::Config;

/// SummarizerX - document chat and voice article assistant
#[derive(Parser)]
#[command(name = "summarizer", version, about)]
struct Cli {
    /// Port for the chat server (overrides config)
    #[arg(long, env = "SUMMARIZER_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the document chat page and API (default)
    Serve,
    /// Run the spoken article assistant on the local mic and speakers
    Voice,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,summarizer_x=info",
        1 => "info,summarizer_x=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.port).await,
        Command::Voice => voice().await,
        Command::TestMic { duration } => test_mic(duration).await,
        Command::TestSpeaker => test_speaker().await,
        Command::TestTts { text } => test_tts(&text).await,
    }
}

/// Run the chat server until interrupted
async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let completion = match ChatCompletions::new(
        &config.llm,
        config.api_keys.groq.as_ref(),
        &config.llm.chat_model,
    ) {
        Ok(client) => Some(Arc::new(client) as Arc<dyn CompletionClient>),
        Err(e) => {
            tracing::warn!(error = %e, "chat completions disabled");
            None
        }
    };

    let synthesizer = match TextToSpeech::new(&config.voice, config.api_keys.openai.as_ref()) {
        Ok(tts) => Some(Arc::new(tts) as Arc<dyn Synthesizer>),
        Err(e) => {
            tracing::warn!(error = %e, "read aloud disabled");
            None
        }
    };

    let clipboard: Arc<dyn Clipboard> = Arc::new(SystemClipboard);
    let state = ApiState::new(completion)
        .synthesizer(synthesizer)
        .clipboard(Some(clipboard))
        .speech_chunk_size(config.voice.speech_chunk_size);

    let port = port.unwrap_or(config.server.port);
    tracing::info!(port, "summarizer chat ready at http://localhost:{port}");
    ApiServer::new(state, port)
        .session_idle_timeout(config.server.session_idle_timeout)
        .run()
        .await?;
    Ok(())
}

/// Run the voice assistant loop once
async fn voice() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let completion = ChatCompletions::new(
        &config.llm,
        config.api_keys.groq.as_ref(),
        &config.llm.voice_model,
    )?;
    let stt = SpeechToText::new(&config.voice, config.api_keys.openai.as_ref())?;
    let tts = TextToSpeech::new(&config.voice, config.api_keys.openai.as_ref())?;
    let articles = ArticleFetcher::new(&config.article)?;

    let pdf = match HtmlPdfRenderer::new(config.export.wkhtmltopdf.as_deref()) {
        Ok(renderer) => Some(renderer),
        Err(e) => {
            tracing::warn!(error = %e, "PDF saving disabled");
            None
        }
    };

    let assistant = VoiceAssistant::new(
        Arc::new(MicrophoneListener::new(stt, &config.voice)),
        Arc::new(LocalSpeaker::new(
            Arc::new(tts),
            config.voice.speech_chunk_size,
        )),
        Arc::new(articles),
        Arc::new(completion),
    )
    .with_pdf_renderer(pdf)
    .with_output_dir(config.export.output_dir.clone())
    .with_max_retries(config.voice.max_listen_retries);

    tracing::info!("voice assistant ready");
    assistant.run().await;
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {SAMPLE_RATE} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = summarizer_x::voice::rms_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let samples = tone(440.0, Duration::from_secs(2), 0.3);
    println!("Playing {} samples...", samples.len());

    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play(samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl list sinks short");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS output
async fn test_tts(text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load()?;
    let tts = TextToSpeech::new(&config.voice, config.api_keys.openai.as_ref())?;

    println!("Synthesizing speech...");
    let mp3 = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3.len());

    println!("Playing audio...");
    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3(&mp3)).await??;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
