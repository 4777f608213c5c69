//! Voice-driven article assistant
//!
//! A spoken menu loop: pick a mode, name a topic, have the article processed
//! by the model, then hear or save the result. Each [`VoiceState`] speaks its
//! prompt, listens once through the retrying listener and yields the next
//! state.

use std::path::PathBuf;
use std::sync::Arc;

use crate::completion::{CompletionClient, process_with_llm};
use crate::export::{HtmlPdfRenderer, save_word};
use crate::extract::ArticleSource;
use crate::voice::{Listener, Speaker, listen_with_retries, say};
use crate::{Error, Result};

pub const MENU_PROMPT: &str = "Welcome to Summarizer X. What do you want to explore? Summarizer, Rephraser, or Translation?";
pub const NO_CONTENT_PROMPT: &str = "Sorry, I couldn't find meaningful content on that topic.";
pub const INVALID_CHOICE_PROMPT: &str = "Invalid choice. Please restart and try again.";
pub const LANGUAGE_PROMPT: &str = "Please specify the language to translate into.";
pub const NO_LANGUAGE_PROMPT: &str = "Translation language not specified. Exiting.";
pub const POST_ACTION_PROMPT: &str =
    "Would you like to read it aloud, download as PDF, or save as a Word document?";
pub const CONTINUE_PROMPT: &str =
    "Do you want to explore something else? Say yes to continue or no to exit.";
pub const PROCESSING_FAILED_PROMPT: &str = "Sorry, I couldn't process that request.";
pub const GOODBYE_PROMPT: &str = "Thank you for using Summarizer X. Goodbye.";

/// File stem for voice-flow exports
const OUTPUT_STEM: &str = "output";

/// What the user asked the assistant to do with an article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Summarizer,
    Rephraser,
    Translation,
}

impl Mode {
    /// Match a heard menu choice by substring
    #[must_use]
    pub fn parse(heard: &str) -> Option<Self> {
        if heard.contains("summarizer") {
            Some(Self::Summarizer)
        } else if heard.contains("rephraser") {
            Some(Self::Rephraser)
        } else if heard.contains("translation") {
            Some(Self::Translation)
        } else {
            None
        }
    }

    /// Instruction prefix sent to the model
    ///
    /// Translation needs a target language and yields `None`; see
    /// [`translate_action`].
    #[must_use]
    pub const fn action(self) -> Option<&'static str> {
        match self {
            Self::Summarizer => Some("summarize"),
            Self::Rephraser => Some("rephrase"),
            Self::Translation => None,
        }
    }
}

/// Instruction prefix for translating into `language`
#[must_use]
pub fn translate_action(language: &str) -> String {
    format!("translate to {language}")
}

/// Step of the spoken conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceState {
    AwaitMenuChoice,
    AwaitTopic {
        choice: String,
        mode: Option<Mode>,
    },
    AwaitLanguage {
        article: String,
    },
    AwaitPostAction {
        result: String,
    },
    AwaitContinueDecision,
    Finished,
}

/// Runs the voice loop over injected collaborators
pub struct VoiceAssistant {
    listener: Arc<dyn Listener>,
    speaker: Arc<dyn Speaker>,
    articles: Arc<dyn ArticleSource>,
    completion: Arc<dyn CompletionClient>,
    pdf: Option<HtmlPdfRenderer>,
    output_dir: PathBuf,
    max_retries: u32,
}

impl VoiceAssistant {
    #[must_use]
    pub fn new(
        listener: Arc<dyn Listener>,
        speaker: Arc<dyn Speaker>,
        articles: Arc<dyn ArticleSource>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            listener,
            speaker,
            articles,
            completion,
            pdf: None,
            output_dir: PathBuf::from("."),
            max_retries: 3,
        }
    }

    /// Renderer used for "download as PDF"
    #[must_use]
    pub fn with_pdf_renderer(mut self, renderer: Option<HtmlPdfRenderer>) -> Self {
        self.pdf = renderer;
        self
    }

    /// Directory saved files are written to
    #[must_use]
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Run until the user exits or stops answering
    pub async fn run(&self) {
        let mut state = VoiceState::AwaitMenuChoice;
        while state != VoiceState::Finished {
            tracing::debug!(?state, "voice step");
            state = self.step(state).await;
        }
        self.say(GOODBYE_PROMPT).await;
        tracing::info!("voice session finished");
    }

    /// Perform one state's prompt, listen and side effects
    pub async fn step(&self, state: VoiceState) -> VoiceState {
        match state {
            VoiceState::AwaitMenuChoice => self.menu().await,
            VoiceState::AwaitTopic { choice, mode } => self.topic(&choice, mode).await,
            VoiceState::AwaitLanguage { article } => self.language(&article).await,
            VoiceState::AwaitPostAction { result } => self.post_action(&result).await,
            VoiceState::AwaitContinueDecision => self.continue_decision().await,
            VoiceState::Finished => VoiceState::Finished,
        }
    }

    async fn menu(&self) -> VoiceState {
        self.say(MENU_PROMPT).await;
        match self.listen().await {
            Some(choice) => {
                let mode = Mode::parse(&choice);
                VoiceState::AwaitTopic { choice, mode }
            }
            None => VoiceState::Finished,
        }
    }

    async fn topic(&self, choice: &str, mode: Option<Mode>) -> VoiceState {
        self.say(&format!("You chose {choice}. Please specify the topic."))
            .await;
        let Some(topic) = self.listen().await else {
            return VoiceState::Finished;
        };

        let article = match self.articles.fetch(&topic).await {
            Ok(article) => article,
            Err(e) => {
                tracing::warn!(error = %e, topic, "article fetch failed");
                self.say(NO_CONTENT_PROMPT).await;
                return VoiceState::AwaitContinueDecision;
            }
        };
        if article.contains("Sorry") {
            self.say(NO_CONTENT_PROMPT).await;
            return VoiceState::AwaitContinueDecision;
        }

        match mode {
            None => {
                self.say(INVALID_CHOICE_PROMPT).await;
                VoiceState::Finished
            }
            Some(mode) => match mode.action() {
                Some(action) => self.process(&article, action).await,
                None => VoiceState::AwaitLanguage { article },
            },
        }
    }

    async fn language(&self, article: &str) -> VoiceState {
        self.say(LANGUAGE_PROMPT).await;
        match self.listen().await {
            Some(language) => self.process(article, &translate_action(&language)).await,
            None => {
                self.say(NO_LANGUAGE_PROMPT).await;
                VoiceState::Finished
            }
        }
    }

    async fn process(&self, article: &str, action: &str) -> VoiceState {
        match process_with_llm(self.completion.as_ref(), article, action).await {
            Ok(result) => VoiceState::AwaitPostAction { result },
            Err(e) => {
                tracing::warn!(error = %e, action, "processing failed");
                self.say(PROCESSING_FAILED_PROMPT).await;
                VoiceState::AwaitContinueDecision
            }
        }
    }

    async fn post_action(&self, result: &str) -> VoiceState {
        self.say(POST_ACTION_PROMPT).await;
        if let Some(option) = self.listen().await {
            if option.contains("pdf") {
                match self.save_pdf(result).await {
                    Ok(path) => self.say(&format!("PDF saved as {}", path.display())).await,
                    Err(e) => self.report_failure("pdf", &e).await,
                }
            }
            if option.contains("word") {
                match self.save_word(result).await {
                    Ok(path) => {
                        self.say(&format!("Word document saved as {}", path.display()))
                            .await;
                    }
                    Err(e) => self.report_failure("word", &e).await,
                }
            }
            if option.contains("read aloud") {
                self.say(result).await;
            }
        }
        VoiceState::AwaitContinueDecision
    }

    async fn continue_decision(&self) -> VoiceState {
        self.say(CONTINUE_PROMPT).await;
        match self.listen().await {
            Some(answer) if answer.contains("no") => VoiceState::Finished,
            _ => VoiceState::AwaitMenuChoice,
        }
    }

    async fn save_pdf(&self, content: &str) -> Result<PathBuf> {
        let renderer = self
            .pdf
            .clone()
            .ok_or_else(|| Error::Export("wkhtmltopdf is not available".to_string()))?;
        let (content, dir) = (content.to_string(), self.output_dir.clone());
        tokio::task::spawn_blocking(move || renderer.save_pdf(&content, &dir, OUTPUT_STEM))
            .await
            .map_err(|e| Error::Export(e.to_string()))?
    }

    async fn save_word(&self, content: &str) -> Result<PathBuf> {
        let (content, dir) = (content.to_string(), self.output_dir.clone());
        tokio::task::spawn_blocking(move || save_word(&content, &dir, OUTPUT_STEM))
            .await
            .map_err(|e| Error::Export(e.to_string()))?
    }

    async fn report_failure(&self, what: &str, error: &Error) {
        tracing::warn!(error = %error, what, "save failed");
        self.say(&format!("Sorry, I couldn't save the {what} file."))
            .await;
    }

    async fn say(&self, text: &str) {
        say(self.speaker.as_ref(), text).await;
    }

    async fn listen(&self) -> Option<String> {
        listen_with_retries(
            self.listener.as_ref(),
            self.speaker.as_ref(),
            self.max_retries,
        )
        .await
    }
}
