//! Document chat actions
//!
//! Handlers take the session state by value and hand it back together with
//! the outcome, so the caller always owns the latest state.

use std::fmt;

use crate::completion::{CompletionClient, build_messages};
use crate::session::{SessionState, Turn};
use crate::{Error, Result};

/// Label shown when a free-text prompt fails
pub const PROMPT_ERROR_LABEL: &str = "Error processing the question";

/// Canned document actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Summarize,
    Paraphrase,
    Quiz,
}

impl ChatAction {
    /// Parse the route name of an action
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "summarize" => Some(Self::Summarize),
            "paraphrase" => Some(Self::Paraphrase),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Paraphrase => "paraphrase",
            Self::Quiz => "quiz",
        }
    }

    /// User turn appended when the action runs
    #[must_use]
    pub const fn instruction(self) -> &'static str {
        match self {
            Self::Summarize => "Summarize the uploaded content.",
            Self::Paraphrase => "Paraphrase the uploaded content.",
            Self::Quiz => "Generate quiz questions from the uploaded content.",
        }
    }

    /// User-facing label for a failed run
    #[must_use]
    pub const fn error_label(self) -> &'static str {
        match self {
            Self::Summarize => "Error generating summary",
            Self::Paraphrase => "Error generating paraphrase",
            Self::Quiz => "Error generating quiz",
        }
    }
}

/// A failed chat step with the label to show the user
#[derive(Debug)]
pub struct ChatFailure {
    pub label: &'static str,
    pub error: Error,
}

impl fmt::Display for ChatFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.error)
    }
}

impl std::error::Error for ChatFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Reply text or a labelled failure
pub type ChatOutcome = std::result::Result<String, ChatFailure>;

/// Run a canned action against the loaded document
///
/// Without a document the state is returned untouched with
/// [`Error::NoDocument`].
pub async fn run_action(
    state: SessionState,
    action: ChatAction,
    client: &dyn CompletionClient,
) -> (SessionState, ChatOutcome) {
    if !state.has_document() {
        return (
            state,
            Err(ChatFailure {
                label: action.error_label(),
                error: Error::NoDocument,
            }),
        );
    }

    tracing::info!(action = action.name(), "running document action");
    exchange(state, action.instruction(), action.error_label(), client).await
}

/// Send the user's own prompt, with or without a document loaded
pub async fn send_prompt(
    state: SessionState,
    text: &str,
    client: &dyn CompletionClient,
) -> (SessionState, ChatOutcome) {
    if text.trim().is_empty() {
        return (
            state,
            Err(ChatFailure {
                label: PROMPT_ERROR_LABEL,
                error: Error::EmptyPrompt,
            }),
        );
    }

    exchange(state, text, PROMPT_ERROR_LABEL, client).await
}

async fn exchange(
    mut state: SessionState,
    user_text: &str,
    label: &'static str,
    client: &dyn CompletionClient,
) -> (SessionState, ChatOutcome) {
    state.push(Turn::user(user_text));

    match complete(&state, client).await {
        Ok(reply) => {
            state.push(Turn::assistant(reply.clone()));
            (state, Ok(reply))
        }
        Err(error) => {
            tracing::warn!(error = %error, label, "completion failed");
            (state, Err(ChatFailure { label, error }))
        }
    }
}

async fn complete(state: &SessionState, client: &dyn CompletionClient) -> Result<String> {
    let messages = build_messages(state.document_opt(), state.history());
    tracing::debug!(turns = messages.len(), "sending completion request");
    client.complete(&messages).await
}
