//! Completion requests against an OpenAI-compatible chat endpoint
//!
//! Both assistants build their requests here. The document chat embeds the
//! full document as a system turn; the voice assistant sends one truncated
//! user turn.

mod client;

pub use client::ChatCompletions;

use async_trait::async_trait;

use crate::Result;
use crate::session::Turn;

/// System turn used when a document is loaded
pub const DOCUMENT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// System turn used when no document is loaded
pub const GENERAL_SYSTEM_PROMPT: &str = "You are a helpful assistant providing general answers.";

/// Longest voice-flow message sent to the model, in characters
pub const VOICE_MESSAGE_LIMIT: usize = 2000;

/// Sends an ordered turn sequence and returns the assistant reply
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Submit `messages` and return the first choice's content
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response has no choices
    async fn complete(&self, messages: &[Turn]) -> Result<String>;
}

/// Build the turn sequence for a completion request
///
/// A non-empty document yields the assistant system turn followed by a
/// document turn. Otherwise a single general-purpose system turn is used.
/// The whole history follows either way.
#[must_use]
pub fn build_messages(document: Option<&str>, history: &[Turn]) -> Vec<Turn> {
    let document = document.filter(|d| !d.is_empty());
    let mut messages = Vec::with_capacity(history.len() + 2);

    match document {
        Some(text) => {
            messages.push(Turn::system(DOCUMENT_SYSTEM_PROMPT));
            messages.push(Turn::system(format!("Here is the document content: {text}")));
        }
        None => messages.push(Turn::system(GENERAL_SYSTEM_PROMPT)),
    }

    messages.extend_from_slice(history);
    messages
}

/// Cut `content` to `max_len` characters and append `...` when longer
///
/// The cut ignores word boundaries.
#[must_use]
pub fn truncate_content(content: &str, max_len: usize) -> String {
    match content.char_indices().nth(max_len) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}

/// Build the single user message the voice assistant sends
#[must_use]
pub fn voice_prompt(action: &str, content: &str) -> String {
    truncate_content(&format!("{action}: {content}"), VOICE_MESSAGE_LIMIT)
}

/// Run a voice-flow action over `content` and return the trimmed reply
///
/// # Errors
///
/// Returns error if the completion request fails
pub async fn process_with_llm(
    client: &dyn CompletionClient,
    content: &str,
    action: &str,
) -> Result<String> {
    let history = [Turn::user(voice_prompt(action, content))];
    let messages = build_messages(None, &history);

    tracing::debug!(action, chars = content.chars().count(), "processing with LLM");
    let reply = client.complete(&messages).await?;
    Ok(reply.trim().to_string())
}
