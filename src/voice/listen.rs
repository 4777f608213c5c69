//! Retrying listener

use super::{ListenError, Listener, Speaker, say};

pub const NOT_UNDERSTOOD_PROMPT: &str = "I couldn't understand that. Please try again.";

pub const NOT_HEARD_PROMPT: &str =
    "I didn't hear anything. Please start speaking as soon as I start listening.";

pub const SERVICE_ERROR_PROMPT: &str =
    "Sorry, there was an error with the speech recognition service.";

/// Listen up to `max_retries` times and return the lowercased transcript
///
/// Unintelligible speech and timeouts are announced and retried. A service
/// error is announced and ends the attempt immediately.
pub async fn listen_with_retries(
    listener: &dyn Listener,
    speaker: &dyn Speaker,
    max_retries: u32,
) -> Option<String> {
    for attempt in 1..=max_retries {
        tracing::debug!(attempt, max_retries, "listening");
        match listener.listen().await {
            Ok(heard) => {
                tracing::info!(heard = %heard, "user said");
                return Some(heard.to_lowercase());
            }
            Err(ListenError::Unintelligible) => say(speaker, NOT_UNDERSTOOD_PROMPT).await,
            Err(ListenError::Timeout) => say(speaker, NOT_HEARD_PROMPT).await,
            Err(ListenError::Service(reason)) => {
                tracing::warn!(reason = %reason, "speech recognition failed");
                say(speaker, SERVICE_ERROR_PROMPT).await;
                return None;
            }
        }
    }

    tracing::debug!("listen retries exhausted");
    None
}
