//! Conversation turns and per-session state

use serde::{Deserialize, Serialize};

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// State of one interactive chat session
///
/// History is append-only for the lifetime of the session. The document
/// text is replaced whenever a new supported file is uploaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    history: Vec<Turn>,
    document: String,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated conversation, oldest first
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Extracted document text, empty when nothing was uploaded
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Whether a non-empty document is loaded
    #[must_use]
    pub fn has_document(&self) -> bool {
        !self.document.is_empty()
    }

    /// Document text if one is loaded
    #[must_use]
    pub fn document_opt(&self) -> Option<&str> {
        self.has_document().then_some(self.document.as_str())
    }

    /// Append a turn to the history
    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    /// Replace the document text
    pub fn set_document(&mut self, text: String) {
        self.document = text;
    }

    /// Assistant turn at `index`, if that index holds one
    #[must_use]
    pub fn assistant_message(&self, index: usize) -> Option<&str> {
        self.history
            .get(index)
            .filter(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.content.as_str())
    }
}
