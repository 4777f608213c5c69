//! Summarizer X - document chat and spoken article assistant
//!
//! Two front ends share one completion layer:
//! - A web chat where a user uploads a PDF, DOCX or text file and then
//!   summarizes, paraphrases, quizzes or asks free questions about it
//! - A voice assistant that fetches an encyclopedia article on a spoken
//!   topic, summarizes, rephrases or translates it, and offers to save or
//!   read the result aloud
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │   Web chat (api, chat)   │   │  Voice assistant (voice) │
//! │ upload │ actions │ export │   │ listen │ article │ speak │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              │                              │
//! ┌────────────▼──────────────────────────────▼─────────────┐
//! │         Completion (OpenAI-compatible chat API)          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod chat;
pub mod clipboard;
pub mod completion;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod session;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
