//! Shared test doubles
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use summarizer_x::clipboard::Clipboard;
use summarizer_x::completion::CompletionClient;
use summarizer_x::extract::ArticleSource;
use summarizer_x::session::Turn;
use summarizer_x::voice::{ListenError, Listener, Speaker, Synthesizer};
use summarizer_x::{Error, Result};

/// Completion client that replays scripted replies and records requests
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(Error::Completion(message.to_string()))])
    }

    /// Every request sent so far, oldest first
    pub fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, messages: &[Turn]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Completion client that never answers within a test's lifetime
pub struct StalledCompletion;

#[async_trait]
impl CompletionClient for StalledCompletion {
    async fn complete(&self, _messages: &[Turn]) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok("too late".to_string())
    }
}

/// Listener that replays scripted results, timing out once exhausted
pub struct ScriptedListener(Mutex<VecDeque<std::result::Result<String, ListenError>>>);

impl ScriptedListener {
    pub fn new(script: Vec<std::result::Result<String, ListenError>>) -> Self {
        Self(Mutex::new(script.into()))
    }

    /// Script where every listen is heard
    pub fn hearing(phrases: &[&str]) -> Self {
        Self::new(phrases.iter().map(|p| Ok((*p).to_string())).collect())
    }
}

#[async_trait]
impl Listener for ScriptedListener {
    async fn listen(&self) -> std::result::Result<String, ListenError> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ListenError::Timeout))
    }
}

/// Speaker that records everything said
#[derive(Default)]
pub struct RecordingSpeaker(Mutex<Vec<String>>);

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Clipboard that keeps the last copied text
#[derive(Default)]
pub struct MemoryClipboard(Mutex<Option<String>>);

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        *self.0.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

/// Article source returning the same text for every topic
pub struct StaticArticles {
    text: String,
    topics: Mutex<Vec<String>>,
}

impl StaticArticles {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            topics: Mutex::new(Vec::new()),
        }
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleSource for StaticArticles {
    async fn fetch(&self, topic: &str) -> Result<String> {
        self.topics.lock().unwrap().push(topic.to_string());
        Ok(self.text.clone())
    }
}

/// Synthesizer returning fixed bytes
pub struct FakeSynthesizer;

pub const FAKE_MP3: &[u8] = b"ID3fake-mp3";

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Ok(FAKE_MP3.to_vec())
    }
}

/// Synthesizer that records each request and echoes it back as `[text]`
#[derive(Default)]
pub struct RecordingSynthesizer(Mutex<Vec<String>>);

impl RecordingSynthesizer {
    pub fn requests(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(format!("[{text}]").into_bytes())
    }
}
