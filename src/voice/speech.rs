//! Sentence chunking and the local speaker

use std::sync::Arc;

use async_trait::async_trait;

use super::{AudioPlayback, Speaker, Synthesizer};
use crate::Result;

/// Split `text` into speakable chunks
///
/// Sentences end at whitespace following `.`, `!` or `?`. A sentence longer
/// than `chunk_size` characters is cut into consecutive `chunk_size`-character
/// pieces. Empty sentences are dropped.
#[must_use]
pub fn speech_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();

    for sentence in sentences(text) {
        let chars: Vec<char> = sentence.chars().collect();
        if chars.len() <= chunk_size {
            chunks.push(sentence.to_string());
        } else {
            chunks.extend(chars.chunks(chunk_size).map(|piece| piece.iter().collect()));
        }
    }

    chunks
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            out.push(&text[start..i]);
            start = i;
        }
        prev = Some(c);
    }
    out.push(&text[start..]);

    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Synthesize `text` chunk by chunk and join the MP3 streams in order
///
/// # Errors
///
/// Returns error if any chunk fails to synthesize
pub async fn synthesize_chunked(
    synthesizer: &dyn Synthesizer,
    text: &str,
    chunk_size: usize,
) -> Result<Vec<u8>> {
    let mut audio = Vec::new();
    for chunk in speech_chunks(text, chunk_size) {
        audio.extend(synthesizer.synthesize(&chunk).await?);
    }
    Ok(audio)
}

/// Speaks through a [`Synthesizer`] and the default output device
pub struct LocalSpeaker {
    synthesizer: Arc<dyn Synthesizer>,
    chunk_size: usize,
}

impl LocalSpeaker {
    #[must_use]
    pub fn new(synthesizer: Arc<dyn Synthesizer>, chunk_size: usize) -> Self {
        Self {
            synthesizer,
            chunk_size,
        }
    }
}

#[async_trait]
impl Speaker for LocalSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        for chunk in speech_chunks(text, self.chunk_size) {
            let mp3 = self.synthesizer.synthesize(&chunk).await?;
            tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3(&mp3))
                .await
                .map_err(|e| crate::Error::Audio(e.to_string()))??;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_sentence_boundaries() {
        let chunks = speech_chunks("First one. Second one! Third?  Fourth", 150);
        assert_eq!(chunks, vec!["First one.", "Second one!", "Third?", "Fourth"]);
    }

    #[test]
    fn test_punctuation_without_space_is_not_a_boundary() {
        let chunks = speech_chunks("Version 1.5 is out. See e.g.this", 150);
        assert_eq!(chunks, vec!["Version 1.5 is out.", "See e.g.this"]);
    }

    #[test]
    fn test_long_sentence_split_by_size() {
        let sentence = "a".repeat(25);
        let chunks = speech_chunks(&format!("{sentence}. Short."), 10);
        assert_eq!(
            chunks,
            vec!["aaaaaaaaaa", "aaaaaaaaaa", "aaaaa.", "Short."]
        );
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_multibyte_characters() {
        let chunks = speech_chunks("ééééé", 2);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(speech_chunks("", 150).is_empty());
        assert!(speech_chunks("   ", 150).is_empty());
    }

    #[test]
    fn test_newline_after_period() {
        let chunks = speech_chunks("Line one.\nLine two.", 150);
        assert_eq!(chunks, vec!["Line one.", "Line two."]);
    }
}
