//! Energy-based phrase segmentation
//!
//! Splits a microphone stream into a single spoken phrase: recording starts
//! on the first loud chunk and ends after enough trailing silence.

/// Floor for the speech energy threshold
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum phrase length (0.3 seconds at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends a phrase (0.8 seconds at 16kHz)
const PAUSE_SAMPLES: usize = 12_800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// No speech yet
    Waiting,
    /// Accumulating a phrase
    Speaking,
    /// Phrase ended with trailing silence
    Complete,
}

/// Accumulates audio chunks into one phrase
#[derive(Debug)]
pub struct PhraseSegmenter {
    threshold: f32,
    state: SegmentState,
    samples: Vec<f32>,
    silence: usize,
}

impl Default for PhraseSegmenter {
    fn default() -> Self {
        Self::with_ambient(0.0)
    }
}

impl PhraseSegmenter {
    /// Create a segmenter whose threshold is at least `ambient`
    #[must_use]
    pub fn with_ambient(ambient: f32) -> Self {
        Self {
            threshold: ENERGY_THRESHOLD.max(ambient),
            state: SegmentState::Waiting,
            samples: Vec::new(),
            silence: 0,
        }
    }

    /// Feed one chunk of samples
    ///
    /// Returns true once the phrase is complete.
    pub fn push(&mut self, chunk: &[f32]) -> bool {
        if chunk.is_empty() {
            return self.state == SegmentState::Complete;
        }
        let loud = rms_energy(chunk) > self.threshold;

        match self.state {
            SegmentState::Waiting => {
                if loud {
                    self.state = SegmentState::Speaking;
                    self.samples.extend_from_slice(chunk);
                    self.silence = 0;
                    tracing::trace!("speech started");
                }
            }
            SegmentState::Speaking => {
                self.samples.extend_from_slice(chunk);
                if loud {
                    self.silence = 0;
                } else {
                    self.silence += chunk.len();
                }

                if self.silence >= PAUSE_SAMPLES {
                    if self.samples.len() - self.silence >= MIN_SPEECH_SAMPLES {
                        self.state = SegmentState::Complete;
                        tracing::debug!(samples = self.samples.len(), "phrase complete");
                    } else {
                        // A click or cough, not a phrase
                        self.reset();
                    }
                }
            }
            SegmentState::Complete => {}
        }

        self.state == SegmentState::Complete
    }

    #[must_use]
    pub const fn state(&self) -> SegmentState {
        self.state
    }

    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// True while a phrase is being accumulated
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.state == SegmentState::Speaking
    }

    /// Number of samples accumulated so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    fn reset(&mut self) {
        self.state = SegmentState::Waiting;
        self.samples.clear();
        self.silence = 0;
    }
}

/// Root-mean-square energy of a chunk
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
