use serde::{Deserialize, Serialize};

use crate::readability::{score, word_count};

/// Typing speed assumed when nothing else is configured.
pub const DEFAULT_WORDS_PER_MINUTE: f64 = 70.0;

/// Process-wide pacing settings. Immutable after startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Simulated typing speed. Must be greater than zero.
    pub words_per_minute: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl PacingConfig {
    /// Seconds needed to type `text` at the configured speed.
    #[must_use]
    pub fn typing_time(&self, text: &str) -> f64 {
        typing_time(text, self.words_per_minute)
    }
}

/// Ordered mapping from readability score to thinking time.
///
/// Rows are checked top to bottom; the first row whose lower bound the score
/// strictly exceeds wins. Scores at or below every bound get `slowest_secs`.
#[derive(Debug, Clone, Copy)]
pub struct ReadabilityThresholds {
    rows: &'static [(f64, f64)],
    slowest_secs: f64,
}

impl ReadabilityThresholds {
    pub const DEFAULT: Self = Self {
        rows: &[(90.0, 0.5), (80.0, 1.0), (70.0, 1.5), (60.0, 2.0)],
        slowest_secs: 3.0,
    };

    /// Thinking time in seconds for an already computed score.
    #[must_use]
    pub fn thinking_time_for(&self, score: f64) -> f64 {
        self.rows
            .iter()
            .find(|(lower, _)| score > *lower)
            .map_or(self.slowest_secs, |(_, secs)| *secs)
    }
}

impl Default for ReadabilityThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Seconds of simulated deliberation before replying to `text`.
#[must_use]
pub fn thinking_time(text: &str) -> f64 {
    ReadabilityThresholds::DEFAULT.thinking_time_for(score(text))
}

/// Seconds needed to type `text` at `words_per_minute`.
#[must_use]
pub fn typing_time(text: &str, words_per_minute: f64) -> f64 {
    word_count(text) as f64 / words_per_minute * 60.0
}
