//! Human pacing: how long a correspondent would "think" before replying and
//! how long they would spend typing the reply.
//!
//! Thinking time is a step function of a readability score; typing time is a
//! straight words-per-minute conversion.

pub mod readability;
pub mod timing;

pub use {
    readability::{count_syllables, score, word_count},
    timing::{
        DEFAULT_WORDS_PER_MINUTE, PacingConfig, ReadabilityThresholds, thinking_time, typing_time,
    },
};
