//! Inbound message processing: generate a timed reply and deliver it the way
//! a person would, thinking first and then typing.
//!
//! Flow: inbound text → [`ReplyGenerator`] → [`ReplySegment`]s →
//! [`PacingOrchestrator`] → channel outbound.

pub mod error;
pub mod generate;
pub mod pipeline;
pub mod reply;

pub use {
    error::GenerationError,
    generate::{LlmReplyGenerator, MirrorReplyGenerator, ReplyGenerator, generator_from_config},
    pipeline::PacingOrchestrator,
    reply::{ReplySegment, WantedResponse},
};
