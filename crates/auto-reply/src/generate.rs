//! Reply generators: turn one inbound message into timed reply segments.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    pacer_config::{Backend, DEFAULT_FALLBACK_REPLY, GenerationConfig},
    pacer_pacing::{DEFAULT_WORDS_PER_MINUTE, PacingConfig, typing_time},
    pacer_providers::{ChatMessage, LlmProvider, StructuredOutput},
    tokio::time::Instant,
    tracing::{debug, info, trace, warn},
};

use crate::{
    GenerationError,
    reply::{
        DEFAULT_PERSONA, RESPONSE_SCHEMA_NAME, ReplySegment, WantedResponse, build_prompt,
        response_schema,
    },
};

/// Produces the reply segments for one inbound message.
///
/// Implementations never fail: every problem is folded into the returned
/// segments.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, message: &str) -> Vec<ReplySegment>;
}

/// Generator backed by a remote completion service.
pub struct LlmReplyGenerator {
    provider: Arc<dyn LlmProvider>,
    persona: String,
    timeout: Option<Duration>,
    fallback_reply: String,
    fallback_thinking_secs: f64,
}

impl LlmReplyGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            persona: DEFAULT_PERSONA.into(),
            timeout: None,
            fallback_reply: DEFAULT_FALLBACK_REPLY.into(),
            fallback_thinking_secs: 1.0,
        }
    }

    /// Apply persona, timeout and fallback settings from config.
    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &GenerationConfig) -> Self {
        let mut generator = Self::new(provider)
            .with_timeout(config.timeout())
            .with_fallback(config.fallback_reply.clone(), config.fallback_thinking_secs);
        if let Some(persona) = &config.persona {
            generator = generator.with_persona(persona.clone());
        }
        generator
    }

    #[must_use]
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Bound the backend call; `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, reply: impl Into<String>, thinking_secs: f64) -> Self {
        self.fallback_reply = reply.into();
        self.fallback_thinking_secs = thinking_secs;
        self
    }

    /// The segment delivered when the backend reply cannot be used.
    ///
    /// Its typing time always uses the default 70 wpm, whatever the configured
    /// pacing rate.
    #[must_use]
    pub fn fallback_segment(&self, message: &str, latency_secs: f64) -> ReplySegment {
        ReplySegment::new(
            self.fallback_reply.clone(),
            self.fallback_thinking_secs - latency_secs,
            typing_time(message, DEFAULT_WORDS_PER_MINUTE),
        )
    }

    async fn call_backend(&self, message: &str) -> Result<String, GenerationError> {
        let messages = [
            ChatMessage::system(self.persona.clone()),
            ChatMessage::user(build_prompt(message)),
        ];
        // Backends without native structured output rely on the prompt alone.
        let output = self
            .provider
            .supports_structured_output()
            .then(|| StructuredOutput::new(RESPONSE_SCHEMA_NAME, response_schema()));
        let call = self.provider.complete(&messages, output.as_ref());

        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GenerationError::Timeout(limit))?,
            None => call.await,
        }
        .map_err(GenerationError::backend)?;

        debug!(
            provider = self.provider.name(),
            model = self.provider.id(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "backend replied"
        );

        response
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyCompletion)
    }
}

#[async_trait]
impl ReplyGenerator for LlmReplyGenerator {
    async fn generate(&self, message: &str) -> Vec<ReplySegment> {
        let started = Instant::now();
        let outcome = self.call_backend(message).await;
        let latency_secs = started.elapsed().as_secs_f64();

        let parsed = outcome.and_then(|raw| {
            trace!(raw = %raw, "raw backend reply");
            WantedResponse::parse(&raw)
        });

        let segment = match parsed {
            Ok(wanted) => wanted.into_segment(latency_secs),
            Err(e) => {
                warn!(
                    error = %e,
                    latency_ms = (latency_secs * 1000.0) as u64,
                    "generation failed, using fallback reply"
                );
                self.fallback_segment(message, latency_secs)
            },
        };

        info!(
            latency_ms = (latency_secs * 1000.0) as u64,
            thinking_secs = segment.thinking_time_secs,
            typing_secs = segment.typing_time_secs,
            "reply generated"
        );
        vec![segment]
    }
}

/// Offline generator: repeats the message, then teases with its last word
/// spelled backwards.
pub struct MirrorReplyGenerator {
    pacing: PacingConfig,
}

impl MirrorReplyGenerator {
    pub fn new(pacing: PacingConfig) -> Self {
        Self { pacing }
    }
}

#[async_trait]
impl ReplyGenerator for MirrorReplyGenerator {
    async fn generate(&self, message: &str) -> Vec<ReplySegment> {
        let Some(last) = message.split_whitespace().last() else {
            return Vec::new();
        };
        let reversed: String = last.chars().rev().collect::<String>().to_lowercase();
        let tease = format!("Or should I say {reversed}");

        let echo_typing = self.pacing.typing_time(message);
        let tease_typing = self.pacing.typing_time(&tease);
        vec![
            ReplySegment::new(message, 0.0, echo_typing),
            ReplySegment::new(tease, 0.0, tease_typing).without_readability_pause(),
        ]
    }
}

/// Build the generator selected by `[generation].backend`.
pub fn generator_from_config(
    config: &GenerationConfig,
    pacing: PacingConfig,
) -> anyhow::Result<Arc<dyn ReplyGenerator>> {
    let generator: Arc<dyn ReplyGenerator> = match config.backend {
        Backend::Mirror => Arc::new(MirrorReplyGenerator::new(pacing)),
        Backend::Anthropic | Backend::Openai => {
            let provider = pacer_providers::provider_from_config(config)?;
            Arc::new(LlmReplyGenerator::from_config(provider, config))
        },
    };
    Ok(generator)
}
