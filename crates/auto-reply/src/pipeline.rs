use std::{sync::Arc, time::Duration};

use {
    pacer_channels::ChannelOutbound,
    pacer_pacing::{ReadabilityThresholds, score},
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

use crate::generate::ReplyGenerator;

/// Drives one reply cycle per inbound message: generate, then for each
/// segment think, type, send.
pub struct PacingOrchestrator {
    generator: Arc<dyn ReplyGenerator>,
    outbound: Arc<dyn ChannelOutbound>,
    thresholds: ReadabilityThresholds,
    pauses: bool,
}

impl PacingOrchestrator {
    pub fn new(generator: Arc<dyn ReplyGenerator>, outbound: Arc<dyn ChannelOutbound>) -> Self {
        Self {
            generator,
            outbound,
            thresholds: ReadabilityThresholds::DEFAULT,
            pauses: true,
        }
    }

    /// Keep the side-effect order but skip every thinking and typing pause.
    #[must_use]
    pub fn without_pauses(mut self) -> Self {
        self.pauses = false;
        self
    }

    async fn pause(&self, secs: f64) {
        if self.pauses {
            pause(secs).await;
        }
    }

    /// Run a full cycle for `message`. Returns once the last segment is sent.
    pub async fn handle_message(&self, message: &str) {
        info!(words = pacer_pacing::word_count(message), "processing message");

        let segments = self.generator.generate(message).await;
        // Readability of the inbound message, not of the reply.
        let extra_thinking = self.thresholds.thinking_time_for(score(message));

        for (index, segment) in segments.iter().enumerate() {
            let thinking = if segment.readability_pause {
                segment.thinking_time_secs + extra_thinking
            } else {
                segment.thinking_time_secs
            };
            debug!(
                segment = index,
                thinking_secs = thinking,
                typing_secs = segment.typing_time_secs,
                "pacing segment"
            );

            self.pause(thinking).await;
            if let Err(e) = self.outbound.start_typing().await {
                warn!(segment = index, error = %e, "failed to start typing indicator");
            }
            self.pause(segment.typing_time_secs).await;
            if let Err(e) = self.outbound.send_text(&segment.text).await {
                warn!(segment = index, error = %e, "failed to send reply");
            }
            if let Err(e) = self.outbound.stop_typing().await {
                warn!(segment = index, error = %e, "failed to stop typing indicator");
            }
        }

        debug!(segments = segments.len(), "message cycle complete");
    }

    /// Process inbound messages one at a time until the channel closes.
    pub async fn serve(&self, mut inbound: mpsc::UnboundedReceiver<String>) {
        while let Some(message) = inbound.recv().await {
            self.handle_message(&message).await;
        }
        info!("inbound channel closed, stopping");
    }
}

async fn pause(secs: f64) {
    match Duration::try_from_secs_f64(secs) {
        Ok(delay) => tokio::time::sleep(delay).await,
        Err(e) => warn!(secs, error = %e, "skipping unrepresentable delay"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::{LlmReplyGenerator, ReplySegment},
        async_trait::async_trait,
        pacer_channels::{Error as ChannelError, Result as ChannelResult},
        pacer_providers::{ChatMessage, CompletionResponse, LlmProvider, StructuredOutput},
        std::sync::Mutex,
        tokio::time::Instant,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        StartTyping,
        Send(String),
        StopTyping,
    }

    /// Records each outbound call with the virtual time it happened at.
    struct RecordingOutbound {
        started: Instant,
        calls: Mutex<Vec<(f64, Call)>>,
        fail_typing: bool,
    }

    impl RecordingOutbound {
        fn new() -> Self {
            Self {
                started: Instant::now(),
                calls: Mutex::new(Vec::new()),
                fail_typing: false,
            }
        }

        fn record(&self, call: Call) {
            let at = self.started.elapsed().as_secs_f64();
            self.calls.lock().unwrap().push((at, call));
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
        }

        fn times(&self) -> Vec<f64> {
            self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }
    }

    #[async_trait]
    impl ChannelOutbound for RecordingOutbound {
        async fn start_typing(&self) -> ChannelResult<()> {
            self.record(Call::StartTyping);
            if self.fail_typing {
                return Err(ChannelError::Closed);
            }
            Ok(())
        }

        async fn send_text(&self, text: &str) -> ChannelResult<()> {
            self.record(Call::Send(text.to_string()));
            Ok(())
        }

        async fn stop_typing(&self) -> ChannelResult<()> {
            self.record(Call::StopTyping);
            if self.fail_typing {
                return Err(ChannelError::Closed);
            }
            Ok(())
        }
    }

    struct FixedGenerator(Vec<ReplySegment>);

    #[async_trait]
    impl ReplyGenerator for FixedGenerator {
        async fn generate(&self, _message: &str) -> Vec<ReplySegment> {
            self.0.clone()
        }
    }

    struct FixedProvider(&'static str);

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn id(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _output: Option<&StructuredOutput>,
        ) -> anyhow::Result<CompletionResponse> {
            Ok(CompletionResponse {
                text: Some(self.0.to_string()),
                ..CompletionResponse::default()
            })
        }
    }

    fn assert_times(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-3, "{actual:?} != {expected:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hi_scenario_orders_and_times_side_effects() {
        let provider = Arc::new(FixedProvider(
            r#"{"response":"hey!","thinking_time":1.0,"typing_time":0.5}"#,
        ));
        let generator = Arc::new(LlmReplyGenerator::new(provider));
        let outbound = Arc::new(RecordingOutbound::new());
        let orchestrator = PacingOrchestrator::new(generator, outbound.clone());

        orchestrator.handle_message("hi").await;

        assert_eq!(outbound.calls(), vec![
            Call::StartTyping,
            Call::Send("hey!".into()),
            Call::StopTyping,
        ]);
        // 1.0 reported + 0.5 readability of "hi", then 0.5 typing.
        assert_times(&outbound.times(), &[1.5, 2.0, 2.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_goes_through_the_same_sequence() {
        let provider = Arc::new(FixedProvider("{not json"));
        let generator = Arc::new(LlmReplyGenerator::new(provider));
        let outbound = Arc::new(RecordingOutbound::new());
        let orchestrator = PacingOrchestrator::new(generator, outbound.clone());

        orchestrator.handle_message("hi").await;

        assert_eq!(outbound.calls(), vec![
            Call::StartTyping,
            Call::Send("Sorry, I encountered an issue.".into()),
            Call::StopTyping,
        ]);
        // 1.0 fallback + 0.5 readability, then one word at 70 wpm.
        let typing = 60.0 / 70.0;
        assert_times(&outbound.times(), &[1.5, 1.5 + typing, 1.5 + typing]);
    }

    #[tokio::test(start_paused = true)]
    async fn segments_run_in_order_without_interleaving() {
        let generator = Arc::new(FixedGenerator(vec![
            ReplySegment::new("first", 0.2, 0.3),
            ReplySegment::new("second", 0.0, 0.1),
        ]));
        let outbound = Arc::new(RecordingOutbound::new());
        let orchestrator = PacingOrchestrator::new(generator, outbound.clone());

        orchestrator.handle_message("hi").await;

        assert_eq!(outbound.calls(), vec![
            Call::StartTyping,
            Call::Send("first".into()),
            Call::StopTyping,
            Call::StartTyping,
            Call::Send("second".into()),
            Call::StopTyping,
        ]);
        assert_times(&outbound.times(), &[0.7, 1.0, 1.0, 1.5, 1.6, 1.6]);
    }

    #[tokio::test(start_paused = true)]
    async fn follow_up_segment_skips_readability_pause() {
        let generator = Arc::new(FixedGenerator(vec![
            ReplySegment::new("hi", 0.0, 0.2),
            ReplySegment::new("Or should I say ih", 0.0, 0.3).without_readability_pause(),
        ]));
        let outbound = Arc::new(RecordingOutbound::new());
        let orchestrator = PacingOrchestrator::new(generator, outbound.clone());

        orchestrator.handle_message("hi").await;

        // 0.5 readability pause before the first segment only.
        assert_times(&outbound.times(), &[0.5, 0.7, 0.7, 0.7, 1.0, 1.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_generation_touches_nothing() {
        let outbound = Arc::new(RecordingOutbound::new());
        let orchestrator =
            PacingOrchestrator::new(Arc::new(FixedGenerator(Vec::new())), outbound.clone());
        orchestrator.handle_message("   ").await;
        assert!(outbound.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn outbound_failures_do_not_skip_steps() {
        let generator = Arc::new(FixedGenerator(vec![ReplySegment::new("x", 0.0, 0.0)]));
        let outbound = Arc::new(RecordingOutbound {
            fail_typing: true,
            ..RecordingOutbound::new()
        });
        let orchestrator = PacingOrchestrator::new(generator, outbound.clone());

        orchestrator.handle_message("hi").await;

        assert_eq!(outbound.calls(), vec![
            Call::StartTyping,
            Call::Send("x".into()),
            Call::StopTyping,
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn serve_handles_messages_one_at_a_time() {
        let generator = Arc::new(FixedGenerator(vec![ReplySegment::new("ok", 0.0, 1.0)]));
        let outbound = Arc::new(RecordingOutbound::new());
        let orchestrator = PacingOrchestrator::new(generator, outbound.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("hi".to_string()).unwrap();
        tx.send("hi".to_string()).unwrap();
        drop(tx);
        orchestrator.serve(rx).await;

        assert_eq!(outbound.calls(), vec![
            Call::StartTyping,
            Call::Send("ok".into()),
            Call::StopTyping,
            Call::StartTyping,
            Call::Send("ok".into()),
            Call::StopTyping,
        ]);
        assert_times(&outbound.times(), &[0.5, 1.5, 1.5, 2.0, 3.0, 3.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn without_pauses_keeps_order_and_takes_no_time() {
        let generator = Arc::new(FixedGenerator(vec![ReplySegment::new("x", 3.0, 4.0)]));
        let outbound = Arc::new(RecordingOutbound::new());
        let orchestrator = PacingOrchestrator::new(generator, outbound.clone()).without_pauses();

        orchestrator.handle_message("hi").await;

        assert_eq!(outbound.calls(), vec![
            Call::StartTyping,
            Call::Send("x".into()),
            Call::StopTyping,
        ]);
        assert_times(&outbound.times(), &[0.0, 0.0, 0.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_delay_is_skipped() {
        let started = Instant::now();
        pause(f64::INFINITY).await;
        pause(-1.0).await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
