use std::{fmt::Write as _, sync::Arc};

use {
    pacer_auto_reply::{PacingOrchestrator, generator_from_config},
    pacer_channels::ConsoleOutbound,
    pacer_config::PacerConfig,
    pacer_pacing::{PacingConfig, score, thinking_time, word_count},
};

/// Text report for `pacer score`.
pub fn score_report(text: &str, pacing: PacingConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "words:        {}", word_count(text));
    let _ = writeln!(out, "readability:  {:.2}", score(text));
    let _ = writeln!(out, "thinking:     {:.2}s", thinking_time(text));
    let _ = writeln!(
        out,
        "typing:       {:.2}s at {} wpm",
        pacing.typing_time(text),
        pacing.words_per_minute
    );
    out
}

/// Run a single reply cycle for `text`, printing outbound effects to stdout.
pub async fn reply_once(config: &PacerConfig, text: &str, no_delay: bool) -> anyhow::Result<()> {
    let generator = generator_from_config(&config.generation, config.pacing)?;
    let mut orchestrator =
        PacingOrchestrator::new(generator, Arc::new(ConsoleOutbound::stdout()));
    if no_delay {
        orchestrator = orchestrator.without_pauses();
    }
    orchestrator.handle_message(text).await;
    Ok(())
}
