use std::{io::Write, sync::Mutex, time::Instant};

use {async_trait::async_trait, tracing::debug};

use crate::{ChannelOutbound, Error, Result};

/// Outbound that prints each side effect as a line, prefixed with the time
/// elapsed since creation.
pub struct ConsoleOutbound<W: Write + Send> {
    out: Mutex<W>,
    started: Instant,
    show_elapsed: bool,
}

impl ConsoleOutbound<std::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleOutbound<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            started: Instant::now(),
            show_elapsed: true,
        }
    }

    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.show_elapsed = false;
        self
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn line(&self, text: &str) -> Result<()> {
        debug!(line = text, "console outbound");
        let mut out = self
            .out
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("console writer poisoned")))?;
        if self.show_elapsed {
            writeln!(out, "[{:>6.2}s] {text}", self.started.elapsed().as_secs_f64())?;
        } else {
            writeln!(out, "{text}")?;
        }
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> ChannelOutbound for ConsoleOutbound<W> {
    async fn start_typing(&self) -> Result<()> {
        self.line("(typing...)")
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.line(&format!("> {text}"))
    }

    async fn stop_typing(&self) -> Result<()> {
        self.line("(stopped typing)")
    }
}
