use std::time::Duration;

use {
    async_trait::async_trait,
    futures::{SinkExt, StreamExt},
    tokio::{sync::mpsc, task::JoinHandle},
    tokio_tungstenite::{connect_async, tungstenite::Message},
    tracing::{debug, error, info, warn},
};

use crate::{AgentFrame, ChannelOutbound, Error, Result};

/// First reconnect delay; doubled after every failed attempt.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// How a single connection attempt ended.
enum Exit {
    /// Socket closed or failed; try again.
    Disconnected,
    /// The local side is shutting down.
    Shutdown,
}

/// WebSocket client for the chat agent, with auto-reconnect.
///
/// Inbound message texts are forwarded to the channel given to
/// [`AgentConnection::spawn`]. Outbound frames are queued and written by the
/// connection task in call order. Frames queued while disconnected go out
/// after reconnect, and a frame whose write fails is retried first on the next
/// connection, so delivery is at-least-once rather than exactly-once.
#[derive(Clone)]
pub struct AgentConnection {
    write_tx: mpsc::UnboundedSender<String>,
}

impl AgentConnection {
    /// Spawn the connection task. Returns immediately.
    ///
    /// The task stops once every `AgentConnection` clone is dropped or the
    /// inbound receiver is dropped.
    pub fn spawn(
        url: String,
        max_backoff: Duration,
        inbound_tx: mpsc::UnboundedSender<String>,
    ) -> (Self, JoinHandle<()>) {
        let (write_tx, write_rx) = mpsc::unbounded_channel::<String>();
        let handle = tokio::spawn(connection_loop(url, max_backoff, inbound_tx, write_rx));
        (Self { write_tx }, handle)
    }

    fn send_frame(&self, frame: &AgentFrame) -> Result<()> {
        let json = frame.encode()?;
        self.write_tx.send(json).map_err(|_| Error::Closed)
    }
}

#[async_trait]
impl ChannelOutbound for AgentConnection {
    async fn start_typing(&self) -> Result<()> {
        self.send_frame(&AgentFrame::Typing { active: true })
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.send_frame(&AgentFrame::message(text))
    }

    async fn stop_typing(&self) -> Result<()> {
        self.send_frame(&AgentFrame::Typing { active: false })
    }
}

/// Main connection loop with auto-reconnect.
async fn connection_loop(
    url: String,
    max_backoff: Duration,
    inbound_tx: mpsc::UnboundedSender<String>,
    mut write_rx: mpsc::UnboundedReceiver<String>,
) {
    let initial = INITIAL_BACKOFF.min(max_backoff);
    let mut backoff = initial;
    let mut pending: Option<String> = None;

    loop {
        info!(url = %url, "connecting to agent");

        let attempt = connect_and_run(
            &url,
            &inbound_tx,
            &mut write_rx,
            &mut pending,
            &mut backoff,
            initial,
        );
        match attempt.await {
            Ok(Exit::Shutdown) => {
                debug!("agent connection shut down");
                return;
            },
            Ok(Exit::Disconnected) => {
                debug!("agent connection closed");
            },
            Err(e) => {
                error!(error = %e, "agent connection error");
            },
        }

        if inbound_tx.is_closed() {
            return;
        }

        info!(delay_ms = backoff.as_millis(), "reconnecting after delay");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(max_backoff);
    }
}

/// Single connection attempt: connect, then forward frames both ways.
async fn connect_and_run(
    url: &str,
    inbound_tx: &mpsc::UnboundedSender<String>,
    write_rx: &mut mpsc::UnboundedReceiver<String>,
    pending: &mut Option<String>,
    backoff: &mut Duration,
    initial: Duration,
) -> Result<Exit> {
    let (ws_stream, _response) = connect_async(url).await?;
    let (mut ws_sink, mut ws_reader) = ws_stream.split();
    info!(url = %url, "connected to agent");
    *backoff = initial;

    if let Some(text) = pending.take() {
        debug!("resending frame that failed on the previous connection");
        send_or_keep(&mut ws_sink, text, pending).await?;
    }

    loop {
        tokio::select! {
            msg = ws_reader.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match AgentFrame::decode(&text) {
                            Some(AgentFrame::Message { text }) => {
                                debug!(chars = text.chars().count(), "inbound message");
                                if inbound_tx.send(text).is_err() {
                                    let _ = ws_sink.send(Message::Close(None)).await;
                                    return Ok(Exit::Shutdown);
                                }
                            },
                            Some(other) => {
                                debug!(frame = ?other, "ignoring inbound frame");
                            },
                            None => {
                                warn!(raw = %text, "ignoring undecodable inbound frame");
                            },
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket closed by agent");
                        return Ok(Exit::Disconnected);
                    },
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        return Err(Error::WebSocket(e));
                    },
                }
            },
            json = write_rx.recv() => {
                match json {
                    Some(text) => {
                        send_or_keep(&mut ws_sink, text, pending).await?;
                    },
                    None => {
                        let _ = ws_sink.send(Message::Close(None)).await;
                        return Ok(Exit::Shutdown);
                    },
                }
            },
        }
    }
}

/// Write one outbound frame; on failure keep it in `pending` for the next
/// connection.
async fn send_or_keep<S>(sink: &mut S, text: String, pending: &mut Option<String>) -> Result<()>
where
    S: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    if let Err(e) = sink.send(Message::Text(text.as_str().into())).await {
        *pending = Some(text);
        return Err(Error::WebSocket(e));
    }
    Ok(())
}
