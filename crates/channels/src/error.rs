/// Crate-wide result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed transport errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The connection task has exited; nothing can be delivered any more.
    #[error("agent connection closed")]
    Closed,

    #[error("console output failed: {0}")]
    Io(#[from] std::io::Error),
}
