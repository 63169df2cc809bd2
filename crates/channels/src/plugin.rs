use async_trait::async_trait;

/// Side effects a reply cycle performs on the chat agent.
///
/// Each call is independent; a failing call must not prevent the caller from
/// issuing the next one.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    /// Show the typing indicator.
    async fn start_typing(&self) -> crate::Result<()>;

    /// Deliver one message.
    async fn send_text(&self, text: &str) -> crate::Result<()>;

    /// Hide the typing indicator.
    async fn stop_typing(&self) -> crate::Result<()>;
}
