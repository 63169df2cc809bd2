use serde::{Deserialize, Serialize};

/// One JSON text frame exchanged with the chat agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentFrame {
    /// A chat message (inbound from the user or outbound from us).
    Message { text: String },
    /// Typing indicator toggle.
    Typing { active: bool },
}

impl AgentFrame {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    /// Decode an inbound frame; anything that is not a known frame yields `None`.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn encode(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
