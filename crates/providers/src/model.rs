use async_trait::async_trait;

// ── Typed chat messages ─────────────────────────────────────────────────────

/// Typed chat message for the backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    System { content: String },
    User { content: String },
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::System { content } | Self::User { content } => content,
        }
    }

    /// Convert to OpenAI-compatible JSON format.
    #[must_use]
    pub fn to_openai_value(&self) -> serde_json::Value {
        serde_json::json!({ "role": self.role(), "content": self.content() })
    }
}

/// Split system messages from the conversation.
///
/// Returns `(system_text, rest)`; multiple system messages are joined with a
/// blank line.
pub(crate) fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
    let mut system_text: Option<String> = None;
    let mut rest = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg {
            ChatMessage::System { content } => {
                system_text = Some(match system_text {
                    Some(existing) => format!("{existing}\n\n{content}"),
                    None => content.clone(),
                });
            },
            other => rest.push(other),
        }
    }

    (system_text, rest)
}

// ── Structured output ───────────────────────────────────────────────────────

/// JSON schema the backend is asked to conform to.
///
/// Backends with native structured output enforce it; others only see the
/// prompt instruction, so callers must still validate the returned text.
#[derive(Debug, Clone)]
pub struct StructuredOutput {
    pub name: String,
    pub schema: serde_json::Value,
}

impl StructuredOutput {
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

// ── Provider trait ──────────────────────────────────────────────────────────

/// Generation backend (Anthropic, OpenAI, test stubs).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Model identifier (e.g. "claude-3-haiku-20240307", "gpt-4o").
    fn id(&self) -> &str;

    /// Issue one completion request and return the raw reply text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        output: Option<&StructuredOutput>,
    ) -> anyhow::Result<CompletionResponse>;

    /// Whether `output` is enforced by the backend rather than the prompt.
    fn supports_structured_output(&self) -> bool {
        false
    }
}

/// Response from a completion call.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub text: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}
