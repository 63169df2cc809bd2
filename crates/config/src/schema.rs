//! Config schema types (agent transport, pacing, generation backend).

use std::{fmt, time::Duration};

use {
    pacer_pacing::PacingConfig,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Reply used whenever the backend output cannot be validated.
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I encountered an issue.";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PacerConfig {
    pub agent: AgentConfig,
    pub pacing: PacingConfig,
    pub generation: GenerationConfig,
}

/// Connection settings for the chat agent transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Host the agent transport listens on. Defaults to "127.0.0.1".
    pub host: String,
    /// Port the agent transport listens on. Defaults to 5380.
    pub port: u16,
    /// WebSocket path. Defaults to "/".
    pub path: String,
    /// Upper bound for the reconnect backoff, in seconds.
    pub reconnect_max_backoff_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5380,
            path: "/".into(),
            reconnect_max_backoff_secs: 5,
        }
    }
}

impl AgentConfig {
    /// WebSocket URL of the agent transport.
    #[must_use]
    pub fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("ws://{}:{}{}", self.host, self.port, path)
    }

    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_max_backoff_secs.max(1))
    }
}

/// Which generation backend produces replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Anthropic Messages API.
    #[default]
    Anthropic,
    /// OpenAI Chat Completions API with structured output.
    Openai,
    /// Offline backend that mirrors the inbound message back.
    Mirror,
}

impl Backend {
    pub const ALL: &'static [Backend] = &[Backend::Anthropic, Backend::Openai, Backend::Mirror];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Openai => "openai",
            Self::Mirror => "mirror",
        }
    }

    #[must_use]
    pub fn default_model(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("claude-3-haiku-20240307"),
            Self::Openai => Some("gpt-4o-2024-08-06"),
            Self::Mirror => None,
        }
    }

    #[must_use]
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("https://api.anthropic.com"),
            Self::Openai => Some("https://api.openai.com/v1"),
            Self::Mirror => None,
        }
    }

    /// Environment variable consulted when no API key is configured.
    #[must_use]
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Openai => Some("OPENAI_API_KEY"),
            Self::Mirror => None,
        }
    }

    /// Whether this backend calls out to a remote service.
    #[must_use]
    pub fn is_remote(self) -> bool {
        !matches!(self, Self::Mirror)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub backend: Backend,
    /// Model identifier. Falls back to the backend default when unset.
    pub model: Option<String>,
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
    /// API base URL. Falls back to the backend default when unset.
    pub base_url: Option<String>,
    pub max_tokens: u32,
    /// Bound on a single backend call, in seconds. `0` disables the bound.
    pub timeout_secs: u64,
    /// System instruction override for the conversational persona.
    pub persona: Option<String>,
    pub fallback_reply: String,
    /// Base thinking time of the fallback reply, before latency correction.
    pub fallback_thinking_secs: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: None,
            api_key: None,
            base_url: None,
            max_tokens: 500,
            timeout_secs: 30,
            persona: None,
            fallback_reply: DEFAULT_FALLBACK_REPLY.into(),
            fallback_thinking_secs: 1.0,
        }
    }
}

impl GenerationConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    #[must_use]
    pub fn resolved_model(&self) -> Option<String> {
        self.model
            .clone()
            .or_else(|| self.backend.default_model().map(str::to_string))
    }

    #[must_use]
    pub fn resolved_base_url(&self) -> Option<String> {
        self.base_url
            .as_deref()
            .or(self.backend.default_base_url())
            .map(|url| url.trim_end_matches('/').to_string())
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
