//! Generation backend clients.
//!
//! Each backend implements [`LlmProvider`]; [`provider_from_config`] picks one
//! from the `[generation]` config section.

pub mod anthropic;
pub mod model;
pub mod openai;

use std::sync::Arc;

use {
    pacer_config::{Backend, GenerationConfig},
    tracing::info,
};

pub use {
    anthropic::AnthropicProvider,
    model::{ChatMessage, CompletionResponse, LlmProvider, StructuredOutput, Usage},
    openai::OpenAiProvider,
};

/// Shared HTTP client for all providers.
///
/// `reqwest::Client` pools connections internally; cloning it is cheap.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}

/// Build the remote provider described by `config`.
///
/// Fails for the local `mirror` backend and when no API key is configured.
pub fn provider_from_config(config: &GenerationConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let backend = config.backend;
    let (Some(model), Some(base_url)) = (config.resolved_model(), config.resolved_base_url())
    else {
        anyhow::bail!("backend '{backend}' has no remote provider");
    };
    let Some(api_key) = config.api_key.clone() else {
        let hint = backend.api_key_env().unwrap_or("generation.api_key");
        anyhow::bail!("no API key for backend '{backend}' (set {hint})");
    };

    info!(backend = %backend, model = %model, base_url = %base_url, "generation provider configured");

    let provider: Arc<dyn LlmProvider> = match backend {
        Backend::Anthropic => Arc::new(
            AnthropicProvider::new(api_key, model, base_url).with_max_tokens(config.max_tokens),
        ),
        Backend::Openai => Arc::new(
            OpenAiProvider::new(api_key, model, base_url).with_max_tokens(config.max_tokens),
        ),
        Backend::Mirror => anyhow::bail!("backend '{backend}' has no remote provider"),
    };
    Ok(provider)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, secrecy::Secret};

    fn generation(backend: Backend, key: Option<&str>) -> GenerationConfig {
        GenerationConfig {
            backend,
            api_key: key.map(|k| Secret::new(k.to_string())),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn anthropic_with_key() {
        let provider = provider_from_config(&generation(Backend::Anthropic, Some("sk"))).unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.id(), "claude-3-haiku-20240307");
        assert!(!provider.supports_structured_output());
    }

    #[test]
    fn openai_with_model_override() {
        let mut config = generation(Backend::Openai, Some("sk"));
        config.model = Some("gpt-4o-mini".into());
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.id(), "gpt-4o-mini");
        assert!(provider.supports_structured_output());
    }

    #[test]
    fn missing_key_names_env_var() {
        let err = provider_from_config(&generation(Backend::Openai, None))
            .err()
            .unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn mirror_has_no_provider() {
        assert!(provider_from_config(&generation(Backend::Mirror, None)).is_err());
    }
}
