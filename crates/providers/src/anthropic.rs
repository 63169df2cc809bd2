use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, trace, warn},
};

use crate::model::{
    ChatMessage, CompletionResponse, LlmProvider, StructuredOutput, Usage, split_system,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
///
/// There is no native JSON-schema mode here; the reply shape is carried by the
/// prompt alone.
pub struct AnthropicProvider {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: Secret<String>, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            max_tokens: 500,
            client: crate::shared_http_client().clone(),
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        let (system_text, rest) = split_system(messages);
        let anthropic_messages: Vec<serde_json::Value> = rest
            .iter()
            .map(|m| serde_json::json!({ "role": m.role(), "content": m.content() }))
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": anthropic_messages,
        });
        if let Some(sys) = system_text {
            body["system"] = serde_json::Value::String(sys);
        }
        body
    }
}

/// Concatenate the `text` blocks of an Anthropic response.
fn collect_text(resp: &serde_json::Value) -> Option<String> {
    resp["content"]
        .as_array()?
        .iter()
        .filter(|b| b["type"].as_str() == Some("text"))
        .filter_map(|b| b["text"].as_str().map(str::to_string))
        .reduce(|a, b| a + &b)
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn id(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _output: Option<&StructuredOutput>,
    ) -> anyhow::Result<CompletionResponse> {
        let body = self.request_body(messages);

        debug!(
            model = %self.model,
            messages_count = messages.len(),
            "anthropic complete request"
        );
        trace!(body = %body, "anthropic request body");

        let http_resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body_text, "anthropic API error");
            anyhow::bail!("Anthropic API error HTTP {status}: {body_text}");
        }

        let resp = http_resp.json::<serde_json::Value>().await?;
        trace!(response = %resp, "anthropic raw response");

        let usage = Usage {
            input_tokens: resp["usage"]["input_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: resp["usage"]["output_tokens"].as_u64().unwrap_or(0) as u32,
        };

        Ok(CompletionResponse {
            text: collect_text(&resp),
            usage,
        })
    }
}
