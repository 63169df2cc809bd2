use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, trace, warn},
};

use crate::model::{ChatMessage, CompletionResponse, LlmProvider, StructuredOutput, Usage};

/// OpenAI Chat Completions client with `json_schema` structured output.
pub struct OpenAiProvider {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiProvider {
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

    fn request_body(
        &self,
        messages: &[ChatMessage],
        output: Option<&StructuredOutput>,
    ) -> serde_json::Value {
        let openai_messages: Vec<serde_json::Value> =
            messages.iter().map(ChatMessage::to_openai_value).collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": openai_messages,
        });

        if let Some(output) = output {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": output.name,
                    "schema": output.schema,
                    "strict": true,
                }
            });
        }
        body
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn id(&self) -> &str {
        &self.model
    }

    fn supports_structured_output(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        output: Option<&StructuredOutput>,
    ) -> anyhow::Result<CompletionResponse> {
        let body = self.request_body(messages, output);

        debug!(
            model = %self.model,
            messages_count = messages.len(),
            structured = output.is_some(),
            "openai complete request"
        );
        trace!(body = %body, "openai request body");

        let http_resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, body = %body_text, "openai API error");
            anyhow::bail!("OpenAI API error HTTP {status}: {body_text}");
        }

        let resp = http_resp.json::<serde_json::Value>().await?;
        trace!(response = %resp, "openai raw response");

        let message = &resp["choices"][0]["message"];
        if let Some(refusal) = message["refusal"].as_str() {
            anyhow::bail!("OpenAI model refused: {refusal}");
        }

        let usage = Usage {
            input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        Ok(CompletionResponse {
            text: message["content"].as_str().map(str::to_string),
            usage,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn provider(base_url: String) -> OpenAiProvider {
        OpenAiProvider::new(Secret::new("sk-test".into()), "gpt-4o".into(), base_url)
    }

    fn output() -> StructuredOutput {
        StructuredOutput::new(
            "reply",
            serde_json::json!({"type": "object", "properties": {"response": {"type": "string"}}}),
        )
    }

    #[test]
    fn body_keeps_system_inline_and_adds_schema() {
        let body = provider("http://unused".into()).request_body(
            &[ChatMessage::system("sys"), ChatMessage::user("hi")],
            Some(&output()),
        );
        let msgs = body["messages"].as_array().unwrap();
        assert_eq!(msgs[0]["role"], "system");
        assert_eq!(msgs[1]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "reply");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn body_without_schema_has_no_response_format() {
        let body = provider("http://unused".into()).request_body(&[ChatMessage::user("hi")], None);
        assert!(body.get("response_format").is_none());
    }

    #[tokio::test]
    async fn complete_returns_message_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "{\"response\":\"hey\"}"}}],
                    "usage": {"prompt_tokens": 20, "completion_tokens": 7}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resp = provider(server.url())
            .complete(&[ChatMessage::user("hi")], Some(&output()))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(resp.text.as_deref(), Some("{\"response\":\"hey\"}"));
        assert_eq!(resp.usage.output_tokens, 7);
    }

    #[tokio::test]
    async fn refusal_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": null, "refusal": "no"}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let err = provider(server.url())
            .complete(&[ChatMessage::user("hi")], Some(&output()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("refused"));
    }

    #[tokio::test]
    async fn http_error_is_propagated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let err = provider(server.url())
            .complete(&[ChatMessage::user("hi")], None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
