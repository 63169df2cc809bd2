//! Reply segments and the structured reply contract with the backend.

use serde::{Deserialize, Serialize};

use crate::GenerationError;

/// Persona used when none is configured.
pub const DEFAULT_PERSONA: &str = "You are a helpful, friendly conversational assistant.";

/// Schema name sent with structured-output requests.
pub const RESPONSE_SCHEMA_NAME: &str = "paced_reply";

/// One unit of reply text with its delays, in seconds.
///
/// Delays are never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplySegment {
    pub text: String,
    pub thinking_time_secs: f64,
    pub typing_time_secs: f64,
    /// Whether the readability pause for the inbound message precedes this
    /// segment on top of `thinking_time_secs`.
    pub readability_pause: bool,
}

impl ReplySegment {
    /// Build a segment, clamping negative (or NaN) delays to zero.
    pub fn new(text: impl Into<String>, thinking_time_secs: f64, typing_time_secs: f64) -> Self {
        Self {
            text: text.into(),
            thinking_time_secs: thinking_time_secs.max(0.0),
            typing_time_secs: typing_time_secs.max(0.0),
            readability_pause: true,
        }
    }

    /// Follow-up segment that goes straight to typing after its own thinking
    /// time.
    #[must_use]
    pub fn without_readability_pause(mut self) -> Self {
        self.readability_pause = false;
        self
    }
}

/// The JSON object the backend is asked to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WantedResponse {
    pub response: String,
    pub thinking_time: f64,
    pub typing_time: f64,
}

impl WantedResponse {
    /// Strictly decode backend text. Only surrounding whitespace is tolerated.
    pub fn parse(raw: &str) -> Result<Self, GenerationError> {
        let wanted: Self = serde_json::from_str(raw.trim())?;
        if wanted.response.trim().is_empty() {
            return Err(GenerationError::Parse("empty \"response\" field".into()));
        }
        Ok(wanted)
    }

    /// Turn into a segment, discounting time already spent on the round trip.
    #[must_use]
    pub fn into_segment(self, latency_secs: f64) -> ReplySegment {
        ReplySegment::new(
            self.response,
            self.thinking_time - latency_secs,
            self.typing_time,
        )
    }
}

/// JSON schema describing [`WantedResponse`], in the strict subset accepted
/// by structured-output backends.
#[must_use]
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "response": { "type": "string" },
            "thinking_time": { "type": "number" },
            "typing_time": { "type": "number" }
        },
        "required": ["response", "thinking_time", "typing_time"],
        "additionalProperties": false
    })
}

/// User instruction embedding the inbound message verbatim.
#[must_use]
pub fn build_prompt(message: &str) -> String {
    format!(
        "Respond to the following message naturally, as if in casual conversation. \
         Provide a single response, but you can follow up or clarify if necessary. \
         Avoid overly formal language and aim for a friendly, conversational tone.\n\
         \n\
         Message: '{message}'\n\
         \n\
         Return a JSON object with this structure:\n\
         {{\n  \
           \"response\": \"<your full response (with potential follow-up)>\",\n  \
           \"thinking_time\": <seconds>,\n  \
           \"typing_time\": <seconds>\n\
         }}\n\
         Return only the JSON object."
    )
}
