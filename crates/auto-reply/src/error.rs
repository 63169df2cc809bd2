use std::time::Duration;

/// Why a generation attempt fell back to the apology reply.
///
/// None of these leave [`crate::ReplyGenerator::generate`]; they exist for
/// logging and tests.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Backend text is not the expected JSON object.
    #[error("malformed backend reply: {0}")]
    Parse(String),

    /// Transport or HTTP failure while calling the backend.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend returned no text")]
    EmptyCompletion,

    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    pub(crate) fn backend(err: anyhow::Error) -> Self {
        Self::BackendUnavailable(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
