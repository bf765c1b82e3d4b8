use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode model response: {0}")]
    Decode(String),

    #[error("model withheld its answer: {0}")]
    Blocked(String),

    #[error("model returned no candidates")]
    NoCandidates,
}
