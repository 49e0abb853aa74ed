use thiserror::Error;

/// Failures talking to a hosted language model.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key not found; set {env_var} in .env or the environment")]
    MissingApiKey { env_var: &'static str },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model returned no text")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, LlmError>;

pub(crate) fn api_key(env_var: &'static str) -> Result<String> {
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(LlmError::MissingApiKey { env_var })
}
