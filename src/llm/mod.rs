pub mod chat;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OpenAI API key is required")]
    MissingApiKey,
    #[error("Invalid API key format: {0}")]
    InvalidApiKey(String),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    /// Non-success status from the provider before streaming began.
    #[error("{status} {message}")]
    Status { status: u16, message: String },
    /// Failure reported by the provider after streaming began.
    #[error("Upstream stream error: {0}")]
    Stream(String),
}
