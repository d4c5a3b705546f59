pub mod client;
pub mod extract;
pub mod orchestrator;
pub mod prompt;
pub mod types;

use thiserror::Error;

use types::CallAttempt;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("provider {provider} returned an unusable reply: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("cannot parse model output: {0}")]
    ParseFailed(String),

    #[error("all providers failed: {message}")]
    AllProvidersFailed {
        message: String,
        attempts: Vec<CallAttempt>,
    },

    #[error("fallback parser requires non-empty input")]
    FallbackFailed,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("{provider} returned error (status {status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("no API key configured for provider {0}")]
    MissingApiKey(String),

    #[error("unsupported AI provider: {0}")]
    UnknownProvider(String),
}
