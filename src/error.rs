//! Error types for the retrieval orchestration core.
//!
//! Layering: providers produce [`ProviderError`]; the orchestrator wraps
//! everything above it in [`OrchestratorError`]. Provider failures inside the
//! fan-out are isolated and logged, never surfaced through these types.

use thiserror::Error;

/// Typed errors for document providers (web search, vector search, fetch).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized - check API key")]
    Unauthorized,

    #[error("Rate limited - too many requests")]
    RateLimited,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("HTTP error ({0}): {1}")]
    HttpError(u16, String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl ProviderError {
    /// Whether a retry at the provider layer can reasonably help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout
                | ProviderError::Connection(_)
                | ProviderError::RateLimited
                | ProviderError::ServerError(_, _)
        )
    }
}

/// Top-level orchestration errors.
///
/// The iterative loop itself has no fatal conditions: incomplete coverage
/// after the iteration cap is a normal return value. These variants cover
/// construction and configuration problems.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),
}
