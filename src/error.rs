//! Error types for the ticker price SDK

use thiserror::Error;

/// Errors that can occur on a single outbound call to the price provider
///
/// These never cross the client boundary directly: the retry pipeline
/// converts them into a recorded failure plus an empty result, and the
/// message surfaces through [`crate::state::ApiStateSnapshot::last_error`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network request failed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request exceeded the per-attempt timeout
    #[error("Request timeout")]
    Timeout,

    /// Provider returned a non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Provider signaled a rate limit (HTTP 429 or embedded error code)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Response body could not be decoded into the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Whether the retry pipeline may spend another attempt on this error.
    ///
    /// Everything transient retries: transport failures, error statuses,
    /// and garbled bodies. Rate limiting aborts immediately because the
    /// provider asked us to back off.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::RateLimited(_))
    }

    /// Classifies a reqwest error, splitting timeouts out of the generic
    /// transport case so `last_error` reads distinctly for them.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err)
        }
    }
}

/// Errors from persisting user settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file could not be read or written
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be serialized
    #[error("Settings serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
