//! Error types for the Instagram OAuth flow
//!
//! Each network operation has its own top-level variant so callers can tell
//! which step failed. The underlying [`Failure`] says why: the transport
//! never produced a response, the body was not JSON, the provider rejected
//! the request, or a required field was missing.

/// Why a single exchange or fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("{}", rejected_message(.status, .message))]
    Rejected {
        /// HTTP status when the provider answered with a non-2xx code
        status: Option<u16>,
        /// Provider message (`error.message` and friends), or "unknown error"
        message: String,
        /// The provider's error object, when one was present
        payload: Option<serde_json::Value>,
    },

    #[error("response missing required field `{0}`")]
    MissingField(&'static str),
}

fn rejected_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("provider rejected request ({status}): {message}"),
        None => format!("provider rejected request: {message}"),
    }
}

/// Errors from Instagram OAuth operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("token exchange failed: {0}")]
    TokenExchange(#[source] Failure),

    #[error("long-lived token exchange failed: {0}")]
    TokenUpgrade(#[source] Failure),

    #[error("profile fetch failed: {0}")]
    ProfileFetch(#[source] Failure),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl Error {
    /// The failure behind an exchange/fetch error.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Error::TokenExchange(f) | Error::TokenUpgrade(f) | Error::ProfileFetch(f) => Some(f),
            Error::InvalidEndpoint(_) | Error::HttpClient(_) => None,
        }
    }

    /// Provider message when the provider answered and rejected the request.
    pub fn provider_message(&self) -> Option<&str> {
        match self.failure() {
            Some(Failure::Rejected { message, .. }) => Some(message),
            _ => None,
        }
    }

    /// True when no response was received (DNS, TLS, connect, timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self.failure(), Some(Failure::Transport(_)))
    }
}

/// Result alias for Instagram OAuth operations.
pub type Result<T> = std::result::Result<T, Error>;
