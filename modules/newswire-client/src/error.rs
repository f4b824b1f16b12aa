use thiserror::Error;

pub type Result<T> = std::result::Result<T, NewswireError>;

#[derive(Debug, Error)]
pub enum NewswireError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl NewswireError {
    /// Quota or permission failure: the provider is done for the run.
    pub fn is_quota(&self) -> bool {
        matches!(self, NewswireError::Api { status: 429 | 403, .. })
    }

    /// Request-level failure (connect, timeout, DNS) as opposed to a
    /// well-formed error response from the provider.
    pub fn is_request_failure(&self) -> bool {
        matches!(self, NewswireError::Network(_))
    }
}

impl From<reqwest::Error> for NewswireError {
    fn from(err: reqwest::Error) -> Self {
        NewswireError::Network(err.to_string())
    }
}
