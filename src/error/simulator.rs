use thiserror::Error;

/// Errors related to the simulation backend.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// The backend rate-limited the request. Retried with bounded backoff;
    /// fatal once the bound is exceeded.
    #[error("backend rate limited the request ({attempts} attempts made)")]
    RateLimited {
        /// Total number of requests issued before giving up.
        attempts: usize,
    },
    /// The backend answered with a non-success status. Never retried.
    #[error("backend unavailable: status {status}: {body}")]
    Unavailable {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },
    /// The backend answered 2xx but the body did not match the expected shape.
    #[error("unexpected backend response: {0}")]
    UnexpectedResponse(String),
    /// A bundle response did not contain one result per request.
    #[error("bundle returned {got} results for {expected} requests")]
    BundleLengthMismatch {
        /// Number of requests sent.
        expected: usize,
        /// Number of results returned.
        got: usize,
    },
    /// Transport-level failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl SimulatorError {
    /// Whether this error is a rate-limit response eligible for retry.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
