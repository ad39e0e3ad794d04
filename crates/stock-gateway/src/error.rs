use thiserror::Error;

/// Errors that can occur when calling the warehouse service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure: connection refused, timeout, or a
    /// response body that could not be decoded.
    #[error("warehouse service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The warehouse service answered with a non-2xx status.
    #[error("warehouse service returned {status} for {operation}")]
    UnexpectedStatus {
        operation: &'static str,
        status: reqwest::StatusCode,
    },
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
