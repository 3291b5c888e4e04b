use thiserror::Error;

/// Failure taxonomy for the swap lifecycle.
///
/// `Network` and `Timeout` are transient and safe to retry with backoff;
/// everything else reflects either a caller mistake, a business-rule
/// rejection by the matching service, or a condition that needs operator
/// attention before another attempt.
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("service error: {0}")]
    Service(String),

    #[error("insufficient funds: have {have} sat, need {need} sat")]
    InsufficientFunds { have: u64, need: u64 },

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("timed out waiting for {operation}")]
    Timeout { operation: String },

    #[error("cancelled while {0}")]
    Cancelled(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("wallet error: {0}")]
    Wallet(String),
}

impl SwapError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SwapError::Network(_) | SwapError::Timeout { .. })
    }
}

impl From<reqwest::Error> for SwapError {
    fn from(err: reqwest::Error) -> Self {
        SwapError::Network(err.to_string())
    }
}

impl From<rusqlite::Error> for SwapError {
    fn from(err: rusqlite::Error) -> Self {
        SwapError::Storage(err.to_string())
    }
}

pub type SwapResult<T> = Result<T, SwapError>;
