use thiserror::Error;

/// Failure reported by a ledger node for a single call.
///
/// The retry layer only cares whether an error is transient (worth another
/// attempt) and whether it looks like rate limiting (worth switching nodes).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// HTTP 429 or an equivalent throttling response
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network, timeout or node-side failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered but the payload could not be interpreted
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl LedgerError {
    /// Whether retrying the same call can reasonably succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, LedgerError::Malformed(_))
    }

    /// Classify a JSON-RPC error object returned by a node
    pub fn from_rpc_error(code: i64, message: &str) -> Self {
        let text = format!("RPC error {}: {}", code, message);
        if code == 429
            || message.contains("429")
            || message.to_ascii_lowercase().contains("too many requests")
        {
            LedgerError::RateLimited(text)
        } else {
            LedgerError::Transport(text)
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            LedgerError::RateLimited(message)
        } else if err.is_decode() {
            LedgerError::Malformed(message)
        } else {
            LedgerError::Transport(message)
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Malformed(err.to_string())
    }
}

/// Errors surfaced by the analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Rejected before any network access
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Every attempt (or a fatal attempt) of a ledger operation failed
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    FetchExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: LedgerError,
    },

    /// The caller's cancellation token fired or its deadline passed
    #[error("{0} cancelled")]
    Cancelled(String),
}

impl AnalysisError {
    pub fn is_fetch_exhausted(&self) -> bool {
        matches!(self, AnalysisError::FetchExhausted { .. })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("endpoint pool requires at least one endpoint")]
    Empty,
}
