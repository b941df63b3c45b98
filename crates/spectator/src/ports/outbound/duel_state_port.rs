//! Duel State Port - the HTTP boundary for polling duel state.

use std::time::Duration;

use serde_json::Value;

/// Result of one successful exchange with the duel state endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A new payload, with the validator to send on the next poll.
    Fresh {
        body: Value,
        etag: Option<String>,
        endpoint: String,
    },
    /// The server confirmed our cached copy is current.
    NotModified,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Rate limited by {endpoint}")]
    RateLimited {
        endpoint: String,
        retry_after: Option<Duration>,
    },

    #[error("Server error {status} from {endpoint}")]
    Server { endpoint: String, status: u16 },

    #[error("Unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid duel state body: {0}")]
    Decode(String),

    #[error("No duel state endpoints configured")]
    NoEndpoints,
}

impl FetchError {
    /// Whether the poller should slow down before trying again.
    pub fn warrants_backoff(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. } | FetchError::Server { .. })
    }

    /// Ranking used when several candidate endpoints fail in one poll: the
    /// most significant failure is the one reported.
    pub fn severity(&self) -> u8 {
        match self {
            FetchError::RateLimited { .. } => 5,
            FetchError::Server { .. } => 4,
            FetchError::Decode(_) => 3,
            FetchError::Network(_) => 2,
            FetchError::Status { .. } => 1,
            FetchError::NoEndpoints => 0,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DuelStatePort: Send + Sync {
    /// Fetch the current duel state, sending `etag` as a conditional validator.
    async fn fetch_state(&self, etag: Option<String>) -> Result<FetchOutcome, FetchError>;
}
