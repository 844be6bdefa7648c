use std::time::Duration;

use thiserror::Error;

/// Failures raised by a [`crate::navigator::Navigator`].
#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script failed: {0}")]
    Script(String),

    #[error("Extraction failed, session unusable: {0}")]
    Extraction(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),
}

impl NavigatorError {
    /// Session-level failures end the run; everything else is contained per link.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Extraction(_) | Self::SessionLost(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Seen-item store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Message rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Network(err.to_string())
    }
}

/// Run-level failures. Anything surfacing here aborts the cycle.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Seen-item store not ready: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("Listing page unavailable: {0}")]
    ListingUnavailable(#[source] NavigatorError),

    #[error(transparent)]
    Session(NavigatorError),
}

impl From<NavigatorError> for RunError {
    fn from(err: NavigatorError) -> Self {
        if err.is_fatal() {
            RunError::Session(err)
        } else {
            RunError::ListingUnavailable(err)
        }
    }
}

impl RunError {
    /// Process exit code the supervisor uses to tell crash restarts apart.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::StoreUnavailable(_) => 2,
            Self::Session(_) => 3,
            Self::ListingUnavailable(_) => 4,
        }
    }
}
