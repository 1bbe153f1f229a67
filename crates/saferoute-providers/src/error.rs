//! Provider failure taxonomy.

use saferoute_core::CoordinateError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} provider disabled: no credential configured")]
    Disabled(&'static str),
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Decode(String),
    #[error("provider returned no routes")]
    NoRoutes,
}

impl ProviderError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// True when the failure came from caller input rather than the upstream.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidCoordinate(_))
    }
}
