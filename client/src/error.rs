use std::time::Duration;

use skirmish_protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ApiError {
    /// Client errors are not worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Protocol(ProtocolError::Server(_)) => false,
            _ => true,
        }
    }
}

/// Whether an error chain bottoms out in a timeout
pub fn is_timeout(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(cause.downcast_ref::<ApiError>(), Some(ApiError::Timeout { .. }))
            || cause
                .downcast_ref::<reqwest::Error>()
                .is_some_and(|e| e.is_timeout())
    })
}

pub(crate) fn should_retry(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return api.is_retryable();
        }
        if let Some(ProtocolError::Server(_)) = cause.downcast_ref::<ProtocolError>() {
            return false;
        }
    }
    true
}
