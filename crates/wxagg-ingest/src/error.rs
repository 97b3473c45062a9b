use thiserror::Error;
use wxagg_core::schedule::RunStateError;

use crate::normalize::NormalizeError;

/// Why a source could not produce articles.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure, timeout, HTTP error status or empty body.
    #[error("transient failure fetching {context}: {message}")]
    Transient { context: String, message: String },

    /// Credentials missing or rejected by the remote side.
    #[error("authentication failed for {context}: {message} (refresh credentials)")]
    AuthFailed { context: String, message: String },

    /// The response could not be decoded.
    #[error("malformed response for {context}: {message}")]
    MalformedResponse { context: String, message: String },
}

impl FetchError {
    pub(crate) fn transient(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Transient {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn auth(context: impl Into<String>, message: impl ToString) -> Self {
        Self::AuthFailed {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn malformed(context: impl Into<String>, message: impl ToString) -> Self {
        Self::MalformedResponse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// The caller should refresh credentials before retrying.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthFailed { .. })
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Failures of the orchestration layer above the pipeline.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    RunState(#[from] RunStateError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("article store error: {0}")]
    Store(String),
}
