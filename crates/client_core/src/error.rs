use std::time::Duration;

use thiserror::Error;
use validator::ValidationErrors;

use crate::categories::Affordance;

/// Coarse classification used by front ends to pick how an error is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport failure or timeout. Shown as a retryable banner.
    Network,
    /// Local, pre-submission. Shown inline per field.
    Validation,
    /// The server answered but refused.
    Rejected,
    /// Missing or unusable session.
    Session,
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
    #[error(
        "server rejected request{}: {}",
        status_suffix(.status),
        .message.as_deref().unwrap_or("no message")
    )]
    Rejected {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("login response did not contain an access token")]
    MissingAccessToken,
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" (status {status})"))
        .unwrap_or_default()
}

impl ApiClientError {
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::Url(_) => ErrorCategory::Network,
            Self::Rejected { status, .. } if matches!(status, Some(401) | Some(403)) => {
                ErrorCategory::Session
            }
            Self::Rejected { .. } | Self::Decode(_) | Self::MissingAccessToken => {
                ErrorCategory::Rejected
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("loading categories timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error(transparent)]
    Api(#[from] ApiClientError),
}

impl FetchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Timeout(_) => ErrorCategory::Network,
            Self::Api(err) => err.category(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("invalid category: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0} is already in progress")]
    InFlight(Affordance),
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: Option<ApiClientError>,
    },
}

impl MutationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::InFlight(_) => ErrorCategory::Rejected,
            Self::Rejected {
                source: Some(source),
                ..
            } => source.category(),
            Self::Rejected { source: None, .. } => ErrorCategory::Rejected,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage failed: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("failed to serialize user profile: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid form: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("not signed in")]
    Unauthenticated,
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Unauthenticated | Self::Session(_) => ErrorCategory::Session,
            Self::Api(err) => err.category(),
        }
    }
}
