//! Image byte fetch errors.

use thiserror::Error;

/// Failure to obtain the bytes of one image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("image server answered HTTP {status}")]
    Status { status: u16 },

    #[error("image response had an empty body")]
    EmptyBody,

    #[error("image request timed out")]
    Timeout,

    #[error("failed to connect to image server: {message}")]
    Connect { message: String },

    #[error("image transfer failed: {message}")]
    Transport { message: String },

    #[error("image download was aborted before completing")]
    Aborted,
}

/// Coarse classification of a [`FetchError`] for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Server answered with a non-success status.
    HttpStatus,
    /// Server answered with nothing.
    EmptyBody,
    /// Request did not complete in time.
    Timeout,
    /// Connection or transfer problem.
    Network,
    /// The download task died.
    Aborted,
}

impl FetchError {
    /// Creates a connection error.
    #[must_use]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Creates a transfer error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Status { .. } => FetchErrorKind::HttpStatus,
            Self::EmptyBody => FetchErrorKind::EmptyBody,
            Self::Timeout => FetchErrorKind::Timeout,
            Self::Connect { .. } | Self::Transport { .. } => FetchErrorKind::Network,
            Self::Aborted => FetchErrorKind::Aborted,
        }
    }

    /// Returns whether a retry could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Status { status } => *status >= 500 || *status == 429,
            Self::EmptyBody => false,
            Self::Timeout | Self::Connect { .. } | Self::Transport { .. } | Self::Aborted => true,
        }
    }
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpStatus => write!(f, "http-status"),
            Self::EmptyBody => write!(f, "empty-body"),
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}
