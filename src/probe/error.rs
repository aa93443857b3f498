//! Error types for the probe module.
//!
//! [`ProbeError`] never escapes [`Prober::probe`](super::Prober::probe): the
//! HTTP prober converts it into a [`ProbeOutcome::Error`] carrying the
//! matching [`ErrorKind`]. Only [`ProbeError::ClientBuild`] surfaces to
//! callers, from prober construction.

use thiserror::Error;

use super::{ErrorKind, ProbeOutcome};

/// Errors that can occur while probing a candidate.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Request timed out.
    #[error("timeout probing {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Transport-level failure (DNS, connect, TLS).
    #[error("connection error probing {url}: {source}")]
    Connection {
        /// The URL being probed.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP-layer anomaly that is neither a timeout nor a transport failure.
    #[error("protocol error probing {url}: {source}")]
    Protocol {
        /// The URL being probed.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The candidate URL is not a valid absolute URL.
    #[error("invalid candidate URL: {url}")]
    InvalidCandidate {
        /// The rejected URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// Underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl ProbeError {
    /// Classifies a request error by failure category.
    pub fn from_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if source.is_connect() || source.is_request() {
            Self::Connection { url, source }
        } else {
            Self::Protocol { url, source }
        }
    }

    /// Creates an invalid-candidate error.
    pub fn invalid_candidate(url: impl Into<String>) -> Self {
        Self::InvalidCandidate { url: url.into() }
    }

    /// The outcome category for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::InvalidCandidate { .. } => ErrorKind::InvalidCandidate,
            Self::ClientBuild { .. } => ErrorKind::Internal,
        }
    }

    /// Converts the error into the outcome recorded for the candidate.
    #[must_use]
    pub fn into_outcome(self) -> ProbeOutcome {
        ProbeOutcome::error(self.kind(), self.to_string())
    }
}
