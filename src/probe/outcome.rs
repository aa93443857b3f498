//! Classified result of a single existence probe.

use std::fmt;

use serde::Serialize;

/// Failure category for a probe that produced no HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request did not complete within the configured timeout.
    Timeout,
    /// DNS, connect, TLS or other transport failure.
    Connection,
    /// HTTP-layer anomaly (bad redirect, malformed response, ...).
    Protocol,
    /// The candidate URL could not be built from the template.
    InvalidCandidate,
    /// Anything unexpected, including a panicking prober.
    Internal,
}

impl ErrorKind {
    /// Stable label used in output and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Protocol => "protocol",
            Self::InvalidCandidate => "invalid_candidate",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of probing one candidate URL. Produced exactly once per candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The server answered 200; `filename` is the last path segment of the
    /// probed URL (never of a redirect target).
    Found {
        /// Filename taken from the probed URL.
        filename: String,
    },
    /// The server answered with any other status.
    NotFound {
        /// Final HTTP status code.
        status: u16,
    },
    /// No status was obtained.
    Error {
        /// Failure category.
        kind: ErrorKind,
        /// Human-readable detail for verbose output.
        detail: String,
    },
}

impl ProbeOutcome {
    /// Creates a `Found` outcome.
    pub fn found(filename: impl Into<String>) -> Self {
        Self::Found {
            filename: filename.into(),
        }
    }

    /// Creates a `NotFound` outcome.
    #[must_use]
    pub fn not_found(status: u16) -> Self {
        Self::NotFound { status }
    }

    /// Creates an `Error` outcome.
    pub fn error(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Error {
            kind,
            detail: detail.into(),
        }
    }

    /// Returns true for `Found`.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Returns true for `Error`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The found filename, if any.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Found { filename } => Some(filename),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let found = ProbeOutcome::found("update_kindle_5.16.8.bin");
        assert!(found.is_found());
        assert_eq!(found.filename(), Some("update_kindle_5.16.8.bin"));

        let missing = ProbeOutcome::not_found(403);
        assert!(!missing.is_found());
        assert_eq!(missing.filename(), None);

        let failed = ProbeOutcome::error(ErrorKind::Timeout, "timed out");
        assert!(failed.is_error());
        assert_eq!(failed.filename(), None);
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_value(ProbeOutcome::not_found(404)).unwrap();
        assert_eq!(json["outcome"], "not_found");
        assert_eq!(json["status"], 404);

        let json =
            serde_json::to_value(ProbeOutcome::error(ErrorKind::Connection, "refused")).unwrap();
        assert_eq!(json["kind"], "connection");
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(ErrorKind::InvalidCandidate.as_str(), "invalid_candidate");
    }
}
