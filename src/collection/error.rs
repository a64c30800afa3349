//! Error types for the remote collection client.
//!
//! Every variant carries the URL (or term) it concerns so that a skipped
//! identifier can be logged with enough context to debug upstream behavior.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the remote collection API.
///
/// None of these are fatal to a batch: the resolver folds them into a
/// per-item skip and carries on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-2xx response that is not rate-limit related.
    #[error("HTTP {status} fetching {url}")]
    Upstream {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Rate-limit class response (403 or 429).
    #[error("throttled (HTTP {status}) fetching {url}")]
    Throttled {
        /// The URL that was throttled.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Parsed Retry-After header, when the server sent one.
        retry_after: Option<Duration>,
    },

    /// Response body could not be decoded into the expected shape.
    #[error("malformed response from {url}: {reason}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// Decoder message.
        reason: String,
    },

    /// The listing request cannot be expressed (blank or control-character term).
    #[error("invalid query '{term}': {reason}")]
    InvalidQuery {
        /// The offending search term.
        term: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The configured base URL or a derived URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

/// Copyable classification of a [`FetchError`], used in skip reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection failure or timeout.
    Network,
    /// Non-2xx status.
    Upstream,
    /// Rate-limit class status.
    Throttled,
    /// Malformed body.
    Decode,
    /// Request rejected before it was sent.
    Invalid,
}

impl FailureKind {
    /// Stable lowercase label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Upstream => "upstream",
            Self::Throttled => "throttled",
            Self::Decode => "decode",
            Self::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates the right error for a non-2xx status.
    ///
    /// 403 and 429 are rate-limit class and become [`FetchError::Throttled`].
    pub fn from_status(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<Duration>,
    ) -> Self {
        if is_throttle_status(status) {
            Self::Throttled {
                url: url.into(),
                status,
                retry_after,
            }
        } else {
            Self::Upstream {
                url: url.into(),
                status,
            }
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(term: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidQuery {
            term: term.into(),
            reason,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => FailureKind::Network,
            Self::Upstream { .. } => FailureKind::Upstream,
            Self::Throttled { .. } => FailureKind::Throttled,
            Self::Decode { .. } => FailureKind::Decode,
            Self::InvalidQuery { .. } | Self::InvalidUrl { .. } => FailureKind::Invalid,
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } | Self::Throttled { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-requested wait carried by a throttled response.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Throttled { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Returns true for rate-limit class statuses.
#[must_use]
pub fn is_throttle_status(status: u16) -> bool {
    matches!(status, 403 | 429)
}
