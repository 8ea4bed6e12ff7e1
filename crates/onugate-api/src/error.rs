use thiserror::Error;

use crate::retry::is_rate_limit_text;

/// Top-level error type for the `onugate-api` crate.
///
/// Covers every failure the transport and retry layers can produce.
/// 4xx responses are *not* errors here: they come back as a
/// [`RawResponse`](crate::RawResponse) so the caller can read the
/// upstream's own explanation. `onugate-core` maps these into
/// caller-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The configured token cannot be carried in an HTTP header.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The upstream answered with a 5xx status.
    #[error("Upstream server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    // ── Throttling ──────────────────────────────────────────────────
    /// Every attempt was answered with a rate-limit signature.
    #[error("Rate limited after {attempts} attempt(s): {message}")]
    RateLimited { message: String, attempts: u32 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::Server { .. } | Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the error carries an upstream throttling signal,
    /// either as a classified [`RateLimited`](Self::RateLimited) or as
    /// free text matching one of the known phrases.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            other => is_rate_limit_text(&other.to_string()),
        }
    }
}
