// ── Core error types ──
//
// Caller-facing errors from onugate-core. Transport-layer details are
// folded into a handful of variants a route handler can act on. The
// `From<onugate_api::Error>` impl does the translation.

use serde_json::Value;
use thiserror::Error;

use onugate_api::envelope;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Upstream reachability ────────────────────────────────────────
    /// Network failure, 5xx, or a body that isn't JSON.
    #[error("Upstream transport error: {message}")]
    Transport {
        message: String,
        /// HTTP status code (if the upstream answered at all).
        status: Option<u16>,
    },

    #[error("Upstream timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Upstream answers ─────────────────────────────────────────────
    /// The upstream said `status: false` for a reason other than throttling.
    #[error("Upstream rejected the request: {message}")]
    UpstreamRejection { message: String, status_code: u16 },

    /// Throttling persisted through every retry.
    #[error("Upstream rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    /// Throttled (or failed) with nothing cached to fall back on.
    #[error("upstream limit reached, no cache available")]
    NoCacheAvailable { resource: String },

    // ── Local state ──────────────────────────────────────────────────
    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Throttling, whether or not a cache could have masked it.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::NoCacheAvailable { .. }
        )
    }

    /// Failures a cached value is allowed to hide.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// `{ "status": false, "error": "..." }` for the caller's wire format.
    ///
    /// Rejections carry the upstream's own text unchanged.
    pub fn to_envelope(&self) -> Value {
        match self {
            Self::UpstreamRejection { message, .. } => envelope::failure(message.clone()),
            other => envelope::failure(other.to_string()),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<onugate_api::Error> for CoreError {
    fn from(err: onugate_api::Error) -> Self {
        match err {
            onugate_api::Error::Authentication { message } => CoreError::Config {
                message: format!("invalid upstream token: {message}"),
            },
            // Timeouts were already turned into `Error::Timeout` by the
            // transport, which knows the configured limit.
            onugate_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            onugate_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            onugate_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            onugate_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            onugate_api::Error::Server { status, body } => CoreError::Transport {
                message: format!("HTTP {status}: {body}"),
                status: Some(status),
            },
            onugate_api::Error::RateLimited { message, .. } => {
                CoreError::RateLimitExceeded { message }
            }
            onugate_api::Error::Deserialization { message, body: _ } => CoreError::Transport {
                message: format!("unparseable upstream response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_cache_envelope_uses_fixed_text() {
        let err = CoreError::NoCacheAvailable {
            resource: "/onu/get_onus_statuses".into(),
        };
        assert_eq!(
            err.to_envelope(),
            json!({ "status": false, "error": "upstream limit reached, no cache available" })
        );
        assert!(err.is_rate_limit());
    }

    #[test]
    fn api_rate_limit_maps_to_exceeded() {
        let err: CoreError = onugate_api::Error::RateLimited {
            message: "hourly limit".into(),
            attempts: 2,
        }
        .into();
        assert!(matches!(err, CoreError::RateLimitExceeded { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn timeout_keeps_configured_limit() {
        let err: CoreError = onugate_api::Error::Timeout { timeout_secs: 20 }.into();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 20 }));
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Upstream timed out after 20s");
    }

    #[test]
    fn server_error_is_transient() {
        let err: CoreError = onugate_api::Error::Server {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert!(err.is_transient());
        assert!(matches!(err, CoreError::Transport { status: Some(502), .. }));
    }

    #[test]
    fn rejection_is_neither_transient_nor_throttle() {
        let err = CoreError::UpstreamRejection {
            message: "ONU not found".into(),
            status_code: 200,
        };
        assert!(!err.is_transient());
        assert!(!err.is_rate_limit());
        assert_eq!(err.to_envelope()["error"], "ONU not found");
    }
}
