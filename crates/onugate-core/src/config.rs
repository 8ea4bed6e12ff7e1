// ── Runtime gateway configuration ──
//
// Describes how to reach the upstream and how long to trust its answers.
// Carries the token and tuning knobs but never touches disk; the config
// crate (or a test) builds a `GatewayConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use onugate_api::{RetryPolicy, TlsMode, TransportConfig};

use crate::client::CacheTtls;
use crate::views::SignalPolicy;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. The upstream is commonly reached this way.
    #[default]
    DangerAcceptInvalid,
}

/// Everything needed to build an [`UpstreamClient`](crate::UpstreamClient).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upstream API root (e.g. `https://tenant.smartolt.com/api`).
    pub base_url: Url,
    /// Sent as `X-Token` on every call.
    pub token: SecretString,
    pub tls: TlsVerification,
    /// Per-call timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Where durable cache entries live. `None` keeps everything in memory.
    pub cache_dir: Option<PathBuf>,
    pub ttls: CacheTtls,
    pub signal: SignalPolicy,
}

impl GatewayConfig {
    /// Defaults for everything but the endpoint and token.
    pub fn new(base_url: Url, token: SecretString) -> Self {
        Self {
            base_url,
            token,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
            cache_dir: None,
            ttls: CacheTtls::default(),
            signal: SignalPolicy::default(),
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
        }
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
