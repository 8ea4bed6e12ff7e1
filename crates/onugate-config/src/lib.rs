//! Configuration for onugate.
//!
//! A TOML file merged with `ONUGATE_`-prefixed environment variables,
//! upstream token resolution (env var + keyring + plaintext), and
//! translation to `onugate_core::GatewayConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use onugate_core::{CacheTtls, GatewayConfig, RetryPolicy, SignalPolicy, TlsVerification};

const KEYRING_SERVICE: &str = "onugate";
const KEYRING_TOKEN_ENTRY: &str = "upstream/token";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no upstream token configured (checked ${env}, keyring, and upstream.token)")]
    NoToken { env: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: Upstream,

    #[serde(default)]
    pub retry: Retry,

    #[serde(default)]
    pub cache: Cache,

    #[serde(default)]
    pub signal: Signal,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Upstream {
    /// API root, e.g. "https://tenant.smartolt.com/api".
    pub base_url: Option<String>,

    /// Token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable holding the token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Skip TLS verification.
    #[serde(default = "default_insecure")]
    pub insecure: bool,

    /// Path to a custom CA certificate. Ignored when `insecure`.
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            token_env: default_token_env(),
            insecure: default_insecure(),
            ca_cert: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_token_env() -> String {
    "SMARTOLT_TOKEN".into()
}
fn default_insecure() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Retry {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}
fn default_base_delay_ms() -> u64 {
    3000
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Cache {
    /// Directory for the durable details snapshot. Unset keeps it in memory.
    pub dir: Option<PathBuf>,

    #[serde(default = "default_details_ttl_secs")]
    pub details_ttl_secs: u64,

    #[serde(default = "default_default_ttl_secs")]
    pub default_ttl_secs: u64,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            dir: None,
            details_ttl_secs: default_details_ttl_secs(),
            default_ttl_secs: default_default_ttl_secs(),
        }
    }
}

fn default_details_ttl_secs() -> u64 {
    3600
}
fn default_default_ttl_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Signal {
    /// Receive level (dBm) at or below which an ONU counts as low signal.
    #[serde(default = "default_low_signal_dbm")]
    pub low_signal_dbm: f64,
}

impl Default for Signal {
    fn default() -> Self {
        Self {
            low_signal_dbm: default_low_signal_dbm(),
        }
    }
}

fn default_low_signal_dbm() -> f64 {
    SignalPolicy::default().low_signal_dbm
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "onugate", "onugate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("onugate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from the platform path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file is not an
/// error; defaults and environment still apply.
///
/// Environment keys nest on `__`: `ONUGATE_UPSTREAM__BASE_URL` sets
/// `upstream.base_url`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ONUGATE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the upstream token: env var named by `token_env`, then the
/// system keyring, then plaintext config.
pub fn resolve_token(upstream: &Upstream) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(val) = std::env::var(&upstream.token_env) {
        if !val.trim().is_empty() {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_ENTRY) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = upstream.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoToken {
        env: upstream.token_env.clone(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Validate `cfg` and build the runtime `GatewayConfig`.
pub fn to_gateway_config(cfg: &Config) -> Result<GatewayConfig, ConfigError> {
    let raw_url = cfg
        .upstream
        .base_url
        .as_deref()
        .ok_or_else(|| invalid("upstream.base_url", "not set".into()))?;
    let base_url: url::Url = raw_url
        .parse()
        .map_err(|e| invalid("upstream.base_url", format!("invalid URL '{raw_url}': {e}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(invalid(
            "upstream.base_url",
            format!("unsupported scheme '{}'", base_url.scheme()),
        ));
    }

    if cfg.upstream.timeout_secs == 0 {
        return Err(invalid("upstream.timeout_secs", "must be positive".into()));
    }
    if cfg.retry.max_attempts == 0 {
        return Err(invalid("retry.max_attempts", "must be at least 1".into()));
    }
    if !cfg.signal.low_signal_dbm.is_finite() {
        return Err(invalid("signal.low_signal_dbm", "must be a finite number".into()));
    }

    let tls = if cfg.upstream.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.upstream.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let token = resolve_token(&cfg.upstream)?;

    Ok(GatewayConfig {
        base_url,
        token,
        tls,
        timeout: Duration::from_secs(cfg.upstream.timeout_secs),
        retry: RetryPolicy::new(
            cfg.retry.max_attempts,
            Duration::from_millis(cfg.retry.base_delay_ms),
        ),
        cache_dir: cfg.cache.dir.clone(),
        ttls: CacheTtls {
            details: Duration::from_secs(cfg.cache.details_ttl_secs),
            default: Duration::from_secs(cfg.cache.default_ttl_secs),
        },
        signal: SignalPolicy {
            low_signal_dbm: cfg.signal.low_signal_dbm,
        },
    })
}

fn invalid(field: &str, reason: String) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn with_upstream(base_url: &str, token: &str) -> Config {
        Config {
            upstream: Upstream {
                base_url: Some(base_url.into()),
                token: Some(token.into()),
                token_env: "ONUGATE_TEST_UNSET_TOKEN".into(),
                ..Upstream::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("missing.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.upstream.token_env, "SMARTOLT_TOKEN");
            assert!(cfg.upstream.insecure);
            assert_eq!(cfg.upstream.timeout_secs, 20);
            assert_eq!(cfg.retry.max_attempts, 2);
            assert_eq!(cfg.retry.base_delay_ms, 3000);
            assert_eq!(cfg.cache.details_ttl_secs, 3600);
            assert_eq!(cfg.cache.default_ttl_secs, 300);
            assert!((cfg.signal.low_signal_dbm - -27.5).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "onugate.toml",
                r#"
                [upstream]
                base_url = "https://tenant.example.com/api"
                timeout_secs = 45

                [retry]
                max_attempts = 3

                [cache]
                dir = "/var/cache/onugate"
                "#,
            )?;
            jail.set_env("ONUGATE_RETRY__MAX_ATTEMPTS", "5");
            jail.set_env("ONUGATE_SIGNAL__LOW_SIGNAL_DBM", "-26");

            let cfg = load_config_from(Path::new("onugate.toml")).map_err(|e| e.to_string())?;
            assert_eq!(
                cfg.upstream.base_url.as_deref(),
                Some("https://tenant.example.com/api")
            );
            assert_eq!(cfg.upstream.timeout_secs, 45);
            assert_eq!(cfg.retry.max_attempts, 5);
            assert_eq!(cfg.cache.dir, Some(PathBuf::from("/var/cache/onugate")));
            assert!((cfg.signal.low_signal_dbm - -26.0).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn token_env_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("ONUGATE_TEST_TOKEN", "from-env");
            let upstream = Upstream {
                token: Some("from-file".into()),
                token_env: "ONUGATE_TEST_TOKEN".into(),
                ..Upstream::default()
            };
            let token = resolve_token(&upstream).map_err(|e| e.to_string())?;
            assert_eq!(token.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn gateway_config_from_sections() {
        let mut cfg = with_upstream("https://tenant.example.com/api", "plain");
        cfg.upstream.insecure = false;
        cfg.upstream.ca_cert = Some("/etc/ssl/olt.pem".into());
        cfg.retry.base_delay_ms = 500;
        cfg.cache.details_ttl_secs = 7200;

        let gateway = to_gateway_config(&cfg).unwrap();
        assert_eq!(gateway.base_url.as_str(), "https://tenant.example.com/api");
        assert_eq!(gateway.tls, TlsVerification::CustomCa("/etc/ssl/olt.pem".into()));
        assert_eq!(gateway.retry, RetryPolicy::new(2, Duration::from_millis(500)));
        assert_eq!(gateway.ttls.details, Duration::from_secs(7200));
        assert_eq!(gateway.ttls.default, Duration::from_secs(300));
        assert_eq!(gateway.timeout, Duration::from_secs(20));
    }

    #[test]
    fn strict_tls_without_ca_uses_system_roots() {
        let mut cfg = with_upstream("https://tenant.example.com/api", "plain");
        cfg.upstream.insecure = false;
        assert_eq!(
            to_gateway_config(&cfg).unwrap().tls,
            TlsVerification::SystemDefaults
        );
    }

    #[test]
    fn validation_names_the_field() {
        let cfg = Config::default();
        let err = to_gateway_config(&cfg).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "upstream.base_url")
        );

        let cfg = with_upstream("ftp://tenant.example.com", "plain");
        assert!(matches!(
            to_gateway_config(&cfg).unwrap_err(),
            ConfigError::Validation { .. }
        ));

        let mut cfg = with_upstream("https://tenant.example.com/api", "plain");
        cfg.retry.max_attempts = 0;
        let err = to_gateway_config(&cfg).unwrap_err();
        assert_eq!(err.to_string(), "invalid retry.max_attempts: must be at least 1");
    }

    #[test]
    fn save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = with_upstream("https://tenant.example.com/api", "plain");

        save_config_to(&cfg, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("base_url = \"https://tenant.example.com/api\""));

        let parsed: Config = toml::from_str(&written).unwrap();
        assert_eq!(parsed.upstream.token_env, "ONUGATE_TEST_UNSET_TOKEN");
    }
}
