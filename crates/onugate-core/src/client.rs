// ── Cache-backed upstream client ──
//
// Every read goes through the cache first and falls back to the last
// good value when the upstream throttles or is unreachable. Mutations
// are never cached. This is the only writer of the cache store.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use onugate_api::{Params, RawResponse, RetryPolicy, UpstreamTransport, envelope};

use crate::cache::{CacheEntry, CacheStore, FileBackend};
use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::model::{DeviceDetailRecord, DeviceStatusRecord, decode_feed, feed_items};
use crate::resource::{Action, Resource};

/// Freshness windows per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Bulk ONU details.
    pub details: Duration,
    /// Everything else.
    pub default: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            details: Duration::from_secs(3600),
            default: Duration::from_secs(300),
        }
    }
}

impl CacheTtls {
    pub fn for_resource(&self, resource: &Resource) -> Duration {
        match resource {
            Resource::AllOnuDetails => self.details,
            _ => self.default,
        }
    }
}

/// Where a fetched body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Fetched just now.
    Upstream,
    /// Served from a cache entry still within its TTL.
    FreshCache,
    /// Upstream failed; served from a stale entry.
    Fallback,
}

/// A successful `fetch`.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub entry: Arc<CacheEntry>,
    pub origin: Origin,
}

impl Fetched {
    pub fn body(&self) -> &Value {
        &self.entry.data
    }

    /// The body as sent to callers: a fresh cache hit is tagged
    /// `cached: false`, a fallback `cached: true`, an upstream answer
    /// is passed through untouched.
    pub fn into_envelope(self) -> Value {
        let mut body = Arc::unwrap_or_clone(self.entry).data;
        let cached = match self.origin {
            Origin::Upstream => return body,
            Origin::FreshCache => false,
            Origin::Fallback => true,
        };
        if let Value::Object(map) = &mut body {
            map.insert("cached".into(), Value::Bool(cached));
        }
        body
    }
}

/// Result of a forced details refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub ok: bool,
    /// Devices in the new snapshot; 0 on failure.
    pub total: usize,
}

/// Resilient client for the upstream OLT manager.
pub struct UpstreamClient {
    transport: UpstreamTransport,
    retry: RetryPolicy,
    cache: CacheStore,
    ttls: CacheTtls,
}

impl UpstreamClient {
    pub fn new(
        transport: UpstreamTransport,
        retry: RetryPolicy,
        cache: CacheStore,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            transport,
            retry,
            cache,
            ttls,
        }
    }

    /// Build the transport and cache described by `config`. With a cache
    /// directory, every durable resource is restored from disk.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, CoreError> {
        let transport = UpstreamTransport::from_token(
            config.base_url.as_str(),
            &config.token,
            &config.transport_config(),
        )?;

        let cache = match &config.cache_dir {
            Some(dir) => CacheStore::open(FileBackend::new(dir)?, Resource::durable_keys()),
            None => CacheStore::in_memory(),
        };

        Ok(Self::new(transport, config.retry, cache, config.ttls))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch `resource`, preferring a fresh cache entry when `use_cache`.
    ///
    /// On a throttle or transport failure the last cached body is served
    /// instead (origin [`Origin::Fallback`]). With nothing cached, a
    /// throttle becomes [`CoreError::NoCacheAvailable`] and any other
    /// failure propagates. Upstream rejections are never masked.
    pub async fn fetch(
        &self,
        resource: &Resource,
        params: &Params,
        use_cache: bool,
    ) -> Result<Fetched, CoreError> {
        let key = resource.cache_key(params);

        if use_cache {
            if let Some(entry) = self.cache.read(&key).filter(|e| e.is_fresh()) {
                debug!(key = %key, "serving fresh cache entry");
                return Ok(Fetched {
                    entry,
                    origin: Origin::FreshCache,
                });
            }
        }

        match self.get_upstream(&resource.path(), params).await {
            Ok(body) => {
                let entry = self
                    .cache
                    .write(&key, body, self.ttls.for_resource(resource))
                    .await;
                Ok(Fetched {
                    entry,
                    origin: Origin::Upstream,
                })
            }
            Err(err) if err.is_rate_limit() || err.is_transient() => self.fall_back(&key, err),
            Err(err) => Err(err),
        }
    }

    fn fall_back(&self, key: &str, err: CoreError) -> Result<Fetched, CoreError> {
        match self.cache.read(key) {
            Some(entry) => {
                warn!(key, error = %err, "upstream unavailable, serving cached copy");
                Ok(Fetched {
                    entry,
                    origin: Origin::Fallback,
                })
            }
            None if err.is_rate_limit() => {
                warn!(key, "upstream limit reached with nothing cached");
                Err(CoreError::NoCacheAvailable {
                    resource: key.to_owned(),
                })
            }
            None => Err(err),
        }
    }

    async fn get_upstream(&self, path: &str, params: &Params) -> Result<Value, CoreError> {
        let transport = &self.transport;
        let response = self
            .retry
            .run(move || transport.get(path, params))
            .await?;
        classify(response)
    }

    /// Status of every ONU.
    pub async fn status_feed(&self) -> Result<Vec<DeviceStatusRecord>, CoreError> {
        let fetched = self
            .fetch(&Resource::OnuStatuses, &Params::new(), true)
            .await?;
        Ok(decode_feed(fetched.body()))
    }

    /// Descriptive details of every ONU.
    pub async fn details_feed(&self) -> Result<Vec<DeviceDetailRecord>, CoreError> {
        let fetched = self
            .fetch(&Resource::AllOnuDetails, &Params::new(), true)
            .await?;
        Ok(decode_feed(fetched.body()))
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// POST `params` as a form to `action`, with retries.
    ///
    /// Returns whatever the upstream answered; deciding whether that is
    /// a success is the caller's business.
    pub async fn mutate(&self, action: &Action, params: &Params) -> Result<RawResponse, CoreError> {
        let path = action.path();
        let path = path.as_str();
        let transport = &self.transport;
        debug!(action = %action, path, fields = params.len(), "upstream mutation");

        let response = self
            .retry
            .run(move || transport.post_form(path, params))
            .await?;
        Ok(response)
    }

    /// Re-fetch the bulk details snapshot, bypassing freshness.
    ///
    /// On success the old entry is dropped from both tiers and replaced.
    /// On any failure the existing entry is left as it was.
    pub async fn force_refresh(&self) -> RefreshOutcome {
        let resource = Resource::AllOnuDetails;
        let params = Params::new();
        let key = resource.cache_key(&params);

        match self.get_upstream(&resource.path(), &params).await {
            Ok(body) => {
                let total = feed_items(&body).len();
                self.cache.invalidate(&key).await;
                self.cache
                    .write(&key, body, self.ttls.for_resource(&resource))
                    .await;
                info!(total, "device details refreshed");
                RefreshOutcome { ok: true, total }
            }
            Err(e) => {
                warn!(error = %e, "forced refresh failed, keeping cached details");
                RefreshOutcome {
                    ok: false,
                    total: 0,
                }
            }
        }
    }
}

/// Turn an answered call into a body worth caching, or the reason it isn't.
fn classify(response: RawResponse) -> Result<Value, CoreError> {
    let RawResponse { status_code, body } = response;
    let text = envelope::message(&body).or_else(|| body.as_str());

    if envelope::is_rate_limited(&body)
        || (status_code >= 400 && text.is_some_and(onugate_api::is_rate_limit_text))
    {
        return Err(CoreError::RateLimitExceeded {
            message: text.unwrap_or("rate limited").to_owned(),
        });
    }

    if !envelope::is_success(&body) || (400..500).contains(&status_code) {
        let message = text.map_or_else(
            || format!("upstream answered HTTP {status_code}"),
            str::to_owned,
        );
        return Err(CoreError::UpstreamRejection {
            message,
            status_code,
        });
    }

    // Only an envelope object is worth caching; anything else would
    // replace good data with a value no reader understands.
    if !body.is_object() {
        return Err(CoreError::Transport {
            message: format!("upstream answered HTTP {status_code} without an envelope"),
            status: Some(status_code),
        });
    }

    Ok(body)
}
