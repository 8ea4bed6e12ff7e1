use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One cached upstream body.
///
/// On disk this is `{ "data": ..., "lastFetch": <epoch ms>, "ttl": <ms> }`.
/// The key is the file name, not part of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(skip)]
    pub key: String,
    pub data: Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_fetch: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, data: Value, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            data,
            last_fetch: Utc::now(),
            ttl,
        }
    }

    /// `now - last_fetch < ttl`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.last_fetch);
        match TimeDelta::from_std(self.ttl) {
            Ok(ttl) => age < ttl,
            // A TTL too large to represent never expires.
            Err(_) => true,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
