// ── Domain model ──
//
// Raw feed records as the upstream sends them, and the unified record
// produced by reconciliation. Identity fields arrive as strings on some
// endpoints and numbers on others; they are normalized to strings on
// the way in.

pub mod detail;
pub mod identity;
pub mod status;
pub mod unified;

pub use detail::{DeviceDetailRecord, ServicePort};
pub use identity::DeviceIdentity;
pub use status::{ConnectivityStatus, DeviceStatusRecord, StatusBucket};
pub use unified::UnifiedRecord;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// The record array inside a feed envelope.
///
/// Accepts `response: [...]` and `response: { onus: [...] }`; anything
/// else is an empty feed.
pub fn feed_items(body: &Value) -> &[Value] {
    let Some(response) = body.get("response") else {
        return &[];
    };
    response
        .as_array()
        .or_else(|| response.get("onus").and_then(Value::as_array))
        .map_or(&[], Vec::as_slice)
}

/// Decode every item of a feed, skipping (and logging) ones that don't fit.
pub fn decode_feed<T: DeserializeOwned>(body: &Value) -> Vec<T> {
    feed_items(body)
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "skipping undecodable feed record");
                None
            }
        })
        .collect()
}
