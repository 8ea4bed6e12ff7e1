// ── Status feed record ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::EnumString;

use super::identity::{DeviceIdentity, loose_string, non_blank};

/// One ONU as reported by the status feed.
///
/// Fields other than identity and `status` are kept verbatim in `extra`
/// so the unified record can pass them through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatusRecord {
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub unique_external_id: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub sn: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub onu: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceStatusRecord {
    /// Parsed connectivity status, if the feed reported one.
    pub fn connectivity(&self) -> Option<ConnectivityStatus> {
        non_blank(self.status.as_deref()).and_then(|s| s.parse().ok())
    }

    /// A pass-through field from `extra`, rendered as text.
    pub(crate) fn extra_text(&self, key: &str) -> Option<String> {
        match self.extra.get(key)? {
            Value::String(s) => non_blank(Some(s)).map(str::to_owned),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl DeviceIdentity for DeviceStatusRecord {
    fn external_id(&self) -> Option<&str> {
        self.unique_external_id.as_deref()
    }
    fn serial(&self) -> Option<&str> {
        self.sn.as_deref()
    }
    fn board(&self) -> Option<&str> {
        self.board.as_deref()
    }
    fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }
    fn onu_slot(&self) -> Option<&str> {
        self.onu.as_deref()
    }
}

/// Connectivity status as spelled by the upstream (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
#[non_exhaustive]
pub enum ConnectivityStatus {
    Online,
    Offline,
    Disabled,
    Unauthorized,
    Waiting,
    Unconfigured,
    /// Anything else (`"LOS"`, `"Power fail"`, ...), verbatim.
    #[strum(default)]
    Other(String),
}

/// Coarse grouping used by aggregate statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    Online,
    Offline,
    /// Unauthorized, waiting, or unconfigured.
    Waiting,
    Other,
}

impl ConnectivityStatus {
    pub fn bucket(&self) -> StatusBucket {
        match self {
            Self::Online => StatusBucket::Online,
            Self::Offline => StatusBucket::Offline,
            Self::Unauthorized | Self::Waiting | Self::Unconfigured => StatusBucket::Waiting,
            Self::Disabled | Self::Other(_) => StatusBucket::Other,
        }
    }

    /// Offline or administratively disabled.
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Offline | Self::Disabled)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_numeric_identity_fields() {
        let record: DeviceStatusRecord = serde_json::from_value(json!({
            "sn": "HWTC1A2B3C4D",
            "board": 1,
            "port": 2,
            "onu": 3,
            "status": "Online",
            "olt_id": "7"
        }))
        .unwrap();

        assert_eq!(record.board.as_deref(), Some("1"));
        assert_eq!(record.onu_slot(), Some("3"));
        assert_eq!(record.extra.get("olt_id"), Some(&json!("7")));
    }

    #[test]
    fn connectivity_is_case_insensitive_and_trimmed() {
        let record = DeviceStatusRecord {
            status: Some("  OFFLINE ".into()),
            ..Default::default()
        };
        assert_eq!(record.connectivity(), Some(ConnectivityStatus::Offline));

        let record = DeviceStatusRecord {
            status: Some("Power fail".into()),
            ..Default::default()
        };
        assert_eq!(
            record.connectivity(),
            Some(ConnectivityStatus::Other("Power fail".into()))
        );

        assert_eq!(DeviceStatusRecord::default().connectivity(), None);
    }

    #[test]
    fn buckets() {
        assert_eq!(ConnectivityStatus::Unconfigured.bucket(), StatusBucket::Waiting);
        assert_eq!(ConnectivityStatus::Disabled.bucket(), StatusBucket::Other);
        assert!(ConnectivityStatus::Disabled.is_down());
        assert!(!ConnectivityStatus::Online.is_down());
    }

    #[test]
    fn serializes_extras_flat() {
        let record: DeviceStatusRecord = serde_json::from_value(json!({
            "sn": "ABC",
            "last_status_change": "2024-01-01"
        }))
        .unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({ "sn": "ABC", "last_status_change": "2024-01-01" }));
    }
}
