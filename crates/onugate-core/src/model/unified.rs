// ── Unified device record ──

use serde::Serialize;

use super::detail::DeviceDetailRecord;
use super::identity::non_blank;
use super::status::DeviceStatusRecord;
use crate::reconcile::MatchTier;

pub const DEFAULT_NAME: &str = "-";
pub const DEFAULT_TYPE: &str = "-";
pub const DEFAULT_VLAN: &str = "Sin VLAN";
pub const DEFAULT_OLT_NAME: &str = "-";
pub const DEFAULT_SIGNAL: &str = "-";

/// Keys the enrichment owns. Stripped from the status record's extras so
/// the flattened output never carries them twice.
const ENRICHED_KEYS: &[&str] = &[
    "name",
    "type",
    "vlan",
    "olt_name",
    "signal_1310",
    "signal_1490",
    "signal",
];

/// A status record enriched with descriptive fields from its matching
/// detail record. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedRecord {
    #[serde(flatten)]
    pub device: DeviceStatusRecord,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub vlan: String,
    pub olt_name: String,
    pub signal_1310: String,
    pub signal_1490: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// Which matcher paired this record, `None` if unmatched.
    #[serde(skip)]
    pub match_tier: Option<MatchTier>,
}

impl UnifiedRecord {
    /// Merge `status` with its match (if any). Missing descriptive fields
    /// take the fixed defaults; signals fall back to whatever the status
    /// feed itself reported.
    pub fn enrich(
        status: &DeviceStatusRecord,
        detail: Option<&DeviceDetailRecord>,
        match_tier: Option<MatchTier>,
    ) -> Self {
        let mut device = status.clone();
        for key in ENRICHED_KEYS {
            device.extra.remove(*key);
        }

        let from_detail = |pick: fn(&DeviceDetailRecord) -> Option<&str>| {
            detail.and_then(|d| non_blank(pick(d))).map(str::to_owned)
        };
        let signal_or = |pick: fn(&DeviceDetailRecord) -> Option<&str>, key: &str| {
            from_detail(pick).or_else(|| status.extra_text(key))
        };

        Self {
            name: from_detail(|d| d.name.as_deref()).unwrap_or_else(|| DEFAULT_NAME.into()),
            device_type: from_detail(|d| d.onu_type_name.as_deref())
                .unwrap_or_else(|| DEFAULT_TYPE.into()),
            vlan: from_detail(DeviceDetailRecord::primary_vlan)
                .unwrap_or_else(|| DEFAULT_VLAN.into()),
            olt_name: from_detail(|d| d.olt_name.as_deref())
                .unwrap_or_else(|| DEFAULT_OLT_NAME.into()),
            signal_1310: signal_or(|d| d.signal_1310.as_deref(), "signal_1310")
                .unwrap_or_else(|| DEFAULT_SIGNAL.into()),
            signal_1490: signal_or(|d| d.signal_1490.as_deref(), "signal_1490")
                .unwrap_or_else(|| DEFAULT_SIGNAL.into()),
            signal: signal_or(|d| d.signal.as_deref(), "signal"),
            device,
            match_tier,
        }
    }

    /// Parsed connectivity status of the underlying device.
    pub fn connectivity(&self) -> Option<super::ConnectivityStatus> {
        self.device.connectivity()
    }
}
