// ── Derived views over reconciled records ──

use serde::{Deserialize, Serialize};

use crate::model::{StatusBucket, UnifiedRecord};

/// Optical receive threshold shared by every signal-based view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalPolicy {
    /// Readings at or below this level (dBm) count as low.
    pub low_signal_dbm: f64,
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self {
            low_signal_dbm: -27.5,
        }
    }
}

impl SignalPolicy {
    /// `true` if `reading` parses as a level at or below the threshold.
    pub fn is_low(self, reading: &str) -> bool {
        parse_dbm(reading).is_some_and(|level| level <= self.low_signal_dbm)
    }
}

/// Leading decimal number of a reading: `"-28.1 dBm"` is `-28.1`.
/// `None` when the text does not start with a number.
pub fn parse_dbm(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }
    s.get(..end)?.parse().ok()
}

/// Offline, disabled, or with either receive level at or below threshold.
pub fn is_low_signal_or_offline(record: &UnifiedRecord, policy: SignalPolicy) -> bool {
    record.connectivity().is_some_and(|s| s.is_down())
        || policy.is_low(&record.signal_1310)
        || policy.is_low(&record.signal_1490)
}

/// Records needing attention, in input order.
pub fn low_signal_or_offline(records: &[UnifiedRecord], policy: SignalPolicy) -> Vec<&UnifiedRecord> {
    records
        .iter()
        .filter(|r| is_low_signal_or_offline(r, policy))
        .collect()
}

/// Aggregate device counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    /// Unauthorized, waiting, or unconfigured.
    pub waiting: usize,
    #[serde(rename = "lowsignal")]
    pub low_signal: usize,
}

/// Count records per status bucket and below the signal threshold.
///
/// The signal used is `signal_1310` when it holds a number, otherwise the
/// generic `signal` field.
pub fn summarize(records: &[UnifiedRecord], policy: SignalPolicy) -> DeviceStats {
    let mut stats = DeviceStats {
        total: records.len(),
        ..DeviceStats::default()
    };

    for record in records {
        match record.connectivity().map(|s| s.bucket()) {
            Some(StatusBucket::Online) => stats.online += 1,
            Some(StatusBucket::Offline) => stats.offline += 1,
            Some(StatusBucket::Waiting) => stats.waiting += 1,
            Some(StatusBucket::Other) | None => {}
        }

        let level = parse_dbm(&record.signal_1310)
            .or_else(|| record.signal.as_deref().and_then(parse_dbm));
        if level.is_some_and(|l| l <= policy.low_signal_dbm) {
            stats.low_signal += 1;
        }
    }

    stats
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceDetailRecord, DeviceStatusRecord};
    use crate::reconcile::reconcile;
    use serde_json::{Value, json};

    fn unified(status: Value, details: Value) -> Vec<UnifiedRecord> {
        let status: Vec<DeviceStatusRecord> = serde_json::from_value(status).unwrap();
        let details: Vec<DeviceDetailRecord> = serde_json::from_value(details).unwrap();
        reconcile(&status, &details)
    }

    #[test]
    fn parse_dbm_takes_leading_number() {
        assert_eq!(parse_dbm("-28.1 dBm"), Some(-28.1));
        assert_eq!(parse_dbm("  -19"), Some(-19.0));
        assert_eq!(parse_dbm("-.5"), Some(-0.5));
        assert_eq!(parse_dbm("12."), Some(12.0));
        assert_eq!(parse_dbm("-"), None);
        assert_eq!(parse_dbm("N/A"), None);
        assert_eq!(parse_dbm(""), None);
        assert_eq!(parse_dbm("."), None);
    }

    #[test]
    fn threshold_is_inclusive() {
        let policy = SignalPolicy::default();
        assert!(policy.is_low("-27.5"));
        assert!(policy.is_low("-30.02"));
        assert!(!policy.is_low("-27.49"));
        assert!(!policy.is_low("-"));
    }

    #[test]
    fn low_signal_or_offline_selects_expected_records() {
        let records = unified(
            json!([
                { "sn": "A", "status": "Online" },
                { "sn": "B", "status": " offline " },
                { "sn": "C", "status": "Online" },
                { "sn": "D", "status": "DISABLED" },
                { "sn": "E", "status": "Online" }
            ]),
            json!([
                { "sn": "A", "signal_1310": "-20.1", "signal_1490": "-19.0" },
                { "sn": "C", "signal_1310": "-21.0", "signal_1490": "-27.5" },
                { "sn": "E", "signal_1310": "n/a" }
            ]),
        );

        let selected: Vec<&str> = low_signal_or_offline(&records, SignalPolicy::default())
            .into_iter()
            .map(|r| r.device.sn.as_deref().unwrap())
            .collect();
        assert_eq!(selected, ["B", "C", "D"]);
    }

    #[test]
    fn summarize_counts_buckets_and_low_signal() {
        let records = unified(
            json!([
                { "sn": "A", "status": "Online" },
                { "sn": "B", "status": "Offline" },
                { "sn": "C", "status": "Unconfigured" },
                { "sn": "D", "status": "waiting" },
                { "sn": "E", "status": "LOS" },
                { "sn": "F", "status": "Online" }
            ]),
            json!([
                { "sn": "A", "signal_1310": "-28.00" },
                { "sn": "F", "signal": "-29.3 dBm" }
            ]),
        );

        let stats = summarize(&records, SignalPolicy::default());
        assert_eq!(
            stats,
            DeviceStats {
                total: 6,
                online: 2,
                offline: 1,
                waiting: 2,
                low_signal: 2,
            }
        );
        assert_eq!(serde_json::to_value(stats).unwrap()["lowsignal"], 2);
    }

    #[test]
    fn stricter_policy_changes_both_views() {
        let records = unified(
            json!([{ "sn": "A", "status": "Online" }]),
            json!([{ "sn": "A", "signal_1310": "-26.0" }]),
        );
        let strict = SignalPolicy {
            low_signal_dbm: -25.0,
        };

        assert_eq!(low_signal_or_offline(&records, strict).len(), 1);
        assert_eq!(summarize(&records, strict).low_signal, 1);
        assert_eq!(summarize(&records, SignalPolicy::default()).low_signal, 0);
    }
}
