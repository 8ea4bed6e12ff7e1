// ── Details feed record ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identity::{DeviceIdentity, loose_string, non_blank};

/// One ONU as reported by the bulk details feed.
///
/// Changes far less often than status, so it is cached much longer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDetailRecord {
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
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub onu_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ports: Option<Vec<ServicePort>>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub olt_name: Option<String>,

    /// Receive level at 1310 nm, dBm as text.
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub signal_1310: Option<String>,
    /// Receive level at 1490 nm, dBm as text.
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub signal_1490: Option<String>,
    /// Generic signal field some firmware reports instead of per-wavelength levels.
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A VLAN service port assigned to an ONU.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePort {
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub vlan: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceDetailRecord {
    /// VLAN of the first service port, if it has one.
    pub fn primary_vlan(&self) -> Option<&str> {
        let first = self.service_ports.as_deref()?.first()?;
        non_blank(first.vlan.as_deref())
    }
}

impl DeviceIdentity for DeviceDetailRecord {
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_upstream_detail() {
        let record: DeviceDetailRecord = serde_json::from_value(json!({
            "unique_external_id": "cliente-0042",
            "sn": "ZTEGC0FFEE01",
            "olt_name": "POAQUIL",
            "board": "1",
            "port": "4",
            "onu": "17",
            "onu_type_name": "F660",
            "name": "Casa 42",
            "signal_1310": "-24.10",
            "signal_1490": "-22.87",
            "service_ports": [
                { "service_port": "1", "vlan": 100, "cvlan": "" },
                { "service_port": "2", "vlan": "200" }
            ],
            "zone_name": "Centro"
        }))
        .unwrap();

        assert_eq!(record.primary_vlan(), Some("100"));
        assert_eq!(record.external_id(), Some("cliente-0042"));
        assert_eq!(record.extra.get("zone_name"), Some(&json!("Centro")));
    }

    #[test]
    fn null_service_ports_mean_no_vlan() {
        let record: DeviceDetailRecord =
            serde_json::from_value(json!({ "sn": "X", "service_ports": null })).unwrap();
        assert_eq!(record.primary_vlan(), None);

        let record: DeviceDetailRecord =
            serde_json::from_value(json!({ "sn": "X", "service_ports": [] })).unwrap();
        assert_eq!(record.primary_vlan(), None);
    }
}
