// ── Typed mutation bodies ──
//
// Each request converts to form `Params`; optional fields that are unset
// are left out of the form entirely.

use serde::{Deserialize, Serialize};

use onugate_api::Params;

// ── Authorize ──────────────────────────────────────────────────────

/// Body for `/onu/authorize_onu`.
///
/// Deserializes with the upstream's usual defaults filled in, so a
/// caller only has to name the OLT position, serial, type, and VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeOnuRequest {
    /// Numeric OLT id as the upstream knows it, sent verbatim. Callers
    /// that let users pick an OLT by name must resolve the name first
    /// (e.g. through [`Resource::Olts`](crate::Resource::Olts)); a name
    /// here is rejected upstream.
    pub olt_id: String,
    #[serde(default = "defaults::pon_type")]
    pub pon_type: String,
    pub board: String,
    pub port: String,
    pub sn: String,
    pub onu_type: String,
    #[serde(default = "defaults::onu_mode")]
    pub onu_mode: String,
    pub vlan: String,
    /// Customer VLAN. Sent as `vlan` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvlan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svlan: Option<String>,
    #[serde(default = "defaults::tag_transform_mode")]
    pub tag_transform_mode: String,
    #[serde(default = "defaults::use_other_all_tls_vlan")]
    pub use_other_all_tls_vlan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default = "defaults::odb")]
    pub odb: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_or_comment: Option<String>,
    #[serde(default = "defaults::onu_external_id")]
    pub onu_external_id: String,
    #[serde(default = "defaults::upload_speed")]
    pub upload_speed_profile_name: String,
    #[serde(default = "defaults::download_speed")]
    pub download_speed_profile_name: String,
}

mod defaults {
    pub fn pon_type() -> String {
        "gpon".into()
    }
    pub fn onu_mode() -> String {
        "Routing".into()
    }
    pub fn tag_transform_mode() -> String {
        "translate".into()
    }
    pub fn use_other_all_tls_vlan() -> String {
        "1".into()
    }
    pub fn odb() -> String {
        "None".into()
    }
    pub fn onu_external_id() -> String {
        "auto".into()
    }
    pub fn upload_speed() -> String {
        "50M".into()
    }
    pub fn download_speed() -> String {
        "100M".into()
    }
}

impl AuthorizeOnuRequest {
    pub fn new(
        olt_id: impl Into<String>,
        board: impl Into<String>,
        port: impl Into<String>,
        sn: impl Into<String>,
        onu_type: impl Into<String>,
        vlan: impl Into<String>,
    ) -> Self {
        Self {
            olt_id: olt_id.into(),
            pon_type: defaults::pon_type(),
            board: board.into(),
            port: port.into(),
            sn: sn.into(),
            onu_type: onu_type.into(),
            onu_mode: defaults::onu_mode(),
            vlan: vlan.into(),
            cvlan: None,
            svlan: None,
            tag_transform_mode: defaults::tag_transform_mode(),
            use_other_all_tls_vlan: defaults::use_other_all_tls_vlan(),
            custom_profile: None,
            zone: None,
            odb: defaults::odb(),
            name: None,
            address_or_comment: None,
            onu_external_id: defaults::onu_external_id(),
            upload_speed_profile_name: defaults::upload_speed(),
            download_speed_profile_name: defaults::download_speed(),
        }
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new()
            .with("olt_id", &self.olt_id)
            .with("pon_type", &self.pon_type)
            .with("board", &self.board)
            .with("port", &self.port)
            .with("sn", &self.sn)
            .with("onu_type", &self.onu_type)
            .with("onu_mode", &self.onu_mode)
            .with("vlan", &self.vlan)
            .with("cvlan", self.cvlan.as_ref().unwrap_or(&self.vlan));

        let optional = [
            ("svlan", &self.svlan),
            ("custom_profile", &self.custom_profile),
            ("zone", &self.zone),
            ("name", &self.name),
            ("address_or_comment", &self.address_or_comment),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.insert(key, value);
            }
        }

        params
            .with("tag_transform_mode", &self.tag_transform_mode)
            .with("use_other_all_tls_vlan", &self.use_other_all_tls_vlan)
            .with("odb", &self.odb)
            .with("onu_external_id", &self.onu_external_id)
            .with("upload_speed_profile_name", &self.upload_speed_profile_name)
            .with("download_speed_profile_name", &self.download_speed_profile_name)
    }
}

// ── WAN ────────────────────────────────────────────────────────────

/// Body for `/onu/set_onu_wan_mode_static_ip/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WanStaticRequest {
    pub ipv4_address: String,
    pub subnet_mask: String,
    pub gateway: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns2: Option<String>,
}

impl WanStaticRequest {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new()
            .with("ipv4_address", &self.ipv4_address)
            .with("subnet_mask", &self.subnet_mask)
            .with("gateway", &self.gateway);
        if let Some(dns) = &self.dns1 {
            params.insert("dns1", dns);
        }
        if let Some(dns) = &self.dns2 {
            params.insert("dns2", dns);
        }
        params
            .with("configuration_method", "OMCI")
            .with("ip_protocol", "ipv4ipv6")
            .with("ipv6_address_mode", "None")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authorize_defaults_from_minimal_body() {
        let req: AuthorizeOnuRequest = serde_json::from_value(json!({
            "olt_id": "1",
            "board": "1",
            "port": "4",
            "sn": "HWTC1A2B3C4D",
            "onu_type": "HG8245H",
            "vlan": "100"
        }))
        .unwrap();

        assert_eq!(req, AuthorizeOnuRequest::new("1", "1", "4", "HWTC1A2B3C4D", "HG8245H", "100"));

        let params = req.to_params();
        assert_eq!(params.get("pon_type"), Some("gpon"));
        assert_eq!(params.get("onu_mode"), Some("Routing"));
        assert_eq!(params.get("cvlan"), Some("100"));
        assert_eq!(params.get("odb"), Some("None"));
        assert_eq!(params.get("onu_external_id"), Some("auto"));
        assert_eq!(params.get("upload_speed_profile_name"), Some("50M"));
        assert_eq!(params.get("download_speed_profile_name"), Some("100M"));
        assert_eq!(params.get("zone"), None);
    }

    #[test]
    fn olt_id_is_sent_verbatim() {
        let req = AuthorizeOnuRequest::new(" 7 ", "0", "1", "SN", "F660", "100");
        assert_eq!(req.to_params().get("olt_id"), Some(" 7 "));
    }

    #[test]
    fn explicit_cvlan_wins() {
        let mut req = AuthorizeOnuRequest::new("1", "0", "1", "SN", "F660", "100");
        req.cvlan = Some("205".into());
        req.zone = Some("Centro".into());

        let params = req.to_params();
        assert_eq!(params.get("vlan"), Some("100"));
        assert_eq!(params.get("cvlan"), Some("205"));
        assert_eq!(params.get("zone"), Some("Centro"));
    }

    #[test]
    fn wan_static_adds_fixed_fields() {
        let req = WanStaticRequest {
            ipv4_address: "10.0.0.2".into(),
            subnet_mask: "255.255.255.0".into(),
            gateway: "10.0.0.1".into(),
            dns1: Some("1.1.1.1".into()),
            dns2: None,
        };
        let params = req.to_params();

        assert_eq!(params.get("configuration_method"), Some("OMCI"));
        assert_eq!(params.get("ip_protocol"), Some("ipv4ipv6"));
        assert_eq!(params.get("ipv6_address_mode"), Some("None"));
        assert_eq!(params.get("dns2"), None);
        assert_eq!(params.len(), 7);
    }
}
