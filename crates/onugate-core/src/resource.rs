// ── Upstream endpoints ──
//
// Readable resources (cached) and mutating actions (never cached), each
// mapped to its path under the upstream base URL.

use strum::Display;

use onugate_api::Params;

/// A readable upstream resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum Resource {
    Olts,
    OltVlans { olt_id: String },
    /// Uptime and environment temperature of every OLT.
    OltEnvironment,
    OnuStatuses,
    UnconfiguredOnus,
    /// Expects an `sn` query parameter.
    OnuBySerial,
    /// Expects an `id` query parameter.
    OnuOpticalPower,
    /// Bulk details of every ONU. Large, slow-changing, kept on disk.
    AllOnuDetails,
}

impl Resource {
    pub fn path(&self) -> String {
        match self {
            Self::Olts => "/system/get_olts".into(),
            Self::OltVlans { olt_id } => format!("/olt/get_vlans/{olt_id}"),
            Self::OltEnvironment => "/olt/get_olts_uptime_and_env_temperature".into(),
            Self::OnuStatuses => "/onu/get_onus_statuses".into(),
            Self::UnconfiguredOnus => "/onu/unconfigured_onus".into(),
            Self::OnuBySerial => "/onu/get_onu_by_sn".into(),
            Self::OnuOpticalPower => "/onu/get_onu_optical_power".into(),
            Self::AllOnuDetails => "/onu/get_all_onus_details".into(),
        }
    }

    /// Path plus sorted query parameters. Two fetches share a cache
    /// entry only if both agree.
    pub fn cache_key(&self, params: &Params) -> String {
        let path = self.path();
        if params.is_empty() {
            path
        } else {
            format!("{path}?{}", params.canonical())
        }
    }

    /// Mirrored to the durable cache tier.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::AllOnuDetails)
    }

    /// Cache keys of every parameterless resource that [`is_durable`].
    ///
    /// [`is_durable`]: Self::is_durable
    pub fn durable_keys() -> Vec<String> {
        [
            Self::Olts,
            Self::OltEnvironment,
            Self::OnuStatuses,
            Self::UnconfiguredOnus,
            Self::AllOnuDetails,
        ]
        .into_iter()
        .filter(Self::is_durable)
        .map(|r| r.cache_key(&Params::new()))
        .collect()
    }
}

/// A mutating upstream call. Parameters go in a form body.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum Action {
    /// Expects `id` in the form.
    EnableOnu,
    /// Expects `id` in the form.
    DisableOnu,
    AuthorizeOnu,
    DeleteOnu { external_id: String },
    SetWanStatic { id: String },
}

impl Action {
    pub fn path(&self) -> String {
        match self {
            Self::EnableOnu => "/onu/enable_onu".into(),
            Self::DisableOnu => "/onu/disable_onu".into(),
            Self::AuthorizeOnu => "/onu/authorize_onu".into(),
            Self::DeleteOnu { external_id } => format!("/onu/delete/{external_id}"),
            Self::SetWanStatic { id } => format!("/onu/set_onu_wan_mode_static_ip/{id}"),
        }
    }
}
