// ── Gateway facade ──
//
// The flows a route handler actually needs: fetch both feeds, reconcile,
// derive. Mutations are thin wrappers that build the form for each action.

use tracing::{debug, info};

use onugate_api::{Params, RawResponse};

use crate::client::{Fetched, RefreshOutcome, UpstreamClient};
use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::model::UnifiedRecord;
use crate::reconcile::Reconciler;
use crate::requests::{AuthorizeOnuRequest, WanStaticRequest};
use crate::resource::{Action, Resource};
use crate::views::{self, DeviceStats, SignalPolicy};

/// Upstream client, reconciler, and signal policy bundled together.
pub struct Gateway {
    client: UpstreamClient,
    reconciler: Reconciler,
    signal: SignalPolicy,
}

impl Gateway {
    pub fn new(client: UpstreamClient, reconciler: Reconciler, signal: SignalPolicy) -> Self {
        Self {
            client,
            reconciler,
            signal,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, CoreError> {
        let client = UpstreamClient::from_config(config)?;
        info!(base_url = %config.base_url, cache_dir = ?config.cache_dir, "gateway ready");
        Ok(Self::new(client, Reconciler::default(), config.signal))
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    pub fn signal_policy(&self) -> SignalPolicy {
        self.signal
    }

    // ── Reconciled views ─────────────────────────────────────────────

    /// Every ONU in the status feed, enriched from the details feed.
    ///
    /// Both feeds are fetched concurrently. A failure of either one
    /// (after cache fallback) fails the whole call.
    pub async fn devices(&self) -> Result<Vec<UnifiedRecord>, CoreError> {
        let (status, details) = tokio::join!(self.client.status_feed(), self.client.details_feed());
        let (status, details) = (status?, details?);
        Ok(self.reconciler.reconcile(&status, &details))
    }

    /// Offline, disabled, or weak-signal devices.
    pub async fn low_signal_devices(&self) -> Result<Vec<UnifiedRecord>, CoreError> {
        let policy = self.signal;
        let devices = self.devices().await?;
        let selected: Vec<UnifiedRecord> = devices
            .into_iter()
            .filter(|d| views::is_low_signal_or_offline(d, policy))
            .collect();
        debug!(count = selected.len(), "low signal or offline devices");
        Ok(selected)
    }

    pub async fn device_stats(&self) -> Result<DeviceStats, CoreError> {
        let devices = self.devices().await?;
        Ok(views::summarize(&devices, self.signal))
    }

    // ── Raw reads ────────────────────────────────────────────────────

    /// Cached read of any resource.
    pub async fn fetch(&self, resource: &Resource, params: &Params) -> Result<Fetched, CoreError> {
        self.client.fetch(resource, params, true).await
    }

    /// Bulk details straight from upstream when `force`, cache first otherwise.
    pub async fn device_details(&self, force: bool) -> Result<Fetched, CoreError> {
        self.client
            .fetch(&Resource::AllOnuDetails, &Params::new(), !force)
            .await
    }

    pub async fn onu_by_serial(&self, sn: &str) -> Result<Fetched, CoreError> {
        self.fetch(&Resource::OnuBySerial, &Params::new().with("sn", sn))
            .await
    }

    pub async fn optical_power(&self, onu_id: &str) -> Result<Fetched, CoreError> {
        self.fetch(&Resource::OnuOpticalPower, &Params::new().with("id", onu_id))
            .await
    }

    pub async fn olt_vlans(&self, olt_id: &str) -> Result<Fetched, CoreError> {
        let resource = Resource::OltVlans {
            olt_id: olt_id.to_owned(),
        };
        self.fetch(&resource, &Params::new()).await
    }

    pub async fn force_refresh(&self) -> RefreshOutcome {
        self.client.force_refresh().await
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn enable_onu(&self, onu_id: &str) -> Result<RawResponse, CoreError> {
        self.client
            .mutate(&Action::EnableOnu, &Params::new().with("id", onu_id))
            .await
    }

    pub async fn disable_onu(&self, onu_id: &str) -> Result<RawResponse, CoreError> {
        self.client
            .mutate(&Action::DisableOnu, &Params::new().with("id", onu_id))
            .await
    }

    pub async fn authorize_onu(
        &self,
        request: &AuthorizeOnuRequest,
    ) -> Result<RawResponse, CoreError> {
        info!(sn = %request.sn, olt_id = %request.olt_id, "authorizing ONU");
        self.client
            .mutate(&Action::AuthorizeOnu, &request.to_params())
            .await
    }

    pub async fn delete_onu(&self, external_id: &str) -> Result<RawResponse, CoreError> {
        let action = Action::DeleteOnu {
            external_id: external_id.to_owned(),
        };
        info!(external_id, "deleting ONU");
        self.client.mutate(&action, &Params::new()).await
    }

    pub async fn set_wan_static(
        &self,
        onu_id: &str,
        request: &WanStaticRequest,
    ) -> Result<RawResponse, CoreError> {
        let action = Action::SetWanStatic {
            id: onu_id.to_owned(),
        };
        self.client.mutate(&action, &request.to_params()).await
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Persist durable cache entries. Call before the process exits.
    pub async fn shutdown(&self) -> usize {
        let written = self.client.cache().flush().await;
        info!(written, "cache flushed");
        written
    }
}
