//! Resilient upstream client and ONU reconciliation engine.
//!
//! This crate sits between `onugate-api` and whatever exposes device state
//! to clients (an HTTP router, a dashboard, a script):
//!
//! - **[`UpstreamClient`]**: `fetch` / `mutate` / `force_refresh` over the
//!   upstream OLT manager. Reads go through the [`CacheStore`] first and
//!   fall back to the last good value when the upstream throttles or fails.
//!
//! - **[`CacheStore`]**: two tiers behind one [`CacheBackend`] trait: a
//!   volatile `DashMap` tier and a durable JSON-file tier for the bulk ONU
//!   details snapshot, so a restart is not a cold start.
//!
//! - **[`Reconciler`]**: fuses the status feed and the details feed into
//!   [`UnifiedRecord`]s through an ordered list of matchers (external id or
//!   serial first, then board/port/slot).
//!
//! - **[`views`]**: low-signal/offline detection and aggregate counts on top
//!   of reconciled records, driven by one [`SignalPolicy`].
//!
//! - **[`Gateway`]**: facade bundling the above for the common
//!   "fetch both feeds, reconcile, derive" flows.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod reconcile;
pub mod requests;
pub mod resource;
pub mod views;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheBackend, CacheEntry, CacheStore, FileBackend, MemoryBackend};
pub use client::{CacheTtls, Fetched, Origin, RefreshOutcome, UpstreamClient};
pub use config::{GatewayConfig, TlsVerification};
pub use error::CoreError;
pub use gateway::Gateway;
pub use reconcile::{MatchKeys, MatchTier, Matcher, Reconciler, reconcile};
pub use requests::{AuthorizeOnuRequest, WanStaticRequest};
pub use resource::{Action, Resource};
pub use views::{DeviceStats, SignalPolicy};

pub use model::{
    ConnectivityStatus, DeviceDetailRecord, DeviceIdentity, DeviceStatusRecord, ServicePort,
    StatusBucket, UnifiedRecord,
};

pub use onugate_api::{Params, RawResponse, RetryPolicy};
