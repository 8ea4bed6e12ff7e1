// ── Feed reconciliation ──
//
// Pairs each status record with at most one detail record. Matchers run
// in tier order; the first tier that finds anything decides, and within
// a tier the earliest detail in feed order wins. Pure: the same feeds
// always produce the same output.

use strum::Display;
use tracing::debug;

use crate::model::identity::non_blank;
use crate::model::{DeviceDetailRecord, DeviceIdentity, DeviceStatusRecord, UnifiedRecord};

/// Which matcher paired a status record with its detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum MatchTier {
    /// External id or serial number.
    Identity,
    /// Board, port, and ONU slot.
    Position,
}

/// Identity fields normalized for comparison, computed once per record.
///
/// External id and serial are trimmed and lowercased; positions are
/// trimmed. Blank values are `None` and never match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchKeys {
    pub external_id: Option<String>,
    pub serial: Option<String>,
    pub board: Option<String>,
    pub port: Option<String>,
    pub onu: Option<String>,
}

impl MatchKeys {
    pub fn of(record: &impl DeviceIdentity) -> Self {
        let folded = |raw: Option<&str>| non_blank(raw).map(str::to_lowercase);
        let trimmed = |raw: Option<&str>| non_blank(raw).map(str::to_owned);
        Self {
            external_id: folded(record.external_id()),
            serial: folded(record.serial()),
            board: trimmed(record.board()),
            port: trimmed(record.port()),
            onu: trimmed(record.onu_slot()),
        }
    }
}

/// Decides whether a status record (left) and a detail record (right)
/// describe the same device.
pub type Matcher = fn(&MatchKeys, &MatchKeys) -> bool;

fn both_equal(a: Option<&String>, b: Option<&String>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// Same external id, or same serial number.
pub fn same_identity(status: &MatchKeys, detail: &MatchKeys) -> bool {
    both_equal(status.external_id.as_ref(), detail.external_id.as_ref())
        || both_equal(status.serial.as_ref(), detail.serial.as_ref())
}

/// Same board, port, and ONU slot, all present.
pub fn same_position(status: &MatchKeys, detail: &MatchKeys) -> bool {
    both_equal(status.board.as_ref(), detail.board.as_ref())
        && both_equal(status.port.as_ref(), detail.port.as_ref())
        && both_equal(status.onu.as_ref(), detail.onu.as_ref())
}

/// Ordered matcher tiers.
#[derive(Debug, Clone)]
pub struct Reconciler {
    tiers: Vec<(MatchTier, Matcher)>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(vec![
            (MatchTier::Identity, same_identity as Matcher),
            (MatchTier::Position, same_position as Matcher),
        ])
    }
}

impl Reconciler {
    pub fn new(tiers: Vec<(MatchTier, Matcher)>) -> Self {
        Self { tiers }
    }

    /// One unified record per status record, in status-feed order.
    pub fn reconcile(
        &self,
        status: &[DeviceStatusRecord],
        details: &[DeviceDetailRecord],
    ) -> Vec<UnifiedRecord> {
        let detail_keys: Vec<MatchKeys> = details.iter().map(MatchKeys::of).collect();
        let mut matched = 0usize;

        let unified: Vec<UnifiedRecord> = status
            .iter()
            .map(|record| {
                let keys = MatchKeys::of(record);
                let found = self
                    .find(&keys, &detail_keys)
                    .and_then(|(index, tier)| details.get(index).map(|d| (d, tier)));
                if found.is_some() {
                    matched += 1;
                }
                UnifiedRecord::enrich(record, found.map(|(d, _)| d), found.map(|(_, t)| t))
            })
            .collect();

        debug!(
            status = status.len(),
            details = details.len(),
            matched,
            "reconciled device feeds"
        );
        unified
    }

    fn find(&self, keys: &MatchKeys, candidates: &[MatchKeys]) -> Option<(usize, MatchTier)> {
        self.tiers.iter().find_map(|(tier, matcher)| {
            candidates
                .iter()
                .position(|candidate| matcher(keys, candidate))
                .map(|index| (index, *tier))
        })
    }
}

/// Reconcile with the default tiers.
pub fn reconcile(
    status: &[DeviceStatusRecord],
    details: &[DeviceDetailRecord],
) -> Vec<UnifiedRecord> {
    Reconciler::default().reconcile(status, details)
}
