// ── Device identity ──
//
// Both feeds describe the same physical ONU with overlapping identity
// fields. Reconciliation only ever looks at records through this trait.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Identity fields shared by status and detail records.
pub trait DeviceIdentity {
    fn external_id(&self) -> Option<&str>;
    fn serial(&self) -> Option<&str>;
    fn board(&self) -> Option<&str>;
    fn port(&self) -> Option<&str>;
    /// ONU index on its PON port.
    fn onu_slot(&self) -> Option<&str>;
}

/// Deserialize a scalar that may arrive as a string, number, or bool
/// into an owned string. `null`, arrays, and objects become `None`.
pub(crate) fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// The value with surrounding whitespace removed, unless that leaves nothing.
pub(crate) fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}
