// Upstream response envelope inspection.
//
// The upstream wraps every answer as `{ status: bool, response: ... }` on
// success or `{ status: false, error | message: "..." }` on failure. The
// transport never interprets bodies; these helpers are the only place
// that knows the envelope shape.

use serde_json::{Value, json};

use crate::retry::is_rate_limit_text;

/// The explicit `status` flag, if the body carries one.
///
/// Some endpoints answer `"status": "success"`; that is read as `true`.
pub fn status_flag(body: &Value) -> Option<bool> {
    match body.get("status")? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("success") => Some(true),
        _ => None,
    }
}

/// `true` unless the body explicitly says `status: false`.
pub fn is_success(body: &Value) -> bool {
    status_flag(body) != Some(false)
}

/// The upstream's own failure text: `error`, then `message`.
pub fn message(body: &Value) -> Option<&str> {
    body.get("error")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
}

/// `true` if the body is an explicit failure carrying a rate-limit phrase.
pub fn is_rate_limited(body: &Value) -> bool {
    status_flag(body) == Some(false) && message(body).is_some_and(is_rate_limit_text)
}

/// Build a structured failure envelope.
pub fn failure(error: impl Into<String>) -> Value {
    json!({ "status": false, "error": error.into() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_flag_variants() {
        assert_eq!(status_flag(&json!({ "status": true })), Some(true));
        assert_eq!(status_flag(&json!({ "status": false })), Some(false));
        assert_eq!(status_flag(&json!({ "status": "success" })), Some(true));
        assert_eq!(status_flag(&json!({ "response": [] })), None);
        assert_eq!(status_flag(&json!("plain text")), None);
    }

    #[test]
    fn missing_flag_counts_as_success() {
        assert!(is_success(&json!({ "response": [] })));
        assert!(!is_success(&json!({ "status": false })));
    }

    #[test]
    fn message_prefers_error_field() {
        let body = json!({ "status": false, "error": "bad id", "message": "other" });
        assert_eq!(message(&body), Some("bad id"));

        let body = json!({ "status": false, "message": "only message" });
        assert_eq!(message(&body), Some("only message"));
    }

    #[test]
    fn rate_limit_requires_explicit_failure() {
        let limited = json!({ "status": false, "error": "You reached the Hourly Limit" });
        assert!(is_rate_limited(&limited));

        // Same text on a successful envelope is not a throttle signal.
        let ok = json!({ "status": true, "message": "hourly limit resets soon" });
        assert!(!is_rate_limited(&ok));

        let rejected = json!({ "status": false, "error": "ONU not found" });
        assert!(!is_rate_limited(&rejected));
    }

    #[test]
    fn failure_envelope_shape() {
        assert_eq!(
            failure("nope"),
            json!({ "status": false, "error": "nope" })
        );
    }
}
