//! Request and webhook signature scheme.
//!
//! Inbound job requests and outbound webhook notifications are
//! authenticated identically: HMAC-SHA256 over `timestamp + "." + payload`
//! with a shared secret, carried in two headers next to the body. The
//! timestamp is covered by the signature, so a captured payload cannot be
//! replayed with a refreshed timestamp, and the tolerance window bounds how
//! long a captured (payload, timestamp, signature) triple stays usable.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the RFC 3339 UTC timestamp the body was signed with.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Header carrying the hex-encoded HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Default replay tolerance in seconds, applied symmetrically so clock skew
/// in either direction (including future-dated timestamps) is covered.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 300;

/// A payload together with the timestamp and signature it was sealed with.
///
/// Built fresh for every outbound send and never cached or reused.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    pub body: Vec<u8>,
    pub timestamp: String,
    pub signature: String,
}

impl SignedEnvelope {
    /// Seal `body` with a timestamp taken now.
    pub fn seal(secret: &str, body: Vec<u8>) -> Self {
        let timestamp = Utc::now().to_rfc3339();
        let signature = generate_signature(secret, &body, &timestamp);
        Self {
            body,
            timestamp,
            signature,
        }
    }
}

/// Compute the hex HMAC-SHA256 signature of `timestamp + "." + payload`.
pub fn generate_signature(secret: &str, payload: &[u8], timestamp: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Parse an RFC 3339 timestamp into a UTC instant.
///
/// A trailing `Z` is the standard spelling of `+00:00`; both are accepted.
/// Timestamps without an offset are rejected.
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Verify a signed payload.
///
/// Fails closed: a missing or empty header, an unparseable timestamp, a
/// timestamp outside the tolerance window in either direction, or a
/// signature mismatch all return `false`. Lengths are compared first, but
/// the final decision uses a constant-time comparison regardless.
///
/// # Arguments
///
/// * `secret` - The shared HMAC secret
/// * `payload` - The exact raw bytes that were signed
/// * `timestamp` - The `x-signature-timestamp` header value, if present
/// * `signature` - The `x-signature` header value, if present
/// * `tolerance_seconds` - Maximum accepted clock skew in seconds
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    timestamp: Option<&str>,
    signature: Option<&str>,
    tolerance_seconds: i64,
) -> bool {
    let (timestamp, signature) = match (timestamp, signature) {
        (Some(t), Some(s)) if !t.is_empty() && !s.is_empty() => (t, s),
        _ => {
            warn!(
                has_timestamp = timestamp.map(|t| !t.is_empty()).unwrap_or(false),
                has_signature = signature.map(|s| !s.is_empty()).unwrap_or(false),
                "signature_missing_fields"
            );
            return false;
        }
    };

    let parsed = match parse_timestamp(timestamp) {
        Some(parsed) => parsed,
        None => {
            warn!(timestamp = %timestamp, "signature_invalid_timestamp");
            return false;
        }
    };

    let skew_seconds = (Utc::now() - parsed).num_seconds().abs();
    if skew_seconds > tolerance_seconds {
        warn!(
            skew_seconds = skew_seconds,
            tolerance_seconds = tolerance_seconds,
            "signature_stale"
        );
        return false;
    }

    let expected = generate_signature(secret, payload, timestamp);
    let valid = constant_time_compare(&expected, signature);

    if !valid {
        // Never log the expected signature; lengths are enough to diagnose.
        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test-signing-secret";

    fn timestamp_with_offset(seconds: i64) -> String {
        (Utc::now() + Duration::seconds(seconds)).to_rfc3339()
    }

    #[test]
    fn test_verify_missing_fields() {
        assert!(!verify_signature(SECRET, b"payload", None, Some("sig"), 300));
        assert!(!verify_signature(SECRET, b"payload", Some("ts"), None, 300));
        assert!(!verify_signature(SECRET, b"payload", None, None, 300));
        assert!(!verify_signature(SECRET, b"payload", Some(""), Some("sig"), 300));
        assert!(!verify_signature(SECRET, b"payload", Some("ts"), Some(""), 300));
    }

    #[test]
    fn test_verify_unparseable_timestamp() {
        let sig = generate_signature(SECRET, b"payload", "not-a-timestamp");
        assert!(!verify_signature(
            SECRET,
            b"payload",
            Some("not-a-timestamp"),
            Some(&sig),
            300
        ));

        // Naive timestamps (no offset) are rejected even when well-formed.
        let sig = generate_signature(SECRET, b"payload", "2026-01-01T00:00:00");
        assert!(!verify_signature(
            SECRET,
            b"payload",
            Some("2026-01-01T00:00:00"),
            Some(&sig),
            300
        ));
    }

    #[test]
    fn test_parse_timestamp_accepts_z_suffix() {
        let zulu = parse_timestamp("2026-08-07T10:00:00Z").unwrap();
        let offset = parse_timestamp("2026-08-07T10:00:00+00:00").unwrap();
        assert_eq!(zulu, offset);

        assert!(parse_timestamp("2026-08-07T12:00:00+02:00").is_some());
        assert!(parse_timestamp("garbage").is_none());
    }

    #[test]
    fn test_verify_round_trip() {
        let timestamp = Utc::now().to_rfc3339();
        let signature = generate_signature(SECRET, b"payload", &timestamp);

        assert!(verify_signature(
            SECRET,
            b"payload",
            Some(&timestamp),
            Some(&signature),
            300
        ));
    }

    #[test]
    fn test_verify_tolerance_boundary() {
        // Just inside the window.
        let timestamp = timestamp_with_offset(-299);
        let signature = generate_signature(SECRET, b"payload", &timestamp);
        assert!(verify_signature(
            SECRET,
            b"payload",
            Some(&timestamp),
            Some(&signature),
            300
        ));

        // Just outside the window.
        let timestamp = timestamp_with_offset(-301);
        let signature = generate_signature(SECRET, b"payload", &timestamp);
        assert!(!verify_signature(
            SECRET,
            b"payload",
            Some(&timestamp),
            Some(&signature),
            300
        ));
    }

    #[test]
    fn test_verify_rejects_future_timestamps() {
        // The window is symmetric; a future-dated signature is just as stale.
        let timestamp = timestamp_with_offset(400);
        let signature = generate_signature(SECRET, b"payload", &timestamp);
        assert!(!verify_signature(
            SECRET,
            b"payload",
            Some(&timestamp),
            Some(&signature),
            300
        ));
    }

    #[test]
    fn test_verify_tamper_sensitivity() {
        let timestamp = Utc::now().to_rfc3339();
        let signature = generate_signature(SECRET, b"payload", &timestamp);

        let mut tampered = b"payload".to_vec();
        tampered[0] ^= 0x01;
        assert!(!verify_signature(
            SECRET,
            &tampered,
            Some(&timestamp),
            Some(&signature),
            300
        ));
    }

    #[test]
    fn test_verify_rejects_refreshed_timestamp() {
        // A replayer cannot swap in a fresh timestamp: the original
        // signature no longer matches.
        let old = timestamp_with_offset(-400);
        let signature = generate_signature(SECRET, b"payload", &old);
        let fresh = Utc::now().to_rfc3339();
        assert!(!verify_signature(
            SECRET,
            b"payload",
            Some(&fresh),
            Some(&signature),
            300
        ));
    }

    #[test]
    fn test_signature_depends_on_timestamp() {
        let a = generate_signature(SECRET, b"payload", "2026-08-07T10:00:00+00:00");
        let b = generate_signature(SECRET, b"payload", "2026-08-07T10:00:01+00:00");
        assert_ne!(a, b);
    }

    #[test]
    fn test_signed_envelope_round_trip() {
        let envelope = SignedEnvelope::seal(SECRET, b"{\"job_id\":1}".to_vec());
        assert!(verify_signature(
            SECRET,
            &envelope.body,
            Some(&envelope.timestamp),
            Some(&envelope.signature),
            300
        ));

        // Sealed with one secret, rejected by another.
        assert!(!verify_signature(
            "other-secret",
            &envelope.body,
            Some(&envelope.timestamp),
            Some(&envelope.signature),
            300
        ));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(constant_time_compare("", ""));
    }
}
