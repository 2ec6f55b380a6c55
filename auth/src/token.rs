//! Access-token codec: claim decoding and expiry detection.
//!
//! DESIGN
//! ======
//! Signatures are never verified here; that is the backend's job. The client
//! only needs the embedded `exp` claim (freshness) and the identity claims
//! (hydrating the session after a reload).
//!
//! A token that cannot be decoded is reported as [`Freshness::Expired`], the
//! same outcome as a token past its expiry. Both force re-authentication.

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use serde::de::Error as _;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::role::Role;
use crate::types::{Identity, deserialize_reference};

/// base64url that tolerates both padded and unpadded segments.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// =============================================================================
// CLAIMS
// =============================================================================

/// Decoded token payload: the expiry plus every other claim, uninterpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct Claims {
    /// Expiry in seconds since the Unix epoch.
    pub exp: i64,
    fields: Map<String, Value>,
}

impl Claims {
    /// Expiry converted to milliseconds since the Unix epoch.
    #[must_use]
    pub fn expires_at_ms(&self) -> i64 {
        self.exp.saturating_mul(1000)
    }

    /// Raw claim lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Interpret the identity claims. Either every required claim is present
    /// and well-formed, or this fails; no partial identity is produced.
    pub fn identity(&self) -> Result<Identity, DecodeError> {
        let raw = IdentityClaims::deserialize(Value::Object(self.fields.clone()))
            .map_err(|e| DecodeError::Claims(e.to_string()))?;
        let role: Role = raw.role.parse()?;
        Ok(Identity {
            id: raw.user_id,
            username: raw.username,
            email: raw.email,
            role,
            institution: raw.institution,
            teacher_id: raw.teacher_id,
            student_id: raw.student_id,
            admin_id: raw.admin_id,
            manager_id: raw.manager_id,
        })
    }
}

/// Claim names as the backend's token serializer writes them.
#[derive(Deserialize)]
struct IdentityClaims {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    user_id: i64,
    #[serde(default)]
    username: Option<String>,
    email: String,
    #[serde(rename = "user_role", alias = "role")]
    role: String,
    #[serde(default, alias = "institution_id", deserialize_with = "deserialize_reference")]
    institution: Option<String>,
    #[serde(default)]
    teacher_id: Option<i64>,
    #[serde(default)]
    student_id: Option<i64>,
    #[serde(default)]
    admin_id: Option<i64>,
    #[serde(default)]
    manager_id: Option<i64>,
}

// =============================================================================
// FRESHNESS
// =============================================================================

/// Outcome of checking a token against the clock.
#[derive(Clone, Debug, PartialEq)]
pub enum Freshness {
    /// Decodable and not yet expired.
    Fresh(Claims),
    /// Past its expiry, or not decodable at all.
    Expired,
}

impl Freshness {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Decode the payload segment of `token` into [`Claims`].
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(DecodeError::Malformed);
    };
    if payload.is_empty() {
        return Err(DecodeError::Malformed);
    }

    let bytes = SEGMENT_ENGINE
        .decode(payload)
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| DecodeError::Claims(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(DecodeError::Claims("payload is not a JSON object".to_owned()));
    };

    let exp = match fields.get("exp") {
        None | Some(Value::Null) => return Err(DecodeError::MissingExpiry),
        Some(raw) => deserialize_i64_from_number(raw.clone()).map_err(|e| DecodeError::Claims(e.to_string()))?,
    };

    Ok(Claims { exp, fields })
}

/// Decode `token` into the identity it carries.
pub fn decode(token: &str) -> Result<Identity, DecodeError> {
    decode_claims(token)?.identity()
}

/// Check `token` against `now_ms` (milliseconds since the Unix epoch).
#[must_use]
pub fn inspect_at(token: &str, now_ms: i64) -> Freshness {
    match decode_claims(token) {
        Ok(claims) if now_ms < claims.expires_at_ms() => Freshness::Fresh(claims),
        Ok(_) => Freshness::Expired,
        Err(e) => {
            tracing::debug!(error = %e, "token decode failed; treating as expired");
            Freshness::Expired
        }
    }
}

/// Check `token` against the current clock.
#[must_use]
pub fn inspect(token: &str) -> Freshness {
    inspect_at(token, now_ms())
}

/// `true` when `token` is past its expiry or cannot be decoded.
#[must_use]
pub fn is_expired(token: &str) -> bool {
    inspect(token).is_expired()
}

/// `true` when `token` is past its expiry at `now_ms`, or cannot be decoded.
#[must_use]
pub fn is_expired_at(token: &str, now_ms: i64) -> bool {
    inspect_at(token, now_ms).is_expired()
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            if let Some(float) = number.as_f64()
                && float.is_finite()
                && float >= i64::MIN as f64
                && float <= i64::MAX as f64
            {
                return Ok(float.floor() as i64);
            }
            Err(D::Error::custom("expected integer-compatible number"))
        }
        _ => Err(D::Error::custom("expected number")),
    }
}
