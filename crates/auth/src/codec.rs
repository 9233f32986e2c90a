//! Bearer-credential payload decoding.
//!
//! A credential is an opaque string of three dot-separated segments
//! (header, payload, signature). Only the payload is interpreted: URL-safe
//! base64, then UTF-8 JSON, then a closed set of required claims. No
//! signature verification happens here.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use supplierdesk_core::Role;

use crate::Identity;

/// A malformed credential. Callers treat any variant as "logged out".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("payload segment is not valid base64")]
    Base64,

    #[error("payload is not valid JSON: {0}")]
    Json(String),

    #[error("missing required claim '{0}'")]
    MissingClaim(&'static str),

    #[error("claim '{0}' has an unexpected type or value")]
    InvalidClaim(&'static str),
}

/// Decode a credential's payload into a validated [`Identity`].
///
/// Required claims: `sub` (string), `role` (`member`/`admin`), `iat` and
/// `exp` (numeric seconds since epoch). A missing or mistyped claim is a
/// defined [`DecodeError`], never a panic.
pub fn decode(credential: &str) -> Result<Identity, DecodeError> {
    let segments: Vec<&str> = credential.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let payload = decode_segment(segments[1])?;
    let value: Value =
        serde_json::from_slice(&payload).map_err(|e| DecodeError::Json(e.to_string()))?;
    let claims = value
        .as_object()
        .ok_or_else(|| DecodeError::Json("payload is not a JSON object".to_string()))?;

    let subject = string_claim(claims, "sub")?.to_string();
    let role = role_claim(claims)?;
    let issued_at = timestamp_claim(claims, "iat")?;
    let expires_at = timestamp_claim(claims, "exp")?;

    Ok(Identity {
        subject,
        role,
        issued_at,
        expires_at,
    })
}

/// Issuers disagree on padding; accept both URL-safe alphabets.
fn decode_segment(segment: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| URL_SAFE.decode(segment))
        .map_err(|_| DecodeError::Base64)
}

fn claim<'a>(claims: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, DecodeError> {
    claims.get(name).ok_or(DecodeError::MissingClaim(name))
}

fn string_claim<'a>(
    claims: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, DecodeError> {
    claim(claims, name)?
        .as_str()
        .ok_or(DecodeError::InvalidClaim(name))
}

fn role_claim(claims: &Map<String, Value>) -> Result<Role, DecodeError> {
    let value = claim(claims, "role")?;
    serde_json::from_value(value.clone()).map_err(|_| DecodeError::InvalidClaim("role"))
}

/// Numeric claim in seconds since epoch.
fn timestamp_claim(
    claims: &Map<String, Value>,
    name: &'static str,
) -> Result<DateTime<Utc>, DecodeError> {
    let seconds = claim(claims, name)?
        .as_i64()
        .ok_or(DecodeError::InvalidClaim(name))?;
    DateTime::from_timestamp(seconds, 0).ok_or(DecodeError::InvalidClaim(name))
}
