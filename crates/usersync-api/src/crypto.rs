//! Webhook signature verification.
//!
//! The identity provider delivers webhooks through Svix, which signs each
//! message with HMAC-SHA256 over `"{svix-id}.{svix-timestamp}.{body}"`
//! using a shared secret. The `svix-signature` header carries one or more
//! space-separated `v1,<base64>` entries; a message is authentic when any
//! `v1` entry matches. Timestamps outside the tolerance window are rejected
//! to limit replay.

use std::{fmt, time::Duration};

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use usersync_core::SyncError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the unique message id.
pub const HEADER_ID: &str = "svix-id";
/// Header carrying the send time in Unix seconds.
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
/// Header carrying the signature list.
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// Default accepted clock skew between sender and receiver.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(5 * 60);

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Signature verification errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// A required header is absent, empty or not visible ASCII.
    #[error("missing required header {0}")]
    MissingHeader(&'static str),
    /// The timestamp header is not an integer.
    #[error("invalid timestamp header: {0}")]
    InvalidTimestamp(String),
    /// The timestamp is older than the tolerance window.
    #[error("message timestamp too old")]
    TimestampTooOld,
    /// The timestamp is further in the future than the tolerance window.
    #[error("message timestamp too new")]
    TimestampTooNew,
    /// No `v1` signature entry matched the payload.
    #[error("no matching signature found")]
    NoMatchingSignature,
    /// The shared secret could not be decoded.
    #[error("invalid secret: {0}")]
    InvalidSecret(String),
}

impl From<SignatureError> for SyncError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidSecret(reason) => Self::InvalidSecret { reason },
            other => Self::Authentication { reason: other.to_string() },
        }
    }
}

/// Decoded shared signing secret.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    /// Parses a secret as issued by the provider dashboard.
    ///
    /// Accepts `whsec_<base64>` or bare base64.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` when the value is empty or
    /// not valid base64.
    pub fn parse(raw: &str) -> Result<Self, SignatureError> {
        let encoded = raw.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);

        if encoded.is_empty() {
            return Err(SignatureError::InvalidSecret("secret is empty".to_string()));
        }

        let key = STANDARD
            .decode(encoded)
            .map_err(|e| SignatureError::InvalidSecret(format!("secret is not base64: {e}")))?;

        Ok(Self(key))
    }

    /// Wraps raw key bytes.
    pub fn from_bytes(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }

    /// Returns the secret in `whsec_<base64>` form.
    pub fn to_encoded(&self) -> String {
        format!("{SECRET_PREFIX}{}", STANDARD.encode(&self.0))
    }

    fn mac(
        &self,
        msg_id: &str,
        timestamp: &str,
        payload: &[u8],
    ) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(&self.0)
            .map_err(|e| SignatureError::InvalidSecret(e.to_string()))?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(***)")
    }
}

/// The three signature headers of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeaders<'a> {
    /// Value of `svix-id`.
    pub id: &'a str,
    /// Value of `svix-timestamp`.
    pub timestamp: &'a str,
    /// Value of `svix-signature`.
    pub signature: &'a str,
}

impl<'a> SignatureHeaders<'a> {
    /// Extracts the signature headers from a request.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::MissingHeader` naming the first header that
    /// is absent or empty.
    pub fn from_header_map(headers: &'a HeaderMap) -> Result<Self, SignatureError> {
        Ok(Self {
            id: required_header(headers, HEADER_ID)?,
            timestamp: required_header(headers, HEADER_TIMESTAMP)?,
            signature: required_header(headers, HEADER_SIGNATURE)?,
        })
    }
}

fn required_header<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, SignatureError> {
    // Values are returned as sent; they are part of the signed content.
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(SignatureError::MissingHeader(name))
}

/// Computes the base64 `v1` signature for a message.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the key is rejected by HMAC.
pub fn sign(
    secret: &WebhookSecret,
    msg_id: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, SignatureError> {
    let mac = secret.mac(msg_id, &timestamp.to_string(), payload)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verifies a payload against its signature headers.
///
/// `now` is the receiver's current Unix time in seconds.
///
/// # Errors
///
/// Returns `SignatureError` if the timestamp is malformed or outside the
/// tolerance window, or if no `v1` signature matches.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use usersync_api::crypto::{sign, verify, SignatureHeaders, WebhookSecret};
///
/// let secret = WebhookSecret::from_bytes(b"shared-key".to_vec());
/// let body = br#"{"type":"user.created","data":{"id":"u1"}}"#;
/// let signature = format!("v1,{}", sign(&secret, "msg_1", 1_700_000_000, body).unwrap());
/// let headers = SignatureHeaders { id: "msg_1", timestamp: "1700000000", signature: &signature };
///
/// assert!(verify(&secret, body, &headers, 1_700_000_010, Duration::from_secs(300)).is_ok());
/// ```
pub fn verify(
    secret: &WebhookSecret,
    payload: &[u8],
    headers: &SignatureHeaders<'_>,
    now: i64,
    tolerance: Duration,
) -> Result<(), SignatureError> {
    let timestamp: i64 = headers
        .timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp(headers.timestamp.to_string()))?;

    let tolerance = i64::try_from(tolerance.as_secs()).unwrap_or(i64::MAX);
    if now.saturating_sub(timestamp) > tolerance {
        return Err(SignatureError::TimestampTooOld);
    }
    if timestamp.saturating_sub(now) > tolerance {
        return Err(SignatureError::TimestampTooNew);
    }

    let expected = secret.mac(headers.id, headers.timestamp, payload)?;

    let matched = candidate_signatures(headers.signature)
        .any(|candidate| expected.clone().verify_slice(&candidate).is_ok());

    if matched {
        Ok(())
    } else {
        Err(SignatureError::NoMatchingSignature)
    }
}

/// Yields decoded `v1` signatures from a signature header.
///
/// Entries with other versions or undecodable bodies are skipped.
fn candidate_signatures(header: &str) -> impl Iterator<Item = Vec<u8>> + '_ {
    header
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == SIGNATURE_VERSION)
        .filter_map(|(_, signature)| STANDARD.decode(signature).ok())
}
