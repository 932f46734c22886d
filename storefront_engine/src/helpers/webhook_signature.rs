//! # Payment provider webhook signatures
//!
//! Payment providers notify us of payment outcomes by `POST`ing a small JSON document to the webhook endpoint. Since
//! that endpoint is unauthenticated, every callback carries an HMAC signature that proves it came from someone who
//! holds the shared webhook secret.
//!
//! ## Signature format
//!
//! Two headers must be present:
//!
//! * `X-Webhook-Timestamp`: the unix time (in seconds) at which the callback was signed, as a decimal string.
//! * `X-Webhook-Signature`: `sha256=<hex>`, where `<hex>` is the lowercase hex encoding of
//!
//! ```text
//!    HMAC-SHA256(secret, "{timestamp}.{canonical_body}")
//! ```
//!
//! `canonical_body` is the JSON body re-serialized deterministically: object keys sorted, no whitespace between
//! tokens, and every non-ASCII character written as a `\uXXXX` escape. Signers on the provider side produce the same
//! bytes with e.g. `json.dumps(body, sort_keys=True, separators=(",", ":"))`.
//!
//! ## Freshness
//!
//! A perfectly valid signature is still rejected if the timestamp is further than the configured tolerance from the
//! current time. This stops old, legitimately signed callbacks from being replayed.
//!
//! The checks run in a fixed order (headers, timestamp, freshness, signature format, body, HMAC) and the first failure
//! wins. Nothing is ever written to the database before verification has fully succeeded.
use std::fmt::Write;

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use log::*;
use serde_json::Value;
use sfg_common::Secret;
use sha2::Sha256;
use thiserror::Error;

pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
const SIGNATURE_SCHEME: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookSignatureError {
    #[error("Missing {0} header")]
    MissingHeader(&'static str),
    #[error("Webhook timestamp is not a valid unix time: {0}")]
    MalformedTimestamp(String),
    #[error("Webhook signature has expired")]
    Expired,
    #[error("Webhook signature is not in the form sha256=<hex>")]
    MalformedSignature,
    #[error("Webhook body is not valid JSON: {0}")]
    MalformedBody(String),
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("No webhook secret has been configured")]
    NotConfigured,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Secret<String>,
    tolerance: Duration,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookVerifier(tolerance: {}s)", self.tolerance.num_seconds())
    }
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verifies a callback against the current time. On success, the parsed JSON body is returned.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<Value, WebhookSignatureError> {
        self.verify_at(timestamp, signature, body, Utc::now().timestamp())
    }

    /// Verifies a callback as if the current unix time were `now`.
    pub fn verify_at(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<Value, WebhookSignatureError> {
        let timestamp = timestamp.map(str::trim).ok_or(WebhookSignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature.map(str::trim).ok_or(WebhookSignatureError::MissingHeader(SIGNATURE_HEADER))?;
        let signed_at = timestamp
            .parse::<i64>()
            .map_err(|_| WebhookSignatureError::MalformedTimestamp(timestamp.to_string()))?;
        let age = now.saturating_sub(signed_at).saturating_abs();
        if age > self.tolerance.num_seconds() {
            debug!("🪝️ Webhook timestamp {signed_at} is {age}s away from now. Tolerance is {}s", self.tolerance.num_seconds());
            return Err(WebhookSignatureError::Expired);
        }
        let digest = signature
            .strip_prefix(SIGNATURE_SCHEME)
            .and_then(|h| hex::decode(h).ok())
            .ok_or(WebhookSignatureError::MalformedSignature)?;
        let value = serde_json::from_slice::<Value>(body)
            .map_err(|e| WebhookSignatureError::MalformedBody(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(signing_input(timestamp, &value).as_bytes());
        mac.verify_slice(&digest).map_err(|_| WebhookSignatureError::InvalidSignature)?;
        trace!("🪝️ Webhook signature verified");
        Ok(value)
    }

    /// Produces the `X-Webhook-Signature` header value for `body`, signed at `timestamp`.
    pub fn sign(&self, timestamp: i64, body: &Value) -> Result<String, WebhookSignatureError> {
        let mut mac = self.mac()?;
        mac.update(signing_input(&timestamp.to_string(), body).as_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(format!("{SIGNATURE_SCHEME}{}", hex::encode(digest)))
    }

    fn mac(&self) -> Result<HmacSha256, WebhookSignatureError> {
        if self.secret.is_unset() {
            error!("🪝️ A webhook arrived, but no webhook secret is configured. Rejecting it.");
            return Err(WebhookSignatureError::NotConfigured);
        }
        HmacSha256::new_from_slice(self.secret.reveal().as_bytes()).map_err(|_| WebhookSignatureError::NotConfigured)
    }
}

fn signing_input(timestamp: &str, body: &Value) -> String {
    format!("{timestamp}.{}", canonical_json(body))
}

/// Serializes `value` deterministically: sorted keys, `,` and `:` separators with no whitespace, ASCII-only output.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        },
        Value::Object(map) => {
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        },
    }
}

fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || (c as u32) > 0x7f => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // Writing to a String cannot fail
                    let _ = write!(out, "\\u{unit:04x}");
                }
            },
            c => out.push(c),
        }
    }
    out.push('"');
}
