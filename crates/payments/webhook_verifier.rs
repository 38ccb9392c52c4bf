//! Stripe webhook signature verification.
//!
//! Stripe signs `"{t}.{raw body}"` with HMAC-SHA256 using the endpoint secret and
//! sends `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`. Several `v1`
//! entries appear while a secret is being rolled.
//! https://stripe.com/docs/webhooks/signatures

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::stripe_objects::StripeEvent;

type HmacSha256 = Hmac<Sha256>;

/// Same replay window the official Stripe libraries default to.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("webhook configuration missing: {0}")]
    ConfigurationMissing(&'static str),
    #[error("webhook signature invalid: {0}")]
    SignatureInvalid(&'static str),
    #[error("webhook payload is not a valid event: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader<'a> {
    timestamp: i64,
    raw_timestamp: &'a str,
    v1_signatures: Vec<&'a str>,
}

impl<'a> SignatureHeader<'a> {
    fn parse(header: &'a str) -> Result<Self, VerificationError> {
        let mut timestamp = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(VerificationError::SignatureInvalid("malformed signature header"))?;

            match key {
                "t" => {
                    let parsed = value
                        .parse::<i64>()
                        .map_err(|_| VerificationError::SignatureInvalid("malformed timestamp"))?;
                    timestamp = Some((parsed, value));
                }
                "v1" => v1_signatures.push(value),
                // v0 and future schemes are not trusted.
                _ => {}
            }
        }

        let (timestamp, raw_timestamp) =
            timestamp.ok_or(VerificationError::SignatureInvalid("missing timestamp"))?;
        if v1_signatures.is_empty() {
            return Err(VerificationError::SignatureInvalid("missing v1 signature"));
        }

        Ok(Self {
            timestamp,
            raw_timestamp,
            v1_signatures,
        })
    }
}

/// Validates inbound Stripe events against the endpoint's signing secret.
///
/// The secret is optional so a deployment without `STRIPE_WEBHOOK_SECRET`
/// still boots and rejects webhooks with `ConfigurationMissing`.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
}

impl WebhookVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|value| !value.is_empty()),
        }
    }

    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<StripeEvent, VerificationError> {
        self.verify_at(payload, signature_header, Utc::now().timestamp())
    }

    /// Same as [`verify`](Self::verify) with an explicit clock.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> Result<StripeEvent, VerificationError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or(VerificationError::ConfigurationMissing("STRIPE_WEBHOOK_SECRET"))?;
        let signature_header = signature_header
            .filter(|value| !value.is_empty())
            .ok_or(VerificationError::ConfigurationMissing("stripe-signature header"))?;

        let header = SignatureHeader::parse(signature_header)?;

        // abs_diff cannot overflow on an attacker-chosen `t`.
        if now.abs_diff(header.timestamp) > DEFAULT_TOLERANCE_SECS.unsigned_abs() {
            return Err(VerificationError::SignatureInvalid(
                "timestamp outside tolerance window",
            ));
        }

        let expected = compute_signature(secret, header.raw_timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| bool::from(candidate.as_bytes().ct_eq(expected.as_bytes())));

        if !matched {
            return Err(VerificationError::SignatureInvalid(
                "no signature matches the payload",
            ));
        }

        serde_json::from_slice::<StripeEvent>(payload)
            .map_err(|err| VerificationError::InvalidPayload(err.to_string()))
    }
}

/// Lowercase hex HMAC over `"{timestamp}.{payload}"`, byte-exact on the payload.
pub fn compute_signature(
    secret: &str,
    timestamp: &str,
    payload: &[u8],
) -> Result<String, VerificationError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::ConfigurationMissing("STRIPE_WEBHOOK_SECRET"))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
