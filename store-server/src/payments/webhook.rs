//! Webhook signature scheme and payload types.
//!
//! The provider signs the raw request body with HMAC-SHA256 over the
//! shared secret and sends the hex digest in `x-store-signature`.
//! Verification must run on the exact bytes received, before any JSON
//! parsing, and a mismatch must cause no side effects.

use ring::hmac;
use serde::Deserialize;

use shared::ShippingAddress;
use shared::money::{Amount, Points};

pub const SIGNATURE_HEADER: &str = "x-store-signature";

/// The only event type that creates orders.
pub const EVENT_CHARGE_SUCCESS: &str = "charge.success";

/// Constant-time HMAC-SHA256 check of `signature_hex` against `body`.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, body, &signature).is_ok()
}

/// Hex HMAC of `body`; used by tests and by provider simulators.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, body).as_ref())
}

/// Top-level webhook payload.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookCharge,
}

/// The charge the provider settled.
#[derive(Debug, Deserialize)]
pub struct WebhookCharge {
    /// Payment reference, the idempotency anchor.
    pub reference: String,
    /// Authoritative amount charged, minor units.
    pub amount: Amount,
    pub metadata: WebhookMetadata,
}

/// Checkout context the client attached when initiating payment.
#[derive(Debug, Deserialize)]
pub struct WebhookMetadata {
    pub user_id: String,
    #[serde(default)]
    pub shipping: ShippingAddress,
    #[serde(default)]
    pub points_redeemed: Points,
}
