//! Payment provider integration.
//!
//! The provider talks to us one way: a signed webhook per charge. The
//! signature scheme and payload shapes live in [`webhook`]; the HTTP
//! endpoint that consumes them is `api::webhook`.

pub mod webhook;

pub use webhook::{
    EVENT_CHARGE_SUCCESS, SIGNATURE_HEADER, WebhookCharge, WebhookEvent, WebhookMetadata,
    verify_signature,
};
