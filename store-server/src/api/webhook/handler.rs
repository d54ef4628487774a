//! Payment webhook handler (Path B of order creation).
//!
//! Verification order matters: the HMAC check runs on the raw body
//! before parsing, and a failed check returns 401 with no side effects.
//! Events other than `charge.success` are acknowledged and dropped so
//! the provider stops retrying them.

use axum::{Json, body::Bytes, extract::State};
use http::HeaderMap;
use serde::Serialize;

use crate::core::{AppError, AppResponse, AppResult, StoreState};
use crate::payments::{EVENT_CHARGE_SUCCESS, SIGNATURE_HEADER, WebhookEvent, verify_signature};
use crate::store::PaymentSource;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// POST /api/webhook/payment
pub async fn payment(
    State(state): State<StoreState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<AppResponse<WebhookAck>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    if !verify_signature(&state.config.webhook_secret, &body, signature) {
        tracing::warn!("Webhook signature mismatch");
        return Err(AppError::InvalidSignature);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {e}")))?;

    if event.event != EVENT_CHARGE_SUCCESS {
        tracing::info!(event = %event.event, "Ignoring webhook event");
        return Ok(Json(AppResponse::success(WebhookAck {
            received: true,
            order_id: None,
        })));
    }

    let charge = event.data;
    let order = state
        .engine
        .place_order(
            &charge.metadata.user_id,
            PaymentSource::ProviderWebhook,
            &charge.reference,
            charge.amount,
            charge.metadata.points_redeemed,
            charge.metadata.shipping,
        )
        .await?;

    Ok(Json(AppResponse::success(WebhookAck {
        received: true,
        order_id: Some(order.id),
    })))
}
