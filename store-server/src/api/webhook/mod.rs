//! Payment provider webhook (public route, HMAC-verified).

mod handler;

use axum::{Router, routing::post};

use crate::core::StoreState;

pub fn router() -> Router<StoreState> {
    Router::new().route("/api/webhook/payment", post(handler::payment))
}
