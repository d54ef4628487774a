//! Loyalty API.

mod handler;

use axum::{Router, routing::get};

use crate::core::StoreState;

pub fn router() -> Router<StoreState> {
    Router::new()
        .route("/api/loyalty/balance", get(handler::balance))
        .route("/api/loyalty/history", get(handler::history))
}
