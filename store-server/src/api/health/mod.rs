//! Health check route (public).

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::core::StoreState;

pub fn router() -> Router<StoreState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
