//! Promotion API.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::StoreState;

pub fn router() -> Router<StoreState> {
    Router::new().nest("/api/promotions", promo_routes())
}

fn promo_routes() -> Router<StoreState> {
    Router::new()
        .route("/", put(handler::upsert))
        .route("/{code}", get(handler::validate))
}
