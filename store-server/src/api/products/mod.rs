//! Product API.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::StoreState;

pub fn router() -> Router<StoreState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<StoreState> {
    Router::new()
        .route("/", get(handler::list).put(handler::upsert))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/restock-interest", post(handler::register_interest))
}
