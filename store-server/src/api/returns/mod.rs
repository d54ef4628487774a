//! Return API.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::StoreState;

pub fn router() -> Router<StoreState> {
    Router::new().nest("/api/returns", return_routes())
}

fn return_routes() -> Router<StoreState> {
    Router::new()
        .route("/", get(handler::list).post(handler::request))
        .route("/{order_id}", get(handler::get_by_order))
        .route("/{order_id}/approve", post(handler::approve))
        .route("/{order_id}/reject", post(handler::reject))
        .route("/{order_id}/complete", post(handler::complete))
        .route("/{order_id}/restock", post(handler::restock))
}
