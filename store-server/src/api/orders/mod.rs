//! Order API.
//!
//! `POST /` is Path A of order creation: the client reporting that the
//! provider confirmed its charge. Path B is the webhook module; both end
//! in the same engine pipeline.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::StoreState;

pub fn router() -> Router<StoreState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<StoreState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/by-reference/{reference}", get(handler::get_by_reference))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/ship", post(handler::ship))
        .route("/{id}/deliver", post(handler::deliver))
        .route("/{id}/cancel", post(handler::cancel))
}
