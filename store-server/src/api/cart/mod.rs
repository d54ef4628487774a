//! Cart API.

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::StoreState;

pub fn router() -> Router<StoreState> {
    Router::new().nest("/api/cart", cart_routes())
}

fn cart_routes() -> Router<StoreState> {
    Router::new()
        .route("/", get(handler::list).post(handler::add).delete(handler::clear))
        .route("/merge", post(handler::merge))
        .route(
            "/{line_id}",
            delete(handler::remove).put(handler::update_quantity),
        )
}
