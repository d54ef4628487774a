//! API routes.
//!
//! One module per resource, each exposing a `router()` merged into
//! [`build_router`]:
//!
//! - [`health`] - health check (public)
//! - [`products`] - catalog queries, operator upsert, restock interest
//! - [`cart`] - cart CRUD and guest-cart merge
//! - [`orders`] - order creation (client confirm path), queries, operator transitions
//! - [`returns`] - return workflow, operator transitions and restock
//! - [`promotions`] - promotion lookup and operator upsert
//! - [`loyalty`] - point balance and history
//! - [`webhook`] - payment provider webhook (public, HMAC-verified)

pub mod cart;
pub mod health;
pub mod loyalty;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod returns;
pub mod webhook;

use std::time::Duration;

use axum::{Router, middleware};
use http::{HeaderValue, Request};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::StoreState;

pub use crate::core::{AppError, AppResponse, AppResult};

#[derive(Clone, Default)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Stateless route tree; state and middleware attach in [`build_app`].
pub fn build_router() -> Router<StoreState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(returns::router())
        .merge(promotions::router())
        .merge(loyalty::router())
        .merge(webhook::router())
}

/// Full application: routes, auth middleware, tower layers.
pub fn build_app(state: StoreState) -> Router {
    let request_timeout = Duration::from_millis(state.config.request_timeout_ms);
    Router::new()
        .merge(build_router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(ConcurrencyLimitLayer::new(1024))
}
