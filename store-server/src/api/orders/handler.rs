//! Order API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::money::{Amount, Points};
use shared::{Order, ShippingAddress};

use crate::auth::{CurrentUser, permissions};
use crate::core::{AppError, AppResponse, AppResult, StoreState};
use crate::store::PaymentSource;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Payment reference handed out by the provider at charge time.
    #[validate(length(min = 1))]
    pub reference: String,
    /// Amount the provider confirmed, minor units.
    #[validate(range(min = 0))]
    pub amount: Amount,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub points_redeemed: Points,
    pub shipping: ShippingAddress,
}

/// POST /api/orders - client-confirmed payment (Path A)
pub async fn create(
    State(state): State<StoreState>,
    user: CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    req.validate()?;
    let order = state
        .engine
        .place_order(
            &user.id,
            PaymentSource::ClientConfirmed,
            &req.reference,
            req.amount,
            req.points_redeemed,
            req.shipping,
        )
        .await?;
    Ok(Json(AppResponse::success(order)))
}

/// GET /api/orders - caller's orders, newest first
pub async fn list(
    State(state): State<StoreState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = state.engine.list_orders(&user.id)?;
    Ok(Json(AppResponse::success(orders)))
}

/// GET /api/orders/by-reference/{reference} - polling fallback while the
/// confirm call or webhook is in flight. 404 until an order exists.
pub async fn get_by_reference(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(reference): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .engine
        .find_order_by_reference(&reference)?
        .ok_or_else(|| AppError::NotFound(format!("No order for reference {reference}")))?;
    if order.user_id != user.id && !user.has_permission(permissions::ORDERS_MANAGE) {
        return Err(AppError::Forbidden("Not the order owner".into()));
    }
    Ok(Json(AppResponse::success(order)))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.engine.get_order(&id)?;
    if order.user_id != user.id && !user.has_permission(permissions::ORDERS_MANAGE) {
        return Err(AppError::Forbidden("Not the order owner".into()));
    }
    Ok(Json(AppResponse::success(order)))
}

/// POST /api/orders/{id}/ship - operator
pub async fn ship(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require(permissions::ORDERS_MANAGE)?;
    let order = state.engine.ship_order(&id).await?;
    Ok(Json(AppResponse::success(order)))
}

/// POST /api/orders/{id}/deliver - operator
pub async fn deliver(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require(permissions::ORDERS_MANAGE)?;
    let order = state.engine.deliver_order(&id).await?;
    Ok(Json(AppResponse::success(order)))
}

/// POST /api/orders/{id}/cancel - operator
pub async fn cancel(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require(permissions::ORDERS_MANAGE)?;
    let order = state.engine.cancel_order(&id).await?;
    Ok(Json(AppResponse::success(order)))
}
