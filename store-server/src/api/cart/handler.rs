//! Cart API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::CartLine;

use crate::auth::CurrentUser;
use crate::core::{AppResponse, AppResult, StoreState};
use crate::store::cart::GuestLine;

/// GET /api/cart
pub async fn list(
    State(state): State<StoreState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<CartLine>>>> {
    let lines = state.engine.list_cart(&user.id)?;
    Ok(Json(AppResponse::success(lines)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    pub size: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// POST /api/cart
pub async fn add(
    State(state): State<StoreState>,
    user: CurrentUser,
    Json(req): Json<AddToCartRequest>,
) -> AppResult<Json<AppResponse<CartLine>>> {
    req.validate()?;
    let line = state
        .engine
        .add_to_cart(&user.id, &req.product_id, req.size, req.quantity)?;
    Ok(Json(AppResponse::success(line)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// PUT /api/cart/{line_id}
pub async fn update_quantity(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(line_id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> AppResult<Json<AppResponse<CartLine>>> {
    req.validate()?;
    let line = state
        .engine
        .update_cart_line(&user.id, &line_id, req.quantity)?;
    Ok(Json(AppResponse::success(line)))
}

/// DELETE /api/cart/{line_id}
pub async fn remove(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(line_id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    state.engine.remove_cart_line(&user.id, &line_id)?;
    Ok(Json(AppResponse::success(())))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<StoreState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<()>>> {
    state.engine.clear_cart(&user.id)?;
    Ok(Json(AppResponse::success(())))
}

#[derive(Debug, Deserialize)]
pub struct MergeCartRequest {
    pub lines: Vec<GuestLine>,
}

#[derive(Debug, Serialize)]
pub struct MergeCartResponse {
    pub merged: usize,
    pub cart: Vec<CartLine>,
}

/// POST /api/cart/merge - fold the guest cart in after login
pub async fn merge(
    State(state): State<StoreState>,
    user: CurrentUser,
    Json(req): Json<MergeCartRequest>,
) -> AppResult<Json<AppResponse<MergeCartResponse>>> {
    let merged = state.engine.merge_guest_cart(&user.id, &req.lines);
    let cart = state.engine.list_cart(&user.id)?;
    Ok(Json(AppResponse::success(MergeCartResponse { merged, cart })))
}
