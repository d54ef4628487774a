//! Return API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use shared::{ReturnReason, ReturnRequest, ReturnResolution};

use crate::auth::{CurrentUser, permissions};
use crate::core::{AppError, AppResponse, AppResult, StoreState};

#[derive(Debug, Deserialize, Validate)]
pub struct RequestReturnBody {
    #[validate(length(min = 1))]
    pub order_id: String,
    pub reason: ReturnReason,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
    pub resolution: ReturnResolution,
}

/// POST /api/returns - owner files a return on a delivered order
pub async fn request(
    State(state): State<StoreState>,
    user: CurrentUser,
    Json(body): Json<RequestReturnBody>,
) -> AppResult<Json<AppResponse<ReturnRequest>>> {
    body.validate()?;
    let request = state
        .engine
        .request_return(&user.id, &body.order_id, body.reason, body.comments, body.resolution)
        .await?;
    Ok(Json(AppResponse::success(request)))
}

/// GET /api/returns - operator queue
pub async fn list(
    State(state): State<StoreState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<ReturnRequest>>>> {
    user.require(permissions::RETURNS_MANAGE)?;
    let returns = state.engine.list_returns()?;
    Ok(Json(AppResponse::success(returns)))
}

/// GET /api/returns/{order_id}
pub async fn get_by_order(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<AppResponse<ReturnRequest>>> {
    let request = state.engine.get_return(&order_id)?;
    if request.user_id != user.id && !user.has_permission(permissions::RETURNS_MANAGE) {
        return Err(AppError::Forbidden("Not the return owner".into()));
    }
    Ok(Json(AppResponse::success(request)))
}

/// POST /api/returns/{order_id}/approve - operator
pub async fn approve(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<AppResponse<ReturnRequest>>> {
    user.require(permissions::RETURNS_MANAGE)?;
    let request = state.engine.approve_return(&order_id).await?;
    Ok(Json(AppResponse::success(request)))
}

/// POST /api/returns/{order_id}/reject - operator
pub async fn reject(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<AppResponse<ReturnRequest>>> {
    user.require(permissions::RETURNS_MANAGE)?;
    let request = state.engine.reject_return(&order_id).await?;
    Ok(Json(AppResponse::success(request)))
}

/// POST /api/returns/{order_id}/complete - operator; runs the loyalty
/// reversal with the status change
pub async fn complete(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<AppResponse<ReturnRequest>>> {
    user.require(permissions::RETURNS_MANAGE)?;
    let request = state.engine.complete_return(&order_id).await?;
    Ok(Json(AppResponse::success(request)))
}

/// POST /api/returns/{order_id}/restock - operator; idempotent
pub async fn restock(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<AppResponse<ReturnRequest>>> {
    user.require(permissions::STORE_MANAGE)?;
    let request = state.engine.restock_return(&order_id).await?;
    Ok(Json(AppResponse::success(request)))
}
