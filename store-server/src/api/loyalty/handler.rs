//! Loyalty API handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use shared::money::{self, Amount, Points};

use crate::auth::CurrentUser;
use crate::core::{AppResponse, AppResult, StoreState};
use crate::store::loyalty::PointEvent;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Points,
    /// Discount the balance is worth if fully redeemed, in minor units.
    pub redeemable_value: Amount,
}

/// GET /api/loyalty/balance
pub async fn balance(
    State(state): State<StoreState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<BalanceResponse>>> {
    let balance = state.engine.points_balance(&user.id)?;
    Ok(Json(AppResponse::success(BalanceResponse {
        balance,
        redeemable_value: money::redemption_value(balance),
    })))
}

/// GET /api/loyalty/history - projected from orders and returns
pub async fn history(
    State(state): State<StoreState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<PointEvent>>>> {
    let events = state.engine.points_history(&user.id)?;
    Ok(Json(AppResponse::success(events)))
}
