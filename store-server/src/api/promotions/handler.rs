//! Promotion API handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::money::Amount;
use shared::{PromoKind, PromoRule};

use crate::auth::{CurrentUser, permissions};
use crate::core::{AppResponse, AppResult, StoreState};

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    /// Cart total in minor units; when present the response carries the
    /// discount this code would apply.
    pub total: Option<Amount>,
}

#[derive(Debug, Serialize)]
pub struct ValidatePromoResponse {
    pub rule: PromoRule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Amount>,
}

/// GET /api/promotions/{code}?total=... - active-code lookup
pub async fn validate(
    State(state): State<StoreState>,
    _user: CurrentUser,
    Path(code): Path<String>,
    Query(query): Query<ValidateQuery>,
) -> AppResult<Json<AppResponse<ValidatePromoResponse>>> {
    let rule = state.engine.validate_promo(&code)?;
    let discount = query.total.map(|t| rule.discount_on(t));
    Ok(Json(AppResponse::success(ValidatePromoResponse {
        rule,
        discount,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertPromoRequest {
    #[validate(length(min = 1))]
    pub code: String,
    pub kind: PromoKind,
    #[validate(range(min = 0))]
    pub value: i64,
    pub active: bool,
}

/// PUT /api/promotions - operator upsert
pub async fn upsert(
    State(state): State<StoreState>,
    user: CurrentUser,
    Json(req): Json<UpsertPromoRequest>,
) -> AppResult<Json<AppResponse<PromoRule>>> {
    user.require(permissions::PROMOTIONS_MANAGE)?;
    req.validate()?;

    let rule = PromoRule {
        code: req.code,
        kind: req.kind,
        value: req.value,
        active: req.active,
    };
    state.engine.upsert_promo(&rule)?;
    Ok(Json(AppResponse::success(rule)))
}
