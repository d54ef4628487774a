//! Product API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use shared::Product;

use crate::auth::{CurrentUser, permissions};
use crate::core::{AppResponse, AppResult, StoreState};

/// GET /api/products - full catalog
pub async fn list(State(state): State<StoreState>) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let products = state.engine.list_products()?;
    Ok(Json(AppResponse::success(products)))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<StoreState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = state.engine.get_product(&id)?;
    Ok(Json(AppResponse::success(product)))
}

#[derive(Debug, serde::Deserialize, Validate)]
pub struct UpsertProductRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0))]
    pub price: i64,
    pub sale_price: Option<i64>,
    #[validate(range(min = 0))]
    pub stock_quantity: i64,
    #[serde(default)]
    pub sizes: Vec<shared::SizeStock>,
}

/// PUT /api/products - operator catalog upsert
pub async fn upsert(
    State(state): State<StoreState>,
    user: CurrentUser,
    Json(req): Json<UpsertProductRequest>,
) -> AppResult<Json<AppResponse<Product>>> {
    user.require(permissions::STORE_MANAGE)?;
    req.validate()?;

    let product = Product {
        id: req.id,
        name: req.name,
        price: req.price,
        sale_price: req.sale_price,
        stock_quantity: req.stock_quantity,
        sizes: req.sizes,
    };
    state.engine.upsert_product(&product)?;
    Ok(Json(AppResponse::success(product)))
}

/// POST /api/products/{id}/restock-interest - notify me when it's back
pub async fn register_interest(
    State(state): State<StoreState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    state.engine.register_restock_interest(&id, &user.id)?;
    Ok(Json(AppResponse::success(())))
}
