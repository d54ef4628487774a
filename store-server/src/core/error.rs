//! Unified API error and response types.
//!
//! `AppError` is what handlers return; `IntoResponse` renders the
//! `{code, message, data}` envelope with a stable error code per variant.
//! Domain errors from the engine map onto it via `From<StoreError>` so
//! handlers can use `?` throughout.
//!
//! # Error codes
//!
//! | Prefix | Category |
//! |--------|----------|
//! | E1xxx | Validation / business rule |
//! | E2xxx | Authorization |
//! | E3xxx | Authentication |
//! | E0xxx | System |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::store::StoreError;

/// Uniform response envelope.
///
/// ```json
/// { "code": "0000", "message": "success", "data": { ... } }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> AppResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: "0000".into(),
            message: "success".into(),
            data: Some(data),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication (401) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    // ========== Authorization (403) ==========
    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Webhook (401) ==========
    #[error("Invalid webhook signature")]
    InvalidSignature,

    // ========== Business logic (4xx) ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ========== System (5xx) ==========
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "E3001", "Please login first".to_string())
            }
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "E3002", "Invalid token".to_string())
            }
            AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "E3003", "Token expired".to_string())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2001", msg.clone()),
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "E3004",
                "Invalid webhook signature".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E1003", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E1004", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E1002", msg.clone()),
            AppError::BusinessRule(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E1005", msg.clone())
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E0001",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E0002",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body: AppResponse<()> = AppResponse {
            code: code.into(),
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmptyCart => AppError::Validation("Cart is empty".into()),
            StoreError::InvalidQuantity(q) => {
                AppError::Validation(format!("Invalid quantity: {q}"))
            }
            StoreError::OutOfStock { product_id, size } => AppError::BusinessRule(match size {
                Some(s) => format!("Out of stock: {product_id} (size {s})"),
                None => format!("Out of stock: {product_id}"),
            }),
            StoreError::InsufficientPoints { requested, balance } => AppError::BusinessRule(
                format!("Insufficient points: requested {requested}, balance {balance}"),
            ),
            StoreError::PromoNotFound(code) => {
                AppError::NotFound(format!("Promotion {code} not found"))
            }
            StoreError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {id} not found"))
            }
            StoreError::OrderNotFound(id) => AppError::NotFound(format!("Order {id} not found")),
            StoreError::ReturnNotFound(id) => {
                AppError::NotFound(format!("Return for order {id} not found"))
            }
            StoreError::CartLineNotFound(id) => {
                AppError::NotFound(format!("Cart line {id} not found"))
            }
            StoreError::DuplicateReturn(id) => {
                AppError::Conflict(format!("Order {id} already has a return"))
            }
            StoreError::InvalidTransition(msg) => AppError::BusinessRule(msg),
            StoreError::NotOwner => AppError::Forbidden("Not the order owner".into()),
            StoreError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Handler result alias.
pub type AppResult<T> = std::result::Result<T, AppError>;
