//! Storefront error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use shared::{OrderId, OrderStatus, ProductId, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid request: {details}")]
    InvalidRequest { details: String },

    #[error("Cannot {action} an order that is {from}")]
    InvalidTransition { from: OrderStatus, action: String },

    #[error("Conflict: {details}")]
    Conflict { details: String },

    #[error("Product {product_id} is out of stock: requested {requested}, available {available}")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Chat for order {order_id} is closed")]
    ChatClosed { order_id: OrderId },

    #[error("Payment error: {details}")]
    Payment { details: String },

    #[error("Upload rejected: {details}")]
    Upload { details: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorefrontError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden { reason: reason.into() }
    }

    pub fn invalid(details: impl Into<String>) -> Self {
        Self::InvalidRequest {
            details: details.into(),
        }
    }

    pub fn conflict(details: impl Into<String>) -> Self {
        Self::Conflict {
            details: details.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StorefrontError::NotFound { .. } => StatusCode::NOT_FOUND,
            StorefrontError::Unauthorized => StatusCode::UNAUTHORIZED,
            StorefrontError::Forbidden { .. } => StatusCode::FORBIDDEN,
            StorefrontError::InvalidRequest { .. }
            | StorefrontError::EmptyCart
            | StorefrontError::Upload { .. }
            | StorefrontError::Shared(_) => StatusCode::BAD_REQUEST,
            StorefrontError::InvalidTransition { .. }
            | StorefrontError::Conflict { .. }
            | StorefrontError::OutOfStock { .. }
            | StorefrontError::ChatClosed { .. } => StatusCode::CONFLICT,
            StorefrontError::Payment { .. } => StatusCode::PAYMENT_REQUIRED,
            StorefrontError::Config(_)
            | StorefrontError::Io(_)
            | StorefrontError::Json(_)
            | StorefrontError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            shared::component_error!("http", "Request failed: {}", self);
        }

        (status, Json(json!({ "status": "error", "error": self.to_string() }))).into_response()
    }
}

pub type StorefrontResult<T> = Result<T, StorefrontError>;
