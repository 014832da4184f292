//! HTTP error mapping.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::services::CommerceError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Business rejection or persistence failure from a service.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// Request body could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Caller identity missing or malformed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A required collaborator is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Commerce(err) => match err {
                CommerceError::Validation(_)
                | CommerceError::InvalidQuantity(_)
                | CommerceError::InvalidEmail(_)
                | CommerceError::InvalidStatus(_)
                | CommerceError::EmptyCart
                | CommerceError::PaymentSignatureInvalid => StatusCode::BAD_REQUEST,
                CommerceError::ProductNotFound(_)
                | CommerceError::EmployeeNotFound(_)
                | CommerceError::OrderNotFound(_)
                | CommerceError::NotFound(_) => StatusCode::NOT_FOUND,
                CommerceError::Conflict(_) | CommerceError::OutstandingLiability { .. } => {
                    StatusCode::CONFLICT
                }
                CommerceError::PaymentNotVerified => StatusCode::PAYMENT_REQUIRED,
                CommerceError::InsufficientStock { .. }
                | CommerceError::ExcessSale { .. }
                | CommerceError::EmployeeInactive(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CommerceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Commerce(err) => err.code(),
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    fn body(&self) -> Value {
        // Don't expose internal error details to clients
        let message = if self.status().is_server_error() && !matches!(self, Self::ServiceUnavailable(_)) {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "success": false,
            "message": message,
            "error": self.code(),
        });

        match self {
            Self::Commerce(CommerceError::InsufficientStock {
                product_id,
                product,
                available,
                requested,
            }) => {
                body["product_id"] = json!(product_id);
                body["product"] = json!(product);
                body["available"] = json!(available);
                body["requested"] = json!(requested);
            }
            Self::Commerce(CommerceError::ExcessSale {
                requested,
                available,
            }) => {
                body["available"] = json!(available);
                body["requested"] = json!(requested);
            }
            Self::Commerce(CommerceError::OutstandingLiability {
                employee_id,
                remaining,
            }) => {
                body["employee_id"] = json!(employee_id);
                body["remaining_liability"] = json!(remaining);
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request failed"
            );
        }

        (status, Json(self.body())).into_response()
    }
}
