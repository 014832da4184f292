//! Domain error taxonomy shared by every service.

use thiserror::Error;

use bazaar_core::{
    EmailError, EmployeeId, OrderId, ProductId, QuantityError, StatusParseError,
};

use crate::db::StoreError;

/// Errors returned by the commerce services.
///
/// Every variant other than [`CommerceError::Persistence`] is a business
/// rejection: the transaction that produced it was rolled back and the
/// caller may retry once the condition changes.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// Bad or missing input.
    #[error("{0}")]
    Validation(String),

    /// Quantity was zero, negative or out of range.
    #[error(transparent)]
    InvalidQuantity(#[from] QuantityError),

    #[error(transparent)]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    InvalidStatus(#[from] StatusParseError),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Any other missing resource, described by name.
    #[error("{0} not found")]
    NotFound(String),

    /// Warehouse stock cannot cover the request.
    #[error("only {available} pieces of {product} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        product: String,
        available: i32,
        requested: i32,
    },

    /// A reported sale exceeds what the employee still holds.
    #[error("sale of {requested} exceeds remaining liability of {available}")]
    ExcessSale { requested: i32, available: i32 },

    #[error("cart is empty")]
    EmptyCart,

    #[error("employee {0} is inactive")]
    EmployeeInactive(EmployeeId),

    /// The employee still owes delegated stock.
    #[error("employee {employee_id} still holds {remaining} unsold pieces")]
    OutstandingLiability {
        employee_id: EmployeeId,
        remaining: i32,
    },

    /// Uniqueness or reference clash.
    #[error("{0}")]
    Conflict(String),

    #[error("payment signature is invalid")]
    PaymentSignatureInvalid,

    /// Checkout referenced a payment that has not passed signature
    /// verification.
    #[error("payment has not been verified")]
    PaymentNotVerified,

    /// Unexpected store failure.
    #[error("persistence error: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for CommerceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Persistence(other),
        }
    }
}

impl CommerceError {
    /// Stable machine-readable code used in API error bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_)
            | Self::InvalidQuantity(_)
            | Self::InvalidEmail(_)
            | Self::InvalidStatus(_) => "validation_error",
            Self::ProductNotFound(_)
            | Self::EmployeeNotFound(_)
            | Self::OrderNotFound(_)
            | Self::NotFound(_) => "not_found",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::ExcessSale { .. } => "excess_sale",
            Self::EmptyCart => "empty_cart",
            Self::EmployeeInactive(_) => "employee_inactive",
            Self::OutstandingLiability { .. } => "outstanding_liability",
            Self::Conflict(_) => "conflict",
            Self::PaymentSignatureInvalid => "payment_signature_invalid",
            Self::PaymentNotVerified => "payment_not_verified",
            Self::Persistence(_) => "persistence_error",
        }
    }
}
