//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness
//! GET    /health/ready                        - Readiness (store ping)
//!
//! # Storefront (caller from `x-user-id`)
//! GET    /api/v1/products                     - Active products
//! GET    /api/v1/products/{id}                - Product detail
//! GET    /api/v1/settings                     - Public store settings
//! GET    /api/v1/user/cart                    - Cart lines
//! POST   /api/v1/user/cart                    - Add to cart
//! DELETE /api/v1/user/cart                    - Clear cart
//! PATCH  /api/v1/user/cart/{item_id}          - Set line quantity
//! DELETE /api/v1/user/cart/{item_id}          - Remove line
//! GET    /api/v1/user/wishlist                - Wishlist
//! POST   /api/v1/user/wishlist                - Add to wishlist
//! DELETE /api/v1/user/wishlist/{product_id}   - Remove from wishlist
//! GET    /api/v1/user/orders                  - Order history
//! POST   /api/v1/user/orders                  - Checkout
//! POST   /api/v1/user/orders/payments         - Register gateway attempt
//! POST   /api/v1/user/orders/verify           - Verify payment signature
//!
//! # Admin (requires `x-user-role: admin`)
//! GET    /api/v1/admin/products               - All products
//! POST   /api/v1/admin/products               - Create product
//! PATCH  /api/v1/admin/products/{id}          - Update product
//! DELETE /api/v1/admin/products/{id}          - Delete never-ordered product
//! GET    /api/v1/admin/orders                 - All orders
//! GET    /api/v1/admin/orders/{id}            - Order detail
//! PATCH  /api/v1/admin/orders/{id}/status     - Update order status
//! GET    /api/v1/admin/employees              - Employees with liability
//! POST   /api/v1/admin/employees              - Create employee
//! PATCH  /api/v1/admin/employees/{id}         - Update employee
//! DELETE /api/v1/admin/employees/{id}         - Retire employee (no liability)
//! POST   /api/v1/admin/employees/{id}/toggle-status
//! GET    /api/v1/admin/employees/{id}/holdings
//! GET    /api/v1/admin/employees/{id}/logs
//! POST   /api/v1/admin/stock/assign           - Delegate stock
//! POST   /api/v1/admin/stock/sale             - Record sale
//! GET    /api/v1/admin/stock/logs             - Full stock audit trail
//! GET    /api/v1/admin/settings               - Store settings
//! PUT    /api/v1/admin/settings               - Update store settings
//! ```

pub mod admin;
pub mod health;
pub mod storefront;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use crate::state::AppState;

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    /// Same envelope with `201 Created`.
    pub fn created(data: T) -> (StatusCode, Self) {
        (StatusCode::CREATED, Self::ok(data))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", storefront::routes().merge(admin::routes()))
}
