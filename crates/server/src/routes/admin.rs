//! Back-office handlers. Every handler requires [`RequireAdmin`].

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use bazaar_core::{EmployeeId, OrderId, ProductId};

use super::ApiResponse;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::{
    AssignStock, NewEmployee, NewProduct, ProductUpdate, RecordSale, SettingsUpdate,
    UpdateEmployee, UpdateOrderStatus,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/products", get(list_products).post(create_product))
        .route(
            "/admin/products/{id}",
            patch(update_product).delete(delete_product),
        )
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/{id}", get(show_order))
        .route("/admin/orders/{id}/status", patch(update_order_status))
        .route("/admin/employees", get(list_employees).post(create_employee))
        .route(
            "/admin/employees/{id}",
            patch(update_employee).delete(delete_employee),
        )
        .route("/admin/employees/{id}/toggle-status", post(toggle_employee))
        .route("/admin/employees/{id}/holdings", get(employee_holdings))
        .route("/admin/employees/{id}/logs", get(employee_logs))
        .route("/admin/stock/assign", post(assign_stock))
        .route("/admin/stock/sale", post(record_sale))
        .route("/admin/stock/logs", get(all_stock_logs))
        .route("/admin/settings", get(get_settings).put(update_settings))
}

#[derive(Debug, Deserialize)]
struct LogQuery {
    limit: Option<i64>,
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.catalog().list_products(false).await?))
}

async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(
        state.catalog().create_product(input).await?,
    ))
}

async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(update) = payload?;
    Ok(ApiResponse::ok(
        state.catalog().update_product(id, update).await?,
    ))
}

async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog().delete_product(id).await?;
    info!(admin_id = %admin, product_id = %id, "Admin deleted product");
    Ok(ApiResponse::ok(json!({ "deleted": id })))
}

// =============================================================================
// Orders
// =============================================================================

async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.orders().all_orders().await?))
}

async fn show_order(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.orders().order_detail(id).await?))
}

async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    payload: Result<Json<UpdateOrderStatus>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let order = state.orders().update_status(id, &request.status).await?;
    info!(admin_id = %admin, order_id = %id, status = %order.status, "Admin updated order status");
    Ok(ApiResponse::ok(order))
}

// =============================================================================
// Employees
// =============================================================================

async fn list_employees(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.employees().list().await?))
}

async fn create_employee(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(state.employees().create(input).await?))
}

async fn update_employee(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<EmployeeId>,
    payload: Result<Json<UpdateEmployee>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(update) = payload?;
    Ok(ApiResponse::ok(state.employees().update(id, update).await?))
}

async fn delete_employee(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<EmployeeId>,
) -> Result<impl IntoResponse, AppError> {
    state.employees().delete(id).await?;
    Ok(ApiResponse::ok(json!({ "deleted": id })))
}

async fn toggle_employee(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<EmployeeId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.employees().toggle_status(id).await?))
}

async fn employee_holdings(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<EmployeeId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.employees().holdings(id).await?))
}

async fn employee_logs(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<EmployeeId>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        state.employees().stock_logs(Some(id), query.limit).await?,
    ))
}

// =============================================================================
// Stock delegation
// =============================================================================

async fn assign_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: Result<Json<AssignStock>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let ledger = state
        .stock()
        .assign(request.employee_id, request.product_id, request.quantity)
        .await?;
    info!(admin_id = %admin, employee_id = %request.employee_id, "Admin assigned stock");
    Ok(ApiResponse::ok(ledger))
}

async fn record_sale(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    payload: Result<Json<RecordSale>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    Ok(ApiResponse::ok(
        state
            .stock()
            .record_sale(request.employee_id, request.quantity)
            .await?,
    ))
}

async fn all_stock_logs(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        state.employees().stock_logs(None, query.limit).await?,
    ))
}

// =============================================================================
// Settings
// =============================================================================

async fn get_settings(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.settings().get().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(update) = payload?;
    let settings = state.settings().update(update).await?;
    info!(admin_id = %admin, "Admin updated store settings");
    Ok(ApiResponse::ok(settings))
}
