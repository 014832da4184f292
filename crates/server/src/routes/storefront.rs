//! Storefront handlers: catalog, cart, wishlist, checkout and payments.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;

use bazaar_core::{CartItemId, ProductId};

use super::ApiResponse;
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::{
    AddToCart, AddToWishlist, PaymentVerification, PlaceOrderInput, RegisterPayment,
    UpdateCartQuantity,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(show_product))
        .route("/settings", get(store_settings))
        .route("/user/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route(
            "/user/cart/{item_id}",
            patch(update_cart_item).delete(remove_cart_item),
        )
        .route("/user/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route(
            "/user/wishlist/{product_id}",
            axum::routing::delete(remove_from_wishlist),
        )
        .route("/user/orders", get(order_history).post(place_order))
        .route("/user/orders/payments", post(register_payment))
        .route("/user/orders/verify", post(verify_payment))
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.catalog().list_products(true).await?))
}

async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.catalog().get_product(id, true).await?))
}

async fn store_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.settings().get().await?))
}

// =============================================================================
// Cart
// =============================================================================

async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.cart().get_cart(user).await?))
}

async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AddToCart>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    Ok(ApiResponse::created(
        state.cart().add_to_cart(user, request).await?,
    ))
}

async fn update_cart_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<CartItemId>,
    payload: Result<Json<UpdateCartQuantity>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    Ok(ApiResponse::ok(
        state
            .cart()
            .update_quantity(user, item_id, request.quantity)
            .await?,
    ))
}

async fn remove_cart_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<CartItemId>,
) -> Result<impl IntoResponse, AppError> {
    state.cart().remove_item(user, item_id).await?;
    Ok(ApiResponse::ok(json!({ "removed": item_id })))
}

async fn clear_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let removed = state.cart().clear_cart(user).await?;
    Ok(ApiResponse::ok(json!({ "removed": removed })))
}

// =============================================================================
// Wishlist
// =============================================================================

async fn get_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.wishlist().get_wishlist(user).await?))
}

async fn add_to_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AddToWishlist>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let added = state.wishlist().add(user, request.product_id).await?;
    Ok(ApiResponse::ok(
        json!({ "product_id": request.product_id, "added": added }),
    ))
}

async fn remove_from_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    state.wishlist().remove(user, product_id).await?;
    Ok(ApiResponse::ok(json!({ "removed": product_id })))
}

// =============================================================================
// Orders & payments
// =============================================================================

async fn order_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(state.orders().user_orders(user).await?))
}

async fn place_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<PlaceOrderInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload?;
    Ok(ApiResponse::created(
        state.checkout().place_order(user, input).await?,
    ))
}

async fn register_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<RegisterPayment>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    Ok(ApiResponse::created(
        state.payments()?.register_attempt(user, request).await?,
    ))
}

async fn verify_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<PaymentVerification>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    Ok(ApiResponse::ok(
        state.payments()?.verify(user, request).await?,
    ))
}
