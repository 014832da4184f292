//! Integration tests for Bazaar.
//!
//! The tests drive the full axum router (extractors, error mapping, JSON
//! envelopes) over [`InMemoryStore`], so no database or running server is
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront` - Catalog, cart, wishlist and checkout
//! - `admin` - Products, orders, employees, stock delegation and settings
//! - `payments` - Gateway attempt registration and signature checks

use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use bazaar_core::UserId;
use bazaar_server::db::InMemoryStore;
use bazaar_server::middleware::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
use bazaar_server::services::{HmacPaymentVerifier, PaymentVerifier};
use bazaar_server::state::AppState;

/// Gateway key secret the test app verifies signatures with.
pub const PAYMENT_SECRET: &str = "bazaar_test_key_secret";

/// Who is calling.
#[derive(Debug, Clone, Copy)]
pub enum Caller {
    Anonymous,
    User(UserId),
    Admin(UserId),
}

/// Status and parsed body of one response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `data` field of a success envelope.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of an error body.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"].as_str()
    }
}

pub struct TestApp {
    router: Router,
    pub admin: Caller,
    pub verifier: Arc<HmacPaymentVerifier>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App over a fresh in-memory store with payment verification enabled.
    #[must_use]
    pub fn new() -> Self {
        let verifier = Arc::new(HmacPaymentVerifier::new(SecretString::from(
            PAYMENT_SECRET.to_string(),
        )));
        let state = AppState::with_verifier(
            Arc::new(InMemoryStore::new()),
            Some(Arc::clone(&verifier) as Arc<dyn PaymentVerifier>),
        );
        Self::from_state(state, verifier)
    }

    /// App with no gateway key secret configured.
    #[must_use]
    pub fn without_payments() -> Self {
        let verifier = Arc::new(HmacPaymentVerifier::new(SecretString::from(
            PAYMENT_SECRET.to_string(),
        )));
        let state = AppState::with_verifier(Arc::new(InMemoryStore::new()), None);
        Self::from_state(state, verifier)
    }

    fn from_state(state: AppState, verifier: Arc<HmacPaymentVerifier>) -> Self {
        Self {
            router: bazaar_server::app(state),
            admin: Caller::Admin(UserId::new()),
            verifier,
        }
    }

    /// Send a request with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        caller: Caller,
        body: Option<&Value>,
    ) -> TestResponse {
        let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
        self.send(method, uri, caller, body).await
    }

    /// Send a request with a raw body, for malformed-input tests.
    pub async fn send(&self, method: Method, uri: &str, caller: Caller, body: Body) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        match caller {
            Caller::Anonymous => {}
            Caller::User(id) => builder = builder.header(USER_ID_HEADER, id.to_string()),
            Caller::Admin(id) => {
                builder = builder
                    .header(USER_ID_HEADER, id.to_string())
                    .header(USER_ROLE_HEADER, "admin");
            }
        }
        let request = builder.body(body).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, caller: Caller) -> TestResponse {
        self.request(Method::GET, uri, caller, None).await
    }

    pub async fn post(&self, uri: &str, caller: Caller, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, caller, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, caller: Caller, body: &Value) -> TestResponse {
        self.request(Method::PATCH, uri, caller, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, caller: Caller) -> TestResponse {
        self.request(Method::DELETE, uri, caller, None).await
    }

    /// Create an active product through the admin API and return it.
    pub async fn create_product(
        &self,
        name: &str,
        price: &str,
        wholesale_price: &str,
        bulk_threshold: i32,
        stock: i32,
    ) -> Value {
        let response = self
            .post(
                "/api/v1/admin/products",
                self.admin,
                &json!({
                    "name": name,
                    "category": "apparel",
                    "price": price,
                    "wholesale_price": wholesale_price,
                    "bulk_threshold": bulk_threshold,
                    "stock": stock,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.data().clone()
    }

    /// Create an employee through the admin API and return it.
    pub async fn create_employee(&self, email: &str) -> Value {
        let response = self
            .post(
                "/api/v1/admin/employees",
                self.admin,
                &json!({ "name": "Field Agent", "email": email, "phone": "9800000000" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.data().clone()
    }

    /// Put `quantity` units of `product_id` in the user's cart.
    pub async fn add_to_cart(&self, user: UserId, product_id: &Value, quantity: i64) -> TestResponse {
        self.post(
            "/api/v1/user/cart",
            Caller::User(user),
            &json!({ "productId": product_id, "quantity": quantity, "size": "M" }),
        )
        .await
    }

    /// Current warehouse stock of a product, read through the admin listing.
    pub async fn stock_of(&self, product_id: &Value) -> i64 {
        let response = self.get("/api/v1/admin/products", self.admin).await;
        response
            .data()
            .as_array()
            .and_then(|products| products.iter().find(|p| &p["id"] == product_id))
            .and_then(|p| p["stock"].as_i64())
            .expect("product not listed")
    }
}

/// Read a money value regardless of its JSON encoding.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    let raw = value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string);
    Decimal::from_str(&raw).expect("not a decimal")
}

/// Standard checkout body.
#[must_use]
pub fn checkout_body() -> Value {
    json!({
        "shippingAddress": { "line1": "12 MG Road", "city": "Pune", "pincode": "411001" },
        "paymentMethod": "COD",
    })
}
