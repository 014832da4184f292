//! Storefront API: catalog, cart, wishlist and checkout.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

use bazaar_core::UserId;
use bazaar_integration_tests::{Caller, TestApp, checkout_body, decimal};

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let live = app.get("/health", Caller::Anonymous).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, json!("ok"));

    let ready = app.get("/health/ready", Caller::Anonymous).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_user_routes_require_identity() {
    let app = TestApp::new();

    let response = app.get("/api/v1/user/cart", Caller::Anonymous).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], json!(false));
    assert_eq!(response.error_code(), Some("unauthorized"));
}

#[tokio::test]
async fn test_catalog_hides_inactive_products() {
    let app = TestApp::new();
    let active = app.create_product("Kurta", "1000", "800", 10, 20).await;
    let hidden = app.create_product("Old Kurta", "900", "0", 0, 5).await;
    let response = app
        .patch(
            &format!("/api/v1/admin/products/{}", hidden["id"].as_str().unwrap()),
            app.admin,
            &json!({ "is_active": false }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let listing = app.get("/api/v1/products", Caller::Anonymous).await;
    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.body["success"], json!(true));
    let ids: Vec<_> = listing
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].clone())
        .collect();
    assert_eq!(ids, vec![active["id"].clone()]);

    let detail = app
        .get(
            &format!("/api/v1/products/{}", hidden["id"].as_str().unwrap()),
            Caller::Anonymous,
        )
        .await;
    assert_eq!(detail.status, StatusCode::NOT_FOUND);
    assert_eq!(detail.error_code(), Some("not_found"));
}

#[tokio::test]
async fn test_cart_lifecycle() {
    let app = TestApp::new();
    let user = UserId::new();
    let product = app.create_product("Dupatta", "450", "360", 20, 100).await;

    let first = app.add_to_cart(user, &product["id"], 1).await;
    assert_eq!(first.status, StatusCode::CREATED);
    let second = app.add_to_cart(user, &product["id"], 2).await;
    assert_eq!(second.status, StatusCode::CREATED);

    // Same (product, size, color) accumulates into one line
    let cart = app.get("/api/v1/user/cart", Caller::User(user)).await;
    let lines = cart.data().as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], json!(3));
    let item_id = lines[0]["item_id"].as_str().unwrap().to_string();

    // Reading twice changes nothing
    let again = app.get("/api/v1/user/cart", Caller::User(user)).await;
    assert_eq!(again.body, cart.body);

    let updated = app
        .patch(
            &format!("/api/v1/user/cart/{item_id}"),
            Caller::User(user),
            &json!({ "quantity": 5 }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.data()["quantity"], json!(5));

    // Another user cannot touch the line
    let foreign = app
        .delete(&format!("/api/v1/user/cart/{item_id}"), Caller::User(UserId::new()))
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let removed = app
        .delete(&format!("/api/v1/user/cart/{item_id}"), Caller::User(user))
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    let cart = app.get("/api/v1/user/cart", Caller::User(user)).await;
    assert!(cart.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_rejects_bad_quantities() {
    let app = TestApp::new();
    let user = UserId::new();
    let product = app.create_product("Top", "1450", "0", 0, 10).await;

    let zero = app.add_to_cart(user, &product["id"], 0).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert_eq!(zero.error_code(), Some("validation_error"));

    let negative = app.add_to_cart(user, &product["id"], -4).await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .add_to_cart(user, &json!(UserId::new().to_string()), 1)
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wishlist_is_idempotent() {
    let app = TestApp::new();
    let user = UserId::new();
    let product = app.create_product("Kurta", "1000", "800", 10, 20).await;
    let body = json!({ "productId": product["id"] });

    let first = app.post("/api/v1/user/wishlist", Caller::User(user), &body).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["added"], json!(true));

    let second = app.post("/api/v1/user/wishlist", Caller::User(user), &body).await;
    assert_eq!(second.data()["added"], json!(false));

    let list = app.get("/api/v1/user/wishlist", Caller::User(user)).await;
    assert_eq!(list.data().as_array().unwrap().len(), 1);
    assert_eq!(list.data()[0]["product_id"], product["id"]);

    let removed = app
        .delete(
            &format!("/api/v1/user/wishlist/{}", product["id"].as_str().unwrap()),
            Caller::User(user),
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    let list = app.get("/api/v1/user/wishlist", Caller::User(user)).await;
    assert!(list.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_applies_bulk_pricing() {
    let app = TestApp::new();
    let user = UserId::new();
    let bulk = app.create_product("Kurta", "100", "80", 10, 50).await;
    let retail = app.create_product("Dupatta", "100", "80", 10, 50).await;

    app.add_to_cart(user, &bulk["id"], 10).await;
    app.add_to_cart(user, &retail["id"], 9).await;

    let placed = app
        .post("/api/v1/user/orders", Caller::User(user), &checkout_body())
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{:?}", placed.body);

    // 10 x 80 + 9 x 100
    assert_eq!(decimal(&placed.data()["total_amount"]), Decimal::from(1700));
    assert_eq!(placed.data()["order"]["status"], json!("pending"));
    let tiers = placed.data()["tiers"].as_array().unwrap();
    assert!(tiers.contains(&json!("wholesale")));
    assert!(tiers.contains(&json!("retail")));

    assert_eq!(app.stock_of(&bulk["id"]).await, 40);
    assert_eq!(app.stock_of(&retail["id"]).await, 41);

    let cart = app.get("/api/v1/user/cart", Caller::User(user)).await;
    assert!(cart.data().as_array().unwrap().is_empty());

    let history = app.get("/api/v1/user/orders", Caller::User(user)).await;
    let orders = history.data().as_array().unwrap();
    assert_eq!(orders.len(), 1);
    let items = orders[0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let bulk_item = items.iter().find(|i| i["product_id"] == bulk["id"]).unwrap();
    assert_eq!(decimal(&bulk_item["price"]), Decimal::from(80));
}

#[tokio::test]
async fn test_checkout_insufficient_stock_changes_nothing() {
    let app = TestApp::new();
    let user = UserId::new();
    let plenty = app.create_product("Kurta", "100", "80", 10, 50).await;
    let scarce = app.create_product("Top", "200", "0", 0, 2).await;

    app.add_to_cart(user, &plenty["id"], 4).await;
    app.add_to_cart(user, &scarce["id"], 3).await;

    let response = app
        .post("/api/v1/user/orders", Caller::User(user), &checkout_body())
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), Some("insufficient_stock"));
    assert_eq!(response.body["available"], json!(2));
    assert_eq!(response.body["requested"], json!(3));
    assert_eq!(response.body["product"], json!("Top"));

    assert_eq!(app.stock_of(&plenty["id"]).await, 50);
    assert_eq!(app.stock_of(&scarce["id"]).await, 2);

    let cart = app.get("/api/v1/user/cart", Caller::User(user)).await;
    assert_eq!(cart.data().as_array().unwrap().len(), 2);
    let history = app.get("/api/v1/user/orders", Caller::User(user)).await;
    assert!(history.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart_and_bad_input() {
    let app = TestApp::new();
    let user = UserId::new();

    let empty = app
        .post("/api/v1/user/orders", Caller::User(user), &checkout_body())
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.error_code(), Some("empty_cart"));

    let no_address = app
        .post(
            "/api/v1/user/orders",
            Caller::User(user),
            &json!({ "shippingAddress": null, "paymentMethod": "COD" }),
        )
        .await;
    assert_eq!(no_address.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_address.error_code(), Some("validation_error"));

    let malformed = app
        .send(
            Method::POST,
            "/api/v1/user/orders",
            Caller::User(user),
            Body::from("{not json"),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.error_code(), Some("bad_request"));
}

/// Register and verify a gateway payment for `user`.
async fn paid(app: &TestApp, user: UserId, gateway_order_id: &str, payment_id: &str, amount: &str) {
    let registered = app
        .post(
            "/api/v1/user/orders/payments",
            Caller::User(user),
            &json!({ "razorpay_order_id": gateway_order_id, "amount": amount }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);
    let verified = app
        .post(
            "/api/v1/user/orders/verify",
            Caller::User(user),
            &json!({
                "razorpay_order_id": gateway_order_id,
                "razorpay_payment_id": payment_id,
                "razorpay_signature": app.verifier.sign(gateway_order_id, payment_id),
            }),
        )
        .await;
    assert_eq!(verified.status, StatusCode::OK, "{:?}", verified.body);
}

fn paid_checkout(gateway_order_id: &str, payment_id: &str) -> serde_json::Value {
    let mut body = checkout_body();
    body["paymentMethod"] = json!("razorpay");
    body["paymentInfo"] = json!({
        "orderId": gateway_order_id,
        "paymentId": payment_id,
        "status": "captured",
    });
    body
}

#[tokio::test]
async fn test_checkout_with_verified_payment_marks_processing() {
    let app = TestApp::new();
    let user = UserId::new();
    let product = app.create_product("Kurta", "100", "80", 10, 50).await;
    app.add_to_cart(user, &product["id"], 1).await;
    paid(&app, user, "order_ABC123", "pay_XYZ789", "100.00").await;

    let placed = app
        .post(
            "/api/v1/user/orders",
            Caller::User(user),
            &paid_checkout("order_ABC123", "pay_XYZ789"),
        )
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{:?}", placed.body);
    assert_eq!(placed.data()["order"]["status"], json!("processing"));
    assert_eq!(
        placed.data()["order"]["gateway_order_id"],
        json!("order_ABC123")
    );

    let history = app.get("/api/v1/user/orders", Caller::User(user)).await;
    let payment_info = &history.data()[0]["payment_info"];
    assert_eq!(payment_info["status"], json!("success"));
    assert_eq!(payment_info["gateway_payment_id"], json!("pay_XYZ789"));
}

#[tokio::test]
async fn test_checkout_rejects_unverified_or_foreign_payment() {
    let app = TestApp::new();
    let victim = UserId::new();
    let attacker = UserId::new();
    let product = app.create_product("Kurta", "100", "80", 10, 50).await;
    app.add_to_cart(attacker, &product["id"], 2).await;
    app.add_to_cart(victim, &product["id"], 1).await;

    // Only registered, never verified
    let registered = app
        .post(
            "/api/v1/user/orders/payments",
            Caller::User(victim),
            &json!({ "razorpay_order_id": "order_V1", "amount": "500" }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);

    let forged = app
        .post(
            "/api/v1/user/orders",
            Caller::User(attacker),
            &paid_checkout("order_V1", "pay_FORGED"),
        )
        .await;
    assert_eq!(forged.status, StatusCode::NOT_FOUND);

    let unverified = app
        .post(
            "/api/v1/user/orders",
            Caller::User(victim),
            &paid_checkout("order_V1", "pay_FORGED"),
        )
        .await;
    assert_eq!(unverified.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(unverified.error_code(), Some("payment_not_verified"));

    // Made-up gateway order with no attempt behind it
    let invented = app
        .post(
            "/api/v1/user/orders",
            Caller::User(victim),
            &paid_checkout("order_INVENTED", "pay_1"),
        )
        .await;
    assert_eq!(invented.status, StatusCode::NOT_FOUND);

    assert_eq!(app.stock_of(&product["id"]).await, 50);
    for user in [victim, attacker] {
        let history = app.get("/api/v1/user/orders", Caller::User(user)).await;
        assert!(history.data().as_array().unwrap().is_empty());
        let cart = app.get("/api/v1/user/cart", Caller::User(user)).await;
        assert_eq!(cart.data().as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_verified_payment_pays_for_one_order() {
    let app = TestApp::new();
    let user = UserId::new();
    let product = app.create_product("Kurta", "100", "80", 10, 50).await;
    paid(&app, user, "order_ONCE", "pay_ONCE", "1000").await;

    app.add_to_cart(user, &product["id"], 1).await;
    let first = app
        .post(
            "/api/v1/user/orders",
            Caller::User(user),
            &paid_checkout("order_ONCE", "pay_ONCE"),
        )
        .await;
    assert_eq!(first.status, StatusCode::CREATED, "{:?}", first.body);

    app.add_to_cart(user, &product["id"], 1).await;
    let reuse = app
        .post(
            "/api/v1/user/orders",
            Caller::User(user),
            &paid_checkout("order_ONCE", "pay_ONCE"),
        )
        .await;
    assert_eq!(reuse.status, StatusCode::CONFLICT);
    assert_eq!(reuse.error_code(), Some("conflict"));
    assert_eq!(app.stock_of(&product["id"]).await, 49);
}

#[tokio::test]
async fn test_payment_must_cover_the_order() {
    let app = TestApp::new();
    let user = UserId::new();
    let product = app.create_product("Kurta", "100", "80", 10, 50).await;
    app.add_to_cart(user, &product["id"], 3).await;
    paid(&app, user, "order_SHORT", "pay_SHORT", "1.00").await;

    let response = app
        .post(
            "/api/v1/user/orders",
            Caller::User(user),
            &paid_checkout("order_SHORT", "pay_SHORT"),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), Some("validation_error"));
    assert_eq!(app.stock_of(&product["id"]).await, 50);
}

#[tokio::test]
async fn test_public_store_settings() {
    let app = TestApp::new();
    let settings = app.get("/api/v1/settings", Caller::Anonymous).await;
    assert_eq!(settings.status, StatusCode::OK);
    assert_eq!(settings.data()["store_name"], json!("Bazaar"));
    assert_eq!(settings.data()["currency"], json!("INR"));
}

#[tokio::test]
async fn test_cart_only_accepts_offered_sizes() {
    let app = TestApp::new();
    let user = UserId::new();
    let created = app
        .post(
            "/api/v1/admin/products",
            app.admin,
            &json!({
                "name": "Lehenga",
                "price": "5000",
                "stock": 5,
                "sizes": ["S", "M"],
                "colors": ["Red"],
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let product_id = &created.data()["id"];

    let offered = app
        .post(
            "/api/v1/user/cart",
            Caller::User(user),
            &json!({ "productId": product_id, "quantity": 1, "size": "m", "color": "red" }),
        )
        .await;
    assert_eq!(offered.status, StatusCode::CREATED, "{:?}", offered.body);

    let wrong_size = app
        .post(
            "/api/v1/user/cart",
            Caller::User(user),
            &json!({ "productId": product_id, "quantity": 1, "size": "XXL" }),
        )
        .await;
    assert_eq!(wrong_size.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_size.error_code(), Some("validation_error"));

    let wrong_color = app
        .post(
            "/api/v1/user/cart",
            Caller::User(user),
            &json!({ "productId": product_id, "quantity": 1, "size": "S", "color": "Blue" }),
        )
        .await;
    assert_eq!(wrong_color.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_payment_is_not_turned_into_an_order() {
    let app = TestApp::new();
    let user = UserId::new();
    let product = app.create_product("Kurta", "100", "80", 10, 50).await;
    app.add_to_cart(user, &product["id"], 1).await;

    let mut body = checkout_body();
    body["paymentInfo"] = json!({ "orderId": "order_1", "status": "FAILED" });

    let response = app.post("/api/v1/user/orders", Caller::User(user), &body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stock_of(&product["id"]).await, 50);
}
