//! Back-office API: products, orders, employees and stock delegation.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use bazaar_core::UserId;
use bazaar_integration_tests::{Caller, TestApp, checkout_body, decimal};

fn id(value: &Value) -> &str {
    value["id"].as_str().unwrap()
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new();

    let customer = app
        .get("/api/v1/admin/products", Caller::User(UserId::new()))
        .await;
    assert_eq!(customer.status, StatusCode::FORBIDDEN);
    assert_eq!(customer.error_code(), Some("forbidden"));

    let anonymous = app.get("/api/v1/admin/employees", Caller::Anonymous).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_product_partial_update() {
    let app = TestApp::new();
    let product = app.create_product("Kurta", "1000", "800", 10, 20).await;

    let updated = app
        .patch(
            &format!("/api/v1/admin/products/{}", id(&product)),
            app.admin,
            &json!({ "price": "1100" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(decimal(&updated.data()["price"]), Decimal::from(1100));
    assert_eq!(updated.data()["name"], json!("Kurta"));
    assert_eq!(updated.data()["stock"], json!(20));

    let invalid = app
        .post(
            "/api/v1/admin/products",
            app.admin,
            &json!({ "name": "Broken", "price": "-5" }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.error_code(), Some("validation_error"));
}

#[tokio::test]
async fn test_order_status_management() {
    let app = TestApp::new();
    let user = UserId::new();
    let product = app.create_product("Kurta", "100", "80", 10, 50).await;
    app.add_to_cart(user, &product["id"], 2).await;
    let placed = app
        .post("/api/v1/user/orders", Caller::User(user), &checkout_body())
        .await;
    let order_id = placed.data()["order"]["id"].as_str().unwrap().to_string();

    let shipped = app
        .patch(
            &format!("/api/v1/admin/orders/{order_id}/status"),
            app.admin,
            &json!({ "status": "SHIPPED" }),
        )
        .await;
    assert_eq!(shipped.status, StatusCode::OK);
    assert_eq!(shipped.data()["status"], json!("shipped"));

    let bogus = app
        .patch(
            &format!("/api/v1/admin/orders/{order_id}/status"),
            app.admin,
            &json!({ "status": "teleported" }),
        )
        .await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);
    assert_eq!(bogus.error_code(), Some("validation_error"));

    let detail = app
        .get(&format!("/api/v1/admin/orders/{order_id}"), app.admin)
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.data()["status"], json!("shipped"));
    assert_eq!(detail.data()["items"].as_array().unwrap().len(), 1);

    let all = app.get("/api/v1/admin/orders", app.admin).await;
    assert_eq!(all.data().as_array().unwrap().len(), 1);

    let missing = app
        .get(
            &format!("/api/v1/admin/orders/{}", UserId::new()),
            app.admin,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_employee_management() {
    let app = TestApp::new();
    let employee = app.create_employee("asha@bazaar.test").await;
    assert_eq!(employee["status"], json!("active"));

    let duplicate = app
        .post(
            "/api/v1/admin/employees",
            app.admin,
            &json!({ "name": "Other", "email": "asha@bazaar.test", "phone": "1" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.error_code(), Some("conflict"));

    let bad_email = app
        .post(
            "/api/v1/admin/employees",
            app.admin,
            &json!({ "name": "Other", "email": "not-an-email", "phone": "1" }),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let renamed = app
        .patch(
            &format!("/api/v1/admin/employees/{}", id(&employee)),
            app.admin,
            &json!({ "name": "Asha Verma" }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.data()["name"], json!("Asha Verma"));

    let listing = app.get("/api/v1/admin/employees", app.admin).await;
    let employees = listing.data().as_array().unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0]["remaining_liability"], json!(0));

    let toggled = app
        .post(
            &format!("/api/v1/admin/employees/{}/toggle-status", id(&employee)),
            app.admin,
            &json!({}),
        )
        .await;
    assert_eq!(toggled.data()["status"], json!("inactive"));

    let deleted = app
        .delete(&format!("/api/v1/admin/employees/{}", id(&employee)), app.admin)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    let holdings = app
        .get(
            &format!("/api/v1/admin/employees/{}/holdings", id(&employee)),
            app.admin,
        )
        .await;
    assert_eq!(holdings.status, StatusCode::NOT_FOUND);

    // A retired employee's email is free again
    let rehired = app.create_employee("asha@bazaar.test").await;
    assert_ne!(rehired["id"], employee["id"]);
}

#[tokio::test]
async fn test_employee_with_outstanding_stock_cannot_be_deleted() {
    let app = TestApp::new();
    let product = app.create_product("Kurta", "1000", "800", 10, 50).await;
    let employee = app.create_employee("kiran@bazaar.test").await;
    let path = format!("/api/v1/admin/employees/{}", id(&employee));
    app.post(
        "/api/v1/admin/stock/assign",
        app.admin,
        &json!({ "employeeId": employee["id"], "productId": product["id"], "quantity": 4 }),
    )
    .await;

    let refused = app.delete(&path, app.admin).await;
    assert_eq!(refused.status, StatusCode::CONFLICT);
    assert_eq!(refused.error_code(), Some("outstanding_liability"));
    assert_eq!(refused.body["remaining_liability"], json!(4));
    let holdings = app.get(&format!("{path}/holdings"), app.admin).await;
    assert_eq!(holdings.data().as_array().unwrap().len(), 1);

    let sale = app
        .post(
            "/api/v1/admin/stock/sale",
            app.admin,
            &json!({ "employeeId": employee["id"], "quantity": 4 }),
        )
        .await;
    assert_eq!(sale.status, StatusCode::OK);
    let deleted = app.delete(&path, app.admin).await;
    assert_eq!(deleted.status, StatusCode::OK, "{:?}", deleted.body);

    // The audit trail outlives the employee
    let trail = app.get("/api/v1/admin/stock/logs", app.admin).await;
    assert_eq!(trail.status, StatusCode::OK);
    let trail = trail.data().as_array().unwrap();
    assert_eq!(trail.len(), 2);
    assert!(trail.iter().all(|log| log["employee_id"] == employee["id"]));
    assert_eq!(app.stock_of(&product["id"]).await, 46);
}

#[tokio::test]
async fn test_product_delete() {
    let app = TestApp::new();
    let unsold = app.create_product("Sample", "100", "0", 0, 3).await;
    let sold = app.create_product("Kurta", "100", "80", 10, 50).await;
    let user = UserId::new();
    app.add_to_cart(user, &sold["id"], 1).await;
    let placed = app
        .post("/api/v1/user/orders", Caller::User(user), &checkout_body())
        .await;
    assert_eq!(placed.status, StatusCode::CREATED);

    let deleted = app
        .delete(&format!("/api/v1/admin/products/{}", id(&unsold)), app.admin)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.data()["deleted"], unsold["id"]);
    let again = app
        .delete(&format!("/api/v1/admin/products/{}", id(&unsold)), app.admin)
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    // Ordered products stay; deactivate them instead
    let ordered = app
        .delete(&format!("/api/v1/admin/products/{}", id(&sold)), app.admin)
        .await;
    assert_eq!(ordered.status, StatusCode::CONFLICT);
    assert_eq!(ordered.error_code(), Some("conflict"));

    let customer = app
        .delete(
            &format!("/api/v1/admin/products/{}", id(&sold)),
            Caller::User(user),
        )
        .await;
    assert_eq!(customer.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_store_settings_management() {
    let app = TestApp::new();

    let customer = app
        .request(
            axum::http::Method::PUT,
            "/api/v1/admin/settings",
            Caller::User(UserId::new()),
            Some(&json!({ "store_name": "Hijacked" })),
        )
        .await;
    assert_eq!(customer.status, StatusCode::FORBIDDEN);

    let updated = app
        .request(
            axum::http::Method::PUT,
            "/api/v1/admin/settings",
            app.admin,
            Some(&json!({ "store_name": "Jaipur Looms", "tax_rate": "18", "currency": "inr" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{:?}", updated.body);
    assert_eq!(updated.data()["currency"], json!("INR"));

    let invalid = app
        .request(
            axum::http::Method::PUT,
            "/api/v1/admin/settings",
            app.admin,
            Some(&json!({ "tax_rate": "150" })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.error_code(), Some("validation_error"));

    let current = app.get("/api/v1/admin/settings", app.admin).await;
    assert_eq!(current.data()["store_name"], json!("Jaipur Looms"));
    assert_eq!(decimal(&current.data()["tax_rate"]), Decimal::from(18));
    let public = app.get("/api/v1/settings", Caller::Anonymous).await;
    assert_eq!(public.data()["store_name"], json!("Jaipur Looms"));
}

#[tokio::test]
async fn test_stock_delegation_flow() {
    let app = TestApp::new();
    let product = app.create_product("Kurta", "1000", "800", 10, 50).await;
    let employee = app.create_employee("ravi@bazaar.test").await;
    let assign = |quantity: i64| {
        json!({ "employeeId": employee["id"], "productId": product["id"], "quantity": quantity })
    };

    let first = app.post("/api/v1/admin/stock/assign", app.admin, &assign(10)).await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.data()["remaining_liability"], json!(10));
    assert_eq!(first.data()["log"]["type"], json!("ASSIGN"));

    // Repeat assignment accumulates onto the same holding
    let second = app.post("/api/v1/admin/stock/assign", app.admin, &assign(5)).await;
    assert_eq!(second.data()["employee"]["total_assigned_stock"], json!(15));
    assert_eq!(second.data()["holding"]["quantity_assigned"], json!(15));
    assert_eq!(app.stock_of(&product["id"]).await, 35);

    let sale = app
        .post(
            "/api/v1/admin/stock/sale",
            app.admin,
            &json!({ "employeeId": employee["id"], "quantity": 12 }),
        )
        .await;
    assert_eq!(sale.status, StatusCode::OK);
    assert_eq!(sale.data()["remaining_liability"], json!(3));
    assert_eq!(sale.data()["log"]["type"], json!("SALE"));

    let oversale = app
        .post(
            "/api/v1/admin/stock/sale",
            app.admin,
            &json!({ "employeeId": employee["id"], "quantity": 4 }),
        )
        .await;
    assert_eq!(oversale.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(oversale.error_code(), Some("excess_sale"));
    assert_eq!(oversale.body["available"], json!(3));
    assert_eq!(oversale.body["requested"], json!(4));

    let holdings = app
        .get(
            &format!("/api/v1/admin/employees/{}/holdings", id(&employee)),
            app.admin,
        )
        .await;
    let holdings = holdings.data().as_array().unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0]["quantity_assigned"], json!(15));

    let logs = app
        .get(
            &format!("/api/v1/admin/employees/{}/logs", id(&employee)),
            app.admin,
        )
        .await;
    let kinds: Vec<_> = logs
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["type"].clone())
        .collect();
    assert_eq!(kinds, vec![json!("SALE"), json!("ASSIGN"), json!("ASSIGN")]);

    let limited = app
        .get(
            &format!("/api/v1/admin/employees/{}/logs?limit=1", id(&employee)),
            app.admin,
        )
        .await;
    assert_eq!(limited.data().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stock_assignment_rejections() {
    let app = TestApp::new();
    let product = app.create_product("Top", "1450", "0", 0, 5).await;
    let employee = app.create_employee("meera@bazaar.test").await;

    let too_many = app
        .post(
            "/api/v1/admin/stock/assign",
            app.admin,
            &json!({ "employeeId": employee["id"], "productId": product["id"], "quantity": 6 }),
        )
        .await;
    assert_eq!(too_many.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(too_many.error_code(), Some("insufficient_stock"));
    assert_eq!(app.stock_of(&product["id"]).await, 5);

    let zero = app
        .post(
            "/api/v1/admin/stock/assign",
            app.admin,
            &json!({ "employeeId": employee["id"], "productId": product["id"], "quantity": 0 }),
        )
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    app.post(
        &format!("/api/v1/admin/employees/{}/toggle-status", id(&employee)),
        app.admin,
        &json!({}),
    )
    .await;
    let inactive = app
        .post(
            "/api/v1/admin/stock/assign",
            app.admin,
            &json!({ "employeeId": employee["id"], "productId": product["id"], "quantity": 1 }),
        )
        .await;
    assert_eq!(inactive.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(inactive.error_code(), Some("employee_inactive"));
    assert_eq!(app.stock_of(&product["id"]).await, 5);

    let logs = app
        .get(
            &format!("/api/v1/admin/employees/{}/logs", id(&employee)),
            app.admin,
        )
        .await;
    assert!(logs.data().as_array().unwrap().is_empty());
}
