//! Persistence for the storefront and back-office.
//!
//! # Tables
//!
//! - `products` - Catalog and warehouse stock
//! - `cart_items` - One row per (user, product, size, color)
//! - `wishlist` - One row per (user, product)
//! - `orders` / `order_items` - Placed orders and their frozen line snapshots
//! - `payments` - Gateway order attempts
//! - `employees` / `employee_holdings` - Delegated stock and liability counters;
//!   deleting an employee only retires the row
//! - `stock_logs` - Append-only delegation audit trail
//! - `store_settings` - Single-row store configuration
//!
//! # Transactions
//!
//! Every read and write goes through a [`StoreTransaction`] obtained from
//! [`CommerceStore::begin`]. Dropping a transaction without calling
//! [`StoreTransaction::commit`] discards all of its writes.
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bazaar_core::{
    CartItemId, Email, EmployeeId, OrderId, OrderStatus, ProductId, UserId,
};

use crate::models::{
    CartItem, CartLine, Employee, Holding, Order, OrderItem, Payment, Product, StockLog,
    StoreSettings, WishlistEntry,
};

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email, missing referenced row).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Handle to the backing store, shared by every request.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    /// Start a transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Cheap round trip used by the readiness check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// A unit of work against the store.
///
/// Methods suffixed `_for_update` lock the returned row until the
/// transaction ends, so a check made on it stays valid for the writes that
/// follow.
#[async_trait]
pub trait StoreTransaction: Send {
    // Catalog

    async fn list_products(&mut self, active_only: bool) -> Result<Vec<Product>, StoreError>;
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;
    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError>;
    async fn update_product(&mut self, product: &Product) -> Result<bool, StoreError>;

    /// Hard delete. Cart and wishlist rows go with it; order items and
    /// holdings that reference the product make this a
    /// [`StoreError::Conflict`].
    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError>;

    /// `stock = stock - quantity` only where `stock >= quantity`.
    ///
    /// Returns `false` when no row qualified: the product is missing or
    /// short. The check and the write are one atomic statement.
    async fn decrement_stock(&mut self, id: ProductId, quantity: i32)
    -> Result<bool, StoreError>;

    // Cart

    /// Cart rows joined with live product fields, newest first.
    async fn cart_lines(&mut self, user: UserId) -> Result<Vec<CartLine>, StoreError>;

    /// Insert a cart row or add `quantity` to the existing
    /// (user, product, size, color) row.
    async fn upsert_cart_item(&mut self, item: &CartItem) -> Result<CartItem, StoreError>;

    async fn set_cart_quantity(
        &mut self,
        user: UserId,
        item: CartItemId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<CartItem>, StoreError>;
    async fn delete_cart_item(&mut self, user: UserId, item: CartItemId)
    -> Result<bool, StoreError>;
    async fn clear_cart(&mut self, user: UserId) -> Result<u64, StoreError>;

    // Wishlist

    async fn wishlist(&mut self, user: UserId) -> Result<Vec<WishlistEntry>, StoreError>;

    /// Returns `false` when the product was already wishlisted.
    async fn add_to_wishlist(
        &mut self,
        user: UserId,
        product: ProductId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    async fn remove_from_wishlist(
        &mut self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, StoreError>;

    // Orders

    /// Fails with [`StoreError::Conflict`] if another order already links
    /// the same gateway order.
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;
    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<(), StoreError>;
    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Orders newest first, optionally restricted to one user.
    async fn orders(&mut self, user: Option<UserId>) -> Result<Vec<Order>, StoreError>;
    async fn order_items(&mut self, orders: &[OrderId]) -> Result<Vec<OrderItem>, StoreError>;
    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError>;

    // Payments

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError>;
    async fn payment_by_gateway_order(
        &mut self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, StoreError>;

    /// Mark the attempt `success`. Only a `pending` attempt transitions.
    async fn mark_payment_success(
        &mut self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Mark the attempt `failed`. Only a `pending` attempt transitions.
    async fn mark_payment_failed(&mut self, gateway_order_id: &str) -> Result<bool, StoreError>;

    /// Attempts for any of the given gateway orders.
    async fn payments_for_orders(
        &mut self,
        gateway_order_ids: &[String],
    ) -> Result<Vec<Payment>, StoreError>;

    // Employees
    //
    // Retired employees are invisible to every read and write below; their
    // holdings and stock logs stay in place.

    async fn employees(&mut self) -> Result<Vec<Employee>, StoreError>;
    async fn employee(&mut self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;
    async fn employee_for_update(&mut self, id: EmployeeId)
    -> Result<Option<Employee>, StoreError>;
    async fn employee_by_email(&mut self, email: &Email) -> Result<Option<Employee>, StoreError>;
    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), StoreError>;

    /// Persist name, email, phone and status.
    async fn update_employee(&mut self, employee: &Employee) -> Result<bool, StoreError>;
    async fn retire_employee(
        &mut self,
        id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    async fn add_assigned_stock(
        &mut self,
        id: EmployeeId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    async fn add_sold(
        &mut self,
        id: EmployeeId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Create the (employee, product) holding or add `quantity` to it.
    async fn upsert_holding(
        &mut self,
        employee: EmployeeId,
        product: ProductId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Holding, StoreError>;
    async fn holdings(&mut self, employee: EmployeeId) -> Result<Vec<Holding>, StoreError>;
    async fn append_stock_log(&mut self, log: &StockLog) -> Result<(), StoreError>;

    /// Audit entries newest first, optionally for one employee.
    async fn stock_logs(
        &mut self,
        employee: Option<EmployeeId>,
        limit: i64,
    ) -> Result<Vec<StockLog>, StoreError>;

    // Settings

    /// `None` until the settings row is first written.
    async fn settings(&mut self) -> Result<Option<StoreSettings>, StoreError>;
    async fn save_settings(&mut self, settings: &StoreSettings) -> Result<(), StoreError>;

    // Lifecycle

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
