//! `PostgreSQL` store.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database. Row types are private and converted into the
//! domain models at the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, instrument};

use bazaar_core::{
    CartItemId, Email, EmployeeId, HoldingId, OrderId, OrderItemId, OrderStatus, PaymentId,
    ProductId, StockLogId, UserId, WishlistItemId,
};

use super::{CommerceStore, StoreError, StoreTransaction};
use crate::models::{
    CartItem, CartLine, Employee, Holding, Order, OrderItem, Payment, Product, StockLog,
    StoreSettings, WishlistEntry,
};

/// Postgres error codes that indicate a constraint rejected the write.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if let Some(code) = db.code() {
            if matches!(
                code.as_ref(),
                UNIQUE_VIOLATION | FOREIGN_KEY_VIOLATION | CHECK_VIOLATION
            ) {
                return StoreError::Conflict(db.message().to_string());
            }
        }
    }
    error!("Store query failed: {err}");
    StoreError::Database(err)
}

fn parse_column<T: std::str::FromStr>(column: &str, value: &str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| StoreError::DataCorruption(format!("{column}: {e}")))
}

// =============================================================================
// Internal Row Types
// =============================================================================

const PRODUCT_COLUMNS: &str = "id, name, description, category, price, wholesale_price, \
     bulk_threshold, stock, is_active, gender, image_url, images, sizes, colors, is_new, \
     is_sale, sale_percent, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    category: Option<String>,
    price: Decimal,
    wholesale_price: Decimal,
    bulk_threshold: i32,
    stock: i32,
    is_active: bool,
    gender: Option<String>,
    image_url: Option<String>,
    images: Vec<String>,
    sizes: Vec<String>,
    colors: Vec<String>,
    is_new: bool,
    is_sale: bool,
    sale_percent: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            wholesale_price: row.wholesale_price,
            bulk_threshold: row.bulk_threshold,
            stock: row.stock,
            is_active: row.is_active,
            gender: row.gender,
            image_url: row.image_url,
            images: row.images,
            sizes: row.sizes,
            colors: row.colors,
            is_new: row.is_new,
            is_sale: row.is_sale,
            sale_percent: row.sale_percent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    size: String,
    color: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            size: row.size,
            color: row.color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    item_id: CartItemId,
    product_id: ProductId,
    product_name: String,
    quantity: i32,
    size: String,
    color: String,
    price: Decimal,
    wholesale_price: Decimal,
    bulk_threshold: i32,
    stock: i32,
    created_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            item_id: row.item_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            size: row.size,
            color: row.color,
            price: row.price,
            wholesale_price: row.wholesale_price,
            bulk_threshold: row.bulk_threshold,
            stock: row.stock,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: WishlistItemId,
    product_id: ProductId,
    product_name: String,
    price: Decimal,
    category: Option<String>,
    image_url: Option<String>,
    stock: i32,
    is_sale: bool,
    sale_percent: i32,
    added_at: DateTime<Utc>,
}

impl From<WishlistRow> for WishlistEntry {
    fn from(row: WishlistRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            price: row.price,
            category: row.category,
            image_url: row.image_url,
            stock: row.stock,
            is_sale: row.is_sale,
            sale_percent: row.sale_percent,
            added_at: row.added_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, total_amount, taxes, payment_method, status, \
     shipping_address, razorpay_order_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total_amount: Decimal,
    taxes: Decimal,
    payment_method: String,
    status: String,
    shipping_address: serde_json::Value,
    razorpay_order_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            total_amount: row.total_amount,
            taxes: row.taxes,
            payment_method: row.payment_method,
            status: parse_column("orders.status", &row.status)?,
            shipping_address: row.shipping_address,
            gateway_order_id: row.razorpay_order_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price: Decimal,
    size: String,
    color: String,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
            size: row.size,
            color: row.color,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    user_id: UserId,
    razorpay_order_id: String,
    razorpay_payment_id: Option<String>,
    razorpay_signature: Option<String>,
    amount: Decimal,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            gateway_order_id: row.razorpay_order_id,
            gateway_payment_id: row.razorpay_payment_id,
            signature: row.razorpay_signature,
            amount: row.amount,
            currency: row.currency,
            status: parse_column("payments.status", &row.status)?,
            created_at: row.created_at,
        })
    }
}

const EMPLOYEE_COLUMNS: &str = "id, name, email, phone, status, total_assigned_stock, \
     total_sold, join_date, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: EmployeeId,
    name: String,
    email: String,
    phone: String,
    status: String,
    total_assigned_stock: i32,
    total_sold: i32,
    join_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: parse_column::<Email>("employees.email", &row.email)?,
            phone: row.phone,
            status: parse_column("employees.status", &row.status)?,
            total_assigned_stock: row.total_assigned_stock,
            total_sold: row.total_sold,
            join_date: row.join_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HoldingRow {
    id: HoldingId,
    employee_id: EmployeeId,
    product_id: ProductId,
    quantity_assigned: i32,
    assigned_at: DateTime<Utc>,
}

impl From<HoldingRow> for Holding {
    fn from(row: HoldingRow) -> Self {
        Self {
            id: row.id,
            employee_id: row.employee_id,
            product_id: row.product_id,
            quantity_assigned: row.quantity_assigned,
            assigned_at: row.assigned_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockLogRow {
    id: StockLogId,
    employee_id: EmployeeId,
    product_id: Option<ProductId>,
    #[sqlx(rename = "type")]
    kind: String,
    quantity: i32,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StockLogRow> for StockLog {
    type Error = StoreError;

    fn try_from(row: StockLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            product_id: row.product_id,
            kind: parse_column("stock_logs.type", &row.kind)?,
            quantity: row.quantity,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    store_name: String,
    support_email: String,
    support_phone: String,
    store_address: String,
    currency: String,
    tax_rate: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for StoreSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            store_name: row.store_name,
            support_email: row.support_email,
            support_phone: row.support_phone,
            store_address: row.store_address,
            currency: row.currency,
            tax_rate: row.tax_rate,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Store backed by a `PostgreSQL` connection pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CommerceStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await.map_err(map_sqlx)?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

/// An open `BEGIN` on one pooled connection.
struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    // =========================================================================
    // Catalog
    // =========================================================================

    async fn list_products(&mut self, active_only: bool) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1 = false OR is_active) ORDER BY created_at DESC"
        ))
        .bind(active_only)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(Into::into))
    }

    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(Into::into))
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO products (
                id, name, description, category, price, wholesale_price,
                bulk_threshold, stock, is_active, gender, image_url, images,
                sizes, colors, is_new, is_sale, sale_percent, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.wholesale_price)
        .bind(product.bulk_threshold)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(&product.gender)
        .bind(&product.image_url)
        .bind(&product.images)
        .bind(&product.sizes)
        .bind(&product.colors)
        .bind(product.is_new)
        .bind(product.is_sale)
        .bind(product.sale_percent)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = $2, description = $3, category = $4, price = $5,
                wholesale_price = $6, bulk_threshold = $7, stock = $8,
                is_active = $9, gender = $10, image_url = $11, images = $12,
                sizes = $13, colors = $14, is_new = $15, is_sale = $16,
                sale_percent = $17, updated_at = $18
            WHERE id = $1
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.wholesale_price)
        .bind(product.bulk_threshold)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(&product.gender)
        .bind(&product.image_url)
        .bind(&product.images)
        .bind(&product.sizes)
        .bind(&product.colors)
        .bind(product.is_new)
        .bind(product.is_sale)
        .bind(product.sale_percent)
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: i32,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = stock - $1, updated_at = now()
            WHERE id = $2 AND stock >= $1
            ",
        )
        .bind(quantity)
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        debug!(rows = result.rows_affected(), "conditional stock decrement");
        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    async fn cart_lines(&mut self, user: UserId) -> Result<Vec<CartLine>, StoreError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT
                c.id AS item_id, c.product_id, p.name AS product_name,
                c.quantity, c.size, c.color,
                p.price, p.wholesale_price, p.bulk_threshold, p.stock,
                c.created_at
            FROM cart_items c
            JOIN products p ON c.product_id = p.id
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC, c.id
            ",
        )
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_cart_item(&mut self, item: &CartItem) -> Result<CartItem, StoreError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (id, user_id, product_id, quantity, size, color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, product_id, size, color)
            DO UPDATE SET
                quantity = cart_items.quantity + EXCLUDED.quantity,
                updated_at = EXCLUDED.updated_at
            RETURNING id, user_id, product_id, quantity, size, color, created_at, updated_at
            ",
        )
        .bind(item.id)
        .bind(item.user_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(&item.size)
        .bind(&item.color)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(row.into())
    }

    async fn set_cart_quantity(
        &mut self,
        user: UserId,
        item: CartItemId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            UPDATE cart_items
            SET quantity = $1, updated_at = $2
            WHERE id = $3 AND user_id = $4
            RETURNING id, user_id, product_id, quantity, size, color, created_at, updated_at
            ",
        )
        .bind(quantity)
        .bind(now)
        .bind(item)
        .bind(user)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(Into::into))
    }

    async fn delete_cart_item(
        &mut self,
        user: UserId,
        item: CartItemId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item)
            .bind(user)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&mut self, user: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    async fn wishlist(&mut self, user: UserId) -> Result<Vec<WishlistEntry>, StoreError> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            r"
            SELECT
                w.id, p.id AS product_id, p.name AS product_name, p.price,
                p.category, p.image_url, p.stock, p.is_sale, p.sale_percent,
                w.created_at AS added_at
            FROM wishlist w
            JOIN products p ON w.product_id = p.id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC, w.id
            ",
        )
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_to_wishlist(
        &mut self,
        user: UserId,
        product: ProductId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            INSERT INTO wishlist (id, user_id, product_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(WishlistItemId::new())
        .bind(user)
        .bind(product)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_from_wishlist(
        &mut self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2")
            .bind(user)
            .bind(product)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO orders (
                id, user_id, total_amount, taxes, payment_method, status,
                shipping_address, razorpay_order_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.total_amount)
        .bind(order.taxes)
        .bind(&order.payment_method)
        .bind(order.status.as_str())
        .bind(&order.shipping_address)
        .bind(&order.gateway_order_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO order_items (id, order_id, product_id, quantity, price, size, color, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(&item.size)
        .bind(&item.color)
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .map(Order::try_from)
        .transpose()
    }

    async fn orders(&mut self, user: Option<UserId>) -> Result<Vec<Order>, StoreError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC, id"
        ))
        .bind(user)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .into_iter()
        .map(Order::try_from)
        .collect()
    }

    async fn order_items(&mut self, orders: &[OrderId]) -> Result<Vec<OrderItem>, StoreError> {
        let ids: Vec<uuid::Uuid> = orders.iter().map(OrderId::as_uuid).collect();
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, price, size, color, created_at
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY created_at, id
            ",
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .map(Order::try_from)
        .transpose()
    }

    // =========================================================================
    // Payments
    // =========================================================================

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO payments (
                id, user_id, razorpay_order_id, razorpay_payment_id, razorpay_signature,
                amount, currency, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(&payment.gateway_order_id)
        .bind(&payment.gateway_payment_id)
        .bind(&payment.signature)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn payment_by_gateway_order(
        &mut self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, StoreError> {
        sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT id, user_id, razorpay_order_id, razorpay_payment_id, razorpay_signature,
                   amount, currency, status, created_at
            FROM payments
            WHERE razorpay_order_id = $1
            ",
        )
        .bind(gateway_order_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .map(Payment::try_from)
        .transpose()
    }

    async fn mark_payment_success(
        &mut self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: Option<&str>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE payments
            SET status = 'success', razorpay_payment_id = $1, razorpay_signature = $2
            WHERE razorpay_order_id = $3 AND status = 'pending'
            ",
        )
        .bind(gateway_payment_id)
        .bind(signature)
        .bind(gateway_order_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_payment_failed(&mut self, gateway_order_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'failed' WHERE razorpay_order_id = $1 AND status = 'pending'",
        )
        .bind(gateway_order_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn payments_for_orders(
        &mut self,
        gateway_order_ids: &[String],
    ) -> Result<Vec<Payment>, StoreError> {
        sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT id, user_id, razorpay_order_id, razorpay_payment_id, razorpay_signature,
                   amount, currency, status, created_at
            FROM payments
            WHERE razorpay_order_id = ANY($1)
            ",
        )
        .bind(gateway_order_ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .into_iter()
        .map(Payment::try_from)
        .collect()
    }

    // =========================================================================
    // Employees
    // =========================================================================

    async fn employees(&mut self) -> Result<Vec<Employee>, StoreError> {
        sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees \
             WHERE deleted_at IS NULL ORDER BY created_at DESC, id"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .into_iter()
        .map(Employee::try_from)
        .collect()
    }

    async fn employee(&mut self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .map(Employee::try_from)
        .transpose()
    }

    async fn employee_for_update(
        &mut self,
        id: EmployeeId,
    ) -> Result<Option<Employee>, StoreError> {
        sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees \
             WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .map(Employee::try_from)
        .transpose()
    }

    async fn employee_by_email(&mut self, email: &Email) -> Result<Option<Employee>, StoreError> {
        sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .map(Employee::try_from)
        .transpose()
    }

    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO employees (
                id, name, email, phone, status, total_assigned_stock, total_sold,
                join_date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(employee.id)
        .bind(&employee.name)
        .bind(employee.email.as_str())
        .bind(&employee.phone)
        .bind(employee.status.as_str())
        .bind(employee.total_assigned_stock)
        .bind(employee.total_sold)
        .bind(employee.join_date)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn update_employee(&mut self, employee: &Employee) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE employees
            SET name = $2, email = $3, phone = $4, status = $5, updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(employee.id)
        .bind(&employee.name)
        .bind(employee.email.as_str())
        .bind(&employee.phone)
        .bind(employee.status.as_str())
        .bind(employee.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn retire_employee(
        &mut self,
        id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE employees SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_assigned_stock(
        &mut self,
        id: EmployeeId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE employees
            SET total_assigned_stock = total_assigned_stock + $1, updated_at = $2
            WHERE id = $3 AND deleted_at IS NULL
            ",
        )
        .bind(quantity)
        .bind(now)
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_sold(
        &mut self,
        id: EmployeeId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE employees
            SET total_sold = total_sold + $1, updated_at = $2
            WHERE id = $3 AND deleted_at IS NULL
            ",
        )
        .bind(quantity)
        .bind(now)
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_holding(
        &mut self,
        employee: EmployeeId,
        product: ProductId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Holding, StoreError> {
        let row = sqlx::query_as::<_, HoldingRow>(
            r"
            INSERT INTO employee_holdings (id, employee_id, product_id, quantity_assigned, assigned_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (employee_id, product_id)
            DO UPDATE SET
                quantity_assigned = employee_holdings.quantity_assigned + EXCLUDED.quantity_assigned,
                assigned_at = EXCLUDED.assigned_at
            RETURNING id, employee_id, product_id, quantity_assigned, assigned_at
            ",
        )
        .bind(HoldingId::new())
        .bind(employee)
        .bind(product)
        .bind(quantity)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(row.into())
    }

    async fn holdings(&mut self, employee: EmployeeId) -> Result<Vec<Holding>, StoreError> {
        let rows = sqlx::query_as::<_, HoldingRow>(
            r"
            SELECT id, employee_id, product_id, quantity_assigned, assigned_at
            FROM employee_holdings
            WHERE employee_id = $1 AND quantity_assigned > 0
            ORDER BY assigned_at DESC, id
            ",
        )
        .bind(employee)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn append_stock_log(&mut self, log: &StockLog) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO stock_logs (id, employee_id, product_id, type, quantity, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(log.id)
        .bind(log.employee_id)
        .bind(log.product_id)
        .bind(log.kind.as_str())
        .bind(log.quantity)
        .bind(&log.note)
        .bind(log.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn stock_logs(
        &mut self,
        employee: Option<EmployeeId>,
        limit: i64,
    ) -> Result<Vec<StockLog>, StoreError> {
        sqlx::query_as::<_, StockLogRow>(
            r"
            SELECT id, employee_id, product_id, type, quantity, note, created_at
            FROM stock_logs
            WHERE ($1::uuid IS NULL OR employee_id = $1)
            ORDER BY created_at DESC, id
            LIMIT $2
            ",
        )
        .bind(employee)
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx)?
        .into_iter()
        .map(StockLog::try_from)
        .collect()
    }

    // =========================================================================
    // Settings
    // =========================================================================

    async fn settings(&mut self) -> Result<Option<StoreSettings>, StoreError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r"
            SELECT store_name, support_email, support_phone, store_address,
                   currency, tax_rate, updated_at
            FROM store_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(Into::into))
    }

    async fn save_settings(&mut self, settings: &StoreSettings) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO store_settings (
                id, store_name, support_email, support_phone, store_address,
                currency, tax_rate, updated_at
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                store_name = EXCLUDED.store_name,
                support_email = EXCLUDED.support_email,
                support_phone = EXCLUDED.support_phone,
                store_address = EXCLUDED.store_address,
                currency = EXCLUDED.currency,
                tax_rate = EXCLUDED.tax_rate,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(&settings.store_name)
        .bind(&settings.support_email)
        .bind(&settings.support_phone)
        .bind(&settings.store_address)
        .bind(&settings.currency)
        .bind(settings.tax_rate)
        .bind(settings.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_sqlx)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(map_sqlx)
    }
}
