//! In-process store.
//!
//! Used by the test suites and for running the API without a database.
//! Transactions are serialised: `begin` takes an owned lock on the tables
//! and works on a copy that replaces the shared state only on commit.
//! The auth-owned `users` table is not modelled.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use bazaar_core::{
    CartItemId, Email, EmployeeId, HoldingId, OrderId, OrderStatus, PaymentStatus, ProductId,
    UserId, WishlistItemId,
};

use super::{CommerceStore, StoreError, StoreTransaction};
use crate::models::{
    CartItem, CartLine, Employee, Holding, Order, OrderItem, Payment, Product, StockLog,
    StoreSettings, WishlistEntry,
};

#[derive(Debug, Clone)]
struct WishlistRow {
    id: WishlistItemId,
    user_id: UserId,
    product_id: ProductId,
    created_at: DateTime<Utc>,
}

/// Rows are kept in insertion order; "newest first" reads iterate in reverse.
#[derive(Debug, Clone, Default)]
struct Tables {
    products: Vec<Product>,
    cart_items: Vec<CartItem>,
    wishlist: Vec<WishlistRow>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    payments: Vec<Payment>,
    employees: Vec<Employee>,
    /// Retired employees, still referenced by holdings and stock logs.
    retired_employees: Vec<Employee>,
    holdings: Vec<Holding>,
    stock_logs: Vec<StockLog>,
    settings: Option<StoreSettings>,
}

impl Tables {
    fn product_exists(&self, id: ProductId) -> bool {
        self.products.iter().any(|p| p.id == id)
    }

    fn employee_exists(&self, id: EmployeeId) -> bool {
        self.employees.iter().any(|e| e.id == id)
    }

    fn product_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    fn employee_mut(&mut self, id: EmployeeId) -> Option<&mut Employee> {
        self.employees.iter_mut().find(|e| e.id == id)
    }

    fn payment_mut(&mut self, gateway_order_id: &str) -> Option<&mut Payment> {
        self.payments
            .iter_mut()
            .find(|p| p.gateway_order_id == gateway_order_id)
    }
}

fn missing_product(id: ProductId) -> StoreError {
    StoreError::Conflict(format!("product {id} does not exist"))
}

fn missing_employee(id: EmployeeId) -> StoreError {
    StoreError::Conflict(format!("employee {id} does not exist"))
}

/// Store that keeps every table in process memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommerceStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    // Catalog

    async fn list_products(&mut self, active_only: bool) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .working
            .products
            .iter()
            .rev()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect())
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.working.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.product(id).await
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        if product.stock < 0 {
            return Err(StoreError::Conflict("products.stock must be >= 0".into()));
        }
        if self.working.product_exists(product.id) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        self.working.products.push(product.clone());
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<bool, StoreError> {
        if product.stock < 0 {
            return Err(StoreError::Conflict("products.stock must be >= 0".into()));
        }
        let Some(existing) = self.working.product_mut(product.id) else {
            return Ok(false);
        };
        let created_at = existing.created_at;
        *existing = Product {
            created_at,
            ..product.clone()
        };
        Ok(true)
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError> {
        let tables = &mut self.working;
        if !tables.product_exists(id) {
            return Ok(false);
        }
        if tables.order_items.iter().any(|i| i.product_id == id)
            || tables.holdings.iter().any(|h| h.product_id == id)
        {
            return Err(StoreError::Conflict(format!(
                "product {id} is referenced by orders or employee holdings"
            )));
        }
        tables.products.retain(|p| p.id != id);
        tables.cart_items.retain(|c| c.product_id != id);
        tables.wishlist.retain(|w| w.product_id != id);
        for log in tables.stock_logs.iter_mut().filter(|l| l.product_id == Some(id)) {
            log.product_id = None;
        }
        Ok(true)
    }

    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: i32,
    ) -> Result<bool, StoreError> {
        match self.working.product_mut(id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                product.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // Cart

    async fn cart_lines(&mut self, user: UserId) -> Result<Vec<CartLine>, StoreError> {
        let tables = &self.working;
        Ok(tables
            .cart_items
            .iter()
            .rev()
            .filter(|c| c.user_id == user)
            .filter_map(|c| {
                let product = tables.products.iter().find(|p| p.id == c.product_id)?;
                Some(CartLine {
                    item_id: c.id,
                    product_id: c.product_id,
                    product_name: product.name.clone(),
                    quantity: c.quantity,
                    size: c.size.clone(),
                    color: c.color.clone(),
                    price: product.price,
                    wholesale_price: product.wholesale_price,
                    bulk_threshold: product.bulk_threshold,
                    stock: product.stock,
                    created_at: c.created_at,
                })
            })
            .collect())
    }

    async fn upsert_cart_item(&mut self, item: &CartItem) -> Result<CartItem, StoreError> {
        if !self.working.product_exists(item.product_id) {
            return Err(missing_product(item.product_id));
        }
        if item.quantity <= 0 {
            return Err(StoreError::Conflict("cart_items.quantity must be > 0".into()));
        }

        if let Some(existing) = self.working.cart_items.iter_mut().find(|c| {
            c.user_id == item.user_id
                && c.product_id == item.product_id
                && c.size == item.size
                && c.color == item.color
        }) {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or_else(|| StoreError::Conflict("cart_items.quantity overflow".into()))?;
            existing.updated_at = item.updated_at;
            return Ok(existing.clone());
        }

        self.working.cart_items.push(item.clone());
        Ok(item.clone())
    }

    async fn set_cart_quantity(
        &mut self,
        user: UserId,
        item: CartItemId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<CartItem>, StoreError> {
        if quantity <= 0 {
            return Err(StoreError::Conflict("cart_items.quantity must be > 0".into()));
        }
        Ok(self
            .working
            .cart_items
            .iter_mut()
            .find(|c| c.id == item && c.user_id == user)
            .map(|c| {
                c.quantity = quantity;
                c.updated_at = now;
                c.clone()
            }))
    }

    async fn delete_cart_item(
        &mut self,
        user: UserId,
        item: CartItemId,
    ) -> Result<bool, StoreError> {
        let before = self.working.cart_items.len();
        self.working
            .cart_items
            .retain(|c| !(c.id == item && c.user_id == user));
        Ok(self.working.cart_items.len() < before)
    }

    async fn clear_cart(&mut self, user: UserId) -> Result<u64, StoreError> {
        let before = self.working.cart_items.len();
        self.working.cart_items.retain(|c| c.user_id != user);
        Ok((before - self.working.cart_items.len()) as u64)
    }

    // Wishlist

    async fn wishlist(&mut self, user: UserId) -> Result<Vec<WishlistEntry>, StoreError> {
        let tables = &self.working;
        Ok(tables
            .wishlist
            .iter()
            .rev()
            .filter(|w| w.user_id == user)
            .filter_map(|w| {
                let product = tables.products.iter().find(|p| p.id == w.product_id)?;
                Some(WishlistEntry {
                    id: w.id,
                    product_id: product.id,
                    product_name: product.name.clone(),
                    price: product.price,
                    category: product.category.clone(),
                    image_url: product.image_url.clone(),
                    stock: product.stock,
                    is_sale: product.is_sale,
                    sale_percent: product.sale_percent,
                    added_at: w.created_at,
                })
            })
            .collect())
    }

    async fn add_to_wishlist(
        &mut self,
        user: UserId,
        product: ProductId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if !self.working.product_exists(product) {
            return Err(missing_product(product));
        }
        if self
            .working
            .wishlist
            .iter()
            .any(|w| w.user_id == user && w.product_id == product)
        {
            return Ok(false);
        }
        self.working.wishlist.push(WishlistRow {
            id: WishlistItemId::new(),
            user_id: user,
            product_id: product,
            created_at: now,
        });
        Ok(true)
    }

    async fn remove_from_wishlist(
        &mut self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, StoreError> {
        let before = self.working.wishlist.len();
        self.working
            .wishlist
            .retain(|w| !(w.user_id == user && w.product_id == product));
        Ok(self.working.wishlist.len() < before)
    }

    // Orders

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        if let Some(link) = &order.gateway_order_id {
            if self
                .working
                .orders
                .iter()
                .any(|o| o.gateway_order_id.as_ref() == Some(link))
            {
                return Err(StoreError::Conflict(format!(
                    "gateway order {link} is already linked to an order"
                )));
            }
        }
        self.working.orders.push(order.clone());
        Ok(())
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<(), StoreError> {
        if !self.working.orders.iter().any(|o| o.id == item.order_id) {
            return Err(StoreError::Conflict(format!(
                "order {} does not exist",
                item.order_id
            )));
        }
        if !self.working.product_exists(item.product_id) {
            return Err(missing_product(item.product_id));
        }
        if item.quantity <= 0 {
            return Err(StoreError::Conflict("order_items.quantity must be > 0".into()));
        }
        self.working.order_items.push(item.clone());
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.working.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders(&mut self, user: Option<UserId>) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .working
            .orders
            .iter()
            .rev()
            .filter(|o| user.is_none_or(|u| o.user_id == u))
            .cloned()
            .collect())
    }

    async fn order_items(&mut self, orders: &[OrderId]) -> Result<Vec<OrderItem>, StoreError> {
        Ok(self
            .working
            .order_items
            .iter()
            .filter(|i| orders.contains(&i.order_id))
            .cloned()
            .collect())
    }

    async fn set_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .working
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .map(|o| {
                o.status = status;
                o.updated_at = now;
                o.clone()
            }))
    }

    // Payments

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        if self
            .working
            .payments
            .iter()
            .any(|p| p.gateway_order_id == payment.gateway_order_id)
        {
            return Err(StoreError::Conflict(format!(
                "payment for gateway order {} already exists",
                payment.gateway_order_id
            )));
        }
        self.working.payments.push(payment.clone());
        Ok(())
    }

    async fn payment_by_gateway_order(
        &mut self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .working
            .payments
            .iter()
            .find(|p| p.gateway_order_id == gateway_order_id)
            .cloned())
    }

    async fn mark_payment_success(
        &mut self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: Option<&str>,
    ) -> Result<bool, StoreError> {
        match self.working.payment_mut(gateway_order_id) {
            Some(payment) if payment.status == PaymentStatus::Pending => {
                payment.status = PaymentStatus::Success;
                payment.gateway_payment_id = Some(gateway_payment_id.to_string());
                payment.signature = signature.map(str::to_string);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_payment_failed(&mut self, gateway_order_id: &str) -> Result<bool, StoreError> {
        match self.working.payment_mut(gateway_order_id) {
            Some(payment) if payment.status == PaymentStatus::Pending => {
                payment.status = PaymentStatus::Failed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn payments_for_orders(
        &mut self,
        gateway_order_ids: &[String],
    ) -> Result<Vec<Payment>, StoreError> {
        Ok(self
            .working
            .payments
            .iter()
            .filter(|p| gateway_order_ids.contains(&p.gateway_order_id))
            .cloned()
            .collect())
    }

    // Employees

    async fn employees(&mut self) -> Result<Vec<Employee>, StoreError> {
        Ok(self.working.employees.iter().rev().cloned().collect())
    }

    async fn employee(&mut self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.working.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn employee_for_update(
        &mut self,
        id: EmployeeId,
    ) -> Result<Option<Employee>, StoreError> {
        self.employee(id).await
    }

    async fn employee_by_email(&mut self, email: &Email) -> Result<Option<Employee>, StoreError> {
        Ok(self
            .working
            .employees
            .iter()
            .find(|e| &e.email == email)
            .cloned())
    }

    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), StoreError> {
        if self
            .working
            .employees
            .iter()
            .any(|e| e.id == employee.id || e.email == employee.email)
        {
            return Err(StoreError::Conflict(format!(
                "employee email {} already exists",
                employee.email
            )));
        }
        self.working.employees.push(employee.clone());
        Ok(())
    }

    async fn update_employee(&mut self, employee: &Employee) -> Result<bool, StoreError> {
        if self
            .working
            .employees
            .iter()
            .any(|e| e.id != employee.id && e.email == employee.email)
        {
            return Err(StoreError::Conflict(format!(
                "employee email {} already exists",
                employee.email
            )));
        }
        let Some(existing) = self.working.employee_mut(employee.id) else {
            return Ok(false);
        };
        existing.name.clone_from(&employee.name);
        existing.email = employee.email.clone();
        existing.phone.clone_from(&employee.phone);
        existing.status = employee.status;
        existing.updated_at = employee.updated_at;
        Ok(true)
    }

    async fn retire_employee(
        &mut self,
        id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let tables = &mut self.working;
        let Some(index) = tables.employees.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        let mut employee = tables.employees.remove(index);
        employee.updated_at = now;
        tables.retired_employees.push(employee);
        Ok(true)
    }

    async fn add_assigned_stock(
        &mut self,
        id: EmployeeId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(employee) = self.working.employee_mut(id) else {
            return Ok(false);
        };
        employee.total_assigned_stock = employee
            .total_assigned_stock
            .checked_add(quantity)
            .ok_or_else(|| StoreError::Conflict("total_assigned_stock overflow".into()))?;
        employee.updated_at = now;
        Ok(true)
    }

    async fn add_sold(
        &mut self,
        id: EmployeeId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(employee) = self.working.employee_mut(id) else {
            return Ok(false);
        };
        let sold = employee.total_sold.saturating_add(quantity);
        if sold > employee.total_assigned_stock {
            return Err(StoreError::Conflict(
                "employees.total_sold must not exceed total_assigned_stock".into(),
            ));
        }
        employee.total_sold = sold;
        employee.updated_at = now;
        Ok(true)
    }

    async fn upsert_holding(
        &mut self,
        employee: EmployeeId,
        product: ProductId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Holding, StoreError> {
        if !self.working.employee_exists(employee) {
            return Err(missing_employee(employee));
        }
        if !self.working.product_exists(product) {
            return Err(missing_product(product));
        }

        if let Some(holding) = self
            .working
            .holdings
            .iter_mut()
            .find(|h| h.employee_id == employee && h.product_id == product)
        {
            holding.quantity_assigned = holding
                .quantity_assigned
                .checked_add(quantity)
                .ok_or_else(|| StoreError::Conflict("quantity_assigned overflow".into()))?;
            holding.assigned_at = now;
            return Ok(holding.clone());
        }

        let holding = Holding {
            id: HoldingId::new(),
            employee_id: employee,
            product_id: product,
            quantity_assigned: quantity,
            assigned_at: now,
        };
        self.working.holdings.push(holding.clone());
        Ok(holding)
    }

    async fn holdings(&mut self, employee: EmployeeId) -> Result<Vec<Holding>, StoreError> {
        Ok(self
            .working
            .holdings
            .iter()
            .rev()
            .filter(|h| h.employee_id == employee && h.quantity_assigned > 0)
            .cloned()
            .collect())
    }

    async fn append_stock_log(&mut self, log: &StockLog) -> Result<(), StoreError> {
        if !self.working.employee_exists(log.employee_id) {
            return Err(missing_employee(log.employee_id));
        }
        if log.quantity <= 0 {
            return Err(StoreError::Conflict("stock_logs.quantity must be > 0".into()));
        }
        self.working.stock_logs.push(log.clone());
        Ok(())
    }

    async fn stock_logs(
        &mut self,
        employee: Option<EmployeeId>,
        limit: i64,
    ) -> Result<Vec<StockLog>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .working
            .stock_logs
            .iter()
            .rev()
            .filter(|l| employee.is_none_or(|e| l.employee_id == e))
            .take(limit)
            .cloned()
            .collect())
    }

    // Settings

    async fn settings(&mut self) -> Result<Option<StoreSettings>, StoreError> {
        Ok(self.working.settings.clone())
    }

    async fn save_settings(&mut self, settings: &StoreSettings) -> Result<(), StoreError> {
        self.working.settings = Some(settings.clone());
        Ok(())
    }

    // Lifecycle

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: "Cotton Kurta".to_string(),
            description: None,
            category: Some("apparel".to_string()),
            price: Decimal::new(100, 0),
            wholesale_price: Decimal::new(80, 0),
            bulk_threshold: 10,
            stock,
            is_active: true,
            gender: None,
            image_url: None,
            images: Vec::new(),
            sizes: Vec::new(),
            colors: Vec::new(),
            is_new: false,
            is_sale: false,
            sale_percent: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = InMemoryStore::new();
        let p = product(5);

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.product(p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = InMemoryStore::new();
        let p = product(5);

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.product(p.id).await.unwrap(), Some(p));
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let store = InMemoryStore::new();
        let p = product(2);

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();
        assert!(!tx.decrement_stock(p.id, 3).await.unwrap());
        assert!(tx.decrement_stock(p.id, 2).await.unwrap());
        assert_eq!(tx.product(p.id).await.unwrap().unwrap().stock, 0);
        assert!(!tx.decrement_stock(ProductId::new(), 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_cart_upsert_is_additive() {
        let store = InMemoryStore::new();
        let p = product(10);
        let user = UserId::new();
        let now = Utc::now();
        let item = |quantity| CartItem {
            id: CartItemId::new(),
            user_id: user,
            product_id: p.id,
            quantity,
            size: "M".to_string(),
            color: String::new(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();
        let first = tx.upsert_cart_item(&item(2)).await.unwrap();
        let second = tx.upsert_cart_item(&item(3)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 5);
        assert_eq!(tx.cart_lines(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cart_item_requires_product() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let mut tx = store.begin().await.unwrap();
        let result = tx
            .upsert_cart_item(&CartItem {
                id: CartItemId::new(),
                user_id: UserId::new(),
                product_id: ProductId::new(),
                quantity: 1,
                size: "M".to_string(),
                color: String::new(),
                created_at: now,
                updated_at: now,
            })
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_payment_transitions_only_from_pending() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_payment(&Payment {
            id: bazaar_core::PaymentId::new(),
            user_id: UserId::new(),
            gateway_order_id: "order_1".to_string(),
            gateway_payment_id: None,
            signature: None,
            amount: Decimal::new(500, 0),
            currency: "INR".to_string(),
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        assert!(tx.mark_payment_success("order_1", "pay_1", Some("sig")).await.unwrap());
        assert!(!tx.mark_payment_failed("order_1").await.unwrap());
        let payment = tx.payment_by_gateway_order("order_1").await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Success);
        assert_eq!(payment.gateway_payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn test_gateway_order_links_one_order() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let order = |link: Option<&str>| Order {
            id: OrderId::new(),
            user_id: UserId::new(),
            total_amount: Decimal::new(100, 0),
            taxes: Decimal::ZERO,
            payment_method: "ONLINE".to_string(),
            status: OrderStatus::Processing,
            shipping_address: serde_json::json!({"city": "Pune"}),
            gateway_order_id: link.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&order(Some("order_1"))).await.unwrap();
        tx.insert_order(&order(None)).await.unwrap();
        tx.insert_order(&order(None)).await.unwrap();
        assert!(matches!(
            tx.insert_order(&order(Some("order_1"))).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_retired_employee_keeps_audit_trail() {
        let store = InMemoryStore::new();
        let p = product(10);
        let now = Utc::now();
        let employee = Employee {
            id: EmployeeId::new(),
            name: "Asha".to_string(),
            email: Email::parse("asha@bazaar.test").unwrap(),
            phone: "9800000000".to_string(),
            status: bazaar_core::EmployeeStatus::Active,
            total_assigned_stock: 0,
            total_sold: 0,
            join_date: now,
            created_at: now,
            updated_at: now,
        };

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();
        tx.insert_employee(&employee).await.unwrap();
        tx.upsert_holding(employee.id, p.id, 2, now).await.unwrap();
        tx.append_stock_log(&StockLog {
            id: bazaar_core::StockLogId::new(),
            employee_id: employee.id,
            product_id: Some(p.id),
            kind: bazaar_core::StockLogKind::Assign,
            quantity: 2,
            note: None,
            created_at: now,
        })
        .await
        .unwrap();

        assert!(tx.retire_employee(employee.id, now).await.unwrap());
        assert!(!tx.retire_employee(employee.id, now).await.unwrap());
        assert!(tx.employee(employee.id).await.unwrap().is_none());
        assert!(tx.employees().await.unwrap().is_empty());
        assert_eq!(tx.stock_logs(None, 10).await.unwrap().len(), 1);

        // The email is free again, and the product cannot vanish from under
        // the retained holding
        let mut rehired = employee.clone();
        rehired.id = EmployeeId::new();
        tx.insert_employee(&rehired).await.unwrap();
        assert!(matches!(
            tx.delete_product(p.id).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_product_cascades_cart_and_wishlist() {
        let store = InMemoryStore::new();
        let p = product(10);
        let user = UserId::new();
        let now = Utc::now();

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();
        tx.add_to_wishlist(user, p.id, now).await.unwrap();
        tx.upsert_cart_item(&CartItem {
            id: CartItemId::new(),
            user_id: user,
            product_id: p.id,
            quantity: 1,
            size: "M".to_string(),
            color: String::new(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

        assert!(tx.delete_product(p.id).await.unwrap());
        assert!(!tx.delete_product(p.id).await.unwrap());
        assert!(tx.cart_lines(user).await.unwrap().is_empty());
        assert!(tx.wishlist(user).await.unwrap().is_empty());
    }
}
