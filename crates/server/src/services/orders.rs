//! Order history and admin order management.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use bazaar_core::{OrderId, OrderStatus, UserId};

use super::CommerceError;
use crate::db::{CommerceStore, StoreTransaction};
use crate::models::{Order, OrderItem, OrderPayment, OrderWithItems};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn CommerceStore>,
}

impl OrderService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// A user's orders with their frozen items and payment state, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the store read fails.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn user_orders(&self, user: UserId) -> Result<Vec<OrderWithItems>, CommerceError> {
        let mut tx = self.store.begin().await?;
        let orders = tx.orders(Some(user)).await?;
        let orders = with_items(tx.as_mut(), orders).await?;
        tx.commit().await?;
        Ok(orders)
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the store read fails.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<OrderWithItems>, CommerceError> {
        let mut tx = self.store.begin().await?;
        let orders = tx.orders(None).await?;
        let orders = with_items(tx.as_mut(), orders).await?;
        tx.commit().await?;
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns [`CommerceError::OrderNotFound`] for unknown orders.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order_detail(&self, id: OrderId) -> Result<OrderWithItems, CommerceError> {
        let mut tx = self.store.begin().await?;
        let order = tx.order(id).await?.ok_or(CommerceError::OrderNotFound(id))?;
        let mut orders = with_items(tx.as_mut(), vec![order]).await?;
        tx.commit().await?;
        orders.pop().ok_or(CommerceError::OrderNotFound(id))
    }

    /// Set an order's status. `status` is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::InvalidStatus`] for anything other than the
    /// five known statuses and [`CommerceError::OrderNotFound`] for unknown
    /// orders.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order, CommerceError> {
        let status: OrderStatus = status.parse()?;

        let mut tx = self.store.begin().await?;
        let order = tx
            .set_order_status(id, status, Utc::now())
            .await?
            .ok_or(CommerceError::OrderNotFound(id))?;
        tx.commit().await?;

        info!(status = %order.status, "Order status updated");
        Ok(order)
    }
}

async fn with_items(
    tx: &mut dyn StoreTransaction,
    orders: Vec<Order>,
) -> Result<Vec<OrderWithItems>, CommerceError> {
    let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in tx.order_items(&ids).await? {
        by_order.entry(item.order_id).or_default().push(item);
    }

    let links: Vec<String> = orders
        .iter()
        .filter_map(|o| o.gateway_order_id.clone())
        .collect();
    let payments: HashMap<String, OrderPayment> = if links.is_empty() {
        HashMap::new()
    } else {
        tx.payments_for_orders(&links)
            .await?
            .iter()
            .map(|p| (p.gateway_order_id.clone(), OrderPayment::from(p)))
            .collect()
    };

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: by_order.remove(&order.id).unwrap_or_default(),
            payment_info: order
                .gateway_order_id
                .as_ref()
                .and_then(|link| payments.get(link).cloned())
                .unwrap_or_default(),
            order,
        })
        .collect())
}
