//! Shopping cart.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use bazaar_core::{CartItemId, Quantity, UserId};

use super::CommerceError;
use crate::db::CommerceStore;
use crate::models::{AddToCart, CartItem, CartLine};

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CommerceStore>,
}

impl CartService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// Cart lines with live product pricing, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the store read fails.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn get_cart(&self, user: UserId) -> Result<Vec<CartLine>, CommerceError> {
        let mut tx = self.store.begin().await?;
        let lines = tx.cart_lines(user).await?;
        tx.commit().await?;
        Ok(lines)
    }

    /// Add a product to the cart.
    ///
    /// Adding the same (product, size, color) again accumulates quantity on
    /// the existing line.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive quantity, a missing size, a
    /// size or color the product does not list, or an unknown or inactive
    /// product.
    #[instrument(skip(self, request), fields(user_id = %user, product_id = %request.product_id))]
    pub async fn add_to_cart(
        &self,
        user: UserId,
        request: AddToCart,
    ) -> Result<CartItem, CommerceError> {
        let quantity = Quantity::new(request.quantity)?;
        let size = request.size.trim();
        if size.is_empty() {
            return Err(CommerceError::Validation("size is required".into()));
        }

        let color = request.color.trim();

        let mut tx = self.store.begin().await?;
        let product = match tx.product(request.product_id).await? {
            Some(p) if p.is_active => p,
            _ => return Err(CommerceError::ProductNotFound(request.product_id)),
        };
        if !product.offers(size, color) {
            return Err(CommerceError::Validation(format!(
                "{} is not available in size {size}{}",
                product.name,
                if color.is_empty() { String::new() } else { format!(" / {color}") },
            )));
        }

        let now = Utc::now();
        let item = tx
            .upsert_cart_item(&CartItem {
                id: CartItemId::new(),
                user_id: user,
                product_id: request.product_id,
                quantity: quantity.get(),
                size: size.to_string(),
                color: color.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await?;
        tx.commit().await?;

        debug!(item_id = %item.id, quantity = item.quantity, "Cart line saved");
        Ok(item)
    }

    /// Set the quantity of one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::InvalidQuantity`] for quantities below one
    /// and [`CommerceError::NotFound`] if the line is not in this user's cart.
    #[instrument(skip(self), fields(user_id = %user, item_id = %item))]
    pub async fn update_quantity(
        &self,
        user: UserId,
        item: CartItemId,
        quantity: i64,
    ) -> Result<CartItem, CommerceError> {
        let quantity = Quantity::new(quantity)?;

        let mut tx = self.store.begin().await?;
        let updated = tx
            .set_cart_quantity(user, item, quantity.get(), Utc::now())
            .await?
            .ok_or_else(|| CommerceError::NotFound("cart item".into()))?;
        tx.commit().await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] if the line is not in this user's
    /// cart.
    #[instrument(skip(self), fields(user_id = %user, item_id = %item))]
    pub async fn remove_item(&self, user: UserId, item: CartItemId) -> Result<(), CommerceError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_cart_item(user, item).await? {
            return Err(CommerceError::NotFound("cart item".into()));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Remove every line. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the store write fails.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn clear_cart(&self, user: UserId) -> Result<u64, CommerceError> {
        let mut tx = self.store.begin().await?;
        let removed = tx.clear_cart(user).await?;
        tx.commit().await?;
        Ok(removed)
    }
}
