//! Wishlist.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use bazaar_core::{ProductId, UserId};

use super::CommerceError;
use crate::db::CommerceStore;
use crate::models::WishlistEntry;

#[derive(Clone)]
pub struct WishlistService {
    store: Arc<dyn CommerceStore>,
}

impl WishlistService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the store read fails.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn get_wishlist(&self, user: UserId) -> Result<Vec<WishlistEntry>, CommerceError> {
        let mut tx = self.store.begin().await?;
        let entries = tx.wishlist(user).await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// Wishlist a product. Adding it twice is a no-op.
    ///
    /// Returns `true` when a new entry was created.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::ProductNotFound`] for unknown products.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn add(&self, user: UserId, product: ProductId) -> Result<bool, CommerceError> {
        let mut tx = self.store.begin().await?;
        if tx.product(product).await?.is_none() {
            return Err(CommerceError::ProductNotFound(product));
        }
        let added = tx.add_to_wishlist(user, product, Utc::now()).await?;
        tx.commit().await?;
        Ok(added)
    }

    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] if the product was not wishlisted.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<(), CommerceError> {
        let mut tx = self.store.begin().await?;
        if !tx.remove_from_wishlist(user, product).await? {
            return Err(CommerceError::NotFound("wishlist item".into()));
        }
        tx.commit().await?;
        Ok(())
    }
}
