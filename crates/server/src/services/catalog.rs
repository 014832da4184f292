//! Product catalog.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use bazaar_core::ProductId;

use super::{CommerceError, abort};
use crate::db::CommerceStore;
use crate::models::{NewProduct, Product, ProductUpdate};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CommerceStore>,
}

impl CatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// Products newest first. The storefront passes `active_only`.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the store read fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, CommerceError> {
        let mut tx = self.store.begin().await?;
        let products = tx.list_products(active_only).await?;
        tx.commit().await?;
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns [`CommerceError::ProductNotFound`] if the product does not
    /// exist, or is inactive and `active_only` is set.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        id: ProductId,
        active_only: bool,
    ) -> Result<Product, CommerceError> {
        let mut tx = self.store.begin().await?;
        let product = tx.product(id).await?;
        tx.commit().await?;
        product
            .filter(|p| !active_only || p.is_active)
            .ok_or(CommerceError::ProductNotFound(id))
    }

    /// # Errors
    ///
    /// Returns [`CommerceError::Validation`] for an empty name, a negative
    /// price, threshold or stock, or a sale percent outside 0-100.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: NewProduct) -> Result<Product, CommerceError> {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name: input.name.trim().to_string(),
            description: input.description,
            category: input.category,
            price: input.price,
            wholesale_price: input.wholesale_price,
            bulk_threshold: input.bulk_threshold,
            stock: input.stock,
            is_active: input.is_active,
            gender: trimmed(input.gender),
            image_url: trimmed(input.image_url),
            images: options(input.images),
            sizes: options(input.sizes),
            colors: options(input.colors),
            is_new: input.is_new,
            is_sale: input.is_sale,
            sale_percent: input.sale_percent,
            created_at: now,
            updated_at: now,
        };
        validate(&product)?;

        let mut tx = self.store.begin().await?;
        tx.insert_product(&product).await?;
        tx.commit().await?;

        info!(product_id = %product.id, stock = product.stock, "Product created");
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::ProductNotFound`] for unknown products and
    /// [`CommerceError::Validation`] if the result would be invalid. Values
    /// are never clamped.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CommerceError> {
        let mut tx = self.store.begin().await?;
        let mut product = tx
            .product_for_update(id)
            .await?
            .ok_or(CommerceError::ProductNotFound(id))?;

        if let Some(name) = update.name {
            product.name = name.trim().to_string();
        }
        if update.description.is_some() {
            product.description = update.description;
        }
        if update.category.is_some() {
            product.category = update.category;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(wholesale_price) = update.wholesale_price {
            product.wholesale_price = wholesale_price;
        }
        if let Some(bulk_threshold) = update.bulk_threshold {
            product.bulk_threshold = bulk_threshold;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        if let Some(is_active) = update.is_active {
            product.is_active = is_active;
        }
        if update.gender.is_some() {
            product.gender = trimmed(update.gender);
        }
        if update.image_url.is_some() {
            product.image_url = trimmed(update.image_url);
        }
        if let Some(images) = update.images {
            product.images = options(images);
        }
        if let Some(sizes) = update.sizes {
            product.sizes = options(sizes);
        }
        if let Some(colors) = update.colors {
            product.colors = options(colors);
        }
        if let Some(is_new) = update.is_new {
            product.is_new = is_new;
        }
        if let Some(is_sale) = update.is_sale {
            product.is_sale = is_sale;
        }
        if let Some(sale_percent) = update.sale_percent {
            product.sale_percent = sale_percent;
        }
        product.updated_at = Utc::now();
        validate(&product)?;

        tx.update_product(&product).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Remove a product for good.
    ///
    /// Cart and wishlist entries for it disappear too. Products that were
    /// ordered or handed to an employee stay; deactivate those instead.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::ProductNotFound`] for unknown products and
    /// [`CommerceError::Conflict`] while orders or holdings reference it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CommerceError> {
        let mut tx = self.store.begin().await?;
        match tx.delete_product(id).await {
            Ok(true) => {
                tx.commit().await?;
                info!("Product deleted");
                Ok(())
            }
            Ok(false) => abort(tx, CommerceError::ProductNotFound(id)).await,
            Err(err) => abort(tx, err.into()).await,
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim entries, drop blanks and repeats, keep the given order.
fn options(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v.eq_ignore_ascii_case(value)) {
            out.push(value.to_string());
        }
    }
    out
}

fn validate(product: &Product) -> Result<(), CommerceError> {
    let invalid =
        |msg: &str| -> Result<(), CommerceError> { Err(CommerceError::Validation(msg.into())) };
    if product.name.is_empty() {
        return invalid("name is required");
    }
    if product.price < Decimal::ZERO || product.wholesale_price < Decimal::ZERO {
        return invalid("prices must not be negative");
    }
    if product.bulk_threshold < 0 {
        return invalid("bulk threshold must not be negative");
    }
    if product.stock < 0 {
        return invalid("stock must not be negative");
    }
    if !(0..=100).contains(&product.sale_percent) {
        return invalid("sale percent must be between 0 and 100");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::EmployeeStatus;

    use super::*;
    use crate::services::StockService;
    use crate::services::testing::{seed_employee, store};

    fn new_product(stock: i32) -> NewProduct {
        NewProduct {
            name: "  Block Print Dupatta ".to_string(),
            description: Some("Hand block printed".to_string()),
            category: Some("accessories".to_string()),
            price: Decimal::new(45000, 2),
            wholesale_price: Decimal::new(39000, 2),
            bulk_threshold: 12,
            stock,
            is_active: true,
            gender: Some("women".to_string()),
            image_url: None,
            images: Vec::new(),
            sizes: vec![" S ".to_string(), "M".to_string(), "m".to_string(), String::new()],
            colors: Vec::new(),
            is_new: true,
            is_sale: false,
            sale_percent: 0,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let catalog = CatalogService::new(store());
        let created = catalog.create_product(new_product(30)).await.unwrap();
        assert_eq!(created.name, "Block Print Dupatta");

        let fetched = catalog.get_product(created.id, true).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(catalog.list_products(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_negative_stock_is_rejected_not_clamped() {
        let catalog = CatalogService::new(store());
        assert!(matches!(
            catalog.create_product(new_product(-1)).await,
            Err(CommerceError::Validation(_))
        ));

        let created = catalog.create_product(new_product(3)).await.unwrap();
        let err = catalog
            .update_product(
                created.id,
                ProductUpdate {
                    stock: Some(-5),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
        assert_eq!(catalog.get_product(created.id, false).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_inactive_hidden_from_storefront() {
        let catalog = CatalogService::new(store());
        let created = catalog.create_product(new_product(3)).await.unwrap();
        catalog
            .update_product(
                created.id,
                ProductUpdate {
                    is_active: Some(false),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap();

        assert!(catalog.list_products(true).await.unwrap().is_empty());
        assert_eq!(catalog.list_products(false).await.unwrap().len(), 1);
        assert!(matches!(
            catalog.get_product(created.id, true).await,
            Err(CommerceError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_variant_options_are_normalised() {
        let catalog = CatalogService::new(store());
        let created = catalog.create_product(new_product(3)).await.unwrap();
        assert_eq!(created.sizes, vec!["S".to_string(), "M".to_string()]);
        assert_eq!(created.gender.as_deref(), Some("women"));

        let updated = catalog
            .update_product(
                created.id,
                ProductUpdate {
                    colors: Some(vec!["Red".to_string(), "blue".to_string()]),
                    is_sale: Some(true),
                    sale_percent: Some(15),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.colors.len(), 2);
        assert_eq!(updated.sizes, created.sizes);
        assert!(updated.is_sale);

        let err = catalog
            .update_product(
                created.id,
                ProductUpdate {
                    sale_percent: Some(101),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_product() {
        let store = store();
        let catalog = CatalogService::new(store.clone());
        let unused = catalog.create_product(new_product(3)).await.unwrap();

        catalog.delete_product(unused.id).await.unwrap();
        assert!(matches!(
            catalog.get_product(unused.id, false).await,
            Err(CommerceError::ProductNotFound(_))
        ));
        assert!(matches!(
            catalog.delete_product(unused.id).await,
            Err(CommerceError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_refuses_products_held_by_employees() {
        let store = store();
        let catalog = CatalogService::new(store.clone());
        let held = catalog.create_product(new_product(10)).await.unwrap();
        let employee = seed_employee(&store, EmployeeStatus::Active).await;
        StockService::new(store.clone())
            .assign(employee.id, held.id, 2)
            .await
            .unwrap();

        assert!(matches!(
            catalog.delete_product(held.id).await,
            Err(CommerceError::Conflict(_))
        ));
        assert_eq!(catalog.get_product(held.id, false).await.unwrap().stock, 8);
    }
}
