//! Catalog, cart and wishlist models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{CartItemId, LinePrice, ProductId, UserId, WishlistItemId, unit_price};

/// A product and its warehouse stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Retail unit price.
    pub price: Decimal,
    /// Unit price once a cart line reaches `bulk_threshold`.
    pub wholesale_price: Decimal,
    /// Zero disables wholesale pricing.
    pub bulk_threshold: i32,
    /// Warehouse-owned units. Never negative.
    pub stock: i32,
    pub is_active: bool,
    pub gender: Option<String>,
    pub image_url: Option<String>,
    pub images: Vec<String>,
    /// Sizes a cart line may pick. Empty means any size.
    pub sizes: Vec<String>,
    /// Colors a cart line may pick. Empty means any color.
    pub colors: Vec<String>,
    pub is_new: bool,
    pub is_sale: bool,
    /// Advertised discount, 0-100. Display only; pricing ignores it.
    pub sale_percent: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether a cart line may use this size and color.
    #[must_use]
    pub fn offers(&self, size: &str, color: &str) -> bool {
        let listed = |options: &[String], value: &str| {
            options.is_empty() || options.iter().any(|o| o.eq_ignore_ascii_case(value))
        };
        listed(&self.sizes, size) && (color.is_empty() || listed(&self.colors, color))
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub wholesale_price: Decimal,
    #[serde(default)]
    pub bulk_threshold: i32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub gender: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub sale_percent: i32,
}

const fn default_true() -> bool {
    true
}

/// Partial update of a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub bulk_threshold: Option<i32>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub gender: Option<String>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub is_new: Option<bool>,
    pub is_sale: Option<bool>,
    pub sale_percent: Option<i32>,
}

/// A raw cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart row joined with the live product fields checkout needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub size: String,
    pub color: String,
    pub price: Decimal,
    pub wholesale_price: Decimal,
    pub bulk_threshold: i32,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    /// Price this line at its current quantity.
    #[must_use]
    pub fn priced(&self) -> LinePrice {
        unit_price(
            self.price,
            self.wholesale_price,
            self.bulk_threshold,
            self.quantity,
        )
    }
}

/// A wishlisted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock: i32,
    pub is_sale: bool,
    pub sale_percent: i32,
    pub added_at: DateTime<Utc>,
}

/// Add-to-cart request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: i64,
    pub size: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpdateCartQuantity {
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlist {
    pub product_id: ProductId,
}
