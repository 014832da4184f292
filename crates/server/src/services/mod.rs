//! Business services.
//!
//! Each service owns a handle to the [`CommerceStore`](crate::db::CommerceStore)
//! and runs every multi-statement mutation inside one store transaction.
//! Inputs are validated before a transaction is opened.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod employees;
pub mod error;
pub mod orders;
pub mod payments;
pub mod settings;
pub mod stock;
pub mod wishlist;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use employees::EmployeeService;
pub use error::CommerceError;
pub use orders::OrderService;
pub use payments::{HmacPaymentVerifier, PaymentService, PaymentVerifier};
pub use settings::SettingsService;
pub use stock::StockService;
pub use wishlist::WishlistService;

use tracing::warn;

use crate::db::StoreTransaction;

/// Roll back `tx` and hand back `err`.
///
/// A failed rollback is logged; the original error still wins.
async fn abort<T>(tx: Box<dyn StoreTransaction>, err: CommerceError) -> Result<T, CommerceError> {
    if let Err(rollback_err) = tx.rollback().await {
        warn!(error = %rollback_err, "Rollback failed");
    }
    Err(err)
}
