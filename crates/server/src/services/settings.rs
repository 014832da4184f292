//! Store settings.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use bazaar_core::Email;

use super::CommerceError;
use crate::db::CommerceStore;
use crate::models::{SettingsUpdate, StoreSettings};

const DEFAULT_STORE_NAME: &str = "Bazaar";
const DEFAULT_SUPPORT_EMAIL: &str = "support@bazaar.local";
const DEFAULT_CURRENCY: &str = "INR";

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn CommerceStore>,
}

impl SettingsService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// Current settings, or the defaults if none were saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the store read fails.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<StoreSettings, CommerceError> {
        let mut tx = self.store.begin().await?;
        let settings = tx.settings().await?;
        tx.commit().await?;
        Ok(settings.unwrap_or_else(defaults))
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty store name, a malformed
    /// support email, a currency that is not a three-letter code, or a tax
    /// rate outside 0-100.
    #[instrument(skip(self, update))]
    pub async fn update(&self, update: SettingsUpdate) -> Result<StoreSettings, CommerceError> {
        let mut tx = self.store.begin().await?;
        let mut settings = tx.settings().await?.unwrap_or_else(defaults);

        if let Some(name) = update.store_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CommerceError::Validation("store name is required".into()));
            }
            settings.store_name = name.to_string();
        }
        if let Some(email) = update.support_email {
            settings.support_email = Email::parse(&email)?.as_str().to_string();
        }
        if let Some(phone) = update.support_phone {
            settings.support_phone = phone.trim().to_string();
        }
        if let Some(address) = update.store_address {
            settings.store_address = address.trim().to_string();
        }
        if let Some(currency) = update.currency {
            let currency = currency.trim().to_ascii_uppercase();
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(CommerceError::Validation(
                    "currency must be a three-letter code".into(),
                ));
            }
            settings.currency = currency;
        }
        if let Some(tax_rate) = update.tax_rate {
            if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE_HUNDRED {
                return Err(CommerceError::Validation(
                    "tax rate must be between 0 and 100".into(),
                ));
            }
            settings.tax_rate = tax_rate;
        }
        settings.updated_at = Utc::now();

        tx.save_settings(&settings).await?;
        tx.commit().await?;

        info!(currency = %settings.currency, tax_rate = %settings.tax_rate, "Store settings updated");
        Ok(settings)
    }
}

fn defaults() -> StoreSettings {
    StoreSettings {
        store_name: DEFAULT_STORE_NAME.to_string(),
        support_email: DEFAULT_SUPPORT_EMAIL.to_string(),
        support_phone: String::new(),
        store_address: String::new(),
        currency: DEFAULT_CURRENCY.to_string(),
        tax_rate: Decimal::ZERO,
        updated_at: Utc::now(),
    }
}
