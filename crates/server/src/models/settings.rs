//! Store-wide configuration edited from the back-office.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The single settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub store_name: String,
    pub support_email: String,
    pub support_phone: String,
    pub store_address: String,
    /// ISO 4217 code, upper case.
    pub currency: String,
    /// Percent, 0-100.
    pub tax_rate: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Partial settings update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub store_name: Option<String>,
    pub support_email: Option<String>,
    pub support_phone: Option<String>,
    pub store_address: Option<String>,
    pub currency: Option<String>,
    pub tax_rate: Option<Decimal>,
}
