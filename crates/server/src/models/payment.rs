//! Payment gateway attempts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{PaymentId, PaymentStatus, UserId};

/// One row per gateway order attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub signature: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Signature check request from the client after the gateway checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// A gateway order created by the client-side checkout widget.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPayment {
    pub razorpay_order_id: String,
    pub amount: Decimal,
    pub currency: Option<String>,
}
