//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, OrderItemId, OrderStatus, PaymentStatus, PriceTier, ProductId, UserId};

use super::Payment;

/// A placed order.
///
/// Everything except `status` and `updated_at` is fixed at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub taxes: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
    /// Address snapshot; later address-book edits do not touch it.
    pub shipping_address: serde_json::Value,
    /// Gateway order this checkout was paid through, if any.
    pub gateway_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Frozen line snapshot. `price` is the unit price charged at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
    pub size: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Payment state shown alongside an order.
///
/// Orders without a linked gateway payment report `pending`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayment {
    pub gateway_payment_id: Option<String>,
    pub status: PaymentStatus,
}

impl From<&Payment> for OrderPayment {
    fn from(payment: &Payment) -> Self {
        Self {
            gateway_payment_id: payment.gateway_payment_id.clone(),
            status: payment.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment_info: OrderPayment,
}

/// Gateway references of a payment the client already verified.
///
/// Checkout links the order to the stored payment; nothing here is trusted
/// on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    /// Gateway order id of a verified payment owned by the caller.
    pub order_id: Option<String>,
    /// Must match the verified payment id when given.
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub status: Option<String>,
}

/// Checkout request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderInput {
    pub shipping_address: serde_json::Value,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub taxes: Decimal,
    pub payment_info: Option<PaymentConfirmation>,
}

fn default_payment_method() -> String {
    "COD".to_string()
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tiers: Vec<PriceTier>,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
}
