//! Order placement.
//!
//! Converts a user's cart into one order in a single transaction:
//!
//! 1. Load the cart joined with live product pricing and stock
//! 2. Price each line (retail or wholesale tier) and sum the total
//! 3. Resolve a referenced gateway payment: it must belong to the user,
//!    have passed signature verification and cover the amount due
//! 4. Insert the order, `processing` when linked to that payment; a payment
//!    pays for one order only
//! 5. Decrement warehouse stock with a conditional update per line
//! 6. Freeze each line as an order item
//! 7. Empty the cart
//!
//! Any failure rolls the whole transaction back: no order, no items, stock
//! and cart exactly as they were. Failed checkouts are never retried here.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use bazaar_core::{
    LinePrice, OrderId, OrderItemId, OrderStatus, PaymentStatus, UserId, order_total,
};

use super::{CommerceError, abort};
use crate::db::{CommerceStore, StoreTransaction};
use crate::models::{CartLine, Order, OrderItem, Payment, PlaceOrderInput, PlacedOrder};

/// Places orders from carts.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn CommerceStore>,
}

impl CheckoutService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// Turn the user's cart into an order.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::Validation`] for a missing address, negative taxes,
    ///   a payment confirmation that reports failure, or a payment that does
    ///   not match or does not cover the order
    /// - [`CommerceError::EmptyCart`] if the cart has no lines
    /// - [`CommerceError::NotFound`] if the referenced payment is unknown or
    ///   belongs to someone else
    /// - [`CommerceError::PaymentNotVerified`] if that payment has not passed
    ///   signature verification
    /// - [`CommerceError::Conflict`] if the payment already paid for another
    ///   order
    /// - [`CommerceError::InsufficientStock`] naming the first product whose
    ///   warehouse stock cannot cover its line
    /// - [`CommerceError::Persistence`] for unexpected store failures
    #[instrument(skip(self, input), fields(user_id = %user))]
    pub async fn place_order(
        &self,
        user: UserId,
        input: PlaceOrderInput,
    ) -> Result<PlacedOrder, CommerceError> {
        validate(&input)?;

        let mut tx = self.store.begin().await?;
        match place(tx.as_mut(), user, input).await {
            Ok(placed) => {
                tx.commit().await?;
                info!(
                    order_id = %placed.order.id,
                    total = %placed.total_amount,
                    items = placed.items.len(),
                    status = %placed.order.status,
                    "Order placed"
                );
                Ok(placed)
            }
            Err(err) => {
                warn!(error = %err, "Checkout rejected");
                abort(tx, err).await
            }
        }
    }
}

fn validate(input: &PlaceOrderInput) -> Result<(), CommerceError> {
    if input.shipping_address.is_null() {
        return Err(CommerceError::Validation(
            "shipping address is required".into(),
        ));
    }
    if input.payment_method.trim().is_empty() {
        return Err(CommerceError::Validation("payment method is required".into()));
    }
    if input.taxes < Decimal::ZERO {
        return Err(CommerceError::Validation("taxes must not be negative".into()));
    }
    if input
        .payment_info
        .as_ref()
        .and_then(|p| p.status.as_deref())
        .is_some_and(|s| s.eq_ignore_ascii_case("failed"))
    {
        return Err(CommerceError::Validation(
            "payment was not completed".into(),
        ));
    }
    if let Some(info) = &input.payment_info {
        if non_empty(info.order_id.as_ref()).is_none()
            && non_empty(info.payment_id.as_ref()).is_some()
        {
            return Err(CommerceError::Validation(
                "payment order id is required with a payment id".into(),
            ));
        }
    }
    Ok(())
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

async fn place(
    tx: &mut dyn StoreTransaction,
    user: UserId,
    input: PlaceOrderInput,
) -> Result<PlacedOrder, CommerceError> {
    let lines = tx.cart_lines(user).await?;
    if lines.is_empty() {
        return Err(CommerceError::EmptyCart);
    }

    let priced: Vec<(CartLine, LinePrice)> = lines
        .into_iter()
        .map(|line| {
            let price = line.priced();
            (line, price)
        })
        .collect();
    let total_amount = order_total(priced.iter().map(|(_, p)| p));

    let confirmation = input.payment_info.unwrap_or_default();
    let gateway_order_id = non_empty(confirmation.order_id.as_ref());
    let status = match gateway_order_id {
        Some(gw_order) => {
            let payment = verified_payment(
                tx,
                user,
                gw_order,
                non_empty(confirmation.payment_id.as_ref()),
                total_amount + input.taxes,
            )
            .await?;
            debug!(
                gateway_order_id = gw_order,
                payment_id = %payment.id,
                "Verified payment linked"
            );
            OrderStatus::Processing
        }
        None => OrderStatus::Pending,
    };

    let now = Utc::now();
    let order = Order {
        id: OrderId::new(),
        user_id: user,
        total_amount,
        taxes: input.taxes,
        payment_method: input.payment_method.trim().to_string(),
        status,
        shipping_address: input.shipping_address,
        gateway_order_id: gateway_order_id.map(str::to_string),
        created_at: now,
        updated_at: now,
    };
    tx.insert_order(&order).await?;

    let mut items = Vec::with_capacity(priced.len());
    let mut tiers = Vec::with_capacity(priced.len());
    for (line, price) in priced {
        if !tx.decrement_stock(line.product_id, line.quantity).await? {
            let available = tx
                .product(line.product_id)
                .await?
                .map_or(0, |p| p.stock);
            return Err(CommerceError::InsufficientStock {
                product_id: line.product_id,
                product: line.product_name,
                available,
                requested: line.quantity,
            });
        }

        let item = OrderItem {
            id: OrderItemId::new(),
            order_id: order.id,
            product_id: line.product_id,
            quantity: line.quantity,
            price: price.unit_price,
            size: line.size,
            color: line.color,
            created_at: now,
        };
        tx.insert_order_item(&item).await?;
        items.push(item);
        tiers.push(price.tier);
    }

    tx.clear_cart(user).await?;

    Ok(PlacedOrder {
        total_amount: order.total_amount,
        order,
        items,
        tiers,
    })
}

/// The user's verified payment for `gateway_order_id`.
///
/// Signatures are checked once, by the payment verifier, when the attempt
/// moves to `success`. Checkout only accepts that recorded outcome.
async fn verified_payment(
    tx: &mut dyn StoreTransaction,
    user: UserId,
    gateway_order_id: &str,
    gateway_payment_id: Option<&str>,
    amount_due: Decimal,
) -> Result<Payment, CommerceError> {
    let payment = tx
        .payment_by_gateway_order(gateway_order_id)
        .await?
        .filter(|p| p.user_id == user)
        .ok_or_else(|| CommerceError::NotFound("payment".into()))?;

    if payment.status != PaymentStatus::Success {
        return Err(CommerceError::PaymentNotVerified);
    }
    if gateway_payment_id.is_some_and(|id| payment.gateway_payment_id.as_deref() != Some(id)) {
        return Err(CommerceError::Validation(
            "payment id does not match the verified payment".into(),
        ));
    }
    if payment.amount < amount_due {
        return Err(CommerceError::Validation(format!(
            "payment of {} does not cover the amount due of {amount_due}",
            payment.amount
        )));
    }
    Ok(payment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use bazaar_core::{OrderStatus, PaymentId, PaymentStatus, PriceTier, UserId};

    use super::*;
    use crate::db::{CommerceStore, InMemoryStore};
    use crate::models::PaymentConfirmation;
    use crate::services::testing::{product, seed_cart_line, seed_product, store};

    fn input() -> PlaceOrderInput {
        PlaceOrderInput {
            shipping_address: json!({"line1": "12 MG Road", "city": "Jaipur"}),
            payment_method: "COD".to_string(),
            taxes: Decimal::ZERO,
            payment_info: None,
        }
    }

    async fn cart_len(store: &InMemoryStore, user: UserId) -> usize {
        let mut tx = store.begin().await.unwrap();
        tx.cart_lines(user).await.unwrap().len()
    }

    async fn order_count(store: &InMemoryStore) -> usize {
        let mut tx = store.begin().await.unwrap();
        tx.orders(None).await.unwrap().len()
    }

    #[tokio::test]
    async fn test_pricing_tiers_at_threshold() {
        for (quantity, expected, tier) in [
            (9, 900, PriceTier::Retail),
            (10, 800, PriceTier::Wholesale),
            (11, 880, PriceTier::Wholesale),
        ] {
            let store = store();
            let user = UserId::new();
            let p = seed_product(&store, 100, 80, 10, 50).await;
            seed_cart_line(&store, user, p.id, quantity).await;

            let placed = CheckoutService::new(store.clone())
                .place_order(user, input())
                .await
                .unwrap();

            assert_eq!(placed.total_amount, Decimal::new(expected, 0));
            assert_eq!(placed.order.total_amount, Decimal::new(expected, 0));
            assert_eq!(placed.tiers, vec![tier]);
        }
    }

    #[tokio::test]
    async fn test_successful_checkout() {
        let store = store();
        let user = UserId::new();
        let a = seed_product(&store, 100, 80, 10, 20).await;
        let b = seed_product(&store, 250, 200, 0, 5).await;
        seed_cart_line(&store, user, a.id, 3).await;
        seed_cart_line(&store, user, b.id, 2).await;

        let placed = CheckoutService::new(store.clone())
            .place_order(user, input())
            .await
            .unwrap();

        assert_eq!(placed.total_amount, Decimal::new(800, 0));
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(product(&store, a.id).await.stock, 17);
        assert_eq!(product(&store, b.id).await.stock, 3);
        assert_eq!(cart_len(&store, user).await, 0);

        let item_a = placed.items.iter().find(|i| i.product_id == a.id).unwrap();
        assert_eq!(item_a.price, Decimal::new(100, 0));
        assert_eq!(item_a.quantity, 3);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let store = store();
        let err = CheckoutService::new(store.clone())
            .place_order(UserId::new(), input())
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::EmptyCart));
        assert_eq!(order_count(&store).await, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_everything_untouched() {
        let store = store();
        let user = UserId::new();
        let p = seed_product(&store, 100, 80, 10, 2).await;
        seed_cart_line(&store, user, p.id, 3).await;

        let err = CheckoutService::new(store.clone())
            .place_order(user, input())
            .await
            .unwrap_err();

        match err {
            CommerceError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            } => {
                assert_eq!(product_id, p.id);
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(product(&store, p.id).await.stock, 2);
        assert_eq!(order_count(&store).await, 0);
        assert_eq!(cart_len(&store, user).await, 1);
    }

    #[tokio::test]
    async fn test_failure_on_later_line_rolls_back_earlier_lines() {
        let store = store();
        let user = UserId::new();
        let plenty = seed_product(&store, 100, 80, 10, 50).await;
        let scarce = seed_product(&store, 300, 250, 0, 1).await;
        // Cart reads newest first, so the scarce line is processed second.
        seed_cart_line(&store, user, scarce.id, 4).await;
        seed_cart_line(&store, user, plenty.id, 5).await;

        let err = CheckoutService::new(store.clone())
            .place_order(user, input())
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::InsufficientStock { .. }));
        assert_eq!(product(&store, plenty.id).await.stock, 50);
        assert_eq!(product(&store, scarce.id).await.stock, 1);
        assert_eq!(order_count(&store).await, 0);
        assert_eq!(cart_len(&store, user).await, 2);
    }

    async fn seed_payment(
        store: &InMemoryStore,
        user: UserId,
        gateway_order_id: &str,
        status: PaymentStatus,
        amount: i64,
    ) {
        let verified = status == PaymentStatus::Success;
        let mut tx = store.begin().await.unwrap();
        tx.insert_payment(&Payment {
            id: PaymentId::new(),
            user_id: user,
            gateway_order_id: gateway_order_id.to_string(),
            gateway_payment_id: verified.then(|| format!("pay_{gateway_order_id}")),
            signature: verified.then(|| "sig".to_string()),
            amount: Decimal::new(amount, 0),
            currency: "INR".to_string(),
            status,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    fn paid_with(gateway_order_id: &str, payment_id: Option<&str>) -> PlaceOrderInput {
        let mut req = input();
        req.payment_method = "ONLINE".to_string();
        req.payment_info = Some(PaymentConfirmation {
            order_id: Some(gateway_order_id.to_string()),
            payment_id: payment_id.map(str::to_string),
            signature: Some("not-a-signature".to_string()),
            status: Some("success".to_string()),
        });
        req
    }

    async fn payment_status(store: &InMemoryStore, gateway_order_id: &str) -> PaymentStatus {
        let mut tx = store.begin().await.unwrap();
        tx.payment_by_gateway_order(gateway_order_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_verified_payment_marks_order_processing() {
        let store = store();
        let user = UserId::new();
        let p = seed_product(&store, 100, 80, 10, 5).await;
        seed_cart_line(&store, user, p.id, 1).await;
        seed_payment(&store, user, "order_abc", PaymentStatus::Success, 100).await;

        let placed = CheckoutService::new(store.clone())
            .place_order(user, paid_with("order_abc", Some("pay_order_abc")))
            .await
            .unwrap();

        assert_eq!(placed.order.status, OrderStatus::Processing);
        assert_eq!(placed.order.gateway_order_id.as_deref(), Some("order_abc"));
    }

    #[tokio::test]
    async fn test_unverified_payment_is_not_trusted() {
        let store = store();
        let victim = UserId::new();
        let attacker = UserId::new();
        let p = seed_product(&store, 100, 80, 10, 5).await;
        seed_payment(&store, victim, "order_victim", PaymentStatus::Pending, 100).await;
        seed_cart_line(&store, victim, p.id, 1).await;
        seed_cart_line(&store, attacker, p.id, 1).await;
        let checkout = CheckoutService::new(store.clone());

        // A forged payment id on someone else's attempt
        let err = checkout
            .place_order(attacker, paid_with("order_victim", Some("pay_forged")))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));

        // The owner cannot skip verification either
        let err = checkout
            .place_order(victim, paid_with("order_victim", Some("pay_forged")))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::PaymentNotVerified));

        assert_eq!(payment_status(&store, "order_victim").await, PaymentStatus::Pending);
        assert_eq!(product(&store, p.id).await.stock, 5);
        assert_eq!(order_count(&store).await, 0);
        assert_eq!(cart_len(&store, victim).await, 1);
    }

    #[tokio::test]
    async fn test_failed_payment_cannot_pay_for_an_order() {
        let store = store();
        let user = UserId::new();
        let p = seed_product(&store, 100, 80, 10, 5).await;
        seed_cart_line(&store, user, p.id, 1).await;
        seed_payment(&store, user, "order_f", PaymentStatus::Failed, 100).await;

        let err = CheckoutService::new(store.clone())
            .place_order(user, paid_with("order_f", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::PaymentNotVerified));
        assert_eq!(payment_status(&store, "order_f").await, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_payment_must_match_and_cover_the_order() {
        let store = store();
        let user = UserId::new();
        let p = seed_product(&store, 100, 80, 10, 5).await;
        seed_cart_line(&store, user, p.id, 2).await;
        seed_payment(&store, user, "order_small", PaymentStatus::Success, 150).await;
        let checkout = CheckoutService::new(store.clone());

        let err = checkout
            .place_order(user, paid_with("order_small", Some("pay_other")))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));

        let err = checkout
            .place_order(user, paid_with("order_small", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(ref m) if m.contains("does not cover")));
        assert_eq!(product(&store, p.id).await.stock, 5);
    }

    #[tokio::test]
    async fn test_payment_pays_for_one_order_only() {
        let store = store();
        let user = UserId::new();
        let p = seed_product(&store, 100, 80, 10, 5).await;
        seed_payment(&store, user, "order_once", PaymentStatus::Success, 100).await;
        let checkout = CheckoutService::new(store.clone());

        seed_cart_line(&store, user, p.id, 1).await;
        checkout
            .place_order(user, paid_with("order_once", None))
            .await
            .unwrap();

        seed_cart_line(&store, user, p.id, 1).await;
        let err = checkout
            .place_order(user, paid_with("order_once", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Conflict(_)));
        assert_eq!(product(&store, p.id).await.stock, 4);
        assert_eq!(order_count(&store).await, 1);
    }

    #[tokio::test]
    async fn test_payment_id_without_gateway_order_rejected() {
        let store = store();
        let mut req = input();
        req.payment_info = Some(PaymentConfirmation {
            payment_id: Some("pay_orphan".to_string()),
            ..PaymentConfirmation::default()
        });

        let err = CheckoutService::new(store)
            .place_order(UserId::new(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_failed_payment_confirmation_rejected() {
        let store = store();
        let user = UserId::new();
        let p = seed_product(&store, 100, 80, 10, 5).await;
        seed_cart_line(&store, user, p.id, 1).await;

        let mut req = input();
        req.payment_info = Some(PaymentConfirmation {
            status: Some("FAILED".to_string()),
            ..PaymentConfirmation::default()
        });

        let err = CheckoutService::new(store.clone())
            .place_order(user, req)
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::Validation(_)));
        assert_eq!(cart_len(&store, user).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let store = store();
        let p = seed_product(&store, 100, 80, 0, 5).await;
        let users: Vec<UserId> = (0..8).map(|_| UserId::new()).collect();
        for user in &users {
            seed_cart_line(&store, *user, p.id, 2).await;
        }

        let service = CheckoutService::new(store.clone());
        let handles: Vec<_> = users
            .iter()
            .map(|user| {
                let service = service.clone();
                let user = *user;
                tokio::spawn(async move { service.place_order(user, input()).await })
            })
            .collect();

        let mut placed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(CommerceError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(placed, 2);
        assert_eq!(product(&store, p.id).await.stock, 1);
        assert_eq!(order_count(&store).await, 2);
    }

    #[tokio::test]
    async fn test_null_address_rejected_before_store() {
        let store: Arc<InMemoryStore> = store();
        let mut req = input();
        req.shipping_address = serde_json::Value::Null;

        let err = CheckoutService::new(store)
            .place_order(UserId::new(), req)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }
}
