//! Payment gateway attempts and signature verification.
//!
//! The gateway signs `"{order_id}|{payment_id}"` with the merchant key
//! secret (HMAC-SHA256, hex encoded). A verified attempt moves from
//! `pending` to `success`; a bad signature moves it to `failed`. Both
//! outcomes are final. Checkout only accepts attempts in `success`.

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{info, instrument, warn};

use bazaar_core::{PaymentId, PaymentStatus, UserId};

use super::CommerceError;
use crate::db::CommerceStore;
use crate::models::{Payment, PaymentVerification, RegisterPayment};

const DEFAULT_CURRENCY: &str = "INR";

/// Checks gateway payment signatures.
pub trait PaymentVerifier: Send + Sync {
    /// Whether `signature` is valid for the gateway order and payment.
    fn verify(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// HMAC-SHA256 verifier keyed with the gateway key secret.
#[derive(Clone)]
pub struct HmacPaymentVerifier {
    secret: SecretString,
}

impl std::fmt::Debug for HmacPaymentVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacPaymentVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl HmacPaymentVerifier {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self, gateway_order_id: &str, payment_id: &str) -> Option<Hmac<Sha256>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes()).ok()?;
        mac.update(format!("{gateway_order_id}|{payment_id}").as_bytes());
        Some(mac)
    }

    /// Hex signature the gateway would produce for this pair.
    #[must_use]
    pub fn sign(&self, gateway_order_id: &str, payment_id: &str) -> String {
        self.mac(gateway_order_id, payment_id)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default()
    }
}

impl PaymentVerifier for HmacPaymentVerifier {
    fn verify(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };
        // verify_slice compares in constant time
        self.mac(gateway_order_id, payment_id)
            .is_some_and(|mac| mac.verify_slice(&expected).is_ok())
    }
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn CommerceStore>,
    verifier: Arc<dyn PaymentVerifier>,
}

impl PaymentService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>, verifier: Arc<dyn PaymentVerifier>) -> Self {
        Self { store, verifier }
    }

    /// Record a gateway order created for `user` as a pending attempt.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty id or non-positive amount and
    /// [`CommerceError::Conflict`] if the gateway order is already recorded.
    #[instrument(skip(self, request), fields(user_id = %user))]
    pub async fn register_attempt(
        &self,
        user: UserId,
        request: RegisterPayment,
    ) -> Result<Payment, CommerceError> {
        let gateway_order_id = request.razorpay_order_id.trim();
        if gateway_order_id.is_empty() {
            return Err(CommerceError::Validation(
                "razorpay_order_id is required".into(),
            ));
        }
        if request.amount <= Decimal::ZERO {
            return Err(CommerceError::Validation("amount must be positive".into()));
        }

        let payment = Payment {
            id: PaymentId::new(),
            user_id: user,
            gateway_order_id: gateway_order_id.to_string(),
            gateway_payment_id: None,
            signature: None,
            amount: request.amount,
            currency: request
                .currency
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };

        let mut tx = self.store.begin().await?;
        tx.insert_payment(&payment).await?;
        tx.commit().await?;

        info!(gateway_order_id = %payment.gateway_order_id, "Payment attempt registered");
        Ok(payment)
    }

    /// Verify the gateway signature for one of the user's attempts.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::NotFound`] if the attempt does not exist or
    ///   belongs to another user
    /// - [`CommerceError::PaymentSignatureInvalid`] if the signature does
    ///   not match; the attempt is marked `failed` first
    /// - [`CommerceError::Conflict`] if the attempt had already failed
    #[instrument(skip(self, request), fields(user_id = %user, gateway_order_id = %request.razorpay_order_id))]
    pub async fn verify(
        &self,
        user: UserId,
        request: PaymentVerification,
    ) -> Result<Payment, CommerceError> {
        let mut tx = self.store.begin().await?;
        let payment = tx
            .payment_by_gateway_order(&request.razorpay_order_id)
            .await?
            .filter(|p| p.user_id == user)
            .ok_or_else(|| CommerceError::NotFound("payment".into()))?;

        if payment.status == PaymentStatus::Success {
            tx.commit().await?;
            return Ok(payment);
        }

        let valid = self.verifier.verify(
            &request.razorpay_order_id,
            &request.razorpay_payment_id,
            &request.razorpay_signature,
        );

        if !valid {
            tx.mark_payment_failed(&request.razorpay_order_id).await?;
            tx.commit().await?;
            warn!("Payment signature mismatch");
            return Err(CommerceError::PaymentSignatureInvalid);
        }

        let marked = tx
            .mark_payment_success(
                &request.razorpay_order_id,
                &request.razorpay_payment_id,
                Some(&request.razorpay_signature),
            )
            .await?;
        if !marked {
            tx.rollback().await?;
            warn!(status = %payment.status, "Signature arrived for a settled payment");
            return Err(CommerceError::Conflict(format!(
                "payment already {}",
                payment.status
            )));
        }
        let payment = tx
            .payment_by_gateway_order(&request.razorpay_order_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound("payment".into()))?;
        tx.commit().await?;

        info!("Payment verified");
        Ok(payment)
    }
}
