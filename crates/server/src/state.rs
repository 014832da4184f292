//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::CommerceStore;
use crate::error::AppError;
use crate::services::{
    CartService, CatalogService, CheckoutService, EmployeeService, HmacPaymentVerifier,
    OrderService, PaymentService, PaymentVerifier, SettingsService, StockService,
    WishlistService,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn CommerceStore>,
    verifier: Option<Arc<dyn PaymentVerifier>>,
}

impl AppState {
    /// Build state from configuration and an already-connected store.
    #[must_use]
    pub fn new(config: &ServerConfig, store: Arc<dyn CommerceStore>) -> Self {
        let verifier = config
            .payment_key_secret
            .clone()
            .map(|secret| Arc::new(HmacPaymentVerifier::new(secret)) as Arc<dyn PaymentVerifier>);
        Self::with_verifier(store, verifier)
    }

    #[must_use]
    pub fn with_verifier(
        store: Arc<dyn CommerceStore>,
        verifier: Option<Arc<dyn PaymentVerifier>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, verifier }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CommerceStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn cart(&self) -> CartService {
        CartService::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn wishlist(&self) -> WishlistService {
        WishlistService::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn orders(&self) -> OrderService {
        OrderService::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn employees(&self) -> EmployeeService {
        EmployeeService::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn stock(&self) -> StockService {
        StockService::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn settings(&self) -> SettingsService {
        SettingsService::new(Arc::clone(&self.inner.store))
    }

    /// Payment service, if a gateway key secret is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceUnavailable`] when verification is disabled.
    pub fn payments(&self) -> Result<PaymentService, AppError> {
        self.inner
            .verifier
            .as_ref()
            .map(|verifier| PaymentService::new(Arc::clone(&self.inner.store), Arc::clone(verifier)))
            .ok_or_else(|| {
                AppError::ServiceUnavailable("payment verification is not configured".into())
            })
    }
}
