//! Stock delegation.
//!
//! Warehouse stock is handed to field employees ("assign") and employees
//! later self-report how much of it they sold ("sale"). Each operation is
//! one transaction; a partial assignment would lose inventory.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use bazaar_core::{
    EmployeeId, EmployeeStatus, ProductId, Quantity, StockLogId, StockLogKind,
};

use super::{CommerceError, abort};
use crate::db::{CommerceStore, StoreTransaction};
use crate::models::{EmployeeLedger, StockLog};

/// Moves stock between the warehouse and employees.
#[derive(Clone)]
pub struct StockService {
    store: Arc<dyn CommerceStore>,
}

impl StockService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// Delegate `quantity` units of a product from the warehouse to an
    /// employee.
    ///
    /// Decrements warehouse stock, adds to the (employee, product) holding,
    /// raises the employee's assigned counter and appends an `ASSIGN` log
    /// entry, all or nothing.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::InvalidQuantity`] if `quantity` is not positive
    /// - [`CommerceError::EmployeeNotFound`] / [`CommerceError::EmployeeInactive`]
    /// - [`CommerceError::ProductNotFound`]
    /// - [`CommerceError::InsufficientStock`] if the warehouse holds fewer
    ///   than `quantity` units
    #[instrument(skip(self), fields(employee_id = %employee, product_id = %product))]
    pub async fn assign(
        &self,
        employee: EmployeeId,
        product: ProductId,
        quantity: i64,
    ) -> Result<EmployeeLedger, CommerceError> {
        let quantity = Quantity::new(quantity)?;

        let mut tx = self.store.begin().await?;
        match assign_in(tx.as_mut(), employee, product, quantity).await {
            Ok(ledger) => {
                tx.commit().await?;
                info!(
                    quantity = quantity.get(),
                    remaining_liability = ledger.remaining_liability,
                    "Stock assigned"
                );
                Ok(ledger)
            }
            Err(err) => {
                warn!(error = %err, "Stock assignment rejected");
                abort(tx, err).await
            }
        }
    }

    /// Record that an employee sold `quantity` of the units they carry.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::InvalidQuantity`] if `quantity` is not positive
    /// - [`CommerceError::EmployeeNotFound`]
    /// - [`CommerceError::ExcessSale`] if `quantity` exceeds the remaining
    ///   liability
    #[instrument(skip(self), fields(employee_id = %employee))]
    pub async fn record_sale(
        &self,
        employee: EmployeeId,
        quantity: i64,
    ) -> Result<EmployeeLedger, CommerceError> {
        let quantity = Quantity::new(quantity)?;

        let mut tx = self.store.begin().await?;
        match record_sale_in(tx.as_mut(), employee, quantity).await {
            Ok(ledger) => {
                tx.commit().await?;
                info!(
                    quantity = quantity.get(),
                    remaining_liability = ledger.remaining_liability,
                    "Sale recorded"
                );
                Ok(ledger)
            }
            Err(err) => {
                warn!(error = %err, "Sale rejected");
                abort(tx, err).await
            }
        }
    }
}

async fn assign_in(
    tx: &mut dyn StoreTransaction,
    employee_id: EmployeeId,
    product_id: ProductId,
    quantity: Quantity,
) -> Result<EmployeeLedger, CommerceError> {
    let employee = tx
        .employee_for_update(employee_id)
        .await?
        .ok_or(CommerceError::EmployeeNotFound(employee_id))?;
    if employee.status != EmployeeStatus::Active {
        return Err(CommerceError::EmployeeInactive(employee_id));
    }

    let product = tx
        .product_for_update(product_id)
        .await?
        .ok_or(CommerceError::ProductNotFound(product_id))?;
    let requested = quantity.get();
    let insufficient = || CommerceError::InsufficientStock {
        product_id,
        product: product.name.clone(),
        available: product.stock,
        requested,
    };
    if product.stock < requested {
        return Err(insufficient());
    }
    if !tx.decrement_stock(product_id, requested).await? {
        return Err(insufficient());
    }

    let now = Utc::now();
    let holding = tx
        .upsert_holding(employee_id, product_id, requested, now)
        .await?;
    tx.add_assigned_stock(employee_id, requested, now).await?;

    let log = StockLog {
        id: StockLogId::new(),
        employee_id,
        product_id: Some(product_id),
        kind: StockLogKind::Assign,
        quantity: requested,
        note: Some(format!("Assigned {requested} pcs of {}", product.name)),
        created_at: now,
    };
    tx.append_stock_log(&log).await?;

    let employee = tx
        .employee(employee_id)
        .await?
        .ok_or(CommerceError::EmployeeNotFound(employee_id))?;
    Ok(EmployeeLedger {
        remaining_liability: employee.remaining_liability(),
        employee,
        holding: Some(holding),
        log,
    })
}

async fn record_sale_in(
    tx: &mut dyn StoreTransaction,
    employee_id: EmployeeId,
    quantity: Quantity,
) -> Result<EmployeeLedger, CommerceError> {
    let employee = tx
        .employee_for_update(employee_id)
        .await?
        .ok_or(CommerceError::EmployeeNotFound(employee_id))?;

    let requested = quantity.get();
    let available = employee.remaining_liability();
    if requested > available {
        return Err(CommerceError::ExcessSale {
            requested,
            available,
        });
    }

    let now = Utc::now();
    tx.add_sold(employee_id, requested, now).await?;

    let log = StockLog {
        id: StockLogId::new(),
        employee_id,
        product_id: None,
        kind: StockLogKind::Sale,
        quantity: requested,
        note: Some(format!("Reported sale of {requested} mixed pieces")),
        created_at: now,
    };
    tx.append_stock_log(&log).await?;

    let employee = tx
        .employee(employee_id)
        .await?
        .ok_or(CommerceError::EmployeeNotFound(employee_id))?;
    Ok(EmployeeLedger {
        remaining_liability: employee.remaining_liability(),
        employee,
        holding: None,
        log,
    })
}
