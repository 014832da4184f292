//! Employee administration.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use bazaar_core::{Email, EmployeeId, EmployeeStatus};

use super::{CommerceError, abort};
use crate::db::CommerceStore;
use crate::models::{Employee, EmployeeView, Holding, NewEmployee, StockLog, UpdateEmployee};

/// Default page size for audit log reads.
pub const DEFAULT_LOG_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn CommerceStore>,
}

impl EmployeeService {
    #[must_use]
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`CommerceError::Persistence`] if the store read fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<EmployeeView>, CommerceError> {
        let mut tx = self.store.begin().await?;
        let employees = tx.employees().await?;
        tx.commit().await?;
        Ok(employees.into_iter().map(EmployeeView::from).collect())
    }

    /// # Errors
    ///
    /// Returns [`CommerceError::EmployeeNotFound`] for unknown employees.
    #[instrument(skip(self), fields(employee_id = %id))]
    pub async fn get(&self, id: EmployeeId) -> Result<EmployeeView, CommerceError> {
        let mut tx = self.store.begin().await?;
        let employee = tx.employee(id).await?;
        tx.commit().await?;
        employee
            .map(EmployeeView::from)
            .ok_or(CommerceError::EmployeeNotFound(id))
    }

    /// Register a new employee with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing fields or a malformed email,
    /// and [`CommerceError::Conflict`] if the email is already registered.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewEmployee) -> Result<Employee, CommerceError> {
        let name = required("name", &input.name)?;
        let phone = required("phone", &input.phone)?;
        let email = Email::parse(&input.email)?;

        let mut tx = self.store.begin().await?;
        if tx.employee_by_email(&email).await?.is_some() {
            return Err(CommerceError::Conflict(format!(
                "employee with email {email} already exists"
            )));
        }

        let now = Utc::now();
        let employee = Employee {
            id: EmployeeId::new(),
            name,
            email,
            phone,
            status: EmployeeStatus::Active,
            total_assigned_stock: 0,
            total_sold: 0,
            join_date: now,
            created_at: now,
            updated_at: now,
        };
        tx.insert_employee(&employee).await?;
        tx.commit().await?;

        info!(employee_id = %employee.id, "Employee created");
        Ok(employee)
    }

    /// Update contact details. Counters are never touched here.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::EmployeeNotFound`], a validation error, or
    /// [`CommerceError::Conflict`] when the new email belongs to someone else.
    #[instrument(skip(self, update), fields(employee_id = %id))]
    pub async fn update(
        &self,
        id: EmployeeId,
        update: UpdateEmployee,
    ) -> Result<Employee, CommerceError> {
        let name = update.name.as_deref().map(|n| required("name", n)).transpose()?;
        let phone = update
            .phone
            .as_deref()
            .map(|p| required("phone", p))
            .transpose()?;
        let email = update.email.as_deref().map(Email::parse).transpose()?;

        let mut tx = self.store.begin().await?;
        let mut employee = tx
            .employee_for_update(id)
            .await?
            .ok_or(CommerceError::EmployeeNotFound(id))?;

        if let Some(email) = email {
            if let Some(other) = tx.employee_by_email(&email).await? {
                if other.id != id {
                    return Err(CommerceError::Conflict(format!(
                        "employee with email {email} already exists"
                    )));
                }
            }
            employee.email = email;
        }
        if let Some(name) = name {
            employee.name = name;
        }
        if let Some(phone) = phone {
            employee.phone = phone;
        }
        employee.updated_at = Utc::now();

        tx.update_employee(&employee).await?;
        tx.commit().await?;
        Ok(employee)
    }

    /// Flip between active and inactive.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::EmployeeNotFound`] for unknown employees.
    #[instrument(skip(self), fields(employee_id = %id))]
    pub async fn toggle_status(&self, id: EmployeeId) -> Result<Employee, CommerceError> {
        let mut tx = self.store.begin().await?;
        let mut employee = tx
            .employee_for_update(id)
            .await?
            .ok_or(CommerceError::EmployeeNotFound(id))?;
        employee.status = employee.status.toggled();
        employee.updated_at = Utc::now();
        tx.update_employee(&employee).await?;
        tx.commit().await?;

        info!(status = %employee.status, "Employee status toggled");
        Ok(employee)
    }

    /// Retire an employee who has accounted for all delegated stock.
    ///
    /// The employee disappears from every listing and can no longer receive
    /// stock. Holdings and stock logs are kept, so the audit trail still
    /// shows what they carried and sold.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::EmployeeNotFound`] for unknown employees and
    /// [`CommerceError::OutstandingLiability`] while they still hold unsold
    /// stock.
    #[instrument(skip(self), fields(employee_id = %id))]
    pub async fn delete(&self, id: EmployeeId) -> Result<(), CommerceError> {
        let mut tx = self.store.begin().await?;
        let Some(employee) = tx.employee_for_update(id).await? else {
            return abort(tx, CommerceError::EmployeeNotFound(id)).await;
        };
        let remaining = employee.remaining_liability();
        if remaining > 0 {
            warn!(remaining, "Refusing to delete employee with outstanding stock");
            return abort(
                tx,
                CommerceError::OutstandingLiability {
                    employee_id: id,
                    remaining,
                },
            )
            .await;
        }
        if !tx.retire_employee(id, Utc::now()).await? {
            return abort(tx, CommerceError::EmployeeNotFound(id)).await;
        }
        tx.commit().await?;
        info!("Employee retired");
        Ok(())
    }

    /// Non-empty holdings, most recently assigned first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::EmployeeNotFound`] for unknown employees.
    #[instrument(skip(self), fields(employee_id = %id))]
    pub async fn holdings(&self, id: EmployeeId) -> Result<Vec<Holding>, CommerceError> {
        let mut tx = self.store.begin().await?;
        if tx.employee(id).await?.is_none() {
            return Err(CommerceError::EmployeeNotFound(id));
        }
        let holdings = tx.holdings(id).await?;
        tx.commit().await?;
        Ok(holdings)
    }

    /// Audit trail, newest first. `None` reads across all employees.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::EmployeeNotFound`] if a given employee does
    /// not exist.
    #[instrument(skip(self))]
    pub async fn stock_logs(
        &self,
        employee: Option<EmployeeId>,
        limit: Option<i64>,
    ) -> Result<Vec<StockLog>, CommerceError> {
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, 1000);

        let mut tx = self.store.begin().await?;
        if let Some(id) = employee {
            if tx.employee(id).await?.is_none() {
                return Err(CommerceError::EmployeeNotFound(id));
            }
        }
        let logs = tx.stock_logs(employee, limit).await?;
        tx.commit().await?;
        Ok(logs)
    }
}

fn required(field: &str, value: &str) -> Result<String, CommerceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CommerceError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}
