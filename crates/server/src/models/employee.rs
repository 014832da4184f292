//! Back-office employees and the stock they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{
    Email, EmployeeId, EmployeeStatus, HoldingId, ProductId, StockLogId, StockLogKind,
};

/// A field employee who sells delegated stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub status: EmployeeStatus,
    /// Cumulative units ever assigned. Never decreases.
    pub total_assigned_stock: i32,
    /// Cumulative units reported sold. Never decreases.
    pub total_sold: i32,
    pub join_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Units the employee still has to account for.
    #[must_use]
    pub const fn remaining_liability(&self) -> i32 {
        self.total_assigned_stock - self.total_sold
    }
}

/// Per-product units currently with an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub id: HoldingId,
    pub employee_id: EmployeeId,
    pub product_id: ProductId,
    pub quantity_assigned: i32,
    pub assigned_at: DateTime<Utc>,
}

/// Audit trail entry. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLog {
    pub id: StockLogId,
    pub employee_id: EmployeeId,
    pub product_id: Option<ProductId>,
    #[serde(rename = "type")]
    pub kind: StockLogKind,
    pub quantity: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Employee counters after a stock operation, with the touched holding.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeLedger {
    pub employee: Employee,
    pub remaining_liability: i32,
    pub holding: Option<Holding>,
    pub log: StockLog,
}

/// An employee with their outstanding liability.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    #[serde(flatten)]
    pub employee: Employee,
    pub remaining_liability: i32,
}

impl From<Employee> for EmployeeView {
    fn from(employee: Employee) -> Self {
        Self {
            remaining_liability: employee.remaining_liability(),
            employee,
        }
    }
}

/// Stock assignment request.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignStock {
    pub employee_id: EmployeeId,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Self-reported sale request.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSale {
    pub employee_id: EmployeeId,
    pub quantity: i64,
}
