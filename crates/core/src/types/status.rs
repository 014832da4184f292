//! Status enums for various entities.
//!
//! All of these are persisted as short text columns. `as_str()` gives the
//! stored spelling and `FromStr` parses it back; order statuses coming from
//! the admin UI are matched case-insensitively.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted status string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value} (allowed: {allowed})")]
pub struct StatusParseError {
    pub kind: &'static str,
    pub value: String,
    pub allowed: &'static str,
}

/// Order lifecycle status.
///
/// Checkout creates orders as `Pending`, or `Processing` when the payment was
/// already confirmed. Later transitions are admin actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| StatusParseError {
                kind: "order status",
                value: s.to_string(),
                allowed: "pending, processing, shipped, delivered, cancelled",
            })
    }
}

/// Employee employment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// The opposite status, used by the admin toggle.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(StatusParseError {
                kind: "employee status",
                value: s.to_string(),
                allowed: "active, inactive",
            }),
        }
    }
}

/// Payment gateway attempt status.
///
/// Moves `Pending -> Success` or `Pending -> Failed`, written once each way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(StatusParseError {
                kind: "payment status",
                value: s.to_string(),
                allowed: "pending, success, failed",
            }),
        }
    }
}

/// Kind of entry in the stock audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLogKind {
    /// Warehouse stock delegated to an employee.
    Assign,
    /// Employee self-reported a sale.
    Sale,
    /// Holding moved between employees.
    Reassign,
}

impl StockLogKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "ASSIGN",
            Self::Sale => "SALE",
            Self::Reassign => "REASSIGN",
        }
    }
}

impl fmt::Display for StockLogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockLogKind {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASSIGN" => Ok(Self::Assign),
            "SALE" => Ok(Self::Sale),
            "REASSIGN" => Ok(Self::Reassign),
            _ => Err(StatusParseError {
                kind: "stock log type",
                value: s.to_string(),
                allowed: "ASSIGN, SALE, REASSIGN",
            }),
        }
    }
}
