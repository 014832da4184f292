//! Stock delegation from the command line.
//!
//! Runs the same transactional workflow as the admin API.

use bazaar_core::{EmployeeId, ProductId};
use bazaar_server::models::EmployeeLedger;
use bazaar_server::services::StockService;

use super::{CliError, connect_shared};

/// Hand `quantity` warehouse units of `product` to `employee`.
pub async fn assign(
    employee: EmployeeId,
    product: ProductId,
    quantity: i64,
) -> Result<(), CliError> {
    let service = StockService::new(connect_shared().await?);
    let ledger = service.assign(employee, product, quantity).await?;
    report(&ledger);
    Ok(())
}

/// Record `quantity` units sold by `employee`.
pub async fn sale(employee: EmployeeId, quantity: i64) -> Result<(), CliError> {
    let service = StockService::new(connect_shared().await?);
    let ledger = service.record_sale(employee, quantity).await?;
    report(&ledger);
    Ok(())
}

fn report(ledger: &EmployeeLedger) {
    tracing::info!(
        employee = %ledger.employee.name,
        assigned = ledger.employee.total_assigned_stock,
        sold = ledger.employee.total_sold,
        remaining_liability = ledger.remaining_liability,
        log_id = %ledger.log.id,
        "Ledger updated"
    );
}
