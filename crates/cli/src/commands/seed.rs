//! Seed an empty database with a demo catalog and two field employees.
//!
//! Refuses to run when products already exist so it can't duplicate the
//! catalog on a live database.

use rust_decimal::Decimal;
use tracing::{info, warn};

use bazaar_server::models::{NewEmployee, NewProduct};
use bazaar_server::services::{CatalogService, CommerceError, EmployeeService};

use super::{CliError, connect_shared};

struct DemoProduct {
    name: &'static str,
    category: &'static str,
    price: i64,
    wholesale_price: i64,
    bulk_threshold: i32,
    stock: i32,
    sizes: &'static [&'static str],
    colors: &'static [&'static str],
}

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Block Print Kurta",
        category: "kurta",
        price: 1000,
        wholesale_price: 800,
        bulk_threshold: 10,
        stock: 120,
        sizes: &["S", "M", "L", "XL"],
        colors: &["indigo", "rust"],
    },
    DemoProduct {
        name: "Cotton Dupatta",
        category: "dupatta",
        price: 450,
        wholesale_price: 360,
        bulk_threshold: 20,
        stock: 300,
        sizes: &["Free"],
        colors: &[],
    },
    DemoProduct {
        name: "Chikankari Top",
        category: "top",
        price: 1450,
        wholesale_price: 0,
        bulk_threshold: 0,
        stock: 60,
        sizes: &["S", "M", "L"],
        colors: &["white"],
    },
];

const EMPLOYEES: &[(&str, &str, &str)] = &[
    ("Asha Verma", "asha@bazaar.example", "9800000001"),
    ("Ravi Nair", "ravi@bazaar.example", "9800000002"),
];

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Insert demo data through the regular services.
pub async fn run() -> Result<(), CliError> {
    let store = connect_shared().await?;
    let catalog = CatalogService::new(store.clone());
    let employees = EmployeeService::new(store);

    if !catalog.list_products(false).await?.is_empty() {
        warn!("Products already exist, skipping seed");
        return Ok(());
    }

    for demo in PRODUCTS {
        let product = catalog
            .create_product(NewProduct {
                name: demo.name.to_string(),
                description: None,
                category: Some(demo.category.to_string()),
                price: Decimal::new(demo.price, 0),
                wholesale_price: Decimal::new(demo.wholesale_price, 0),
                bulk_threshold: demo.bulk_threshold,
                stock: demo.stock,
                is_active: true,
                gender: Some("women".to_string()),
                image_url: None,
                images: Vec::new(),
                sizes: owned(demo.sizes),
                colors: owned(demo.colors),
                is_new: true,
                is_sale: false,
                sale_percent: 0,
            })
            .await?;
        info!(product_id = %product.id, name = %product.name, "Seeded product");
    }

    for (name, email, phone) in EMPLOYEES {
        let input = NewEmployee {
            name: (*name).to_string(),
            email: (*email).to_string(),
            phone: (*phone).to_string(),
        };
        match employees.create(input).await {
            Ok(employee) => info!(employee_id = %employee.id, %email, "Seeded employee"),
            Err(CommerceError::Conflict(_)) => warn!(%email, "Employee exists, skipped"),
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seed complete!");
    Ok(())
}
