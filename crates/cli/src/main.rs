//! Bazaar CLI - Database migrations and back-office tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bazaar migrate
//!
//! # Load demo products and employees
//! bazaar seed
//!
//! # Hand 10 units of a product to an employee
//! bazaar stock assign -e <employee-id> -p <product-id> -q 10
//!
//! # Record 4 units sold by an employee
//! bazaar stock sale -e <employee-id> -q 4
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert demo catalog and employees into an empty database
//! - `stock assign` / `stock sale` - Stock delegation without the admin UI

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use bazaar_core::{EmployeeId, ProductId};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed an empty database with demo data
    Seed,
    /// Delegate stock to field employees
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// Move warehouse units to an employee
    Assign {
        /// Employee UUID
        #[arg(short, long)]
        employee: EmployeeId,

        /// Product UUID
        #[arg(short, long)]
        product: ProductId,

        /// Units to hand over
        #[arg(short, long)]
        quantity: i64,
    },
    /// Record units sold by an employee
    Sale {
        /// Employee UUID
        #[arg(short, long)]
        employee: EmployeeId,

        /// Units sold
        #[arg(short, long)]
        quantity: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Stock { action } => match action {
            StockAction::Assign {
                employee,
                product,
                quantity,
            } => commands::stock::assign(employee, product, quantity).await?,
            StockAction::Sale { employee, quantity } => {
                commands::stock::sale(employee, quantity).await?;
            }
        },
    }
    Ok(())
}
