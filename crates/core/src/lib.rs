//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types used across all Bazaar components:
//! - `server` - Storefront and admin HTTP API
//! - `cli` - Command-line tools for migrations, seeding and stock operations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The checkout pricing rule lives here so that both
//! the engine and any caller previewing a cart compute totals identically.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, quantities, prices, emails and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
