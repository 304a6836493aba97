//! Storekeep Core - Shared domain types.
//!
//! This crate provides common types used across all Storekeep components:
//! - `admin` - Administration backend (categories, products, admin auth)
//! - `cli` - Command-line tools for migrations and admin provisioning
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no
//! database access, no HTTP. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, category codes and the password policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
