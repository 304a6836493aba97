//! Storekeep Admin library.
//!
//! The administration backend for a small e-commerce catalog: admin login,
//! the category tree and products. Exposed as a library so the binary, the
//! CLI and the integration tests share one implementation.
//!
//! # Request flow
//!
//! ```text
//! axum fallback -> routing::dispatch -> route match -> guard chain -> handler
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod routing;
pub mod services;
pub mod state;
