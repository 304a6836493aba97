//! Core types for Storekeep.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category_code;
pub mod id;
pub mod password;
pub mod price;

pub use category_code::{CategoryCode, CategoryCodeError, MAX_CATEGORY_CODE_LEN};
pub use id::*;
pub use password::{PASSWORD_SPECIAL_CHARS, PasswordError, validate_password};
pub use price::{Price, PriceError};
