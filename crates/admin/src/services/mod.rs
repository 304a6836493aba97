//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password login, persistent tokens and session payloads
//! - `categories` - Category tree with integrity rules
//! - `crypto` - AES-256-GCM field cipher and token helpers
//! - `products` - Product catalog, batch operations
//! - `uploads` - Product image validation and storage

pub mod auth;
pub mod categories;
pub mod crypto;
pub mod products;
pub mod uploads;

pub use auth::{AUTH_TOKEN_TTL_DAYS, AuthError, AuthOutcome, AuthService, IssuedToken};
pub use categories::{CategoryError, CategoryService};
pub use crypto::{CryptoError, FieldCipher};
pub use products::{ProductError, ProductForm, ProductService, parse_ids};
pub use uploads::{ImageUpload, ImageUploader, UploadError};
