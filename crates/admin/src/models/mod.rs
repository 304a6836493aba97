//! Domain models for the admin backend.

pub mod admin_user;
pub mod category;
pub mod product;
pub mod session;

pub use admin_user::{AdminUser, AuthToken};
pub use category::{Category, CategoryDraft, CategoryInput};
pub use product::{NewProduct, Product, ProductListing, ProductStats};
pub use session::{AUTH_COOKIE_NAME, AuthCookie, SessionClaims};
