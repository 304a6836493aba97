//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{AdminConfig, ConfigError};
use crate::db::Stores;
use crate::routing::{RouteError, RouteTable};
use crate::services::{AuthService, CategoryService, FieldCipher, ImageUploader, ProductService};

/// Errors building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route table error: {0}")]
    Routes(#[from] RouteError),
}

/// Application state shared across all handlers.
///
/// Built once at startup and cloned cheaply into every request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    stores: Stores,
    cipher: FieldCipher,
    uploader: ImageUploader,
    routes: RouteTable,
}

impl AppState {
    /// Build the state: derive the cipher from the configured key and
    /// compile the route table.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the encryption key is invalid or a route
    /// pattern fails to compile.
    pub fn new(config: AdminConfig, stores: Stores) -> Result<Self, StateError> {
        let cipher = FieldCipher::new(&config.encryption_key_bytes()?);
        let uploader = ImageUploader::new(config.upload_dir.clone());
        let routes = crate::routes::route_table()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                cipher,
                uploader,
                routes,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    #[must_use]
    pub fn uploader(&self) -> &ImageUploader {
        &self.inner.uploader
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            &self.inner.stores,
            &self.inner.cipher,
            self.inner.config.session_ttl,
        )
    }

    #[must_use]
    pub fn categories(&self) -> CategoryService<'_> {
        CategoryService::new(&self.inner.stores)
    }

    #[must_use]
    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(&self.inner.stores, &self.inner.uploader)
    }
}
