//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::PgStore;
use crate::services::{CertificateService, ProgressService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Services are built per request
/// from it; nothing request-specific is cached here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: PgStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store: PgStore::new(pool),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.inner.store.pool()
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &PgStore {
        &self.inner.store
    }

    /// Progress service for the current request.
    #[must_use]
    pub fn progress(&self) -> ProgressService<'_, PgStore> {
        ProgressService::new(&self.inner.store)
    }

    /// Certificate service for the current request.
    #[must_use]
    pub fn certificates(&self) -> CertificateService<'_, PgStore> {
        CertificateService::new(&self.inner.store, &self.inner.config.certificates)
    }
}
