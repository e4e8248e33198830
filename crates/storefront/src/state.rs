//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::cloudinary::CloudinaryStore;
use crate::config::StorefrontConfig;
use crate::firebase::{FirebaseIdentity, FirestoreCatalog};
use crate::middleware::SessionLocks;
use crate::services::{
    Catalog, CatalogEditor, IdentityProvider, ImageStore, PaymentError, PaymentGateway,
};
use crate::stripe::StripeGateway;

/// External collaborators the storefront talks to.
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn Catalog>,
    pub editor: Arc<dyn CatalogEditor>,
    pub payments: Arc<dyn PaymentGateway>,
    pub images: Arc<dyn ImageStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Services {
    /// Build the production clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, PaymentError> {
        // One client for reads and writes, so writes clear the read cache.
        let catalog = Arc::new(FirestoreCatalog::new(&config.firebase));
        Ok(Self {
            catalog: catalog.clone(),
            editor: catalog,
            payments: Arc::new(StripeGateway::new(&config.stripe)?),
            images: Arc::new(CloudinaryStore::new(&config.cloudinary)),
            identity: Arc::new(FirebaseIdentity::new(&config.firebase)),
        })
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the session database, configuration and
/// external service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    services: Services,
    session_locks: SessionLocks,
}

impl AppState {
    /// Create a new application state with the production clients.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `SQLite` pool backing the session store
    ///
    /// # Errors
    ///
    /// Returns an error if a service client cannot be built.
    pub fn new(config: StorefrontConfig, pool: SqlitePool) -> Result<Self, PaymentError> {
        let services = Services::from_config(&config)?;
        Ok(Self::with_services(config, pool, services))
    }

    /// Create an application state with explicit collaborators.
    #[must_use]
    pub fn with_services(config: StorefrontConfig, pool: SqlitePool, services: Services) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                services,
                session_locks: SessionLocks::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session database pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.inner.services.catalog.as_ref()
    }

    /// Admin catalog writes.
    #[must_use]
    pub fn editor(&self) -> &dyn CatalogEditor {
        self.inner.services.editor.as_ref()
    }

    /// Payment gateway.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.services.payments.as_ref()
    }

    /// Image store.
    #[must_use]
    pub fn images(&self) -> &dyn ImageStore {
        self.inner.services.images.as_ref()
    }

    /// Identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.services.identity.as_ref()
    }

    /// Per-session request locks.
    #[must_use]
    pub fn session_locks(&self) -> &SessionLocks {
        &self.inner.session_locks
    }
}
