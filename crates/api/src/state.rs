//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::CartClient;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    #[error("failed to build cart gateway client: {0}")]
    CartClient(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    cart: Option<CartClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The cart gateway client is built only when `WISHBOX_CART_URL` is
    /// configured; without it, move-to-cart removals keep the item.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart gateway client cannot be constructed.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateInitError> {
        let cart = config
            .cart_url
            .clone()
            .map(CartClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, pool, cart }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the cart gateway client, if one is configured.
    #[must_use]
    pub fn cart(&self) -> Option<&CartClient> {
        self.inner.cart.as_ref()
    }
}
