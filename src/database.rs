use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::config::DatabaseOptions;
use crate::context::{ContextId, ExecutionContext};
use crate::error::SqlHelperError;
use crate::provider::ConnectionProvider;
use crate::types::ConnectionStrategy;

/// Configuration plus connection provider for one datastore.
///
/// Create it once at startup and hand out an [`ExecutionContext`] per unit of
/// work.
#[derive(Debug)]
pub struct Database {
    options: DatabaseOptions,
    provider: Arc<ConnectionProvider>,
    next_context: AtomicU64,
}

impl Database {
    /// Set up the connection provider described by `options`.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConfigError` for invalid options or
    /// `SqlHelperError::ConnectionError` if the pool cannot be built.
    pub async fn connect(options: DatabaseOptions) -> Result<Self, SqlHelperError> {
        let provider = ConnectionProvider::new(&options).await?;
        info!(
            driver = ?options.driver,
            url = %options.url,
            strategy = ?options.strategy,
            "database ready"
        );
        Ok(Self {
            options,
            provider: Arc::new(provider),
            next_context: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    #[must_use]
    pub fn strategy(&self) -> ConnectionStrategy {
        self.provider.strategy()
    }

    /// Start a new execution context with an empty connection slot.
    #[must_use]
    pub fn begin_context(&self) -> ExecutionContext {
        let id = ContextId(self.next_context.fetch_add(1, Ordering::Relaxed));
        ExecutionContext::new(id, Arc::clone(&self.provider))
    }
}
