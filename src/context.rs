use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::SqlHelperError;
use crate::provider::{ConnectionHandle, ConnectionProvider, HandleId};

/// Identity of one execution context, unique per `Database`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// One logical unit of work (e.g. one request) and the connection it reuses.
///
/// The context owns at most one [`ConnectionHandle`]. The first statement
/// acquires it from the provider, later statements reuse it, and
/// [`close_connection`](Self::close_connection) releases it. The context is
/// not `Clone` and every connection-touching method takes `&mut self`, so a
/// cached handle can never be reached from another context.
///
/// ```rust,no_run
/// use sql_helper::prelude::*;
///
/// # async fn demo() -> Result<(), SqlHelperError> {
/// let db = Database::connect(DatabaseOptions::sqlite("app.db")).await?;
/// let mut ctx = db.begin_context();
/// let first = ctx.get_connection().await?.id();
/// let again = ctx.get_connection().await?.id();
/// assert_eq!(first, again);
/// ctx.close_connection().await;
/// # Ok(()) }
/// ```
pub struct ExecutionContext {
    id: ContextId,
    provider: Arc<ConnectionProvider>,
    slot: Option<ConnectionHandle>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("connection", &self.connection_id())
            .finish()
    }
}

impl ExecutionContext {
    pub(crate) fn new(id: ContextId, provider: Arc<ConnectionProvider>) -> Self {
        Self {
            id,
            provider,
            slot: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    #[must_use]
    pub fn has_connection(&self) -> bool {
        self.slot.is_some()
    }

    /// Id of the cached handle, if one is cached.
    #[must_use]
    pub fn connection_id(&self) -> Option<HandleId> {
        self.slot.as_ref().map(ConnectionHandle::id)
    }

    /// Return the cached handle, acquiring and caching one on first use.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConnectionError` if the provider cannot supply
    /// a connection; nothing is cached in that case.
    pub async fn get_connection(&mut self) -> Result<&mut ConnectionHandle, SqlHelperError> {
        let handle = match self.slot.take() {
            Some(handle) => handle,
            None => match self.provider.acquire().await {
                Ok(handle) => {
                    info!(context = %self.id, handle = %handle.id(), "created connection");
                    handle
                }
                Err(e) => {
                    error!(context = %self.id, error = %e, "get connection failure");
                    return Err(e);
                }
            },
        };
        Ok(self.slot.insert(handle))
    }

    /// Close and evict the cached handle, if any.
    ///
    /// The handle leaves the slot before closing, so a failed close still
    /// evicts it. Close failures are logged and swallowed. Calling this with
    /// nothing cached is a no-op.
    pub async fn close_connection(&mut self) {
        let Some(handle) = self.slot.take() else {
            return;
        };
        let handle_id = handle.id();
        match handle.close().await {
            Ok(()) => info!(context = %self.id, handle = %handle_id, "destroyed connection"),
            Err(e) => {
                error!(context = %self.id, handle = %handle_id, error = %e, "close connection failure");
            }
        }
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        if let Some(handle) = self.slot.take() {
            warn!(
                context = %self.id,
                handle = %handle.id(),
                "execution context dropped without close_connection"
            );
        }
    }
}
