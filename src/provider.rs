use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bb8::{Pool, PooledConnection};
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

use crate::config::DatabaseOptions;
use crate::error::SqlHelperError;
use crate::sqlite::connection::SharedSqliteConnection;
use crate::sqlite::manager::{SqliteManager, open_shared};
use crate::types::{ConnectionStrategy, Driver};

/// Identity of one acquired connection handle, unique per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

enum HandleKind {
    Pooled(PooledConnection<'static, SqliteManager>),
    Direct(SharedSqliteConnection),
}

/// An exclusively owned session with the datastore.
///
/// Pooled handles go back to the pool when closed or dropped; direct
/// handles close the underlying `SQLite` connection.
pub struct ConnectionHandle {
    id: HandleId,
    kind: HandleKind,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            HandleKind::Pooled(_) => "pooled",
            HandleKind::Direct(_) => "direct",
        };
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("kind", &kind)
            .finish()
    }
}

impl ConnectionHandle {
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn is_pooled(&self) -> bool {
        matches!(self.kind, HandleKind::Pooled(_))
    }

    /// The underlying connection, for running one statement.
    pub(crate) fn shared(&self) -> SharedSqliteConnection {
        match &self.kind {
            HandleKind::Pooled(conn) => Arc::clone(&**conn),
            HandleKind::Direct(conn) => Arc::clone(conn),
        }
    }

    /// Release the handle: back to the pool, or closed for good.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConnectionError` if a direct connection is
    /// still shared or `SQLite` refuses to close it.
    pub async fn close(self) -> Result<(), SqlHelperError> {
        let id = self.id;
        match self.kind {
            HandleKind::Pooled(conn) => {
                drop(conn);
                debug!(handle = %id, "returned connection to pool");
                Ok(())
            }
            HandleKind::Direct(conn) => {
                let mutex = Arc::try_unwrap(conn).map_err(|_| {
                    SqlHelperError::ConnectionError(format!(
                        "{id} is still in use and cannot be closed"
                    ))
                })?;
                let raw = mutex.into_inner();
                spawn_blocking(move || raw.close().map_err(|(_, e)| e))
                    .await
                    .map_err(|e| {
                        SqlHelperError::ConnectionError(format!("close task join error: {e}"))
                    })?
                    .map_err(|e| {
                        SqlHelperError::ConnectionError(format!("failed to close {id}: {e}"))
                    })
            }
        }
    }
}

enum ProviderKind {
    Pooled(Pool<SqliteManager>),
    Direct { path: String, busy_timeout: Duration },
}

/// Hands out raw connections, either from a `bb8` pool or by dialing anew.
pub struct ConnectionProvider {
    kind: ProviderKind,
    next_handle: AtomicU64,
}

impl fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProviderKind::Pooled(pool) => f
                .debug_struct("ConnectionProvider")
                .field("strategy", &ConnectionStrategy::Pooled)
                .field("state", &pool.state())
                .finish(),
            ProviderKind::Direct { path, .. } => f
                .debug_struct("ConnectionProvider")
                .field("strategy", &ConnectionStrategy::Direct)
                .field("path", path)
                .finish(),
        }
    }
}

impl ConnectionProvider {
    /// Set up the provider described by `options`.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConnectionError` if the pool cannot be built.
    pub async fn new(options: &DatabaseOptions) -> Result<Self, SqlHelperError> {
        options.validate()?;
        let Driver::Sqlite = options.driver;
        if options.username.is_some() || options.password.is_some() {
            debug!("sqlite ignores username/password");
        }

        let path = options.sqlite_path().to_string();
        let kind = match options.strategy {
            ConnectionStrategy::Pooled => {
                if path == ":memory:" {
                    warn!("pooled ':memory:' gives every pooled connection its own database");
                }
                let pool = Pool::builder()
                    .max_size(options.pool_max_size)
                    .connection_timeout(options.pool_timeout)
                    .build(SqliteManager::new(path, options.busy_timeout))
                    .await
                    .map_err(|e| {
                        SqlHelperError::ConnectionError(format!("Failed to create SQLite pool: {e}"))
                    })?;
                ProviderKind::Pooled(pool)
            }
            ConnectionStrategy::Direct => ProviderKind::Direct {
                path,
                busy_timeout: options.busy_timeout,
            },
        };

        Ok(Self {
            kind,
            next_handle: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn strategy(&self) -> ConnectionStrategy {
        match self.kind {
            ProviderKind::Pooled(_) => ConnectionStrategy::Pooled,
            ProviderKind::Direct { .. } => ConnectionStrategy::Direct,
        }
    }

    /// Obtain a raw connection.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConnectionError` on pool exhaustion or when the
    /// driver cannot open the database.
    pub async fn acquire(&self) -> Result<ConnectionHandle, SqlHelperError> {
        let kind = match &self.kind {
            ProviderKind::Pooled(pool) => HandleKind::Pooled(pool.get_owned().await?),
            ProviderKind::Direct { path, busy_timeout } => {
                HandleKind::Direct(open_shared(path.clone(), *busy_timeout).await?)
            }
        };
        let id = HandleId(self.next_handle.fetch_add(1, Ordering::Relaxed));
        Ok(ConnectionHandle { id, kind })
    }
}
