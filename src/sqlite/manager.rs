use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bb8::ManageConnection;
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use super::connection::{SharedSqliteConnection, run_blocking};
use crate::error::SqlHelperError;

/// Open one `SQLite` connection with the crate's standard session settings.
///
/// # Errors
/// Returns `SqlHelperError::ConnectionError` if the database cannot be opened
/// or configured.
pub fn open_connection(
    path: &str,
    busy_timeout: Duration,
) -> Result<rusqlite::Connection, SqlHelperError> {
    let conn = rusqlite::Connection::open(path).map_err(|e| {
        SqlHelperError::ConnectionError(format!("cannot open sqlite database {path}: {e}"))
    })?;
    conn.busy_timeout(busy_timeout).map_err(|e| {
        SqlHelperError::ConnectionError(format!("cannot set sqlite busy timeout: {e}"))
    })?;
    // in-memory databases answer "memory" and stay that way
    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
        .map_err(|e| {
            SqlHelperError::ConnectionError(format!("cannot set sqlite journal mode: {e}"))
        })?;
    Ok(conn)
}

/// Open a connection on the blocking pool and wrap it for shared use.
///
/// # Errors
/// Returns `SqlHelperError::ConnectionError` if opening fails or the blocking
/// task panics.
pub async fn open_shared(
    path: String,
    busy_timeout: Duration,
) -> Result<SharedSqliteConnection, SqlHelperError> {
    let conn = spawn_blocking(move || open_connection(&path, busy_timeout))
        .await
        .map_err(|e| {
            SqlHelperError::ConnectionError(format!("sqlite open task join error: {e}"))
        })??;
    Ok(Arc::new(Mutex::new(conn)))
}

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    path: String,
    busy_timeout: Duration,
}

impl SqliteManager {
    #[must_use]
    pub fn new(path: impl Into<String>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = SqlHelperError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;
        async move { open_shared(path, busy_timeout).await }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let conn = Arc::clone(conn);
        async move {
            run_blocking(conn, |guard| {
                guard.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
                Ok(())
            })
            .await
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
