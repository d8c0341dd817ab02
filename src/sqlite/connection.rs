use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use super::params::Params;
use super::query::build_result_set;
use crate::error::SqlHelperError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// A `SQLite` connection that can be moved onto the blocking pool.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Run synchronous `rusqlite` work on the blocking pool.
///
/// The mutex is held only while `func` runs.
///
/// # Errors
/// Propagates the closure's error, or `SqlHelperError::ConnectionError` if the
/// blocking task could not be joined.
pub async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, SqlHelperError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlHelperError> + Send + 'static,
    R: Send + 'static,
{
    spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| {
        SqlHelperError::ConnectionError(format!("sqlite spawn_blocking join error: {e}"))
    })?
}

/// Execute a SELECT and materialize it into a `ResultSet`.
///
/// # Errors
/// Returns the driver error if preparing or stepping the statement fails.
pub async fn select(
    conn: SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, SqlHelperError> {
    let sql_owned = query.to_owned();
    let params_owned = Params::convert(params);
    run_blocking(conn, move |guard| {
        let mut stmt = guard.prepare(&sql_owned)?;
        build_result_set(&mut stmt, params_owned.as_values())
    })
    .await
}

/// Execute a DML/DDL statement and return rows affected.
///
/// # Errors
/// Returns the driver error if preparing or executing the statement fails.
pub async fn dml(
    conn: SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
) -> Result<usize, SqlHelperError> {
    let sql_owned = query.to_owned();
    let params_owned = Params::convert(params);
    run_blocking(conn, move |guard| {
        let mut stmt = guard.prepare(&sql_owned)?;
        let affected = stmt.execute(&params_owned.as_refs()[..])?;
        Ok(affected)
    })
    .await
}
