//! Statement execution on an execution context's connection.
//!
//! Every operation reuses the context's cached connection and leaves it open;
//! the caller releases it with `close_connection`. Driver failures are logged
//! with the operation name and re-raised as `QueryError` / `UpdateError`.
//! Nothing is retried.

mod writes;

use tracing::{debug, error, warn};

use crate::context::ExecutionContext;
use crate::entity::Entity;
use crate::error::SqlHelperError;
use crate::field_map::FieldMap;
use crate::results::ResultSet;
use crate::sqlite::connection;
use crate::translation::check_param_count;
use crate::types::RowValues;

impl ExecutionContext {
    async fn run_select(
        &mut self,
        operation: &'static str,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlHelperError> {
        check_param_count(sql, params.len())?;
        let context = self.id();
        let conn = self.get_connection().await?.shared();
        debug!(context = %context, sql, params = params.len(), "{operation}");
        connection::select(conn, sql, params).await.map_err(|e| {
            error!(context = %context, sql, error = %e, "{operation} failure");
            SqlHelperError::QueryError(format!("{operation} failure: {e}"))
        })
    }

    /// Run a query and map every row to `T`.
    ///
    /// No matching rows is an empty vector, not an error.
    ///
    /// # Errors
    /// `ParameterError` if `params` does not match the placeholders,
    /// `ConnectionError` if no connection can be obtained, `QueryError` if the
    /// statement or the row mapping fails.
    pub async fn query_entity_list<T: Entity>(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<T>, SqlHelperError> {
        let result_set = self.run_select("query entity list", sql, params).await?;
        result_set
            .results
            .iter()
            .map(|row| T::from_row(row).map_err(|e| map_row_error(self, "query entity list", e)))
            .collect()
    }

    /// Run a query expected to match at most one row and map it to `T`.
    ///
    /// Returns `None` when nothing matches. If several rows match, the first
    /// is returned and a warning is logged.
    ///
    /// # Errors
    /// Same as [`query_entity_list`](Self::query_entity_list).
    pub async fn query_entity<T: Entity>(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<T>, SqlHelperError> {
        let result_set = self.run_select("query entity", sql, params).await?;
        if result_set.results.len() > 1 {
            warn!(
                context = %self.id(),
                sql,
                rows = result_set.results.len(),
                "query entity matched several rows, using the first"
            );
        }
        result_set
            .results
            .first()
            .map(|row| T::from_row(row).map_err(|e| map_row_error(self, "query entity", e)))
            .transpose()
    }

    /// Run a query and return each row as an ordered column -> value map.
    ///
    /// # Errors
    /// Same as [`query_entity_list`](Self::query_entity_list).
    pub async fn execute_query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<FieldMap>, SqlHelperError> {
        let result_set = self.run_select("execute query", sql, params).await?;
        Ok(result_set.into_field_maps())
    }

    /// Run an INSERT/UPDATE/DELETE (or DDL) statement and return the number
    /// of affected rows.
    ///
    /// # Errors
    /// `ParameterError` if `params` does not match the placeholders,
    /// `ConnectionError` if no connection can be obtained, `UpdateError` if
    /// the statement fails.
    pub async fn execute_update(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlHelperError> {
        check_param_count(sql, params.len())?;
        let context = self.id();
        let conn = self.get_connection().await?.shared();
        debug!(context = %context, sql, params = params.len(), "execute update");
        connection::dml(conn, sql, params).await.map_err(|e| {
            error!(context = %context, sql, error = %e, "execute update failure");
            SqlHelperError::UpdateError(format!("execute update failure: {e}"))
        })
    }
}

fn map_row_error(ctx: &ExecutionContext, operation: &str, err: SqlHelperError) -> SqlHelperError {
    error!(context = %ctx.id(), error = %err, "{operation} failure: row mapping");
    match err {
        SqlHelperError::QueryError(msg) => {
            SqlHelperError::QueryError(format!("{operation} failure: {msg}"))
        }
        other => other,
    }
}
