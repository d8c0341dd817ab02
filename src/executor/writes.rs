use tracing::{debug, error};

use crate::context::ExecutionContext;
use crate::error::SqlHelperError;
use crate::field_map::FieldMap;
use crate::query_builder::{build_delete, build_insert, build_update};
use crate::types::QueryAndParams;

impl ExecutionContext {
    /// Insert one row into `T`'s table from `fields`.
    ///
    /// Returns `true` only if exactly one row was inserted. An empty field
    /// map is logged and reported as `Ok(false)` without touching the
    /// database.
    ///
    /// # Errors
    /// `ParameterError` for a column name that is not a plain identifier,
    /// `ConnectionError` / `UpdateError` from execution.
    pub async fn insert_entity<T: ?Sized>(
        &mut self,
        fields: &FieldMap,
    ) -> Result<bool, SqlHelperError> {
        match soft_precondition(self, build_insert::<T>(fields))? {
            Some(statement) => self.run_write(&statement).await,
            None => Ok(false),
        }
    }

    /// Update the row of `T`'s table whose `id` matches.
    ///
    /// Same result contract as [`insert_entity`](Self::insert_entity).
    ///
    /// # Errors
    /// Same as [`insert_entity`](Self::insert_entity).
    pub async fn update_entity<T: ?Sized>(
        &mut self,
        id: i64,
        fields: &FieldMap,
    ) -> Result<bool, SqlHelperError> {
        match soft_precondition(self, build_update::<T>(id, fields))? {
            Some(statement) => self.run_write(&statement).await,
            None => Ok(false),
        }
    }

    /// Delete the row of `T`'s table whose `id` matches; `true` only if
    /// exactly one row went away.
    ///
    /// # Errors
    /// `ConnectionError` / `UpdateError` from execution.
    pub async fn delete_entity<T: ?Sized>(&mut self, id: i64) -> Result<bool, SqlHelperError> {
        let statement = build_delete::<T>(id)?;
        self.run_write(&statement).await
    }

    async fn run_write(&mut self, statement: &QueryAndParams) -> Result<bool, SqlHelperError> {
        let affected = self
            .execute_update(&statement.query, &statement.params)
            .await?;
        if affected != 1 {
            debug!(
                context = %self.id(),
                sql = %statement.query,
                affected,
                "write did not affect exactly one row"
            );
        }
        Ok(affected == 1)
    }
}

/// Turn an empty-field-map precondition failure into "no statement".
fn soft_precondition(
    ctx: &ExecutionContext,
    built: Result<QueryAndParams, SqlHelperError>,
) -> Result<Option<QueryAndParams>, SqlHelperError> {
    match built {
        Ok(statement) => Ok(Some(statement)),
        Err(SqlHelperError::PreconditionError(msg)) => {
            error!(context = %ctx.id(), "{msg}");
            Ok(None)
        }
        Err(other) => {
            error!(context = %ctx.id(), error = %other, "cannot build write statement");
            Err(other)
        }
    }
}
