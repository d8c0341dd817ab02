use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::context::ExecutionContext;
use crate::error::SqlHelperError;

impl ExecutionContext {
    /// Run the SQL file at `path`, one statement per non-blank line.
    ///
    /// Statements run in file order through [`execute_update`](Self::execute_update)
    /// and the run stops at the first failure. Statements that already ran
    /// stay applied. Returns the number of statements executed.
    ///
    /// # Errors
    /// `ScriptError` if the file cannot be opened or read; the statement's own
    /// error (usually `UpdateError`) if one fails.
    pub async fn execute_sql_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<usize, SqlHelperError> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| {
            error!(
                context = %self.id(),
                path = %path.display(),
                error = %e,
                "execute sql file failure"
            );
            SqlHelperError::ScriptError {
                line: 0,
                message: format!("cannot open {}: {e}", path.display()),
            }
        })?;
        let executed = self.execute_sql_script(BufReader::new(file)).await?;
        info!(context = %self.id(), path = %path.display(), executed, "executed sql file");
        Ok(executed)
    }

    /// Run every non-blank line read from `reader` as one statement.
    ///
    /// ```rust,no_run
    /// use sql_helper::prelude::*;
    ///
    /// # async fn demo(ctx: &mut ExecutionContext) -> Result<(), SqlHelperError> {
    /// let script = "CREATE TABLE t (id INTEGER)\nINSERT INTO t VALUES (1)\n";
    /// let executed = ctx.execute_sql_script(script.as_bytes()).await?;
    /// assert_eq!(executed, 2);
    /// # Ok(()) }
    /// ```
    ///
    /// # Errors
    /// Same as [`execute_sql_file`](Self::execute_sql_file).
    pub async fn execute_sql_script<R>(&mut self, reader: R) -> Result<usize, SqlHelperError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut line_no = 0usize;
        let mut executed = 0usize;

        loop {
            line_no += 1;
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!(
                        context = %self.id(),
                        line = line_no,
                        error = %e,
                        "execute sql file failure"
                    );
                    return Err(SqlHelperError::ScriptError {
                        line: line_no,
                        message: format!("read failure: {e}"),
                    });
                }
            };
            let sql = line.trim();
            if sql.is_empty() {
                continue;
            }
            if let Err(e) = self.execute_update(sql, &[]).await {
                error!(context = %self.id(), line = line_no, error = %e, "script statement failed");
                return Err(e);
            }
            executed += 1;
        }

        Ok(executed)
    }
}
