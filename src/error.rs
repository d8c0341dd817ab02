use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlHelperError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Update error: {0}")]
    UpdateError(String),

    #[error("Precondition failed: {0}")]
    PreconditionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Script error at line {line}: {message}")]
    ScriptError { line: usize, message: String },
}

impl From<bb8::RunError<SqlHelperError>> for SqlHelperError {
    fn from(err: bb8::RunError<SqlHelperError>) -> Self {
        match err {
            bb8::RunError::User(inner) => {
                SqlHelperError::ConnectionError(format!("SQLite pool error: {inner}"))
            }
            bb8::RunError::TimedOut => SqlHelperError::ConnectionError(
                "SQLite pool exhausted: timed out waiting for a connection".to_string(),
            ),
        }
    }
}

impl SqlHelperError {
    /// True for the failure kinds raised by the connection layer.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, SqlHelperError::ConnectionError(_))
    }
}
