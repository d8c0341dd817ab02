use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::database::Database;
use crate::error::SqlHelperError;
use crate::types::{ConnectionStrategy, Driver};

const DEFAULT_POOL_MAX_SIZE: u32 = 8;
const DEFAULT_POOL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for connecting to the datastore.
///
/// Built once at startup and handed to [`Database::connect`]; nothing in the
/// crate reads configuration from global state.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub driver: Driver,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub strategy: ConnectionStrategy,
    /// Upper bound on pooled connections (pooled strategy only)
    pub pool_max_size: u32,
    /// How long a pooled checkout may wait before failing
    pub pool_timeout: Duration,
    /// `SQLite` busy handler timeout applied to every new connection
    pub busy_timeout: Duration,
}

impl fmt::Debug for DatabaseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseOptions")
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("strategy", &self.strategy)
            .field("pool_max_size", &self.pool_max_size)
            .field("pool_timeout", &self.pool_timeout)
            .field("busy_timeout", &self.busy_timeout)
            .finish()
    }
}

impl DatabaseOptions {
    #[must_use]
    pub fn new(driver: Driver, url: impl Into<String>) -> Self {
        Self {
            driver,
            url: url.into(),
            username: None,
            password: None,
            strategy: ConnectionStrategy::default(),
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
            pool_timeout: DEFAULT_POOL_TIMEOUT,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Shorthand for a `SQLite` database at `url`.
    #[must_use]
    pub fn sqlite(url: impl Into<String>) -> Self {
        Self::new(Driver::Sqlite, url)
    }

    #[must_use]
    pub fn builder(driver: Driver, url: impl Into<String>) -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::new(driver, url)
    }

    /// Parse Java-properties style text.
    ///
    /// Recognized keys: `jdbc.driver`/`driver`, `jdbc.url`/`url`,
    /// `jdbc.username`/`username`, `jdbc.password`/`password`,
    /// `pool.strategy`, `pool.max_size`, `pool.timeout_secs` and
    /// `sqlite.busy_timeout_ms`. Unknown keys are ignored.
    ///
    /// ```rust
    /// use sql_helper::prelude::*;
    ///
    /// let opts = DatabaseOptions::from_properties(
    ///     "# demo\njdbc.driver=sqlite\njdbc.url=jdbc:sqlite::memory:\npool.strategy = direct\n",
    /// )?;
    /// assert_eq!(opts.strategy, ConnectionStrategy::Direct);
    /// # Ok::<(), SqlHelperError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConfigError` when the driver or url is missing
    /// or a value does not parse.
    pub fn from_properties(text: &str) -> Result<Self, SqlHelperError> {
        let mut driver = None;
        let mut url = None;
        let mut username = None;
        let mut password = None;
        let mut strategy = None;
        let mut pool_max_size = None;
        let mut pool_timeout = None;
        let mut busy_timeout = None;

        for (lineno, raw) in text.lines().enumerate() {
            let Some((key, value)) = parse_property_line(raw) else {
                continue;
            };
            let lineno = lineno + 1;
            match key {
                "jdbc.driver" | "driver" => driver = Some(Driver::from_identifier(value)?),
                "jdbc.url" | "url" => url = Some(value.to_string()),
                "jdbc.username" | "username" => username = non_empty(value),
                "jdbc.password" | "password" => password = non_empty(value),
                "pool.strategy" => strategy = Some(ConnectionStrategy::from_identifier(value)?),
                "pool.max_size" => pool_max_size = Some(parse_number::<u32>(key, value, lineno)?),
                "pool.timeout_secs" => {
                    pool_timeout = Some(Duration::from_secs(parse_number(key, value, lineno)?));
                }
                "sqlite.busy_timeout_ms" => {
                    busy_timeout = Some(Duration::from_millis(parse_number(key, value, lineno)?));
                }
                _ => {}
            }
        }

        let driver = driver
            .ok_or_else(|| SqlHelperError::ConfigError("missing property: jdbc.driver".into()))?;
        let url =
            url.ok_or_else(|| SqlHelperError::ConfigError("missing property: jdbc.url".into()))?;

        let mut opts = DatabaseOptions::new(driver, url);
        opts.username = username;
        opts.password = password;
        if let Some(strategy) = strategy {
            opts.strategy = strategy;
        }
        if let Some(size) = pool_max_size {
            opts.pool_max_size = size;
        }
        if let Some(timeout) = pool_timeout {
            opts.pool_timeout = timeout;
        }
        if let Some(timeout) = busy_timeout {
            opts.busy_timeout = timeout;
        }
        opts.validate()?;
        Ok(opts)
    }

    /// Read and parse a properties file.
    ///
    /// # Errors
    /// Returns `SqlHelperError::ConfigError` if the file cannot be read or parsed.
    pub fn from_properties_file(path: impl AsRef<Path>) -> Result<Self, SqlHelperError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SqlHelperError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_properties(&text)
    }

    /// # Errors
    /// Returns `SqlHelperError::ConfigError` for an empty url or a zero pool size.
    pub fn validate(&self) -> Result<(), SqlHelperError> {
        if self.url.trim().is_empty() {
            return Err(SqlHelperError::ConfigError("url must not be empty".into()));
        }
        if self.pool_max_size == 0 {
            return Err(SqlHelperError::ConfigError(
                "pool.max_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The `SQLite` path (or URI) the url points at.
    ///
    /// Accepts `jdbc:sqlite:<path>`, `sqlite://<path>`, `sqlite:<path>`,
    /// `:memory:`, `file:` URIs and bare paths.
    #[must_use]
    pub fn sqlite_path(&self) -> &str {
        let url = self.url.trim();
        let url = url.strip_prefix("jdbc:").unwrap_or(url);
        if let Some(rest) = url.strip_prefix("sqlite:") {
            return rest.strip_prefix("//").unwrap_or(rest);
        }
        url
    }
}

fn parse_property_line(raw: &str) -> Option<(&str, &str)> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }
    let split = line.find(['=', ':'])?;
    let key = line[..split].trim();
    let value = line[split + 1..].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &str,
    value: &str,
    lineno: usize,
) -> Result<T, SqlHelperError> {
    value.parse::<T>().map_err(|_| {
        SqlHelperError::ConfigError(format!("line {lineno}: {key} is not a number: {value}"))
    })
}

/// Fluent builder for `DatabaseOptions`.
#[derive(Debug, Clone)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn new(driver: Driver, url: impl Into<String>) -> Self {
        Self {
            opts: DatabaseOptions::new(driver, url),
        }
    }

    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.opts.username = Some(username.into());
        self.opts.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: ConnectionStrategy) -> Self {
        self.opts.strategy = strategy;
        self
    }

    #[must_use]
    pub fn pool_max_size(mut self, size: u32) -> Self {
        self.opts.pool_max_size = size;
        self
    }

    #[must_use]
    pub fn pool_timeout(mut self, timeout: Duration) -> Self {
        self.opts.pool_timeout = timeout;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }

    /// Build a `Database` from these options.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError` if the options are invalid or pool creation fails.
    pub async fn build(self) -> Result<Database, SqlHelperError> {
        Database::connect(self.finish()).await
    }
}
