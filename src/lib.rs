//! Context-scoped `SQLite` connections, typed row mapping and field-map
//! driven CRUD statements.
//!
//! ```rust,no_run
//! use sql_helper::prelude::*;
//! use sql_helper::impl_entity;
//!
//! #[derive(Debug, Default)]
//! pub struct Customer {
//!     pub id: i64,
//!     pub name: String,
//!     pub contact: String,
//! }
//! impl_entity!(Customer { id, name, contact });
//!
//! # async fn demo() -> Result<(), SqlHelperError> {
//! let db = Database::connect(DatabaseOptions::sqlite("customers.db")).await?;
//! let mut ctx = db.begin_context();
//! ctx.execute_sql_file("sql/customer_init.sql").await?;
//! let inserted = ctx
//!     .insert_entity::<Customer>(&FieldMap::new().with("name", "Acme").with("contact", "Jane"))
//!     .await?;
//! assert!(inserted);
//! let customers: Vec<Customer> = ctx.query_entity_list("SELECT * FROM Customer", &[]).await?;
//! ctx.close_connection().await;
//! # let _ = customers;
//! # Ok(()) }
//! ```

pub mod config;
pub mod context;
pub mod database;
pub mod entity;
pub mod error;
mod executor;
pub mod field_map;
pub mod prelude;
pub mod provider;
pub mod query_builder;
pub mod results;
mod script;
pub mod sqlite;
pub mod translation;
pub mod types;

pub use config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use context::{ContextId, ExecutionContext};
pub use database::Database;
pub use entity::{Entity, FromRowValue, table_name};
pub use error::SqlHelperError;
pub use field_map::FieldMap;
pub use provider::{ConnectionHandle, ConnectionProvider, HandleId};
pub use results::{CustomDbRow, ResultSet};
pub use types::{ConnectionStrategy, Driver, QueryAndParams, RowValues};
