//! Convenient imports for common functionality.

pub use crate::config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use crate::context::{ContextId, ExecutionContext};
pub use crate::database::Database;
pub use crate::entity::{Entity, FromRowValue, table_name};
pub use crate::error::SqlHelperError;
pub use crate::field_map::FieldMap;
pub use crate::provider::{ConnectionHandle, HandleId};
pub use crate::query_builder::{build_delete, build_insert, build_update};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::translation::count_placeholders;
pub use crate::types::{ConnectionStrategy, Driver, QueryAndParams, RowValues};
