// SQLite backend, split into:
// - manager: connection opening and the bb8 manager for pooled mode
// - params: conversion from `RowValues` to rusqlite values
// - query: result extraction into `ResultSet`
// - connection: blocking execution of statements on the shared connection

pub mod connection;
pub mod manager;
pub mod params;
pub mod query;

pub use connection::{SharedSqliteConnection, run_blocking};
pub use manager::{SqliteManager, open_connection};
pub use query::build_result_set;
