//! Statement synthesis for field-map driven writes.
//!
//! Values only ever travel as positional parameters. Table names come from
//! the entity type and column names from the field map; both are checked to
//! be plain identifiers before they are spliced into the statement text.

use std::sync::LazyLock;

use regex::Regex;

use crate::entity::table_name;
use crate::error::SqlHelperError;
use crate::field_map::FieldMap;
use crate::types::{QueryAndParams, RowValues};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// True if `name` can be spliced into SQL text unquoted.
#[must_use]
pub fn is_plain_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

fn check_identifier(kind: &str, name: &str) -> Result<(), SqlHelperError> {
    if is_plain_identifier(name) {
        Ok(())
    } else {
        Err(SqlHelperError::ParameterError(format!(
            "{kind} name {name:?} is not a plain identifier"
        )))
    }
}

fn check_fields(operation: &str, table: &str, fields: &FieldMap) -> Result<(), SqlHelperError> {
    if fields.is_empty() {
        return Err(SqlHelperError::PreconditionError(format!(
            "can not {operation} {table}: field map is empty"
        )));
    }
    check_identifier("table", table)?;
    for column in fields.columns() {
        check_identifier("column", column)?;
    }
    Ok(())
}

/// `INSERT INTO <table> (<c1>, <c2>, ...) VALUES (?, ?, ...)`, parameters in
/// field-map order.
///
/// # Errors
/// `PreconditionError` for an empty field map, `ParameterError` for a name
/// that is not a plain identifier.
pub fn build_insert_into(table: &str, fields: &FieldMap) -> Result<QueryAndParams, SqlHelperError> {
    check_fields("insert", table, fields)?;
    let columns = fields.columns().collect::<Vec<_>>().join(", ");
    let placeholders = vec!["?"; fields.len()].join(", ");
    let query = format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})");
    Ok(QueryAndParams::new(query, fields.values().cloned().collect()))
}

/// `UPDATE <table> SET <c1> = ?, ... WHERE id = ?`, parameters are the
/// field-map values followed by `id`.
///
/// # Errors
/// Same as [`build_insert_into`].
pub fn build_update_table(
    table: &str,
    id: i64,
    fields: &FieldMap,
) -> Result<QueryAndParams, SqlHelperError> {
    check_fields("update", table, fields)?;
    let assignments = fields
        .columns()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!("UPDATE {table} SET {assignments} WHERE id = ?");
    let mut params: Vec<RowValues> = fields.values().cloned().collect();
    params.push(RowValues::Int(id));
    Ok(QueryAndParams::new(query, params))
}

/// `DELETE FROM <table> WHERE id = ?` with `id` as the only parameter.
///
/// # Errors
/// `ParameterError` if the table name is not a plain identifier.
pub fn build_delete_from(table: &str, id: i64) -> Result<QueryAndParams, SqlHelperError> {
    check_identifier("table", table)?;
    Ok(QueryAndParams::new(
        format!("DELETE FROM {table} WHERE id = ?"),
        vec![RowValues::Int(id)],
    ))
}

/// [`build_insert_into`] for the table of entity `T`.
///
/// ```rust
/// use sql_helper::prelude::*;
///
/// struct Customer;
///
/// let q = build_insert::<Customer>(&FieldMap::new().with("name", "Acme").with("contact", "Jane"))?;
/// assert_eq!(q.query, "INSERT INTO Customer (name, contact) VALUES (?, ?)");
/// assert_eq!(q.params, vec![RowValues::from("Acme"), RowValues::from("Jane")]);
/// # Ok::<(), SqlHelperError>(())
/// ```
///
/// # Errors
/// See [`build_insert_into`].
pub fn build_insert<T: ?Sized>(fields: &FieldMap) -> Result<QueryAndParams, SqlHelperError> {
    build_insert_into(table_name::<T>(), fields)
}

/// [`build_update_table`] for the table of entity `T`.
///
/// # Errors
/// See [`build_update_table`].
pub fn build_update<T: ?Sized>(id: i64, fields: &FieldMap) -> Result<QueryAndParams, SqlHelperError> {
    build_update_table(table_name::<T>(), id, fields)
}

/// [`build_delete_from`] for the table of entity `T`.
///
/// # Errors
/// See [`build_delete_from`].
pub fn build_delete<T: ?Sized>(id: i64) -> Result<QueryAndParams, SqlHelperError> {
    build_delete_from(table_name::<T>(), id)
}
