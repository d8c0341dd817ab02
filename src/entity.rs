//! Typed records built from result rows.
//!
//! Each entity declares its column-to-field correspondence statically with
//! [`impl_entity!`](crate::impl_entity). Columns are matched ASCII
//! case-insensitively; a missing column or a SQL NULL leaves the field at its
//! `Default` value.

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqlHelperError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// A typed record that can be built from one result row.
pub trait Entity: Sized {
    /// Build the record from a row.
    ///
    /// # Errors
    /// Returns `SqlHelperError::QueryError` if a column holds a value of the
    /// wrong type for its field.
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlHelperError>;
}

/// Table an entity type is stored in: the unqualified type name, verbatim.
///
/// ```rust
/// mod model {
///     pub struct Customer;
/// }
/// assert_eq!(sql_helper::entity::table_name::<model::Customer>(), "Customer");
/// ```
#[must_use]
pub fn table_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Conversion from a non-NULL column value into a field type.
pub trait FromRowValue: Sized {
    /// # Errors
    /// Returns `SqlHelperError::QueryError` when the value has the wrong type.
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError>;
}

fn mismatch(column: &str, expected: &str, value: &RowValues) -> SqlHelperError {
    SqlHelperError::QueryError(format!(
        "column {column}: expected {expected}, found {}",
        value.kind()
    ))
}

impl FromRowValue for i64 {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        match value {
            RowValues::Int(i) => Ok(*i),
            RowValues::Bool(b) => Ok(i64::from(*b)),
            other => Err(mismatch(column, "integer", other)),
        }
    }
}

impl FromRowValue for i32 {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        let wide = i64::from_row_value(value, column)?;
        i32::try_from(wide).map_err(|_| {
            SqlHelperError::QueryError(format!("column {column}: {wide} does not fit in i32"))
        })
    }
}

impl FromRowValue for f64 {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        value
            .as_float()
            .ok_or_else(|| mismatch(column, "float", value))
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        value.as_bool().ok_or_else(|| mismatch(column, "bool", value))
    }
}

impl FromRowValue for String {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| mismatch(column, "text", value))
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        match value {
            RowValues::Blob(bytes) => Ok(bytes.clone()),
            RowValues::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch(column, "blob", other)),
        }
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch(column, "timestamp", value))
    }
}

impl FromRowValue for JsonValue {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        match value {
            RowValues::JSON(json) => Ok(json.clone()),
            RowValues::Text(s) => serde_json::from_str(s).map_err(|e| {
                SqlHelperError::QueryError(format!("column {column}: invalid json: {e}"))
            }),
            other => Ok(other.to_json()),
        }
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: &RowValues, column: &str) -> Result<Self, SqlHelperError> {
        T::from_row_value(value, column).map(Some)
    }
}

/// Read one field from a row. Missing columns and NULLs give `T::default()`.
///
/// # Errors
/// Returns `SqlHelperError::QueryError` when the value has the wrong type.
pub fn column<T: FromRowValue + Default>(
    row: &CustomDbRow,
    name: &str,
) -> Result<T, SqlHelperError> {
    match row.get(name) {
        None | Some(RowValues::Null) => Ok(T::default()),
        Some(value) => T::from_row_value(value, name),
    }
}

/// Implement [`Entity`] for a struct by listing its fields.
///
/// Every field is read from the column of the same name. Field types must
/// implement [`FromRowValue`] and `Default`.
///
/// ```rust
/// use sql_helper::impl_entity;
///
/// #[derive(Debug, Default)]
/// pub struct Customer {
///     pub id: i64,
///     pub name: String,
///     pub email: Option<String>,
/// }
///
/// impl_entity!(Customer { id, name, email });
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::entity::Entity for $ty {
            fn from_row(
                row: &$crate::results::CustomDbRow,
            ) -> ::std::result::Result<Self, $crate::SqlHelperError> {
                ::std::result::Result::Ok(Self {
                    $($field: $crate::entity::column(row, stringify!($field))?,)*
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Customer {
        id: i64,
        name: String,
        contact: String,
        telephone: Option<String>,
        score: f64,
    }

    crate::impl_entity!(Customer {
        id,
        name,
        contact,
        telephone,
        score,
    });

    struct Wrapper<T>(T);

    fn row(columns: &[&str], values: Vec<RowValues>) -> CustomDbRow {
        CustomDbRow::new(
            Arc::new(columns.iter().map(|c| (*c).to_string()).collect()),
            values,
        )
    }

    #[test]
    fn table_name_is_the_bare_type_name() {
        assert_eq!(table_name::<Customer>(), "Customer");
        assert_eq!(table_name::<Wrapper<Customer>>(), "Wrapper");
    }

    #[test]
    fn maps_columns_case_insensitively() {
        let r = row(
            &["ID", "Name", "contact", "TELEPHONE", "score"],
            vec![
                RowValues::Int(3),
                RowValues::Text("Acme".into()),
                RowValues::Text("Jane".into()),
                RowValues::Text("555".into()),
                RowValues::Int(4),
            ],
        );
        let customer = Customer::from_row(&r).unwrap();
        assert_eq!(
            customer,
            Customer {
                id: 3,
                name: "Acme".into(),
                contact: "Jane".into(),
                telephone: Some("555".into()),
                score: 4.0,
            }
        );
    }

    #[test]
    fn missing_and_null_columns_default() {
        let r = row(&["name", "telephone"], vec![RowValues::Text("Acme".into()), RowValues::Null]);
        let customer = Customer::from_row(&r).unwrap();
        assert_eq!(customer.id, 0);
        assert_eq!(customer.contact, "");
        assert_eq!(customer.telephone, None);
    }

    #[test]
    fn wrong_type_is_a_query_error() {
        let r = row(&["id"], vec![RowValues::Text("seven".into())]);
        let err = Customer::from_row(&r).unwrap_err();
        assert!(matches!(err, SqlHelperError::QueryError(msg) if msg.contains("column id")));
    }
}
