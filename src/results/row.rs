use std::collections::HashMap;
use std::sync::Arc;

use crate::field_map::FieldMap;
use crate::types::RowValues;

/// A row from a database query result
///
/// This struct represents a single row from a database query result,
/// with access to both the column names and the values.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    // Lower-cased column name -> index, shared across the rows of one result set
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

pub(crate) fn build_column_index(column_names: &[String]) -> Arc<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // first occurrence wins for duplicate names (e.g. joins)
        index.entry(name.to_ascii_lowercase()).or_insert(i);
    }
    Arc::new(index)
}

impl CustomDbRow {
    /// Create a new database row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let cache = build_column_index(&column_names);
        Self {
            column_names,
            rows,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name.
    ///
    /// Matching is ASCII case-insensitive, so `Name`, `NAME` and `name` all
    /// resolve to the same column.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }
        self.column_index_cache
            .get(&column_name.to_ascii_lowercase())
            .copied()
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    /// Copy the row into an ordered column -> value map.
    ///
    /// Duplicate column names (e.g. `SELECT a.id, b.id`) keep the first
    /// column, the same one [`get`](Self::get) resolves to.
    #[must_use]
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = FieldMap::with_capacity(self.rows.len());
        for (idx, (name, value)) in self.column_names.iter().zip(self.rows.iter()).enumerate() {
            if self.get_column_index(name) == Some(idx) {
                map.insert(name.clone(), value.clone());
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> CustomDbRow {
        CustomDbRow::new(
            Arc::new(vec!["id".into(), "Name".into(), "EMAIL".into()]),
            vec![
                RowValues::Int(7),
                RowValues::Text("Acme".into()),
                RowValues::Null,
            ],
        )
    }

    #[test]
    fn lookup_ignores_ascii_case() {
        let r = row();
        assert_eq!(r.get("name"), Some(&RowValues::Text("Acme".into())));
        assert_eq!(r.get("NAME"), r.get("Name"));
        assert_eq!(r.get("email"), Some(&RowValues::Null));
        assert!(r.get("telephone").is_none());
    }

    #[test]
    fn field_map_keeps_result_column_names() {
        let map = row().to_field_map();
        assert_eq!(map.columns().collect::<Vec<_>>(), ["id", "Name", "EMAIL"]);
    }

    #[test]
    fn duplicate_columns_resolve_to_the_first() {
        let joined = CustomDbRow::new(
            Arc::new(vec!["id".into(), "name".into(), "ID".into()]),
            vec![
                RowValues::Int(1),
                RowValues::Text("Acme".into()),
                RowValues::Int(2),
            ],
        );
        assert_eq!(joined.get("Id"), Some(&RowValues::Int(1)));

        let map = joined.to_field_map();
        assert_eq!(map.columns().collect::<Vec<_>>(), ["id", "name"]);
        assert_eq!(map.get("id"), Some(&RowValues::Int(1)));
    }
}
