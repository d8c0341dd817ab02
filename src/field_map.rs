use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// Ordered column-name to value mapping used for write statements and for
/// untyped query results.
///
/// Iteration order is insertion order, so the column list and the parameter
/// list of a generated statement always line up:
/// ```rust
/// use sql_helper::prelude::*;
///
/// let fields = FieldMap::new()
///     .with("name", "Acme")
///     .with("contact", "Jane");
/// assert_eq!(fields.columns().collect::<Vec<_>>(), ["name", "contact"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, RowValues)>,
}

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.insert(column, value);
        self
    }

    /// Insert a value. An existing column keeps its position and gets the new
    /// value; the previous value is returned.
    pub fn insert(
        &mut self,
        column: impl Into<String>,
        value: impl Into<RowValues>,
    ) -> Option<RowValues> {
        let column = column.into();
        let value = value.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(name, _)| *name == column) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((column, value));
        None
    }

    /// Look up a column by its exact name.
    ///
    /// Unlike entity mapping this is case-sensitive: keys are the names the
    /// caller inserted, or the names the database reported for a result row.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Remove a column, shifting later columns up.
    pub fn remove(&mut self, column: &str) -> Option<RowValues> {
        let idx = self.entries.iter().position(|(name, _)| name == column)?;
        Some(self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &RowValues> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMap
where
    K: Into<String>,
    V: Into<RowValues>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (column, value) in iter {
            map.insert(column, value);
        }
        map
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, RowValues);
    type IntoIter = std::vec::IntoIter<(String, RowValues)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, &value.to_json())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinsert_keeps_position() {
        let mut map = FieldMap::new().with("a", 1).with("b", 2).with("c", 3);
        let old = map.insert("b", 20);
        assert_eq!(old, Some(RowValues::Int(2)));
        assert_eq!(map.columns().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(map.get("b"), Some(&RowValues::Int(20)));
    }

    #[test]
    fn remove_shifts_later_columns() {
        let mut map: FieldMap = [("x", "1"), ("y", "2"), ("z", "3")].into_iter().collect();
        assert_eq!(map.remove("y"), Some(RowValues::Text("2".into())));
        assert_eq!(map.columns().collect::<Vec<_>>(), ["x", "z"]);
        assert!(map.remove("missing").is_none());
    }

    #[test]
    fn serializes_in_column_order() {
        let map = FieldMap::new()
            .with("zeta", "last-alphabetically")
            .with("alpha", None::<i64>)
            .with("mid", 2.5);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":"last-alphabetically","alpha":null,"mid":2.5}"#);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut map = FieldMap::new().with("Name", "Acme");
        assert!(map.get("name").is_none());
        assert!(map.insert("name", "Globex").is_none());
        assert_eq!(map.len(), 2);
    }
}
