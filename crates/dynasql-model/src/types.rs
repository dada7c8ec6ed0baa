//! Table key schema.

use serde::{Deserialize, Serialize};

use crate::attribute_value::Item;

/// Primary-key layout of a table: a partition key and an optional sort key.
///
/// Attribute types are not declared; the store is schemaless and key values
/// are typed by whatever literal the caller supplies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableSchema {
    /// Table name.
    pub table_name: String,
    /// Partition (HASH) key attribute name.
    pub partition_key: String,
    /// Optional sort (RANGE) key attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
}

impl TableSchema {
    /// Creates a schema with only a partition key.
    #[must_use]
    pub fn new(table_name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    /// Adds a sort key to the schema.
    #[must_use]
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Returns `true` if `name` is the partition key or the sort key.
    #[must_use]
    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.partition_key == name || self.sort_key.as_deref() == Some(name)
    }

    /// Key attribute names in schema order (partition key first).
    pub fn key_attribute_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref())
    }

    /// Returns the key attributes of the schema that `key` does not contain.
    #[must_use]
    pub fn missing_key_attributes(&self, key: &Item) -> Vec<String> {
        self.key_attribute_names()
            .filter(|name| !key.contains_key(*name))
            .map(str::to_owned)
            .collect()
    }

    /// Extracts just the key attributes from an item.
    #[must_use]
    pub fn key_of(&self, item: &Item) -> Item {
        self.key_attribute_names()
            .filter_map(|name| item.get(name).map(|v| (name.to_owned(), v.clone())))
            .collect()
    }
}
