//! Result projection.

use serde::ser::{Serialize, SerializeMap, Serializer};

use dynasql_model::{AttributeValue, Item};

/// Requested columns of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*`: every attribute of the item.
    All,
    /// Named columns, in request order.
    Columns(Vec<String>),
}

impl Projection {
    /// Project `item` into a [`Row`].
    ///
    /// Requested columns the item does not have are omitted. `*` yields every
    /// attribute sorted by name.
    #[must_use]
    pub fn apply(&self, item: &Item) -> Row {
        match self {
            Self::All => Row::from_item(item),
            Self::Columns(columns) => Row::from_lookup(columns, |name| item.get(name)),
        }
    }
}

/// A projected item. Columns keep the order in which they were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, AttributeValue)>,
}

impl Row {
    /// Every attribute of `item`, sorted by name.
    #[must_use]
    pub fn from_item(item: &Item) -> Self {
        let mut fields: Vec<_> = item.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        Self { fields }
    }

    /// The `columns` that `lookup` resolves, in order.
    pub(crate) fn from_lookup<'a, F>(columns: &[String], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<&'a AttributeValue>,
    {
        Self {
            fields: columns
                .iter()
                .filter_map(|c| lookup(c).map(|v| (c.clone(), v.clone())))
                .collect(),
        }
    }

    /// Value of `column`, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&AttributeValue> {
        self.fields
            .iter()
            .find_map(|(name, value)| (name == column).then_some(value))
    }

    /// Returns `true` if the row has `column`.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no requested column was present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the row back into an unordered item.
    #[must_use]
    pub fn into_item(self) -> Item {
        self.fields.into_iter().collect()
    }

    /// Plain JSON object with type tags removed.
    #[must_use]
    pub fn to_plain_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(name, value)| (name.to_owned(), value.to_plain_json()))
                .collect(),
        )
    }
}

impl IntoIterator for Row {
    type Item = (String, AttributeValue);
    type IntoIter = std::vec::IntoIter<(String, AttributeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
