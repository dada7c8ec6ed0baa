//! In-memory storage engine for a single table.
//!
//! # Architecture
//!
//! ```text
//! DashMap<PartitionKey, BTreeMap<SortableAttributeValue, StoredItem>>
//! ```
//!
//! - Partition-level concurrency: different partitions can be read and
//!   written concurrently. Conditional writes evaluate their condition while
//!   holding the partition's write lock, so check-and-write is atomic per
//!   item.
//! - Sort key ordering: within each partition, items are kept in a
//!   `BTreeMap` keyed by [`SortableAttributeValue`] (strings by UTF-8 bytes,
//!   numbers numerically).
//! - For tables without a sort key, a sentinel value is used as the single
//!   BTreeMap key per partition.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use dynasql_model::{AttributeValue, Item, TableSchema};

use crate::expression::{CompareOp, compare_values};
use crate::expression::evaluator::compare_numbers;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A required key attribute was not found in the item.
    #[error("missing required key attribute: {attr}")]
    MissingKeyAttribute {
        /// The name of the missing attribute.
        attr: String,
    },
    /// A key attribute has a type that cannot be used as a key.
    #[error("key attribute '{attr}' has wrong type: expected S or N, got {actual}")]
    InvalidKeyType {
        /// The name of the attribute.
        attr: String,
        /// The actual type descriptor.
        actual: String,
    },
    /// An update tried to change a key attribute.
    #[error("cannot update key attribute: {attr}")]
    KeyAttributeUpdate {
        /// The key attribute.
        attr: String,
    },
    /// `<>` cannot be used as a sort-key condition.
    #[error("unsupported sort key operator: {op}")]
    InvalidSortCondition {
        /// The rejected operator.
        op: CompareOp,
    },
    /// The item's condition evaluated to false.
    #[error("the conditional request failed")]
    ConditionFailed,
    /// An item with the same primary key already exists.
    #[error("an item with the same primary key already exists")]
    DuplicateKey,
}

// ---------------------------------------------------------------------------
// Key types
// ---------------------------------------------------------------------------

/// A primary key consisting of a partition key and an optional sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKey {
    /// The partition key value.
    pub partition_key: AttributeValue,
    /// The optional sort key value.
    pub sort_key: Option<SortableAttributeValue>,
}

/// A wrapper around key-eligible [`AttributeValue`] variants that implements
/// [`Ord`] for use as `BTreeMap` keys.
///
/// - **Strings (S)**: UTF-8 byte ordering.
/// - **Numbers (N)**: Numeric ordering (parsed as `f64`).
/// - **Sentinel**: used when the table has no sort key.
#[derive(Debug, Clone)]
pub enum SortableAttributeValue {
    /// String sort key.
    S(String),
    /// Number sort key, in canonical form (see [`canonical_number`]).
    N(String),
    /// Sentinel value for tables without a sort key.
    Sentinel,
}

impl SortableAttributeValue {
    /// Creates a `SortableAttributeValue` from an `AttributeValue`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKeyType` unless the value is S or N.
    pub fn from_attribute_value(
        attr_name: &str,
        value: &AttributeValue,
    ) -> Result<Self, StorageError> {
        match value {
            AttributeValue::S(s) => Ok(Self::S(s.clone())),
            AttributeValue::N(n) => Ok(Self::N(canonical_number(n))),
            other => Err(StorageError::InvalidKeyType {
                attr: attr_name.to_owned(),
                actual: other.type_descriptor().to_owned(),
            }),
        }
    }
}

impl PartialEq for SortableAttributeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortableAttributeValue {}

impl PartialOrd for SortableAttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableAttributeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::S(a), Self::S(b)) => a.as_bytes().cmp(b.as_bytes()),
            // Unparseable numbers sort after every valid number.
            (Self::N(a), Self::N(b)) => compare_numbers(a, b).unwrap_or_else(|| {
                let valid = |n: &str| n.trim().parse::<f64>().is_ok();
                valid(b).cmp(&valid(a)).then_with(|| a.cmp(b))
            }),
            (Self::Sentinel, Self::Sentinel) => Ordering::Equal,
            (Self::S(_), _) => Ordering::Less,
            (_, Self::S(_)) => Ordering::Greater,
            (Self::N(_), _) => Ordering::Less,
            (_, Self::N(_)) => Ordering::Greater,
        }
    }
}

impl std::hash::Hash for SortableAttributeValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::S(s) | Self::N(s) => s.hash(state),
            Self::Sentinel => {}
        }
    }
}

// ---------------------------------------------------------------------------
// SortKeyCondition
// ---------------------------------------------------------------------------

/// Conditions that can be applied to sort keys during query operations.
#[derive(Debug, Clone)]
pub enum SortKeyCondition {
    /// Sort key equals the given value.
    Eq(SortableAttributeValue),
    /// Sort key is less than the given value.
    Lt(SortableAttributeValue),
    /// Sort key is less than or equal to the given value.
    Le(SortableAttributeValue),
    /// Sort key is greater than the given value.
    Gt(SortableAttributeValue),
    /// Sort key is greater than or equal to the given value.
    Ge(SortableAttributeValue),
}

impl SortKeyCondition {
    /// Build a sort-key condition from a comparison.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidSortCondition` for `<>` and
    /// `StorageError::InvalidKeyType` for values other than S or N.
    pub fn from_comparison(
        attr_name: &str,
        op: CompareOp,
        value: &AttributeValue,
    ) -> Result<Self, StorageError> {
        let v = SortableAttributeValue::from_attribute_value(attr_name, value)?;
        Ok(match op {
            CompareOp::Eq => Self::Eq(v),
            CompareOp::Lt => Self::Lt(v),
            CompareOp::Le => Self::Le(v),
            CompareOp::Gt => Self::Gt(v),
            CompareOp::Ge => Self::Ge(v),
            CompareOp::Ne => return Err(StorageError::InvalidSortCondition { op }),
        })
    }

    fn bounds(&self) -> (Bound<SortableAttributeValue>, Bound<SortableAttributeValue>) {
        match self {
            Self::Eq(v) => (Bound::Included(v.clone()), Bound::Included(v.clone())),
            Self::Lt(v) => (Bound::Unbounded, Bound::Excluded(v.clone())),
            Self::Le(v) => (Bound::Unbounded, Bound::Included(v.clone())),
            Self::Gt(v) => (Bound::Excluded(v.clone()), Bound::Unbounded),
            Self::Ge(v) => (Bound::Included(v.clone()), Bound::Unbounded),
        }
    }

    /// Typed re-check of a stored sort key. Keys of a different type than
    /// the bound fall inside BTreeMap ranges but never satisfy the condition.
    fn accepts(&self, stored: &SortableAttributeValue) -> bool {
        let (op, bound) = match self {
            Self::Eq(v) => (CompareOp::Eq, v),
            Self::Lt(v) => (CompareOp::Lt, v),
            Self::Le(v) => (CompareOp::Le, v),
            Self::Gt(v) => (CompareOp::Gt, v),
            Self::Ge(v) => (CompareOp::Ge, v),
        };
        match (to_attribute_value(stored), to_attribute_value(bound)) {
            (Some(a), Some(b)) => compare_values(&a, &b, op),
            _ => false,
        }
    }
}

/// Canonical text of a number key: numerically equal spellings (`1`, `1.0`,
/// `1e0`) map to the same string. Unparseable or non-finite text is kept.
#[must_use]
pub fn canonical_number(n: &str) -> String {
    match n.trim().parse::<f64>() {
        // Adding 0.0 folds -0 into 0.
        Ok(f) if f.is_finite() => (f + 0.0).to_string(),
        _ => n.to_owned(),
    }
}

/// Partition map key for a key value; numbers are canonicalized.
fn partition_key_of(value: &AttributeValue) -> AttributeValue {
    match value {
        AttributeValue::N(n) => AttributeValue::N(canonical_number(n)),
        other => other.clone(),
    }
}

fn to_attribute_value(v: &SortableAttributeValue) -> Option<AttributeValue> {
    match v {
        SortableAttributeValue::S(s) => Some(AttributeValue::S(s.clone())),
        SortableAttributeValue::N(n) => Some(AttributeValue::N(n.clone())),
        SortableAttributeValue::Sentinel => None,
    }
}

// ---------------------------------------------------------------------------
// TableStorage
// ---------------------------------------------------------------------------

/// An item stored in the table, containing all attributes.
#[derive(Debug, Clone)]
struct StoredItem {
    /// The full set of attributes for this item, including key attributes.
    attributes: Item,
}

/// In-memory storage for a single table.
#[derive(Debug)]
pub struct TableStorage {
    /// Partition key (canonical) -> sorted items within that partition.
    data: DashMap<AttributeValue, BTreeMap<SortableAttributeValue, StoredItem>>,
    /// The key schema for this table.
    schema: TableSchema,
    /// Total number of items in the table.
    item_count: AtomicU64,
}

impl TableStorage {
    /// Creates a new empty `TableStorage` with the given key schema.
    #[must_use]
    pub fn new(schema: TableSchema) -> Self {
        Self {
            data: DashMap::new(),
            schema,
            item_count: AtomicU64::new(0),
        }
    }

    /// Returns the key schema.
    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Returns the current item count.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.item_count.load(AtomicOrdering::Relaxed)
    }

    /// Inserts or replaces an item. Returns the replaced item, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::MissingKeyAttribute` or
    /// `StorageError::InvalidKeyType` for items without a valid key.
    pub fn put_item(&self, item: Item) -> Result<Option<Item>, StorageError> {
        let (partition_key, sort_key) = self.split_key(&item)?;
        let old = {
            let mut partition = self.data.entry(partition_key).or_default();
            partition.insert(sort_key, StoredItem { attributes: item })
        };
        if old.is_none() {
            self.item_count.fetch_add(1, AtomicOrdering::Relaxed);
            debug!(table = %self.schema.table_name, "inserted new item");
        } else {
            debug!(table = %self.schema.table_name, "replaced existing item");
        }
        Ok(old.map(|o| o.attributes))
    }

    /// Inserts an item only if no item with the same key exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::DuplicateKey` if the key is taken, or a key
    /// error for items without a valid key.
    pub fn insert_new(&self, item: Item) -> Result<(), StorageError> {
        let (partition_key, sort_key) = self.split_key(&item)?;
        let mut partition = self.data.entry(partition_key).or_default();
        match partition.entry(sort_key) {
            Entry::Occupied(_) => Err(StorageError::DuplicateKey),
            Entry::Vacant(e) => {
                e.insert(StoredItem { attributes: item });
                self.item_count.fetch_add(1, AtomicOrdering::Relaxed);
                debug!(table = %self.schema.table_name, "inserted new item");
                Ok(())
            }
        }
    }

    /// Retrieves an item by its primary key.
    #[must_use]
    pub fn get_item(&self, key: &PrimaryKey) -> Option<Item> {
        let sort_key = key
            .sort_key
            .as_ref()
            .map_or(&SortableAttributeValue::Sentinel, |sk| sk);

        self.data
            .get(&key.partition_key)
            .and_then(|partition| partition.get(sort_key).map(|item| item.attributes.clone()))
    }

    /// Sets attributes on the item under `key`, creating it if absent.
    /// `condition` sees the existing item (if any) before the write.
    ///
    /// Returns the item after the update.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConditionFailed` if `condition` rejects the
    /// existing item and `StorageError::KeyAttributeUpdate` if `updates`
    /// touches a key attribute.
    pub fn update_item<F>(
        &self,
        key: &PrimaryKey,
        updates: &[(String, AttributeValue)],
        condition: F,
    ) -> Result<Item, StorageError>
    where
        F: FnOnce(Option<&Item>) -> bool,
    {
        if let Some((attr, _)) = updates.iter().find(|(a, _)| self.schema.is_key_attribute(a)) {
            return Err(StorageError::KeyAttributeUpdate { attr: attr.clone() });
        }

        let sort_key = key.sort_key.clone().unwrap_or(SortableAttributeValue::Sentinel);
        let mut partition = self.data.entry(key.partition_key.clone()).or_default();
        let existing = partition.get(&sort_key).map(|s| &s.attributes);
        if !condition(existing) {
            drop(partition);
            self.remove_if_empty(&key.partition_key);
            return Err(StorageError::ConditionFailed);
        }

        let created = existing.is_none();
        let stored = partition.entry(sort_key).or_insert_with(|| StoredItem {
            attributes: self.key_item(key),
        });
        for (attr, value) in updates {
            stored.attributes.insert(attr.clone(), value.clone());
        }
        let result = stored.attributes.clone();
        drop(partition);

        if created {
            self.item_count.fetch_add(1, AtomicOrdering::Relaxed);
        }
        debug!(table = %self.schema.table_name, created, updated = updates.len(), "updated item");
        Ok(result)
    }

    /// Deletes the item under `key`. `condition` sees the existing item (if
    /// any) before the delete. Returns the deleted item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConditionFailed` if `condition` rejects the
    /// existing item.
    pub fn delete_item<F>(&self, key: &PrimaryKey, condition: F) -> Result<Option<Item>, StorageError>
    where
        F: FnOnce(Option<&Item>) -> bool,
    {
        let sort_key = key
            .sort_key
            .as_ref()
            .map_or(&SortableAttributeValue::Sentinel, |sk| sk);

        let Some(mut partition) = self.data.get_mut(&key.partition_key) else {
            return if condition(None) {
                Ok(None)
            } else {
                Err(StorageError::ConditionFailed)
            };
        };
        if !condition(partition.get(sort_key).map(|s| &s.attributes)) {
            return Err(StorageError::ConditionFailed);
        }
        let removed = partition.remove(sort_key);
        drop(partition);
        self.remove_if_empty(&key.partition_key);

        Ok(removed.map(|stored| {
            self.item_count.fetch_sub(1, AtomicOrdering::Relaxed);
            debug!(table = %self.schema.table_name, "deleted item");
            stored.attributes
        }))
    }

    /// Items of one partition matching `sort_condition`, in sort-key order
    /// (descending when `scan_forward` is false).
    #[must_use]
    pub fn query(
        &self,
        partition_key: &AttributeValue,
        sort_condition: Option<&SortKeyCondition>,
        scan_forward: bool,
    ) -> Vec<Item> {
        let Some(partition) = self.data.get(&partition_key_of(partition_key)) else {
            return Vec::new();
        };

        let (lower, upper) = sort_condition.map_or(
            (Bound::Unbounded, Bound::Unbounded),
            SortKeyCondition::bounds,
        );
        let accepted = |(sk, _): &(&SortableAttributeValue, &StoredItem)| {
            sort_condition.is_none_or(|c| c.accepts(sk))
        };
        let range = partition.range((lower, upper));
        if scan_forward {
            range.filter(accepted).map(|(_, s)| s.attributes.clone()).collect()
        } else {
            range.rev().filter(accepted).map(|(_, s)| s.attributes.clone()).collect()
        }
    }

    /// All items, ordered by partition key display string then sort key.
    #[must_use]
    pub fn scan(&self) -> Vec<Item> {
        let mut partitions: Vec<_> = self.data.iter().collect();
        partitions.sort_by(|a, b| format!("{}", a.key()).cmp(&format!("{}", b.key())));

        partitions
            .iter()
            .flat_map(|entry| entry.value().values().map(|s| s.attributes.clone()))
            .collect()
    }

    fn remove_if_empty(&self, partition_key: &AttributeValue) {
        self.data.remove_if(partition_key, |_, items| items.is_empty());
    }

    /// Split an item's key attributes into the partition value and the
    /// BTreeMap sort key.
    fn split_key(&self, item: &Item) -> Result<(AttributeValue, SortableAttributeValue), StorageError> {
        let key = extract_primary_key(&self.schema, item)?;
        Ok((
            key.partition_key,
            key.sort_key.unwrap_or(SortableAttributeValue::Sentinel),
        ))
    }

    /// The key attributes of `key` as an item, used to seed upserts.
    fn key_item(&self, key: &PrimaryKey) -> Item {
        let mut item = Item::new();
        item.insert(self.schema.partition_key.clone(), key.partition_key.clone());
        if let (Some(name), Some(value)) = (
            &self.schema.sort_key,
            key.sort_key.as_ref().and_then(to_attribute_value),
        ) {
            item.insert(name.clone(), value);
        }
        item
    }
}

// ---------------------------------------------------------------------------
// Key extraction
// ---------------------------------------------------------------------------

/// Extracts the primary key from an item according to the table schema.
/// Non-key attributes are ignored and number key values are canonicalized.
///
/// # Errors
///
/// Returns `StorageError::MissingKeyAttribute` if a key attribute is
/// missing, or `StorageError::InvalidKeyType` if it is not S or N.
pub fn extract_primary_key(schema: &TableSchema, item: &Item) -> Result<PrimaryKey, StorageError> {
    let pk_value = item
        .get(&schema.partition_key)
        .ok_or_else(|| StorageError::MissingKeyAttribute {
            attr: schema.partition_key.clone(),
        })?;
    // Validates the partition key type.
    SortableAttributeValue::from_attribute_value(&schema.partition_key, pk_value)?;

    let sort_key = match &schema.sort_key {
        Some(name) => {
            let sk_value = item
                .get(name)
                .ok_or_else(|| StorageError::MissingKeyAttribute { attr: name.clone() })?;
            Some(SortableAttributeValue::from_attribute_value(name, sk_value)?)
        }
        None => None,
    };

    Ok(PrimaryKey {
        partition_key: partition_key_of(pk_value),
        sort_key,
    })
}
