//! In-memory item store.
//!
//! [`MemoryStore`] keeps one [`TableStorage`] per table and implements
//! [`ItemStore`], applying scan/query filters and write conditions with the
//! predicate evaluator.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use dynasql_model::{
    DeleteItemOutput, Item, PutItemOutput, StoreError, TableSchema, UpdateItemOutput,
};

use crate::error::storage_error_to_store;
use crate::expression::{Predicate, matches};
use crate::storage::{SortKeyCondition, StorageError, TableStorage, extract_primary_key};
use crate::store::{DeleteRequest, ItemStore, QueryRequest, ScanRequest, UpdateRequest};

/// Per-table behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Reject puts whose primary key is already taken with
    /// `DuplicateKeyException` instead of replacing the item.
    pub enforce_unique_keys: bool,
}

/// A single in-memory table.
#[derive(Debug)]
pub struct MemoryTable {
    /// Behavior switches.
    pub options: TableOptions,
    /// Item storage engine.
    pub storage: TableStorage,
}

impl MemoryTable {
    /// Key schema of this table.
    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        self.storage.schema()
    }
}

/// In-memory [`ItemStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// All tables keyed by name.
    tables: DashMap<String, Arc<MemoryTable>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with default options.
    pub fn create_table(&self, schema: TableSchema) -> Result<Arc<MemoryTable>, StoreError> {
        self.create_table_with_options(schema, TableOptions::default())
    }

    /// Create a table. Returns `ResourceInUseException` if it already exists.
    pub fn create_table_with_options(
        &self,
        schema: TableSchema,
        options: TableOptions,
    ) -> Result<Arc<MemoryTable>, StoreError> {
        let name = schema.table_name.clone();
        match self.tables.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(StoreError::resource_in_use(
                format!("Table already exists: {}", e.key()),
            )),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                debug!(table = %e.key(), ?options, "created table");
                let table = Arc::new(MemoryTable {
                    options,
                    storage: TableStorage::new(schema),
                });
                e.insert(Arc::clone(&table));
                Ok(table)
            }
        }
    }

    /// Get a table by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<Arc<MemoryTable>> {
        self.tables.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Get a table or return `ResourceNotFoundException`.
    pub fn require_table(&self, name: &str) -> Result<Arc<MemoryTable>, StoreError> {
        self.get_table(name).ok_or_else(|| {
            StoreError::resource_not_found(format!(
                "Requested resource not found: Table: {name} not found"
            ))
        })
    }
}

/// Apply a store-side filter.
fn apply_filter(items: Vec<Item>, filter: Option<&Predicate>) -> Vec<Item> {
    match filter {
        Some(f) => items.into_iter().filter(|item| matches(f, item)).collect(),
        None => items,
    }
}

/// Evaluate a write condition against the existing item. A missing item is
/// evaluated as an empty one.
fn condition_holds(condition: Option<&Predicate>, existing: Option<&Item>) -> bool {
    let empty = Item::new();
    condition.is_none_or(|c| matches(c, existing.unwrap_or(&empty)))
}

impl ItemStore for MemoryStore {
    fn describe_table(&self, table: &str) -> Result<TableSchema, StoreError> {
        Ok(self.require_table(table)?.schema().clone())
    }

    fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>, StoreError> {
        let table = self.require_table(table)?;
        match extract_primary_key(table.schema(), key) {
            Ok(pk) => Ok(table.storage.get_item(&pk)),
            // No item can have a key of a non-key type.
            Err(StorageError::InvalidKeyType { .. }) => Ok(None),
            Err(e) => Err(storage_error_to_store(e)),
        }
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, StoreError> {
        let table = self.require_table(&request.table)?;
        let key = &request.key_condition;
        if key.partition_key != table.schema().partition_key {
            return Err(StoreError::validation(format!(
                "Query condition missed key schema element: {}",
                table.schema().partition_key
            )));
        }

        let sort_condition = match &key.sort {
            Some(sort) => {
                match SortKeyCondition::from_comparison(&sort.attribute, sort.op, &sort.value) {
                    Ok(c) => Some(c),
                    Err(StorageError::InvalidKeyType { .. }) => return Ok(Vec::new()),
                    Err(e) => return Err(storage_error_to_store(e)),
                }
            }
            None => None,
        };

        let items = table.storage.query(
            &key.partition_value,
            sort_condition.as_ref(),
            request.scan_forward,
        );
        let scanned = items.len();
        let items = apply_filter(items, request.filter.as_ref());
        debug!(table = %request.table, scanned, returned = items.len(), "query");
        Ok(items)
    }

    fn scan(&self, request: &ScanRequest) -> Result<Vec<Item>, StoreError> {
        let table = self.require_table(&request.table)?;
        let items = table.storage.scan();
        let scanned = items.len();
        let items = apply_filter(items, request.filter.as_ref());
        debug!(table = %request.table, scanned, returned = items.len(), "scan");
        Ok(items)
    }

    fn put_item(&self, table: &str, item: Item) -> Result<PutItemOutput, StoreError> {
        let table = self.require_table(table)?;
        let old = if table.options.enforce_unique_keys {
            table
                .storage
                .insert_new(item)
                .map_err(storage_error_to_store)?;
            None
        } else {
            table.storage.put_item(item).map_err(storage_error_to_store)?
        };
        debug!(
            table = %table.schema().table_name,
            items = table.storage.item_count(),
            "put_item"
        );
        Ok(PutItemOutput { attributes: old })
    }

    fn update_item(&self, request: UpdateRequest) -> Result<UpdateItemOutput, StoreError> {
        let table = self.require_table(&request.table)?;
        let pk = extract_primary_key(table.schema(), &request.key).map_err(storage_error_to_store)?;
        let attributes = table
            .storage
            .update_item(&pk, &request.updates, |existing| {
                condition_holds(request.condition.as_ref(), existing)
            })
            .map_err(storage_error_to_store)?;
        Ok(UpdateItemOutput { attributes })
    }

    fn delete_item(&self, request: DeleteRequest) -> Result<DeleteItemOutput, StoreError> {
        let table = self.require_table(&request.table)?;
        let pk = extract_primary_key(table.schema(), &request.key).map_err(storage_error_to_store)?;
        let attributes = table
            .storage
            .delete_item(&pk, |existing| {
                condition_holds(request.condition.as_ref(), existing)
            })
            .map_err(storage_error_to_store)?;
        debug!(
            table = %request.table,
            items = table.storage.item_count(),
            "delete_item"
        );
        Ok(DeleteItemOutput { attributes })
    }
}
