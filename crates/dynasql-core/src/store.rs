//! The item store collaborator.
//!
//! The SQL layer talks to storage only through [`ItemStore`]. Requests are
//! plain data so they can be logged before they are sent.

use std::sync::Arc;

use dynasql_model::{
    AttributeValue, DeleteItemOutput, Item, PutItemOutput, StoreError, TableSchema,
    UpdateItemOutput,
};

use crate::classifier::KeyCondition;
use crate::expression::Predicate;

/// Indexed read of one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Table name.
    pub table: String,
    /// Partition-key equality and optional sort-key range.
    pub key_condition: KeyCondition,
    /// Filter applied to items matching the key condition.
    pub filter: Option<Predicate>,
    /// `false` reads the partition in descending sort-key order.
    pub scan_forward: bool,
}

/// Full-table read.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    /// Table name.
    pub table: String,
    /// Filter applied to every item.
    pub filter: Option<Predicate>,
}

/// Attribute-level update of a single item.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    /// Table name.
    pub table: String,
    /// Full primary key.
    pub key: Item,
    /// Attributes to set, in order.
    pub updates: Vec<(String, AttributeValue)>,
    /// Condition the existing item must satisfy.
    pub condition: Option<Predicate>,
}

/// Delete of a single item.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    /// Table name.
    pub table: String,
    /// Full primary key.
    pub key: Item,
    /// Condition the existing item must satisfy.
    pub condition: Option<Predicate>,
}

/// A schemaless key/attribute store.
///
/// Calls are single-shot: implementations report failures as [`StoreError`]
/// and callers never retry them.
pub trait ItemStore {
    /// Key schema of `table`.
    fn describe_table(&self, table: &str) -> Result<TableSchema, StoreError>;

    /// Point lookup by full primary key.
    fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>, StoreError>;

    /// Indexed read of one partition, in sort-key order.
    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, StoreError>;

    /// Full-table read.
    fn scan(&self, request: &ScanRequest) -> Result<Vec<Item>, StoreError>;

    /// Insert or replace an item.
    fn put_item(&self, table: &str, item: Item) -> Result<PutItemOutput, StoreError>;

    /// Set attributes on an item, creating it if absent.
    fn update_item(&self, request: UpdateRequest) -> Result<UpdateItemOutput, StoreError>;

    /// Delete an item. Deleting a missing item is not an error.
    fn delete_item(&self, request: DeleteRequest) -> Result<DeleteItemOutput, StoreError>;
}

impl<S: ItemStore + ?Sized> ItemStore for Arc<S> {
    fn describe_table(&self, table: &str) -> Result<TableSchema, StoreError> {
        (**self).describe_table(table)
    }

    fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>, StoreError> {
        (**self).get_item(table, key)
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, StoreError> {
        (**self).query(request)
    }

    fn scan(&self, request: &ScanRequest) -> Result<Vec<Item>, StoreError> {
        (**self).scan(request)
    }

    fn put_item(&self, table: &str, item: Item) -> Result<PutItemOutput, StoreError> {
        (**self).put_item(table, item)
    }

    fn update_item(&self, request: UpdateRequest) -> Result<UpdateItemOutput, StoreError> {
        (**self).update_item(request)
    }

    fn delete_item(&self, request: DeleteRequest) -> Result<DeleteItemOutput, StoreError> {
        (**self).delete_item(request)
    }
}
