//! Model types shared by the dynasql crates.
//!
//! Attribute values and items, table key schemas, the outputs of mutating
//! store operations and the store error type.
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod output;
pub mod types;

pub use attribute_value::{AttributeValue, Item, item_from_json};
pub use error::{StoreError, StoreErrorCode};
pub use output::{DeleteItemOutput, PutItemOutput, UpdateItemOutput};
pub use types::TableSchema;
