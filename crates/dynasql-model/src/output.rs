//! Outputs of the mutating store operations.
//!
//! These are echoed back to the caller unchanged by the SQL layer. Field
//! names serialize as `PascalCase`; absent attribute maps are omitted.

use serde::{Deserialize, Serialize};

use crate::attribute_value::Item;

/// Output of a put.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemOutput {
    /// The item previously stored under the same key, if one was replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
}

/// Output of an attribute-level update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemOutput {
    /// All attributes of the item after the update.
    pub attributes: Item,
}

/// Output of a delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemOutput {
    /// The deleted item, or `None` if no item existed under the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
}
