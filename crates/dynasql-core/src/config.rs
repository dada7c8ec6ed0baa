//! SQL layer configuration.

use std::collections::HashMap;
use std::env;

use tracing::warn;

use dynasql_model::TableSchema;

/// Configuration for [`crate::SqlWrapper`].
#[derive(Debug, Clone, Default)]
pub struct SqlConfig {
    /// Table schemas known up front. Tables not listed here are discovered
    /// through the store's `describe_table`.
    pub tables: HashMap<String, TableSchema>,
    /// Row cap applied to SELECT and JOIN statements without a LIMIT.
    pub default_limit: Option<usize>,
}

impl SqlConfig {
    /// Create configuration from environment variables.
    ///
    /// - `DYNASQL_TABLES`: comma-separated `table=partition_key[:sort_key]`
    ///   entries.
    /// - `DYNASQL_DEFAULT_LIMIT`: default row cap.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            tables: env::var("DYNASQL_TABLES")
                .map(|v| parse_table_schemas(&v))
                .unwrap_or_default(),
            default_limit: env_usize("DYNASQL_DEFAULT_LIMIT"),
        }
    }

    /// Declare a table schema.
    #[must_use]
    pub fn with_table(mut self, schema: TableSchema) -> Self {
        self.tables.insert(schema.table_name.clone(), schema);
        self
    }

    /// Set the default row cap.
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Configured schema for `table`, if any.
    #[must_use]
    pub fn schema(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(table)
    }
}

/// Parse `table=pk[:sk]` entries separated by commas. Malformed entries are
/// skipped with a warning.
#[must_use]
pub fn parse_table_schemas(value: &str) -> HashMap<String, TableSchema> {
    let mut tables = HashMap::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match parse_table_schema(entry) {
            Some(schema) => {
                tables.insert(schema.table_name.clone(), schema);
            }
            None => warn!(entry, "ignoring malformed DYNASQL_TABLES entry"),
        }
    }
    tables
}

fn parse_table_schema(entry: &str) -> Option<TableSchema> {
    let (table, keys) = entry.split_once('=')?;
    let (table, keys) = (table.trim(), keys.trim());
    let (pk, sk) = match keys.split_once(':') {
        Some((pk, sk)) => (pk.trim(), Some(sk.trim())),
        None => (keys, None),
    };
    if table.is_empty() || pk.is_empty() || sk.is_some_and(|s| s.is_empty() || s == pk) {
        return None;
    }
    let schema = TableSchema::new(table, pk);
    Some(match sk {
        Some(sk) => schema.with_sort_key(sk),
        None => schema,
    })
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring non-numeric value");
            None
        }
    }
}
