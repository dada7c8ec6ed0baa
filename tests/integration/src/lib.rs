//! End-to-end tests for dynasql.
//!
//! Every test builds its own [`MemoryStore`] with uniquely named tables and
//! drives it through [`SqlWrapper`], so tests are independent and run in
//! parallel.
//!
//! Run them with:
//! ```text
//! cargo test -p dynasql-integration
//! ```

use std::sync::{Arc, Once};

use dynasql_core::{MemoryStore, SqlWrapper, TableOptions};
use dynasql_model::{Item, TableSchema, item_from_json};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Generate a unique table name for a test.
#[must_use]
pub fn test_table_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Build an item from a plain JSON object.
#[must_use]
pub fn item(value: serde_json::Value) -> Item {
    item_from_json(value).unwrap_or_else(|| panic!("fixture is not a JSON object"))
}

/// A wrapper over a shared in-memory store. The store handle is kept so
/// tests can inspect it directly.
#[derive(Debug)]
pub struct Fixture {
    /// The store the wrapper executes against.
    pub store: Arc<MemoryStore>,
    /// The SQL front end.
    pub sql: SqlWrapper<Arc<MemoryStore>>,
}

impl Fixture {
    /// Create an empty store and wrapper.
    #[must_use]
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let sql = SqlWrapper::new(Arc::clone(&store));
        Self { store, sql }
    }

    /// Create a uniquely named table and return its name.
    pub fn create_table(&self, prefix: &str, partition_key: &str, sort_key: Option<&str>) -> String {
        self.create_table_with_options(prefix, partition_key, sort_key, TableOptions::default())
    }

    /// Create a uniquely named table with `options` and return its name.
    pub fn create_table_with_options(
        &self,
        prefix: &str,
        partition_key: &str,
        sort_key: Option<&str>,
        options: TableOptions,
    ) -> String {
        let name = test_table_name(prefix);
        let schema = TableSchema::new(&name, partition_key);
        let schema = match sort_key {
            Some(sk) => schema.with_sort_key(sk),
            None => schema,
        };
        self.store
            .create_table_with_options(schema, options)
            .unwrap_or_else(|e| panic!("failed to create table {name}: {e}"));
        name
    }

    /// Insert fixture items through the structured API.
    pub fn seed(&self, table: &str, items: Vec<serde_json::Value>) {
        let handle = self
            .sql
            .table(table)
            .unwrap_or_else(|e| panic!("failed to open table {table}: {e}"));
        for value in items {
            handle
                .insert(item(value))
                .unwrap_or_else(|e| panic!("failed to seed {table}: {e}"));
        }
    }

    /// A `users` table keyed by `id` with four people.
    pub fn users(&self) -> String {
        let table = self.create_table("users", "id", None);
        self.seed(&table, vec![
            serde_json::json!({"id": "u1", "name": "Ada", "age": 36, "city": "Seattle"}),
            serde_json::json!({"id": "u2", "name": "Grace", "age": 45, "city": "Seattle"}),
            serde_json::json!({"id": "u3", "name": "Linus", "age": 28, "city": "Seattle"}),
            serde_json::json!({"id": "u4", "name": "Ken", "age": 52, "city": "Boston"}),
        ]);
        table
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

mod test_error;
mod test_join;
mod test_mutation;
mod test_select;
