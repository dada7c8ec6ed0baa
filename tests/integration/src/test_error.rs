//! Error handling integration tests.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use dynasql_core::SqlError;
    use dynasql_core::store::{DeleteRequest, ItemStore, QueryRequest, ScanRequest, UpdateRequest};
    use dynasql_model::{
        DeleteItemOutput, Item, PutItemOutput, StoreError, StoreErrorCode, TableSchema,
        UpdateItemOutput, store_error,
    };

    use crate::Fixture;

    /// A store whose data calls all fail with the same error code.
    #[derive(Debug)]
    struct FailingStore {
        code: StoreErrorCode,
        calls: AtomicUsize,
    }

    impl FailingStore {
        fn new(code: StoreErrorCode) -> Self {
            Self {
                code,
                calls: AtomicUsize::new(0),
            }
        }

        fn fail<T>(&self) -> Result<T, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::with_message(self.code, "injected failure"))
        }
    }

    impl ItemStore for FailingStore {
        fn describe_table(&self, table: &str) -> Result<TableSchema, StoreError> {
            Ok(TableSchema::new(table, "id"))
        }

        fn get_item(&self, _table: &str, _key: &Item) -> Result<Option<Item>, StoreError> {
            self.fail()
        }

        fn query(&self, _request: &QueryRequest) -> Result<Vec<Item>, StoreError> {
            self.fail()
        }

        fn scan(&self, _request: &ScanRequest) -> Result<Vec<Item>, StoreError> {
            self.fail()
        }

        fn put_item(&self, _table: &str, _item: Item) -> Result<PutItemOutput, StoreError> {
            self.fail()
        }

        fn update_item(&self, _request: UpdateRequest) -> Result<UpdateItemOutput, StoreError> {
            self.fail()
        }

        fn delete_item(&self, _request: DeleteRequest) -> Result<DeleteItemOutput, StoreError> {
            self.fail()
        }
    }

    #[test]
    fn test_should_pass_store_errors_through_unchanged() {
        let codes = [
            StoreErrorCode::ProvisionedThroughputExceededException,
            StoreErrorCode::AccessDeniedException,
            StoreErrorCode::ResourceNotFoundException,
        ];
        for code in codes {
            let sql = dynasql_core::SqlWrapper::new(FailingStore::new(code));
            for statement in [
                "SELECT * FROM t WHERE id = 'a'",
                "SELECT * FROM t",
                "INSERT INTO t (id) VALUES ('a')",
                "UPDATE t SET x = 1 WHERE id = 'a'",
                "DELETE FROM t WHERE id = 'a'",
            ] {
                let err = sql.execute_query(statement).unwrap_err();
                assert_eq!(err.store_code(), Some(code), "{statement}");
            }
            // One store call per statement, never retried.
            assert_eq!(sql.store().calls.load(Ordering::SeqCst), 5);
        }
    }

    #[test]
    fn test_should_flag_throttling_errors() {
        let sql = dynasql_core::SqlWrapper::new(FailingStore::new(
            StoreErrorCode::ProvisionedThroughputExceededException,
        ));
        let err = sql.execute_query("SELECT * FROM t").unwrap_err();
        let SqlError::Store(store) = err else {
            panic!("expected store error, got {err:?}");
        };
        assert!(store.is_throttling());
        assert_eq!(store.message, "injected failure");
    }

    #[test]
    fn test_should_reject_bad_statements_before_any_store_call() {
        let sql = dynasql_core::SqlWrapper::new(FailingStore::new(
            StoreErrorCode::InternalServerError,
        ));
        let cases: [(&str, fn(&SqlError) -> bool); 9] = [
            ("SELECT * FROM t WHERE a != 1", |e| {
                matches!(e, SqlError::Parse { .. })
            }),
            ("SELECT * FROM t WHERE a = bare", |e| {
                matches!(e, SqlError::Parse { .. })
            }),
            ("SELECT * FROM t WHERE (a = 1)", |e| {
                matches!(e, SqlError::Parse { .. })
            }),
            ("SELECT city FROM t GROUP BY city", |e| {
                matches!(e, SqlError::UnsupportedStatement { .. })
            }),
            ("INSERT INTO t (id, ts) VALUES ('a', NOW())", |e| {
                matches!(e, SqlError::UnsupportedStatement { .. })
            }),
            ("MERGE INTO t", |e| {
                matches!(e, SqlError::UnsupportedStatement { .. })
            }),
            ("SELECT * WHERE id = 'a'", |e| {
                matches!(e, SqlError::MalformedStatement { .. })
            }),
            ("INSERT INTO t (id, name) VALUES ('a')", |e| {
                matches!(e, SqlError::MalformedStatement { .. })
            }),
            ("UPDATE t SET x = 1", |e| {
                matches!(e, SqlError::MalformedStatement { .. })
            }),
        ];
        for (statement, expected) in cases {
            let err = sql.execute_query(statement).unwrap_err();
            assert!(expected(&err), "{statement}: {err:?}");
        }
        assert_eq!(sql.store().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_should_reject_key_problems_before_any_data_call() {
        let sql = dynasql_core::SqlWrapper::new(FailingStore::new(
            StoreErrorCode::InternalServerError,
        ));
        let err = sql
            .execute_query("DELETE FROM t WHERE name = 'a'")
            .unwrap_err();
        assert!(matches!(err, SqlError::IncompleteKey { .. }));
        let err = sql
            .execute_query("UPDATE t SET id = 'b' WHERE id = 'a'")
            .unwrap_err();
        assert!(matches!(err, SqlError::MalformedStatement { .. }));
        assert_eq!(sql.store().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_should_report_missing_table() {
        let fx = Fixture::new();
        let err = fx.sql.table("no-such-table").unwrap_err();
        assert_eq!(
            err.store_code(),
            Some(store_error!(ResourceNotFoundException).code)
        );
        assert!(err.to_string().contains("no-such-table"));
    }
}
