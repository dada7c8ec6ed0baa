//! INSERT / UPDATE / DELETE integration tests.

#[cfg(test)]
mod tests {
    use dynasql_core::{ExecuteOutput, SqlError, TableOptions};
    use dynasql_model::{AttributeValue, StoreErrorCode};

    use crate::{Fixture, item};

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_owned())
    }

    fn n(v: &str) -> AttributeValue {
        AttributeValue::N(v.to_owned())
    }

    #[test]
    fn test_should_insert_then_select_by_id() -> anyhow::Result<()> {
        let fx = Fixture::new();
        let users = fx.create_table("users", "id", None);

        let out = fx.sql.execute_query(&format!(
            "INSERT INTO `{users}` (id, name, age, vip, note) VALUES ('u9', 'Barbara', 41, TRUE, NULL)"
        ))?;
        assert!(matches!(out, ExecuteOutput::Put(_)));

        let rows = fx
            .sql
            .execute_query(&format!("SELECT * FROM `{users}` WHERE id = 'u9'"))?
            .into_rows()
            .unwrap_or_default();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("age"), Some(&n("41")));
        assert_eq!(rows[0].get("vip"), Some(&AttributeValue::Bool(true)));
        assert_eq!(rows[0].get("note"), Some(&AttributeValue::Null(true)));
        Ok(())
    }

    #[test]
    fn test_should_update_one_attribute_and_keep_the_rest() -> anyhow::Result<()> {
        let fx = Fixture::new();
        let users = fx.users();

        let out = fx.sql.execute_query(&format!(
            "UPDATE `{users}` SET city = 'Portland', age = 37 WHERE id = 'u1'"
        ))?;
        let ExecuteOutput::Update(update) = out else {
            panic!("expected update output, got {out:?}");
        };
        assert_eq!(update.attributes.get("city"), Some(&s("Portland")));

        let item = fx
            .sql
            .table(&users)?
            .select(&["*"], Some("id = 'u1'"))?
            .pop()
            .map(dynasql_core::Row::into_item)
            .unwrap_or_default();
        assert_eq!(item.get("city"), Some(&s("Portland")));
        assert_eq!(item.get("age"), Some(&n("37")));
        assert_eq!(item.get("name"), Some(&s("Ada")));
        Ok(())
    }

    #[test]
    fn test_should_upsert_missing_item_on_update() -> anyhow::Result<()> {
        let fx = Fixture::new();
        let users = fx.create_table("users", "id", None);

        fx.sql
            .table(&users)?
            .update(item(serde_json::json!({"id": "new"})), item(serde_json::json!({"name": "Edsger"})))?;

        let rows = fx.sql.table(&users)?.select(&["name"], Some("id = 'new'"))?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&s("Edsger")));
        Ok(())
    }

    #[test]
    fn test_should_delete_missing_key_idempotently() -> anyhow::Result<()> {
        let fx = Fixture::new();
        let users = fx.users();

        let out = fx
            .sql
            .execute_query(&format!("DELETE FROM `{users}` WHERE id = 'ghost'"))?;
        assert_eq!(
            out,
            ExecuteOutput::Delete(dynasql_model::DeleteItemOutput::default())
        );
        // Deleting twice is fine too.
        fx.sql.table(&users)?.delete(item(serde_json::json!({"id": "ghost"})))?;

        let rows = fx.sql.table(&users)?.select(&["*"], Some("id = 'ghost'"))?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_should_delete_existing_item() -> anyhow::Result<()> {
        let fx = Fixture::new();
        let users = fx.users();

        fx.sql
            .execute_query(&format!("DELETE FROM `{users}` WHERE id = 'u2'"))?;

        let rows = fx.sql.table(&users)?.select(&[], None)?;
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.get("id") != Some(&s("u2"))));
        Ok(())
    }

    #[test]
    fn test_should_fail_conditional_update_and_leave_item_unchanged() -> anyhow::Result<()> {
        let fx = Fixture::new();
        let users = fx.users();

        let err = fx
            .sql
            .execute_query(&format!(
                "UPDATE `{users}` SET city = 'Austin' WHERE id = 'u4' AND city = 'Seattle'"
            ))
            .unwrap_err();
        assert_eq!(
            err.store_code(),
            Some(StoreErrorCode::ConditionalCheckFailedException)
        );

        let rows = fx.sql.table(&users)?.select(&["city"], Some("id = 'u4'"))?;
        assert_eq!(rows[0].get("city"), Some(&s("Boston")));
        Ok(())
    }

    #[test]
    fn test_should_surface_duplicate_key_from_unique_table() {
        let fx = Fixture::new();
        let users = fx.create_table_with_options("users", "id", None, TableOptions {
            enforce_unique_keys: true,
        });
        let insert = format!("INSERT INTO `{users}` (id, name) VALUES ('u1', 'Ada')");

        fx.sql.execute_query(&insert).unwrap();
        let err = fx.sql.execute_query(&insert).unwrap_err();

        assert!(matches!(err, SqlError::Store(_)));
        assert_eq!(err.store_code(), Some(StoreErrorCode::DuplicateKeyException));
    }

    #[test]
    fn test_should_require_sort_key_for_composite_delete() {
        let fx = Fixture::new();
        let events = fx.create_table("events", "user", Some("ts"));

        let err = fx
            .sql
            .execute_query(&format!("DELETE FROM `{events}` WHERE user = 'u1' AND ts > 3"))
            .unwrap_err();

        let SqlError::IncompleteKey { table, missing } = err else {
            panic!("expected incomplete key, got {err:?}");
        };
        assert_eq!(table, events);
        assert_eq!(missing, "ts");
    }
}
