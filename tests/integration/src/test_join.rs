//! JOIN integration tests.

#[cfg(test)]
mod tests {
    use dynasql_core::SqlError;
    use dynasql_model::AttributeValue;

    use crate::Fixture;

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_owned())
    }

    /// Create `users` and an `orders` table whose `user_id` points at it.
    fn setup(fx: &Fixture) -> (String, String) {
        let users = fx.users();
        let orders = fx.create_table("orders", "id", None);
        fx.seed(&orders, vec![
            serde_json::json!({"id": "o1", "user_id": "u1", "total": 25}),
            serde_json::json!({"id": "o2", "user_id": "u1", "total": 5}),
            serde_json::json!({"id": "o3", "user_id": "u4", "total": 90}),
            serde_json::json!({"id": "o4", "user_id": "nobody", "total": 12}),
        ]);
        (orders, users)
    }

    fn order_ids(rows: &[dynasql_core::Row], column: &str) -> Vec<String> {
        let mut ids: Vec<String> = rows
            .iter()
            .filter_map(|r| r.get(column).and_then(AttributeValue::as_s).map(str::to_owned))
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_should_merge_matching_rows_and_drop_unmatched() {
        let fx = Fixture::new();
        let (orders, users) = setup(&fx);

        let rows: Vec<_> = fx
            .sql
            .table(&orders)
            .unwrap()
            .join(&users, &format!("`{orders}`.user_id = `{users}`.id"))
            .unwrap()
            .collect();

        assert_eq!(rows.len(), 3);
        // Left attributes win on clashing names.
        assert_eq!(order_ids(&rows, "id"), vec!["o1", "o2", "o3"]);
        let o3 = rows.iter().find(|r| r.get("id") == Some(&s("o3"))).unwrap();
        assert_eq!(o3.get("name"), Some(&s("Ken")));
        assert_eq!(o3.get("city"), Some(&s("Boston")));
    }

    #[test]
    fn test_should_recompute_join_on_each_call() {
        let fx = Fixture::new();
        let (orders, users) = setup(&fx);
        let table = fx.sql.table(&orders).unwrap();
        let condition = format!("user_id = `{users}`.id");

        assert_eq!(table.join(&users, &condition).unwrap().count(), 3);
        fx.seed(&orders, vec![serde_json::json!({"id": "o5", "user_id": "u2"})]);
        assert_eq!(table.join(&users, &condition).unwrap().count(), 4);
    }

    #[test]
    fn test_should_project_qualified_columns_and_push_down_filters() {
        let fx = Fixture::new();
        let (orders, users) = setup(&fx);

        let rows = fx
            .sql
            .execute_query(&format!(
                "SELECT `{orders}`.id, `{users}`.id, name FROM `{orders}` INNER JOIN `{users}` \
                 ON `{orders}`.user_id = `{users}`.id \
                 WHERE `{orders}`.total > 10 AND `{users}`.city = 'Seattle'"
            ))
            .unwrap()
            .into_rows()
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(
            row.columns().collect::<Vec<_>>(),
            vec![
                format!("{orders}.id").as_str(),
                format!("{users}.id").as_str(),
                "name"
            ]
        );
        assert_eq!(row.get(&format!("{orders}.id")), Some(&s("o1")));
        assert_eq!(row.get(&format!("{users}.id")), Some(&s("u1")));
        assert_eq!(row.get("name"), Some(&s("Ada")));
    }

    #[test]
    fn test_should_filter_merged_rows_and_limit() {
        let fx = Fixture::new();
        let (orders, users) = setup(&fx);

        let rows = fx
            .sql
            .execute_query(&format!(
                "SELECT * FROM `{orders}` JOIN `{users}` ON user_id = id WHERE name = 'Ada' LIMIT 1"
            ))
            .unwrap()
            .into_rows()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("user_id"), Some(&s("u1")));
    }

    #[test]
    fn test_should_reject_or_in_join_where() {
        let fx = Fixture::new();
        let (orders, users) = setup(&fx);

        let err = fx
            .sql
            .execute_query(&format!(
                "SELECT * FROM `{orders}` JOIN `{users}` ON user_id = id WHERE total > 1 OR name = 'Ada'"
            ))
            .unwrap_err();

        assert!(matches!(err, SqlError::UnsupportedStatement { .. }));
    }
}
