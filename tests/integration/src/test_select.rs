//! SELECT integration tests.

#[cfg(test)]
mod tests {
    use dynasql_model::AttributeValue;

    use crate::Fixture;

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_owned())
    }

    #[test]
    fn test_should_project_and_filter_structured_select() {
        let fx = Fixture::new();
        let users = fx.users();
        let table = fx.sql.table(&users).unwrap();

        let mut rows = table
            .select(&["id", "name"], Some("age > 30 AND city = 'Seattle'"))
            .unwrap();
        rows.sort_by(|a, b| a.get("id").unwrap().as_s().cmp(&b.get("id").unwrap().as_s()));

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "name"]);
            assert!(!row.contains("age"));
            assert!(!row.contains("city"));
        }
        assert_eq!(rows[0].get("name"), Some(&s("Ada")));
        assert_eq!(rows[1].get("name"), Some(&s("Grace")));
    }

    #[test]
    fn test_should_select_all_attributes_sorted_by_name() {
        let fx = Fixture::new();
        let users = fx.users();

        let rows = fx
            .sql
            .execute_query(&format!("SELECT * FROM `{users}` WHERE id = 'u4'"))
            .unwrap()
            .into_rows()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].columns().collect::<Vec<_>>(),
            vec!["age", "city", "id", "name"]
        );
        assert_eq!(
            rows[0].to_plain_json(),
            serde_json::json!({"id": "u4", "name": "Ken", "age": 52, "city": "Boston"})
        );
    }

    #[test]
    fn test_should_omit_missing_columns() {
        let fx = Fixture::new();
        let users = fx.users();

        let rows = fx
            .sql
            .execute_query(&format!("select name, email from `{users}` where id = 'u1';"))
            .unwrap()
            .into_rows()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["name"]);
    }

    fn ids(fx: &Fixture, sql: &str) -> Vec<String> {
        let rows = fx.sql.execute_query(sql).unwrap().into_rows().unwrap();
        let mut ids: Vec<String> = rows
            .iter()
            .filter_map(|r| r.get("id").map(|v| v.to_plain_json().to_string()))
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_should_return_same_rows_for_get_and_scan() {
        let fx = Fixture::new();
        let users = fx.users();
        let expected = vec![r#""u2""#.to_owned()];
        for condition in [
            "id = 'u2'",
            "id = 'u2' AND age = 45",
            "id = 'u2' OR id = 'none'",
            "name = 'Grace'",
        ] {
            let sql = format!("SELECT id FROM `{users}` WHERE {condition}");
            assert_eq!(ids(&fx, &sql), expected, "{condition}");
        }

        let nums = fx.create_table("nums", "id", None);
        fx.seed(&nums, vec![
            serde_json::json!({"id": 1, "v": "a"}),
            serde_json::json!({"id": 2, "v": "b"}),
        ]);
        for condition in ["id = 1", "id = 1.0", "id = 1.0 OR id = 99", "v = 'a'"] {
            let sql = format!("SELECT id FROM `{nums}` WHERE {condition}");
            assert_eq!(ids(&fx, &sql), vec!["1".to_owned()], "{condition}");
        }
    }

    #[test]
    fn test_should_scan_with_or_predicate() {
        let fx = Fixture::new();
        let users = fx.users();

        let rows = fx
            .sql
            .execute_query(&format!(
                "SELECT id FROM `{users}` WHERE id = 'u1' OR city = 'Boston'"
            ))
            .unwrap()
            .into_rows()
            .unwrap();

        let mut ids: Vec<_> = rows
            .iter()
            .filter_map(|r| r.get("id").and_then(AttributeValue::as_s))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["u1", "u4"]);
    }

    #[test]
    fn test_should_return_empty_for_unknown_key() {
        let fx = Fixture::new();
        let users = fx.users();

        let rows = fx
            .sql
            .table(&users)
            .unwrap()
            .select(&["*"], Some("id = 'nobody'"))
            .unwrap();

        assert!(rows.is_empty());
    }

    #[test]
    fn test_should_range_query_sort_key_in_both_directions() {
        let fx = Fixture::new();
        let events = fx.create_table("events", "user", Some("ts"));
        fx.seed(&events, vec![
            serde_json::json!({"user": "u1", "ts": 10, "kind": "view"}),
            serde_json::json!({"user": "u1", "ts": 20, "kind": "click"}),
            serde_json::json!({"user": "u1", "ts": 30, "kind": "view"}),
            serde_json::json!({"user": "u2", "ts": 15, "kind": "view"}),
        ]);

        let ts = |sql: String| -> Vec<String> {
            fx.sql
                .execute_query(&sql)
                .unwrap()
                .into_rows()
                .unwrap()
                .iter()
                .filter_map(|r| r.get("ts").and_then(AttributeValue::as_n).map(str::to_owned))
                .collect()
        };

        assert_eq!(
            ts(format!(
                "SELECT ts FROM `{events}` WHERE user = 'u1' AND ts >= 20 ORDER BY ts ASC"
            )),
            vec!["20", "30"]
        );
        assert_eq!(
            ts(format!(
                "SELECT ts FROM `{events}` WHERE user = 'u1' ORDER BY ts DESC LIMIT 2"
            )),
            vec!["30", "20"]
        );
        assert_eq!(
            ts(format!(
                "SELECT ts FROM `{events}` WHERE user = 'u1' AND kind = 'view' LIMIT 1"
            )),
            vec!["10"]
        );
    }
}
