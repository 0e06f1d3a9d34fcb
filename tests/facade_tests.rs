#[cfg(test)]
mod facade_tests {
    use sqlport::drivers::{GenericDriver, SqliteDriver};
    use sqlport::test_utils::MemoryConnection;
    use sqlport::{
        AssocValue, AutoQueryMode, DbFacade, DriverOptions, ErrorCode, FetchMode, Portability,
        RowData, Value,
    };

    fn sqlite_facade() -> DbFacade {
        let mut db = DbFacade::new(SqliteDriver::memory().unwrap());
        db.query("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, team TEXT)", ())
            .unwrap();
        db
    }

    fn seed_people(db: &mut DbFacade) {
        let id = db
            .prepare("INSERT INTO people (name, team) VALUES (?, ?)")
            .unwrap();
        let rows = vec![
            vec![Value::Text("ada".into()), Value::Text("compilers".into())],
            vec![Value::Text("grace".into()), Value::Text("compilers".into())],
            vec![Value::Text("linus".into()), Value::Text("kernels".into())],
        ];
        db.execute_multiple(id, &rows).unwrap();
        db.free_prepared(id).unwrap();
    }

    #[test]
    fn test_prepare_execute_fetch_round_trip() {
        let mut db = sqlite_facade();
        seed_people(&mut db);

        let all = db
            .get_all("SELECT name FROM people ORDER BY id", (), FetchMode::ORDERED)
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].values()[0], Value::Text("ada".into()));

        let one = db
            .get_one("SELECT name FROM people WHERE id = ?", Value::Integer(2))
            .unwrap();
        assert_eq!(one, Some(Value::Text("grace".into())));

        let col = db
            .get_col("SELECT name FROM people ORDER BY id", 0usize, ())
            .unwrap();
        assert_eq!(col.len(), 3);

        let by_name = db
            .get_col("SELECT id, name FROM people ORDER BY id", "name", ())
            .unwrap();
        assert_eq!(by_name[0], Value::Text("ada".into()));

        let err = db
            .get_col("SELECT id FROM people", "ghost", ())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoSuchField);

        let row = db
            .get_row("SELECT id, name FROM people WHERE name = ?",
                Value::Text("linus".into()),
                FetchMode::ASSOC,
            )
            .unwrap();
        match row {
            Some(RowData::Assoc(row)) => assert_eq!(row.get_i64("id"), Some(3)),
            other => panic!("expected assoc row, got {:?}", other),
        }
    }

    #[test]
    fn test_placeholder_substitution_scenario() {
        let mut db = sqlite_facade();
        db.query("CREATE TABLE t (a TEXT, b TEXT)", ()).unwrap();

        let id = db.prepare("INSERT INTO t (a,b) VALUES (?, !)").unwrap();
        let err_or_ok = db.execute(
            id,
            &[Value::Text("hello's".into()), Value::Text("NOW()".into())],
        );
        // NOW() is not a sqlite function; the substitution itself is what
        // this scenario pins down.
        let _ = err_or_ok;
        assert_eq!(
            db.last_query(),
            Some("INSERT INTO t (a,b) VALUES ('hello''s', NOW())")
        );
    }

    #[test]
    fn test_limit_query_native_window() {
        let mut db = sqlite_facade();
        let id = db.prepare("INSERT INTO people (name, team) VALUES (?, 'x')").unwrap();
        for i in 1..=20 {
            db.execute(id, &[Value::Text(format!("p{:02}", i))]).unwrap();
        }
        db.free_prepared(id).unwrap();

        let mut cursor = db
            .limit_query("SELECT name FROM people ORDER BY id", 5, 5, ())
            .unwrap()
            .rows()
            .unwrap();

        let mut names = Vec::new();
        while let Some(RowData::Ordered(values)) = cursor.fetch_row(None).unwrap() {
            names.push(values[0].as_str().unwrap().to_string());
        }
        assert_eq!(names, vec!["p06", "p07", "p08", "p09", "p10"]);
        cursor.free().unwrap();
    }

    #[test]
    fn test_limit_query_emulated_window() {
        // An "odbc" platform has no LIMIT dialect; the window must be
        // applied client-side.
        let rows: Vec<Vec<Value>> = (1..=20).map(|i| vec![Value::Integer(i)]).collect();
        let mut conn = MemoryConnection::new("odbc");
        conn.push_result(vec!["n"], rows);
        let log = conn.log();

        let mut options = DriverOptions::default();
        options.autofree = true;
        let mut db = DbFacade::with_options(GenericDriver::new(Box::new(conn)), options);

        let mut cursor = db
            .limit_query("SELECT n FROM nums", 5, 5, ())
            .unwrap()
            .rows()
            .unwrap();

        // The query reached the backend unmodified.
        assert_eq!(log.borrow().as_slice(), &["SELECT n FROM nums".to_string()]);

        let mut seen = Vec::new();
        while let Some(RowData::Ordered(values)) = cursor.fetch_row(None).unwrap() {
            seen.push(values[0].as_i64().unwrap());
        }
        assert_eq!(seen, vec![6, 7, 8, 9, 10]);
        // The sixth attempt stays end-of-data, with the handle autofreed.
        assert!(cursor.fetch_row(None).unwrap().is_none());
        assert!(cursor.is_freed());
    }

    #[test]
    fn test_get_assoc_two_column_semantics() {
        let mut db = sqlite_facade();
        seed_people(&mut db);

        let map = db
            .get_assoc("SELECT name, team FROM people", false, (), false)
            .unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(
            map.get("ada"),
            Some(&AssocValue::Scalar(Value::Text("compilers".into())))
        );
    }

    #[test]
    fn test_get_assoc_duplicate_keys_overwrite_or_group() {
        let mut db = sqlite_facade();
        seed_people(&mut db);

        // Keyed by team: without grouping the later row wins.
        let map = db
            .get_assoc(
                "SELECT team, name FROM people ORDER BY id",
                false,
                (),
                false,
            )
            .unwrap();
        assert_eq!(
            map.get("compilers"),
            Some(&AssocValue::Scalar(Value::Text("grace".into())))
        );

        // With grouping both accumulate under the shared key.
        let map = db
            .get_assoc("SELECT team, name FROM people ORDER BY id", false, (), true)
            .unwrap();
        match map.get("compilers") {
            Some(AssocValue::Group(entries)) => {
                assert_eq!(
                    entries.as_slice(),
                    &[
                        AssocValue::Scalar(Value::Text("ada".into())),
                        AssocValue::Scalar(Value::Text("grace".into()))
                    ]
                );
            }
            other => panic!("expected grouped entries, got {:?}", other),
        }
    }

    #[test]
    fn test_get_assoc_wide_rows_and_force_array() {
        let mut db = sqlite_facade();
        seed_people(&mut db);

        // Three result columns: values are key-stripped row tails.
        let map = db
            .get_assoc("SELECT name, team, id FROM people", false, (), false)
            .unwrap();
        assert_eq!(
            map.get("ada"),
            Some(&AssocValue::Row(vec![
                Value::Text("compilers".into()),
                Value::Integer(1)
            ]))
        );

        // force_array wraps even a single tail column.
        let map = db
            .get_assoc("SELECT name, team FROM people", true, (), false)
            .unwrap();
        assert_eq!(
            map.get("ada"),
            Some(&AssocValue::Row(vec![Value::Text("compilers".into())]))
        );
    }

    #[test]
    fn test_get_assoc_needs_two_columns() {
        let mut db = sqlite_facade();
        seed_people(&mut db);
        let err = db
            .get_assoc("SELECT name FROM people", false, (), false)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Truncated);
    }

    #[test]
    fn test_get_all_flipped_is_column_major() {
        let mut db = sqlite_facade();
        seed_people(&mut db);

        let flipped = db
            .get_all(
                "SELECT id, name FROM people ORDER BY id",
                (),
                FetchMode::ORDERED | FetchMode::FLIPPED,
            )
            .unwrap();
        assert_eq!(flipped.len(), 2);
        assert_eq!(
            flipped[0].values(),
            &[Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
        assert_eq!(
            flipped[1].values(),
            &[
                Value::Text("ada".into()),
                Value::Text("grace".into()),
                Value::Text("linus".into())
            ]
        );
    }

    #[test]
    fn test_default_fetch_mode_substitution() {
        let mut db = sqlite_facade();
        seed_people(&mut db);

        db.set_fetch_mode(FetchMode::ASSOC, None);
        let row = db
            .get_row("SELECT id, name FROM people WHERE id = 1", (), FetchMode::DEFAULT)
            .unwrap();
        assert!(matches!(row, Some(RowData::Assoc(_))));

        db.set_fetch_mode(FetchMode::OBJECT, Some("Person"));
        let row = db
            .get_row("SELECT id, name FROM people WHERE id = 1", (), FetchMode::DEFAULT)
            .unwrap();
        match row {
            Some(RowData::Object(obj)) => {
                assert_eq!(obj.type_name.as_deref(), Some("Person"));
                assert_eq!(obj.fields.get_str("name"), Some("ada"));
            }
            other => panic!("expected object row, got {:?}", other),
        }
    }

    #[test]
    fn test_portability_flags_through_options() {
        let mut options = DriverOptions::default();
        options.portability =
            Portability::LOWERCASE | Portability::RTRIM | Portability::NULL_TO_EMPTY;
        let mut db = DbFacade::with_options(SqliteDriver::memory().unwrap(), options);
        db.query("CREATE TABLE t (a TEXT)", ()).unwrap();
        db.query("INSERT INTO t (a) VALUES ('padded   ')", ()).unwrap();
        db.query("INSERT INTO t (a) VALUES (NULL)", ()).unwrap();

        let rows = db
            .get_all("SELECT a AS LOUD FROM t", (), FetchMode::ASSOC)
            .unwrap();
        match &rows[0] {
            RowData::Assoc(row) => assert_eq!(row.get_str("loud"), Some("padded")),
            other => panic!("unexpected row {:?}", other),
        }
        match &rows[1] {
            RowData::Assoc(row) => assert_eq!(row.get_str("loud"), Some("")),
            other => panic!("unexpected row {:?}", other),
        }
    }

    #[test]
    fn test_numrows_emulation_on_generic_backend() {
        let rows: Vec<Vec<Value>> = (1..=4).map(|i| vec![Value::Integer(i)]).collect();
        let mut conn = MemoryConnection::new("odbc");
        conn.push_result(vec!["n"], rows.clone());
        // The emulation re-runs the query, consuming a second script step.
        conn.push_result(vec!["n"], rows);

        let mut options = DriverOptions::default();
        options.portability = Portability::NUMROWS;
        let mut db = DbFacade::with_options(GenericDriver::new(Box::new(conn)), options);

        let mut cursor = db.query("SELECT n FROM nums", ()).unwrap().rows().unwrap();
        assert_eq!(cursor.num_rows().unwrap(), 4);
        cursor.free().unwrap();
    }

    #[test]
    fn test_strict_transactions_via_facade() {
        let mut db = sqlite_facade();
        db.auto_commit(false).unwrap();
        db.query("INSERT INTO people (name, team) VALUES ('x', 'y')", ())
            .unwrap();

        let err = db.auto_commit(true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ActiveTransactions);

        db.rollback().unwrap();
        db.auto_commit(true).unwrap();

        // With strictness disabled the toggle goes through mid-transaction.
        db.set_option("strict_transactions", Value::Bool(false)).unwrap();
        db.auto_commit(false).unwrap();
        db.query("INSERT INTO people (name, team) VALUES ('x', 'y')", ())
            .unwrap();
        db.auto_commit(true).unwrap();
    }

    #[test]
    fn test_delete_count_rewrite() {
        let mut options = DriverOptions::default();
        options.portability = Portability::DELETE_COUNT;
        let mut db = DbFacade::with_options(SqliteDriver::memory().unwrap(), options);
        db.query("CREATE TABLE t (a INTEGER)", ()).unwrap();
        db.query("INSERT INTO t (a) VALUES (1)", ()).unwrap();
        db.query("INSERT INTO t (a) VALUES (2)", ()).unwrap();

        let affected = db.query("DELETE FROM t", ()).unwrap().affected().unwrap();
        assert_eq!(affected, 2);
        assert_eq!(db.last_query(), Some("DELETE FROM t WHERE 1 = 1"));
    }

    #[test]
    fn test_auto_execute_against_generic_backend() {
        let mut conn = MemoryConnection::new("pgsql");
        conn.push_affected(1);
        let log = conn.log();
        let mut db = DbFacade::new(GenericDriver::new(Box::new(conn)));

        db.auto_execute(
            "people",
            &[("name", Value::Text("ada".into())), ("id", Value::Integer(1))],
            AutoQueryMode::Insert,
            None,
        )
        .unwrap();
        assert_eq!(
            log.borrow().as_slice(),
            &["INSERT INTO people (name, id) VALUES ('ada', 1)".to_string()]
        );
    }

    #[test]
    fn test_table_info_passthrough() {
        let mut db = sqlite_facade();
        let info = db.table_info("people").unwrap();
        assert_eq!(info.len(), 3);
        assert_eq!(info[0].name, "id");
        assert!(info[0].primary_key);

        let err = db.table_info("nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoSuchTable);
    }

    #[test]
    fn test_last_insert_id_and_affected_rows() {
        let mut db = sqlite_facade();
        db.query("INSERT INTO people (name, team) VALUES ('a', 'b')", ())
            .unwrap();
        assert_eq!(db.last_insert_id().unwrap(), 1);
        db.query("UPDATE people SET team = 'c'", ()).unwrap();
        assert_eq!(db.affected_rows(), 1);
    }
}
