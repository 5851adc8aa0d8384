#[cfg(test)]
mod tests {
    use chconnect::{
        Client, ClientConfig, ColumnNames, ColumnType, DefaultKind, ErrorKind, Frame, Insert,
        InsertPlan, QueryResult, Row, Settings, Value, error_kind,
    };
    use chconnect_tests::{Dispatched, ScriptedBackend, init_logs, silent_logs};
    use time::macros::datetime;

    const EVENTS: &[(&str, &str, &str)] = &[
        ("id", "UInt64", ""),
        ("ts", "DateTime", ""),
        ("day", "Date", "MATERIALIZED"),
        ("label", "LowCardinality(String)", "DEFAULT"),
        ("upper_label", "String", "ALIAS"),
    ];

    async fn connect(backend: &ScriptedBackend) -> Client<ScriptedBackend> {
        Client::connect(backend.clone(), ClientConfig::default())
            .await
            .expect("Could not connect")
    }

    fn rows() -> Vec<Vec<Value>> {
        vec![
            vec![
                Value::UInt64(1),
                datetime!(2024-05-01 08:00:00).into(),
                Value::from("open"),
            ],
            vec![
                Value::UInt64(2),
                datetime!(2024-05-01 09:15:00).into(),
                Value::from("close"),
            ],
        ]
    }

    #[tokio::test]
    async fn insert_all_columns() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("default.events", EVENTS);
        let client = connect(&backend).await;
        client
            .insert(Insert::new("events", rows()).column_names("*"))
            .await
            .expect("Insert failed");
        assert_eq!(
            backend.inserts(),
            [Dispatched::Insert {
                plan: InsertPlan {
                    full_table: "default.events".into(),
                    column_names: vec!["id".into(), "ts".into(), "label".into()],
                    column_types: vec![
                        ColumnType::UInt64,
                        ColumnType::DateTime(None),
                        ColumnType::LowCardinality(Box::new(ColumnType::String)),
                    ],
                },
                data: rows(),
                settings: None,
                column_oriented: false,
            }]
        );
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn all_columns_ignore_explicit_types() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("default.events", EVENTS);
        let client = connect(&backend).await;
        let plan = client
            .plan_insert(&Insert::new("events", rows()).column_types(vec![ColumnType::Int8]))
            .await
            .expect("Could not plan the insert");
        assert_eq!(plan.column_names, ["id", "ts", "label"]);
        assert_eq!(plan.column_types[0], ColumnType::UInt64);
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn insert_single_column() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("default.events", EVENTS);
        let client = connect(&backend).await;
        let plan = client
            .plan_insert(&Insert::new("events", vec![vec![Value::UInt64(3)]]).column_names("id"))
            .await
            .expect("Could not plan the insert");
        assert_eq!(plan.column_names, ["id"]);
        assert_eq!(plan.column_types, [ColumnType::UInt64]);
        assert_eq!(backend.queries(), ["DESCRIBE TABLE default.events"]);
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn empty_column_list() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("default.events", EVENTS);
        let client = connect(&backend).await;
        let error = silent_logs! {
            client
                .insert(Insert::new("events", rows()).column_names(Vec::<String>::new()))
                .await
                .expect_err("An empty column list should fail")
        };
        assert_eq!(error_kind(&error), Some(ErrorKind::Programming));
        assert!(backend.queries().is_empty());
        assert!(backend.inserts().is_empty());
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn unknown_column() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("default.events", EVENTS);
        let client = connect(&backend).await;
        let error = silent_logs! {
            client
                .insert(Insert::new("events", rows()).column_names(["id", "missing"]))
                .await
                .expect_err("An unknown column should fail")
        };
        assert_eq!(error_kind(&error), Some(ErrorKind::Programming));
        assert!(format!("{:#}", error).contains("missing"));
        assert!(backend.inserts().is_empty());
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn explicit_types_skip_metadata() {
        init_logs();
        let backend = ScriptedBackend::new();
        let client = connect(&backend).await;
        let plan = client
            .plan_insert(
                &Insert::new("scratch", vec![])
                    .column_names(["a", "b"])
                    .column_type_names(["UInt8", "Nullable(String)"]),
            )
            .await
            .expect("Could not plan the insert");
        assert_eq!(
            plan.column_types,
            [
                ColumnType::UInt8,
                ColumnType::Nullable(Box::new(ColumnType::String))
            ]
        );
        let plan = client
            .plan_insert(
                &Insert::new("scratch", vec![])
                    .column_names(["a"])
                    .column_types(vec![ColumnType::Float64]),
            )
            .await
            .expect("Could not plan the insert");
        assert_eq!(plan.column_types, [ColumnType::Float64]);
        assert!(backend.queries().is_empty());

        let error = silent_logs! {
            client
                .plan_insert(
                    &Insert::new("scratch", vec![])
                        .column_names(["a", "b"])
                        .column_type_names(["UInt8"]),
                )
                .await
                .expect_err("Misaligned types should fail")
        };
        assert_eq!(error_kind(&error), Some(ErrorKind::Programming));
        let error = silent_logs! {
            client
                .plan_insert(
                    &Insert::new("scratch", vec![])
                        .column_names(["a"])
                        .column_type_names(["Strange"]),
                )
                .await
                .expect_err("Unknown type names should fail")
        };
        assert_eq!(error_kind(&error), Some(ErrorKind::Programming));
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn empty_type_names_read_metadata() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("default.events", EVENTS);
        let client = connect(&backend).await;
        let plan = client
            .plan_insert(
                &Insert::new("events", vec![])
                    .column_names(["label"])
                    .column_type_names(Vec::<String>::new()),
            )
            .await
            .expect("Could not plan the insert");
        assert_eq!(
            plan.column_types,
            [ColumnType::LowCardinality(Box::new(ColumnType::String))]
        );
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn normalize_table() {
        init_logs();
        let client = connect(&ScriptedBackend::new()).await;
        let cases = [
            (("events", ""), ("events", "default", "default.events")),
            (("events", "sales"), ("events", "sales", "sales.events")),
            (("logs.events", "sales"), ("events", "logs", "logs.events")),
            (("a.b.c", ""), ("b.c", "a", "a.b.c")),
        ];
        for ((table, database), (name, db, full)) in cases {
            let (t, d, f) = client.normalize_table(table, database);
            assert_eq!((t.as_str(), d.as_str(), f.as_str()), (name, db, full));
            assert_eq!(f, format!("{}.{}", d, t));
        }
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn qualified_table_wins() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("logs.events", EVENTS);
        let client = connect(&backend).await;
        let plan = client
            .plan_insert(&Insert::new("logs.events", rows()).database("ignored"))
            .await
            .expect("Could not plan the insert");
        assert_eq!(plan.full_table, "logs.events");
        assert_eq!(backend.queries(), ["DESCRIBE TABLE logs.events"]);
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn table_without_columns() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("default.empty", &[]);
        let client = connect(&backend).await;
        let error = silent_logs! {
            client
                .insert(Insert::new("empty", rows()))
                .await
                .expect_err("A table without columns should fail")
        };
        assert_eq!(error_kind(&error), Some(ErrorKind::Internal));
        assert!(backend.inserts().is_empty());
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn column_oriented_insert() {
        init_logs();
        let backend = ScriptedBackend::new();
        let client = connect(&backend).await;
        let settings = Settings::from([("async_insert".to_string(), "1".to_string())]);
        let columns = vec![
            vec![Value::Int32(1), Value::Int32(2)],
            vec![Value::from("x"), Value::from("y")],
        ];
        client
            .insert(
                Insert::new("scratch", columns.clone())
                    .column_names(vec!["n", "s"])
                    .column_types(vec![ColumnType::Int32, ColumnType::String])
                    .column_oriented(true)
                    .settings(settings.clone()),
            )
            .await
            .expect("Insert failed");
        let inserts = backend.inserts();
        let [Dispatched::Insert {
            plan,
            data,
            settings: forwarded,
            column_oriented,
        }] = inserts.as_slice()
        else {
            panic!("Expected exactly one insert");
        };
        assert_eq!(plan.full_table, "default.scratch");
        assert_eq!(*data, columns);
        assert_eq!(forwarded.as_ref(), Some(&settings));
        assert!(*column_oriented);
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn insert_frame() {
        init_logs();
        let backend = ScriptedBackend::new().with_describe("default.events", EVENTS);
        let client = connect(&backend).await;
        let frame = Frame::new(
            vec!["id".into(), "label".into()],
            vec![],
            vec![
                vec![Value::UInt64(1), Value::UInt64(2)],
                vec![Value::from("a"), Value::from("b")],
            ],
        );
        client
            .insert_df("events", frame.clone())
            .await
            .expect("Insert failed");
        let result = QueryResult::new(
            ["id", "label"],
            vec![ColumnType::UInt64, ColumnType::String],
            vec![
                Box::new([Value::UInt64(1), Value::from("a")]) as Row,
                Box::new([Value::UInt64(2), Value::from("b")]),
            ],
        );
        client
            .insert_df("other", Frame::from_result(result))
            .await
            .expect("Insert failed");
        let inserts = backend.inserts();
        assert_eq!(inserts.len(), 2);
        for insert in inserts {
            let Dispatched::Insert {
                plan,
                data,
                column_oriented,
                ..
            } = insert
            else {
                unreachable!();
            };
            assert_eq!(plan.column_names, ["id", "label"]);
            assert_eq!(data, frame.columns);
            assert!(column_oriented);
        }
        // Only the frame without types reads the table
        assert_eq!(backend.queries(), ["DESCRIBE TABLE default.events"]);
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn table_def() {
        init_logs();
        let backend = ScriptedBackend::new()
            .with_describe("default.events", EVENTS)
            .with_query(
                "SELECT engine, sorting_key, primary_key, comment FROM system.tables \
                 WHERE database = 'default' AND name = 'events' LIMIT 5000",
                QueryResult::new(
                    ["engine", "sorting_key", "primary_key", "comment"],
                    vec![ColumnType::String; 4],
                    vec![Box::new([
                        Value::from("MergeTree"),
                        Value::from("ts, id"),
                        Value::from("ts"),
                        Value::from("Click stream"),
                    ]) as Row],
                ),
            );
        let client = connect(&backend).await;
        let table = client
            .table_def("events", "")
            .await
            .expect("Could not describe the table");
        assert_eq!(table.full_name(), "default.events");
        assert_eq!(table.engine, "MergeTree");
        assert_eq!(table.order_by, "ts, id");
        assert_eq!(table.sort_by, "ts");
        assert_eq!(table.comment, "Click stream");
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            ["id", "ts", "day", "label", "upper_label"]
        );
        assert_eq!(table.column_defs[2].default_kind, DefaultKind::Materialized);
        assert_eq!(table.column_defs[4].default_kind, DefaultKind::Alias);
        assert!(!table.column_defs[4].is_insertable());
        assert_eq!(
            table.column_types().nth(3),
            Some("LowCardinality(String)")
        );
        client.close().await.expect("Could not close");
    }

    #[test]
    fn column_names_conversions() {
        assert_eq!(ColumnNames::from("*"), ColumnNames::All);
        assert_eq!(ColumnNames::from("id"), ColumnNames::Single("id".into()));
        assert_eq!(
            ColumnNames::from(["a", "b"]),
            ColumnNames::List(vec!["a".into(), "b".into()])
        );
        assert_eq!(Insert::default().column_names, ColumnNames::All);
    }
}
