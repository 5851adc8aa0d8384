#[cfg(test)]
mod tests {
    use chconnect::{
        Client, ClientConfig, CommandResult, DEFAULT_DATABASE, Error, ErrorKind, Result,
        error_kind,
    };
    use chconnect_tests::{Dispatched, IDENTITY_COMMAND, ScriptedBackend, init_logs, silent_logs};

    #[tokio::test]
    async fn identity() {
        init_logs();
        let backend = ScriptedBackend::new().with_identity("24.3.2.23", "Europe/Rome", "analytics");
        let client = Client::connect(backend.clone(), ClientConfig::new("clickhouse://localhost"))
            .await
            .expect("Could not connect");
        assert_eq!(client.server_version(), "24.3.2.23");
        assert_eq!(client.server_timezone().name(), "Europe/Rome");
        assert_eq!(client.database(), "analytics");
        assert_eq!(client.query_limit(), 5000);
        assert_eq!(client.uri(), "clickhouse://localhost");
        assert_eq!(
            backend.dispatched(),
            [Dispatched::Command {
                command: IDENTITY_COMMAND.into(),
                use_database: false,
                settings: None,
            }]
        );
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn database_override() {
        init_logs();
        for (database, expected) in [
            ("sales", "sales"),
            (DEFAULT_DATABASE, "default"),
            ("", "default"),
        ] {
            let client = Client::connect(
                ScriptedBackend::new(),
                ClientConfig::default().with_database(database),
            )
            .await
            .expect("Could not connect");
            assert_eq!(client.database(), expected);
            client.close().await.expect("Could not close");
        }
    }

    #[tokio::test]
    async fn construction_failure_closes_backend() {
        init_logs();
        let backend = ScriptedBackend::new().with_failing_identity("Connection refused");
        let error = silent_logs! {
            Client::connect(backend.clone(), ClientConfig::new("clickhouse://nowhere:9000"))
                .await
                .err()
                .expect("The connection should fail")
        };
        assert!(format!("{:#}", error).contains("Connection refused"));
        assert!(format!("{:#}", error).contains("clickhouse://nowhere:9000"));
        assert_eq!(backend.close_count(), 1);
    }

    #[tokio::test]
    async fn malformed_identity() {
        init_logs();
        let backend = ScriptedBackend::new()
            .with_command(IDENTITY_COMMAND, CommandResult::Text("24.8.1.1\tUTC".into()));
        let error = silent_logs! {
            Client::connect(backend.clone(), ClientConfig::default())
                .await
                .err()
                .expect("An identity with two fields should be rejected")
        };
        assert_eq!(error_kind(&error), Some(ErrorKind::Internal));
        assert_eq!(backend.close_count(), 1);
    }

    #[tokio::test]
    async fn tab_separated_identity() {
        init_logs();
        let backend = ScriptedBackend::new().with_command(
            IDENTITY_COMMAND,
            CommandResult::Text("23.8.9.54\tUTC\tlogs".into()),
        );
        let client = Client::connect(backend, ClientConfig::default())
            .await
            .expect("Could not connect");
        assert_eq!(client.server_version(), "23.8.9.54");
        assert_eq!(client.database(), "logs");
        client.close().await.expect("Could not close");
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        init_logs();
        let backend = ScriptedBackend::new();
        let client = Client::connect(backend.clone(), ClientConfig::default())
            .await
            .expect("Could not connect");
        assert!(!client.is_closed());
        client.close().await.expect("First close failed");
        client.close().await.expect("Second close failed");
        assert!(client.is_closed());
        assert_eq!(backend.close_count(), 1);
    }

    #[tokio::test]
    async fn scope() {
        init_logs();
        let backend = ScriptedBackend::new();
        let client = Client::connect(backend.clone(), ClientConfig::default())
            .await
            .expect("Could not connect");
        let version = client
            .scope(async |client: &Client<ScriptedBackend>| -> Result<String> {
                Ok(client.server_version().to_string())
            })
            .await
            .expect("The scope should succeed");
        assert_eq!(version, "24.8.1.1");
        assert_eq!(backend.close_count(), 1);

        let backend = ScriptedBackend::new();
        let client = Client::connect(backend.clone(), ClientConfig::default())
            .await
            .expect("Could not connect");
        let error = client
            .scope(async |_: &Client<ScriptedBackend>| -> Result<()> {
                Err(Error::msg("Failed inside the scope"))
            })
            .await
            .expect_err("The scope should fail");
        assert_eq!(error.to_string(), "Failed inside the scope");
        assert_eq!(backend.close_count(), 1);
    }

    #[tokio::test]
    async fn scope_closes_after_panic() {
        init_logs();
        let backend = ScriptedBackend::new();
        let client = Client::connect(backend.clone(), ClientConfig::default())
            .await
            .expect("Could not connect");
        let task = tokio::spawn(client.scope(
            async |_: &Client<ScriptedBackend>| -> Result<()> {
                panic!("Panicked inside the scope");
            },
        ));
        let error = task.await.expect_err("The panic should reach the task");
        assert!(error.is_panic());
        assert_eq!(backend.close_count(), 1);
    }

    #[tokio::test]
    async fn ping() {
        init_logs();
        let backend = ScriptedBackend::new();
        let client = Client::connect(backend.clone(), ClientConfig::default())
            .await
            .expect("Could not connect");
        assert!(client.ping().await);
        backend.set_alive(false);
        assert!(!client.ping().await);
        client.close().await.expect("Could not close");
    }
}
