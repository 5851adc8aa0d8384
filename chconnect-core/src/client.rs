use crate::{
    Backend, ClientConfig, ColumnDef, CommandResult, DEFAULT_DATABASE, Frame, Parameters,
    QueryResult, Result, ServerTimezone, Settings, TableDef, TypeRegistry, Value, flatten_lines,
    internal_error, substitute_parameters, truncate_long,
};
use futures::FutureExt;
use std::{
    borrow::Cow,
    fmt::Write,
    panic::{self, AssertUnwindSafe},
    sync::atomic::{AtomicBool, Ordering},
};

const IDENTITY_QUERY: &str = "SELECT version(), timezone(), database()";

/// Orchestrates queries, commands and inserts on top of a [`Backend`].
///
/// The server identity (version, timezone, default database) is read once when connecting
/// and never changes afterwards. Every operation takes `&self`, the client adds no locking
/// of its own.
pub struct Client<B: Backend> {
    backend: B,
    server_version: String,
    server_timezone: ServerTimezone,
    database: String,
    query_limit: u64,
    uri: String,
    closed: AtomicBool,
}

impl<B: Backend> Client<B> {
    /// Read the server identity through `backend` and build the client.
    ///
    /// The backend is closed when the identity cannot be read.
    pub async fn connect(backend: B, config: ClientConfig) -> Result<Self> {
        let identity = backend
            .exec_command(IDENTITY_QUERY, false, None)
            .await
            .and_then(parse_identity);
        let (server_version, timezone, server_database) = match identity {
            Ok(v) => v,
            Err(error) => {
                if let Err(e) = backend.close().await {
                    log::error!("{:#}", e.context("While closing the backend"));
                }
                let error = error.context(format!(
                    "While reading the server identity of `{}`",
                    truncate_long!(config.uri)
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
        };
        let ClientConfig {
            database,
            query_limit,
            uri,
        } = config;
        let database = if database.is_empty() || database == DEFAULT_DATABASE {
            server_database
        } else {
            database
        };
        log::debug!(
            "Connected to server {} (timezone {}, database {})",
            server_version,
            timezone,
            database
        );
        Ok(Self {
            backend,
            server_version,
            server_timezone: ServerTimezone::new(timezone),
            database,
            query_limit,
            uri,
            closed: AtomicBool::new(false),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn types(&self) -> &dyn TypeRegistry {
        self.backend.types()
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn server_timezone(&self) -> &ServerTimezone {
        &self.server_timezone
    }

    /// Database used for unqualified table names.
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn query_limit(&self) -> u64 {
        self.query_limit
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn bind<'q>(&self, text: &'q str, parameters: Option<&Parameters>) -> Result<Cow<'q, str>> {
        Ok(match parameters {
            Some(parameters) if !parameters.is_empty() => {
                substitute_parameters(text, parameters, &self.server_timezone)?.into()
            }
            _ => text.into(),
        })
    }

    /// The exact text [`Client::query`] sends to the backend.
    ///
    /// `LIMIT` is appended when a limit is configured and the upper cased text contains
    /// `SELECT ` but not ` LIMIT `. The check is textual, a `SELECT` inside a string literal
    /// or a subquery counts as well.
    pub fn finalize_query(&self, query: &str, parameters: Option<&Parameters>) -> Result<String> {
        let mut query = flatten_lines(&self.bind(query, parameters)?);
        if self.query_limit > 0 {
            let upper = query.to_uppercase();
            if !upper.contains(" LIMIT ") && upper.contains("SELECT ") {
                let _ = write!(query, " LIMIT {}", self.query_limit);
            }
        }
        Ok(query)
    }

    pub async fn query(
        &self,
        query: &str,
        parameters: Option<&Parameters>,
        use_none: bool,
        settings: Option<&Settings>,
    ) -> Result<QueryResult> {
        let query = self.finalize_query(query, parameters)?;
        log::debug!("Query: {}", truncate_long!(query));
        self.backend.exec_query(&query, use_none, settings).await
    }

    /// Query materialized as one array per column, missing values become type defaults.
    pub async fn query_np(
        &self,
        query: &str,
        parameters: Option<&Parameters>,
        settings: Option<&Settings>,
    ) -> Result<Vec<Vec<Value>>> {
        let result = self.query(query, parameters, false, settings).await?;
        Ok(Frame::from_result(result).columns)
    }

    /// Query materialized as a [`Frame`], missing values become type defaults.
    pub async fn query_df(
        &self,
        query: &str,
        parameters: Option<&Parameters>,
        settings: Option<&Settings>,
    ) -> Result<Frame> {
        let result = self.query(query, parameters, false, settings).await?;
        Ok(Frame::from_result(result))
    }

    /// Run an administrative statement. No limit is added and newlines are kept.
    pub async fn command(
        &self,
        command: &str,
        parameters: Option<&Parameters>,
        use_database: bool,
        settings: Option<&Settings>,
    ) -> Result<CommandResult> {
        let command = self.bind(command, parameters)?;
        log::debug!("Command: {}", truncate_long!(command));
        self.backend
            .exec_command(&command, use_database, settings)
            .await
    }

    pub async fn ping(&self) -> bool {
        self.backend.ping().await
    }

    /// Split `table` into `(table, database, full_table)`.
    ///
    /// A qualified `db.table` wins over `database`, an empty `database` means the client one.
    pub fn normalize_table(&self, table: &str, database: &str) -> (String, String, String) {
        if let Some((database, name)) = table.split_once('.') {
            return (name.into(), database.into(), table.into());
        }
        let database = if database.is_empty() {
            &self.database
        } else {
            database
        };
        (table.into(), database.into(), format!("{}.{}", database, table))
    }

    /// Live columns of `database.table`, in server order.
    pub async fn table_columns(&self, table: &str, database: &str) -> Result<Vec<ColumnDef>> {
        let result = self
            .query(&format!("DESCRIBE TABLE {}.{}", database, table), None, true, None)
            .await?;
        if result.is_empty() {
            return Err(internal_error(format!(
                "No table columns found for {}.{}",
                database, table
            )));
        }
        result
            .named_results()
            .map(|row| ColumnDef::from_row(&row))
            .collect()
    }

    /// Live description of a table: its columns plus engine, keys and comment from `system.tables`.
    pub async fn table_def(&self, table: &str, database: &str) -> Result<TableDef> {
        let (table, database, full_table) = self.normalize_table(table, database);
        let parameters = crate::parameters! {
            "database" => database.as_str(),
            "table" => table.as_str(),
        };
        let (column_defs, info) = futures::future::try_join(
            self.table_columns(&table, &database),
            self.query(
                "SELECT engine, sorting_key, primary_key, comment FROM system.tables \
                 WHERE database = %(database)s AND name = %(table)s",
                Some(&parameters),
                true,
                None,
            ),
        )
        .await?;
        let Some(row) = info.named_results().next() else {
            return Err(internal_error(format!(
                "Table {} has columns but no entry in system.tables",
                full_table
            )));
        };
        let text = |name: &str| {
            row.get_column(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(TableDef {
            engine: text("engine"),
            order_by: text("sorting_key"),
            sort_by: text("primary_key"),
            comment: text("comment"),
            database,
            name: table,
            column_defs,
        })
    }

    /// Release the backend. Only the first call reaches it, later calls return `Ok`.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.backend.close().await
    }

    /// Run `body` with the client and close it afterwards, whatever the outcome of `body`.
    ///
    /// The error of `body` wins over a failure while closing. A panic in `body` resumes once
    /// the client is closed.
    pub async fn scope<T>(self, body: impl AsyncFnOnce(&Self) -> Result<T>) -> Result<T> {
        let result = AssertUnwindSafe(body(&self)).catch_unwind().await;
        let closed = self.close().await;
        let result = match result {
            Ok(result) => result,
            Err(payload) => {
                if let Err(e) = closed {
                    log::error!("{:#}", e.context("While closing the client after a panic"));
                }
                panic::resume_unwind(payload);
            }
        };
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(..), Err(e)) => {
                log::error!("{:#}", e);
                Err(e)
            }
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    log::error!("{:#}", close_error);
                }
                Err(e)
            }
        }
    }
}

impl<B: Backend> Drop for Client<B> {
    fn drop(&mut self) {
        if !*self.closed.get_mut() {
            log::warn!(
                "Client of `{}` dropped without being closed",
                truncate_long!(self.uri)
            );
        }
    }
}

fn parse_identity(result: CommandResult) -> Result<(String, String, String)> {
    let fields = result.into_strings();
    match <[String; 3]>::try_from(fields) {
        Ok([version, timezone, database]) => Ok((version, timezone, database)),
        Err(fields) => Err(internal_error(format!(
            "Expected version, timezone and database from `{}`, received {:?}",
            IDENTITY_QUERY, fields
        ))),
    }
}
