use crate::{BuiltinTypes, CommandResult, InsertPlan, QueryResult, Result, TypeRegistry, Value};
use std::{collections::BTreeMap, future::Future};

/// Per call server settings, forwarded to the backend untouched.
pub type Settings = BTreeMap<String, String>;

/// Transport that talks to the server.
///
/// The [`Client`](crate::Client) prepares every statement and insert plan, a backend only
/// moves finished text and data over the wire. Implementations decide how (and whether)
/// the primitives can run concurrently; timeouts and cancellation belong here as well,
/// usually driven by `settings`.
pub trait Backend: Send + Sync {
    /// Registry used to resolve the type names reported by the server.
    fn types(&self) -> &dyn TypeRegistry {
        &BuiltinTypes
    }

    /// Run a query and materialize its rows.
    ///
    /// With `use_none` false missing values are replaced by the default of the column type
    /// instead of [`Value::Null`].
    fn exec_query(
        &self,
        query: &str,
        use_none: bool,
        settings: Option<&Settings>,
    ) -> impl Future<Output = Result<QueryResult>> + Send;

    /// Run a statement whose result has no row shape.
    ///
    /// `use_database` selects whether the statement runs in the context of the client database.
    fn exec_command(
        &self,
        command: &str,
        use_database: bool,
        settings: Option<&Settings>,
    ) -> impl Future<Output = Result<CommandResult>> + Send;

    fn ping(&self) -> impl Future<Output = bool> + Send;

    /// Send `data` to the table described by `plan`.
    ///
    /// `data` holds one sequence per column when `column_oriented` is true, one per row otherwise.
    fn data_insert(
        &self,
        plan: &InsertPlan,
        data: &[Vec<Value>],
        settings: Option<&Settings>,
        column_oriented: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Release the resources held by the transport. Called at most once by the client.
    fn close(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
