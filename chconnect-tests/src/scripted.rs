use chconnect_core::{
    Backend, ColumnType, CommandResult, Error, InsertPlan, QueryResult, Result, Row, Settings,
    Value,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

/// A call received by a [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Query {
        query: String,
        use_none: bool,
        settings: Option<Settings>,
    },
    Command {
        command: String,
        use_database: bool,
        settings: Option<Settings>,
    },
    Insert {
        plan: InsertPlan,
        data: Vec<Vec<Value>>,
        settings: Option<Settings>,
        column_oriented: bool,
    },
    Ping,
    Close,
}

#[derive(Default)]
struct State {
    queries: HashMap<String, QueryResult>,
    commands: HashMap<String, std::result::Result<CommandResult, String>>,
    dispatched: Vec<Dispatched>,
    alive: bool,
}

/// Backend answering from canned responses, keyed by the exact text it receives.
///
/// Clones share the same state, keep one to inspect the calls after handing the other to a
/// client. Unknown statements fail like a server would.
#[derive(Clone)]
pub struct ScriptedBackend {
    state: Arc<Mutex<State>>,
}

pub const IDENTITY_COMMAND: &str = "SELECT version(), timezone(), database()";

impl ScriptedBackend {
    /// Server `24.8.1.1` in `UTC` with database `default`.
    pub fn new() -> Self {
        let backend = Self {
            state: Default::default(),
        };
        backend.lock().alive = true;
        backend.with_identity("24.8.1.1", "UTC", "default")
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_identity(self, version: &str, timezone: &str, database: &str) -> Self {
        self.with_command(
            IDENTITY_COMMAND,
            CommandResult::Strings(vec![version.into(), timezone.into(), database.into()]),
        )
    }

    /// The identity command fails with `message`.
    pub fn with_failing_identity(self, message: &str) -> Self {
        self.lock()
            .commands
            .insert(IDENTITY_COMMAND.into(), Err(message.into()));
        self
    }

    pub fn with_query(self, query: &str, result: QueryResult) -> Self {
        self.lock().queries.insert(query.into(), result);
        self
    }

    pub fn with_command(self, command: &str, result: CommandResult) -> Self {
        self.lock().commands.insert(command.into(), Ok(result));
        self
    }

    /// Answer `DESCRIBE TABLE {full_table}` with `(name, type, default_type)` columns.
    pub fn with_describe(self, full_table: &str, columns: &[(&str, &str, &str)]) -> Self {
        self.with_query(
            &format!("DESCRIBE TABLE {}", full_table),
            describe_result(columns),
        )
    }

    pub fn dispatched(&self) -> Vec<Dispatched> {
        self.lock().dispatched.clone()
    }

    /// Text of every query received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.lock()
            .dispatched
            .iter()
            .filter_map(|v| match v {
                Dispatched::Query { query, .. } => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn inserts(&self) -> Vec<Dispatched> {
        self.lock()
            .dispatched
            .iter()
            .filter(|v| matches!(v, Dispatched::Insert { .. }))
            .cloned()
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.lock()
            .dispatched
            .iter()
            .filter(|v| matches!(v, Dispatched::Close))
            .count()
    }

    pub fn set_alive(&self, alive: bool) {
        self.lock().alive = alive;
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the nulls of non nullable columns with the type default.
fn materialize_defaults(mut result: QueryResult) -> QueryResult {
    if result.column_types.is_empty() {
        return result;
    }
    for row in result.result_set.iter_mut() {
        for (value, column_type) in row.iter_mut().zip(&result.column_types) {
            if value.is_null() {
                *value = column_type.default_value();
            }
        }
    }
    result
}

impl Backend for ScriptedBackend {
    async fn exec_query(
        &self,
        query: &str,
        use_none: bool,
        settings: Option<&Settings>,
    ) -> Result<QueryResult> {
        let mut state = self.lock();
        state.dispatched.push(Dispatched::Query {
            query: query.into(),
            use_none,
            settings: settings.cloned(),
        });
        let Some(result) = state.queries.get(query).cloned() else {
            return Err(Error::msg(format!("Unknown query `{}`", query)));
        };
        Ok(if use_none {
            result
        } else {
            materialize_defaults(result)
        })
    }

    async fn exec_command(
        &self,
        command: &str,
        use_database: bool,
        settings: Option<&Settings>,
    ) -> Result<CommandResult> {
        let mut state = self.lock();
        state.dispatched.push(Dispatched::Command {
            command: command.into(),
            use_database,
            settings: settings.cloned(),
        });
        match state.commands.get(command) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(Error::msg(message.clone())),
            None => Err(Error::msg(format!("Unknown command `{}`", command))),
        }
    }

    async fn ping(&self) -> bool {
        let mut state = self.lock();
        state.dispatched.push(Dispatched::Ping);
        state.alive
    }

    async fn data_insert(
        &self,
        plan: &InsertPlan,
        data: &[Vec<Value>],
        settings: Option<&Settings>,
        column_oriented: bool,
    ) -> Result<()> {
        self.lock().dispatched.push(Dispatched::Insert {
            plan: plan.clone(),
            data: data.to_vec(),
            settings: settings.cloned(),
            column_oriented,
        });
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.lock().dispatched.push(Dispatched::Close);
        Ok(())
    }
}

/// `DESCRIBE TABLE` result for `(name, type, default_type)` columns.
pub fn describe_result(columns: &[(&str, &str, &str)]) -> QueryResult {
    let rows = columns
        .iter()
        .map(|&(name, type_name, default_type)| {
            let default_expression = match default_type {
                "" => "",
                "ALIAS" | "MATERIALIZED" => "now()",
                _ => "0",
            };
            [name, type_name, default_type, default_expression, "", "", ""]
                .into_iter()
                .map(Value::from)
                .collect::<Row>()
        })
        .collect();
    QueryResult::new(
        [
            "name",
            "type",
            "default_type",
            "default_expression",
            "comment",
            "codec_expression",
            "ttl_expression",
        ],
        vec![ColumnType::String; 7],
        rows,
    )
}

/// Single column `name` result, the shape of `SHOW DATABASES` and `SHOW TABLES`.
pub fn names_result(names: &[&str]) -> QueryResult {
    QueryResult::new(
        ["name"],
        vec![ColumnType::String],
        names
            .iter()
            .map(|v| Box::new([Value::from(*v)]) as Row)
            .collect(),
    )
}
