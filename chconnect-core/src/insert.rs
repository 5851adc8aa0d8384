use crate::{
    Backend, Client, ColumnDef, ColumnType, Frame, Result, Settings, Value, programming_error,
};
use std::collections::HashMap;

/// Columns targeted by an insert.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum ColumnNames {
    /// Every column of the table that can receive values (`'*'`).
    #[default]
    All,
    Single(String),
    List(Vec<String>),
}

impl From<&str> for ColumnNames {
    fn from(value: &str) -> Self {
        match value {
            "*" => ColumnNames::All,
            _ => ColumnNames::Single(value.into()),
        }
    }
}

impl From<String> for ColumnNames {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

impl From<Vec<String>> for ColumnNames {
    fn from(value: Vec<String>) -> Self {
        ColumnNames::List(value)
    }
}

impl From<Vec<&str>> for ColumnNames {
    fn from(value: Vec<&str>) -> Self {
        ColumnNames::List(value.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnNames {
    fn from(value: [&str; N]) -> Self {
        ColumnNames::List(value.into_iter().map(Into::into).collect())
    }
}

/// Insert request, built fluently:
///
/// ```rust
/// use chconnect_core::{Insert, Value};
/// let insert = Insert::new("analytics.events", vec![vec![Value::from(1), Value::from("click")]])
///     .column_names(["id", "kind"])
///     .column_type_names(["UInt64", "String"]);
/// assert!(!insert.column_oriented);
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Insert {
    /// Table name, optionally qualified as `database.table`.
    pub table: String,
    /// Rows, or columns when `column_oriented`.
    pub data: Vec<Vec<Value>>,
    pub column_names: ColumnNames,
    /// Ignored when `table` is qualified, empty means the client database.
    pub database: String,
    pub column_types: Option<Vec<ColumnType>>,
    pub column_type_names: Option<Vec<String>>,
    pub column_oriented: bool,
    pub settings: Option<Settings>,
}

impl Insert {
    pub fn new(table: impl Into<String>, data: Vec<Vec<Value>>) -> Self {
        Self {
            table: table.into(),
            data,
            ..Default::default()
        }
    }

    pub fn column_names(mut self, column_names: impl Into<ColumnNames>) -> Self {
        self.column_names = column_names.into();
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn column_types(mut self, column_types: Vec<ColumnType>) -> Self {
        self.column_types = Some(column_types);
        self
    }

    pub fn column_type_names<S: Into<String>>(
        mut self,
        column_type_names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.column_type_names = Some(column_type_names.into_iter().map(Into::into).collect());
        self
    }

    pub fn column_oriented(mut self, column_oriented: bool) -> Self {
        self.column_oriented = column_oriented;
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// Validated target of an insert: `column_names` and `column_types` are aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub full_table: String,
    pub column_names: Vec<String>,
    pub column_types: Vec<ColumnType>,
}

impl<B: Backend> Client<B> {
    /// Resolve the columns and types an insert targets, reading the live table when needed.
    pub async fn plan_insert(&self, insert: &Insert) -> Result<InsertPlan> {
        let (table, database, full_table) = self.normalize_table(&insert.table, &insert.database);
        let mut column_types = None;
        let column_names = match &insert.column_names {
            ColumnNames::All => {
                let column_defs = self
                    .table_columns(&table, &database)
                    .await?
                    .into_iter()
                    .filter(ColumnDef::is_insertable)
                    .collect::<Vec<_>>();
                column_types = Some(
                    column_defs
                        .iter()
                        .map(|v| v.column_type(self.types()))
                        .collect::<Result<Vec<_>>>()?,
                );
                column_defs.into_iter().map(|v| v.name).collect()
            }
            ColumnNames::Single(name) => vec![name.clone()],
            ColumnNames::List(names) if names.is_empty() => {
                return Err(programming_error("Column names must be specified for insert"));
            }
            ColumnNames::List(names) => names.clone(),
        };
        let column_types = match column_types {
            Some(v) => v,
            None => self.resolve_types(insert, &table, &database, &column_names).await?,
        };
        assert_eq!(
            column_names.len(),
            column_types.len(),
            "Insert plan for {} has misaligned column names and types",
            full_table
        );
        Ok(InsertPlan {
            full_table,
            column_names,
            column_types,
        })
    }

    async fn resolve_types(
        &self,
        insert: &Insert,
        table: &str,
        database: &str,
        column_names: &[String],
    ) -> Result<Vec<ColumnType>> {
        let explicit = match (&insert.column_types, &insert.column_type_names) {
            (Some(types), _) => Some(types.clone()),
            (None, Some(names)) if !names.is_empty() => Some(
                names
                    .iter()
                    .map(|v| self.types().get_from_name(v))
                    .collect::<Result<Vec<_>>>()?,
            ),
            _ => None,
        };
        if let Some(types) = explicit {
            if types.len() != column_names.len() {
                return Err(programming_error(format!(
                    "Insert into {}.{} names {} columns but provides {} column types",
                    database,
                    table,
                    column_names.len(),
                    types.len()
                )));
            }
            return Ok(types);
        }
        let column_map = self
            .table_columns(table, database)
            .await?
            .into_iter()
            .map(|v| (v.name.clone(), v))
            .collect::<HashMap<_, _>>();
        column_names
            .iter()
            .map(|name| match column_map.get(name) {
                Some(column) => column.column_type(self.types()),
                None => Err(programming_error(format!(
                    "Unrecognized column `{}` in table {}",
                    name, table
                ))),
            })
            .collect()
    }

    /// Plan the insert against the live schema and hand the data to the backend.
    pub async fn insert(&self, insert: Insert) -> Result<()> {
        let plan = self.plan_insert(&insert).await?;
        log::debug!(
            "Insert of {} {} into {} ({})",
            insert.data.len(),
            if insert.column_oriented { "columns" } else { "rows" },
            plan.full_table,
            plan.column_names.join(", ")
        );
        self.backend()
            .data_insert(
                &plan,
                &insert.data,
                insert.settings.as_ref(),
                insert.column_oriented,
            )
            .await
    }

    /// Insert every column of `frame`.
    pub async fn insert_df(&self, table: &str, frame: Frame) -> Result<()> {
        self.insert(frame.into_insert(table)).await
    }
}
