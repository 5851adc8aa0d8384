use crate::{ColumnType, Value};
use std::sync::Arc;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .and_then(|i| self.values.get(i))
    }
}

/// Materialized result of a query, as produced by a [`Backend`](crate::Backend).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub column_names: RowNames,
    /// Either empty or aligned with `column_names`.
    pub column_types: Vec<ColumnType>,
    pub result_set: Vec<Row>,
}

impl QueryResult {
    pub fn new<N: Into<String>>(
        column_names: impl IntoIterator<Item = N>,
        column_types: Vec<ColumnType>,
        result_set: Vec<Row>,
    ) -> Self {
        Self {
            column_names: column_names.into_iter().map(Into::into).collect(),
            column_types,
            result_set,
        }
    }

    pub fn row_count(&self) -> usize {
        self.result_set.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result_set.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|v| v == name)
    }

    pub fn first_row(&self) -> Option<&Row> {
        self.result_set.first()
    }

    pub fn first_item(&self) -> Option<&Value> {
        self.first_row().and_then(|v| v.first())
    }

    /// Rows labeled with the column names, in server order.
    pub fn named_results(&self) -> impl Iterator<Item = RowLabeled> + '_ {
        self.result_set
            .iter()
            .map(|row| RowLabeled::new(self.column_names.clone(), row.clone()))
    }
}

impl Default for QueryResult {
    fn default() -> Self {
        Self {
            column_names: Arc::new([]),
            column_types: Vec::new(),
            result_set: Vec::new(),
        }
    }
}

/// Outcome of a command, its shape depends on the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Text(String),
    Integer(i64),
    Strings(Vec<String>),
}

impl CommandResult {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CommandResult::Integer(v) => Some(*v),
            CommandResult::Text(v) => v.trim().parse().ok(),
            CommandResult::Strings(..) => None,
        }
    }

    /// Every field of the result, a text result is split on tabs.
    pub fn into_strings(self) -> Vec<String> {
        match self {
            CommandResult::Text(v) => v.split('\t').map(ToString::to_string).collect(),
            CommandResult::Integer(v) => vec![v.to_string()],
            CommandResult::Strings(v) => v,
        }
    }
}
