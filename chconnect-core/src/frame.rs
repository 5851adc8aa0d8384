use crate::{ColumnType, Insert, QueryResult, Value};

/// Column major table of values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    pub column_names: Vec<String>,
    /// Either empty or aligned with `column_names`.
    pub column_types: Vec<ColumnType>,
    /// One vector per column, all of the same length.
    pub columns: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(
        column_names: Vec<String>,
        column_types: Vec<ColumnType>,
        columns: Vec<Vec<Value>>,
    ) -> Self {
        Self {
            column_names,
            column_types,
            columns,
        }
    }

    /// Transpose the rows of `result` into columns.
    pub fn from_result(result: QueryResult) -> Self {
        let mut columns = vec![Vec::with_capacity(result.row_count()); result.column_count()];
        for row in result.result_set {
            for (column, value) in columns.iter_mut().zip(row.into_vec()) {
                column.push(value);
            }
        }
        Self {
            column_names: result.column_names.to_vec(),
            column_types: result.column_types,
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.column_names
            .iter()
            .position(|v| v == name)
            .and_then(|i| self.columns.get(i))
            .map(Vec::as_slice)
    }

    /// Column oriented insert of every column, carrying the types when known.
    pub fn into_insert(self, table: &str) -> Insert {
        let mut insert = Insert::new(table, self.columns)
            .column_names(self.column_names)
            .column_oriented(true);
        if !self.column_types.is_empty() {
            insert = insert.column_types(self.column_types);
        }
        insert
    }
}
