use crate::{Backend, Client, ColumnDef, QueryResult, Result, escape::write_string, not_supported};

/// `table` qualified with `schema` when there is one.
pub fn full_table(table: &str, schema: Option<&str>) -> String {
    match schema {
        Some(schema) if !schema.is_empty() => format!("{}.{}", schema, table),
        _ => table.to_string(),
    }
}

/// Catalog questions answered through the client's own query path, the surface a
/// schema reflection layer is built on.
///
/// The server has no keys, constraints, sequences or transactions to report: those answers
/// are constant, and two-phase commit fails with [`ErrorKind::NotSupported`](crate::ErrorKind).
pub struct SchemaInspector<'c, B: Backend> {
    client: &'c Client<B>,
}

impl<B: Backend> Client<B> {
    pub fn inspector(&self) -> SchemaInspector<'_, B> {
        SchemaInspector { client: self }
    }
}

impl<'c, B: Backend> SchemaInspector<'c, B> {
    pub fn client(&self) -> &'c Client<B> {
        self.client
    }

    async fn names(&self, query: &str) -> Result<Vec<String>> {
        let result = self.client.query(query, None, true, None).await?;
        Ok(name_column(&result))
    }

    pub async fn schema_names(&self) -> Result<Vec<String>> {
        self.names("SHOW DATABASES").await
    }

    pub async fn has_database(&self, name: &str) -> Result<bool> {
        let mut query = String::from("SELECT name FROM system.databases WHERE name = ");
        write_string(&mut query, name);
        let result = self.client.query(&query, None, true, None).await?;
        Ok(result.row_count() > 0)
    }

    pub async fn table_names(&self, schema: Option<&str>) -> Result<Vec<String>> {
        let mut query = String::from("SHOW TABLES");
        if let Some(schema) = schema.filter(|v| !v.is_empty()) {
            query.push_str(" FROM ");
            query.push_str(schema);
        }
        self.names(&query).await
    }

    /// True when `EXISTS TABLE` answers 1.
    pub async fn has_table(&self, table: &str, schema: Option<&str>) -> Result<bool> {
        let query = format!("EXISTS TABLE {}", full_table(table, schema));
        let result = self.client.query(&query, None, true, None).await?;
        Ok(result.first_item().and_then(|v| v.as_i128()) == Some(1))
    }

    pub async fn columns(&self, table: &str, schema: Option<&str>) -> Result<Vec<ColumnDef>> {
        let (table, database, _) = self.client.normalize_table(table, schema.unwrap_or_default());
        self.client.table_columns(&table, &database).await
    }

    pub fn primary_keys(&self, _table: &str, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    /// Columns of the primary key constraint, there is none to report.
    pub fn pk_constraint(&self, _table: &str, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    pub fn foreign_keys(&self, _table: &str, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    pub fn indexes(&self, _table: &str, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    pub fn unique_constraints(&self, _table: &str, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    pub fn check_constraints(&self, _table: &str, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    pub fn view_names(&self, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    pub fn view_definition(&self, _view: &str, _schema: Option<&str>) -> Option<String> {
        None
    }

    pub fn temp_table_names(&self, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    pub fn temp_view_names(&self, _schema: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    pub fn has_sequence(&self, _sequence: &str, _schema: Option<&str>) -> bool {
        false
    }

    pub fn isolation_level(&self) -> Option<String> {
        None
    }

    pub fn set_isolation_level(&self, level: &str) -> Result<()> {
        Err(not_supported(format!(
            "Cannot set the isolation level to {}: transactions are not supported",
            level
        )))
    }

    pub fn begin_twophase(&self, xid: &str) -> Result<()> {
        Err(not_supported(format!(
            "Cannot begin the two-phase transaction {}",
            xid
        )))
    }

    pub fn prepare_twophase(&self, xid: &str) -> Result<()> {
        Err(not_supported(format!(
            "Cannot prepare the two-phase transaction {}",
            xid
        )))
    }

    pub fn rollback_twophase(&self, xid: &str, _is_prepared: bool, _recover: bool) -> Result<()> {
        Err(not_supported(format!(
            "Cannot roll back the two-phase transaction {}",
            xid
        )))
    }

    pub fn commit_twophase(&self, xid: &str, _is_prepared: bool, _recover: bool) -> Result<()> {
        Err(not_supported(format!(
            "Cannot commit the two-phase transaction {}",
            xid
        )))
    }

    pub fn recover_twophase(&self) -> Result<Vec<String>> {
        Err(not_supported("Cannot recover two-phase transactions"))
    }
}

/// Values of the `name` column, or of the first column when there is none.
fn name_column(result: &QueryResult) -> Vec<String> {
    let index = result.column_index("name").unwrap_or(0);
    result
        .result_set
        .iter()
        .filter_map(|row| row.get(index).and_then(|v| v.as_str()))
        .map(ToString::to_string)
        .collect()
}
