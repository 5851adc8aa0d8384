use crate::{ColumnType, Result, RowLabeled, TypeRegistry, internal_error};
use std::fmt::{self, Display};

/// How the server fills a column when an insert does not provide it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum DefaultKind {
    /// No default expression.
    #[default]
    None,
    Default,
    /// Computed on insert, cannot receive values.
    Materialized,
    /// Computed on read, cannot receive values.
    Alias,
    Ephemeral,
    Other(String),
}

impl DefaultKind {
    pub fn as_str(&self) -> &str {
        match self {
            DefaultKind::None => "",
            DefaultKind::Default => "DEFAULT",
            DefaultKind::Materialized => "MATERIALIZED",
            DefaultKind::Alias => "ALIAS",
            DefaultKind::Ephemeral => "EPHEMERAL",
            DefaultKind::Other(v) => v,
        }
    }
}

impl From<&str> for DefaultKind {
    fn from(value: &str) -> Self {
        match value {
            "" => DefaultKind::None,
            "DEFAULT" => DefaultKind::Default,
            "MATERIALIZED" => DefaultKind::Materialized,
            "ALIAS" => DefaultKind::Alias,
            "EPHEMERAL" => DefaultKind::Ephemeral,
            _ => DefaultKind::Other(value.into()),
        }
    }
}

impl Display for DefaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column of a live table, one row of `DESCRIBE TABLE`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Type name as declared on the server.
    pub type_name: String,
    pub default_kind: DefaultKind,
    pub default_expression: String,
    pub comment: String,
    pub codec_expression: String,
    pub ttl_expression: String,
}

impl ColumnDef {
    /// Build the descriptor from a `DESCRIBE TABLE` row. `name` and `type` are
    /// required, the other fields default to empty.
    pub fn from_row(row: &RowLabeled) -> Result<Self> {
        let text = |name: &str| {
            row.get_column(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let required = |name: &str| {
            row.get_column(name)
                .and_then(|v| v.as_str())
                .map(ToString::to_string)
                .ok_or_else(|| {
                    internal_error(format!(
                        "Column description is missing the `{}` field (available: {})",
                        name,
                        row.names().join(", ")
                    ))
                })
        };
        Ok(Self {
            name: required("name")?,
            type_name: required("type")?,
            default_kind: text("default_type").as_str().into(),
            default_expression: text("default_expression"),
            comment: text("comment"),
            codec_expression: text("codec_expression"),
            ttl_expression: text("ttl_expression"),
        })
    }

    /// Semantic type resolved from the declared type name.
    pub fn column_type(&self, registry: &dyn TypeRegistry) -> Result<ColumnType> {
        registry.get_from_name(&self.type_name)
    }

    /// Whether an insert can provide a value for this column.
    pub fn is_insertable(&self) -> bool {
        !matches!(
            self.default_kind,
            DefaultKind::Alias | DefaultKind::Materialized
        )
    }
}

/// Live table description.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub database: String,
    pub name: String,
    /// Server order.
    pub column_defs: Vec<ColumnDef>,
    pub engine: String,
    pub order_by: String,
    pub sort_by: String,
    pub comment: String,
}

impl TableDef {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.column_defs.iter().map(|v| v.name.as_str())
    }

    pub fn column_types(&self) -> impl Iterator<Item = &str> {
        self.column_defs.iter().map(|v| v.type_name.as_str())
    }
}
