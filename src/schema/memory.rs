use std::collections::HashMap;

use crate::{
    error::Error,
    schema::{ColumnMeta, ScalarType, SchemaIntrospector},
};

/// A statically declared table definition for [`MemorySchema`].
#[derive(Debug, Clone, Default)]
pub struct TableDef {
    primary_key: Vec<String>,
    columns: HashMap<String, ColumnMeta>,
}

impl TableDef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a column. Key columns must additionally be named via
    /// [`Self::primary_key`].
    #[must_use]
    pub fn column(mut self, name: &str, scalar_type: ScalarType, auto_increment: bool) -> Self {
        self.columns.insert(
            name.to_string(),
            ColumnMeta {
                scalar_type,
                auto_increment,
            },
        );
        self
    }

    /// Append a column to the declared primary key.
    #[must_use]
    pub fn primary_key(mut self, column: &str) -> Self {
        self.primary_key.push(column.to_string());
        self
    }
}

/// An in-memory [`SchemaIntrospector`] backed by declared table
/// definitions instead of a live connection.
///
/// Useful both as a test double and for schemas known ahead of time where
/// a metadata round-trip per bind is unwanted.
#[derive(Debug, Clone, Default)]
pub struct MemorySchema {
    tables: HashMap<String, TableDef>,
}

impl MemorySchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, name: &str, table: TableDef) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    fn table(&self, table: &str) -> Result<&TableDef, Error> {
        self.tables
            .get(table)
            .ok_or_else(|| Error::MissingTable(table.to_string()))
    }
}

impl SchemaIntrospector for MemorySchema {
    async fn table_exists(&self, table: &str) -> Result<bool, Error> {
        Ok(self.tables.contains_key(table))
    }

    async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>, Error> {
        Ok(self.table(table)?.primary_key.clone())
    }

    async fn column_meta(&self, table: &str, column: &str) -> Result<ColumnMeta, Error> {
        self.table(table)?
            .columns
            .get(column)
            .copied()
            .ok_or_else(|| Error::UnsupportedSchema {
                table: table.to_string(),
                reason: format!("column `{column}` is not declared"),
            })
    }
}
