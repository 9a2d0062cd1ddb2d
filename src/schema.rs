pub mod live;
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Coarse classification of a column's declared SQL type, as far as key
/// derivation cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Integer,
    Float,
    Text,
    Boolean,
    Other,
}

/// Schema metadata for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMeta {
    pub scalar_type: ScalarType,
    pub auto_increment: bool,
}

/// Reports live database structure: which tables exist, their primary keys
/// and column declarations.
///
/// One introspector is scoped to one connection; connection selection
/// happens when the introspector is constructed, not per call. Binds
/// re-read metadata through this trait every time, nothing is cached.
#[allow(async_fn_in_trait)]
pub trait SchemaIntrospector {
    /// Whether the named table exists in this connection's schema.
    async fn table_exists(&self, table: &str) -> Result<bool, Error>;

    /// The declared primary key columns of the table, in declaration
    /// order. Empty when the table has no primary key.
    async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>, Error>;

    /// Type and auto-increment metadata for one column of the table.
    async fn column_meta(&self, table: &str, column: &str) -> Result<ColumnMeta, Error>;
}
