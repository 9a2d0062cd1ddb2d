use serde::{Deserialize, Serialize};

use crate::schema::ScalarType;

/// The declared type of a resolved primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    Integer,
    Text,
}

impl From<ScalarType> for KeyType {
    fn from(value: ScalarType) -> Self {
        match value {
            ScalarType::Text => Self::Text,
            _ => Self::Integer,
        }
    }
}

/// The storage mapping one dynamic entity instance resolved at bind time.
///
/// Computed once per bind from live schema metadata and immutable
/// afterwards. Every instance produced downstream of a bind (query
/// hydration, replication, bulk deletes) carries a copy of the binding
/// that originated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    table: String,
    connection: Option<String>,
    primary_key: String,
    key_type: KeyType,
    incrementing: bool,
    lookup_key: String,
}

impl Binding {
    pub(crate) fn new(
        table: String,
        connection: Option<String>,
        primary_key: String,
        key_type: KeyType,
        incrementing: bool,
    ) -> Self {
        Self {
            table,
            connection,
            lookup_key: primary_key.clone(),
            primary_key,
            key_type,
            incrementing,
        }
    }

    /// The physical table this entity is bound to.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The label of the connection whose schema was consulted, if not the
    /// default one.
    #[must_use]
    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// The single primary key column of the bound table.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Whether the key column is declared auto-incrementing.
    #[must_use]
    pub const fn incrementing(&self) -> bool {
        self.incrementing
    }

    /// The column used for identity lookups. Follows the primary key.
    #[must_use]
    pub fn lookup_key(&self) -> &str {
        &self.lookup_key
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        table: &str,
        connection: Option<&str>,
        primary_key: &str,
        key_type: KeyType,
        incrementing: bool,
    ) -> Self {
        Self::new(
            table.to_string(),
            connection.map(ToString::to_string),
            primary_key.to_string(),
            key_type,
            incrementing,
        )
    }
}
