//! Crate-wide error taxonomy.
//!
//! Binding failures carry enough context to name the offending table or
//! kind; collaborator failures (`sqlx`, the DDL parser) pass through
//! unwrapped.

use dyn_entity_sqlparse::sqlparser::parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Table '{0}' does not exist")]
    MissingTable(String),

    #[error("Table '{table}' cannot be bound: {reason}")]
    UnsupportedSchema { table: String, reason: String },

    #[error("Entity kind '{0}' has never been bound")]
    Unbound(&'static str),

    #[error("No connection registered under label '{0}'")]
    UnknownConnection(String),

    #[error("Connection string '{0}' matches no supported driver")]
    UnknownDriver(String),

    #[error("Entity carries no value in its key column '{0}'")]
    MissingKeyValue(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Parse(#[from] ParserError),
}
