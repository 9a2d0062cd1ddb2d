pub mod db;
pub mod query;
pub mod schema;

pub use sqlparser;
