//! Schema introspection against a live connection.
//!
//! SQLite keeps the original `CREATE TABLE` DDL in `sqlite_schema`, so the
//! SQLite path reads and parses that. Postgres and MySQL are served from
//! `information_schema`.

use dyn_entity_sqlparse::{db::DbType, query::parse_create_table, schema::SqlTable};
use sqlx::{Any, AnyPool, QueryBuilder, Row};

use crate::{
    error::Error,
    schema::{ColumnMeta, ScalarType, SchemaIntrospector},
};

/// [`SchemaIntrospector`] over one registered connection.
pub struct LiveSchema {
    pool: AnyPool,
    db_type: DbType,
}

impl LiveSchema {
    #[must_use]
    pub const fn new(pool: AnyPool, db_type: DbType) -> Self {
        Self { pool, db_type }
    }

    async fn sqlite_ddl(&self, table: &str) -> Result<Option<String>, Error> {
        let mut builder = QueryBuilder::<Any>::new(
            "SELECT sql FROM sqlite_schema WHERE type = 'table' AND name = ",
        );
        builder.push_bind(table.to_string());

        let row = builder.build().fetch_optional(&self.pool).await?;

        row.map(|row| row.try_get::<String, _>(0))
            .transpose()
            .map_err(Error::from)
    }

    async fn sqlite_table(&self, table: &str) -> Result<SqlTable, Error> {
        let Some(ddl) = self.sqlite_ddl(table).await? else {
            return Err(Error::MissingTable(table.to_string()));
        };

        Ok(parse_create_table(&ddl)?)
    }

    async fn info_schema_exists(&self, table: &str) -> Result<bool, Error> {
        let mut builder = QueryBuilder::<Any>::new(match self.db_type {
            DbType::Postgres => {
                "SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = "
            }
            _ => {
                "SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_name = "
            }
        });
        builder.push_bind(table.to_string());

        Ok(builder.build().fetch_optional(&self.pool).await?.is_some())
    }

    async fn info_schema_key_columns(&self, table: &str) -> Result<Vec<String>, Error> {
        let mut builder = QueryBuilder::<Any>::new(match self.db_type {
            DbType::Postgres => {
                "SELECT kcu.column_name FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                 ON kcu.constraint_name = tc.constraint_name \
                 AND kcu.table_schema = tc.table_schema \
                 WHERE tc.constraint_type = 'PRIMARY KEY' \
                 AND tc.table_schema = current_schema() AND tc.table_name = "
            }
            _ => {
                "SELECT column_name FROM information_schema.key_column_usage \
                 WHERE table_schema = DATABASE() AND constraint_name = 'PRIMARY' \
                 AND table_name = "
            }
        });
        builder.push_bind(table.to_string());
        builder.push(" ORDER BY ordinal_position");

        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(Error::from))
            .collect()
    }

    async fn info_schema_column_meta(
        &self,
        table: &str,
        column: &str,
    ) -> Result<ColumnMeta, Error> {
        let mut builder = QueryBuilder::<Any>::new(match self.db_type {
            DbType::Postgres => {
                "SELECT data_type, is_identity, column_default \
                 FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = "
            }
            _ => {
                "SELECT data_type, extra, NULL FROM information_schema.columns \
                 WHERE table_schema = DATABASE() AND table_name = "
            }
        });
        builder.push_bind(table.to_string());
        builder.push(" AND column_name = ");
        builder.push_bind(column.to_string());

        let row = builder.build().fetch_one(&self.pool).await?;

        let data_type = row.try_get::<String, _>(0)?.to_lowercase();
        let scalar_type = named_scalar_type(&data_type);

        let auto_increment = match self.db_type {
            DbType::Postgres => {
                let is_identity = row.try_get::<String, _>(1)?;
                let column_default = row.try_get::<Option<String>, _>(2)?;

                is_identity.eq_ignore_ascii_case("yes")
                    || column_default.is_some_and(|d| d.starts_with("nextval("))
            }
            _ => row
                .try_get::<Option<String>, _>(1)?
                .is_some_and(|extra| extra.to_lowercase().contains("auto_increment")),
        };

        Ok(ColumnMeta {
            scalar_type,
            auto_increment,
        })
    }
}

/// Map an `information_schema` type name to its scalar classification.
fn named_scalar_type(data_type: &str) -> ScalarType {
    match data_type {
        "character varying" | "varchar" | "character" | "char" | "text" | "tinytext"
        | "mediumtext" | "longtext" | "uuid" | "citext" => ScalarType::Text,
        "integer" | "int" | "bigint" | "smallint" | "mediumint" | "tinyint" => ScalarType::Integer,
        "real" | "float" | "double" | "double precision" | "numeric" | "decimal" => {
            ScalarType::Float
        }
        "boolean" | "bool" => ScalarType::Boolean,
        _ => ScalarType::Other,
    }
}

fn parsed_scalar_type(column: &dyn_entity_sqlparse::schema::SqlColumn) -> ScalarType {
    use dyn_entity_sqlparse::sqlparser::ast::DataType;

    if column.is_text_type() {
        ScalarType::Text
    } else if column.is_integer_type() {
        ScalarType::Integer
    } else {
        match &column.column_type {
            DataType::Real | DataType::Float(_) | DataType::Float4 | DataType::Float8 => {
                ScalarType::Float
            }
            DataType::Bool | DataType::Boolean => ScalarType::Boolean,
            _ => ScalarType::Other,
        }
    }
}

impl SchemaIntrospector for LiveSchema {
    async fn table_exists(&self, table: &str) -> Result<bool, Error> {
        match self.db_type {
            DbType::Sqlite => Ok(self.sqlite_ddl(table).await?.is_some()),
            _ => self.info_schema_exists(table).await,
        }
    }

    async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>, Error> {
        match self.db_type {
            DbType::Sqlite => Ok(self.sqlite_table(table).await?.primary_key),
            _ => self.info_schema_key_columns(table).await,
        }
    }

    async fn column_meta(&self, table: &str, column: &str) -> Result<ColumnMeta, Error> {
        match self.db_type {
            DbType::Sqlite => {
                let parsed = self.sqlite_table(table).await?;
                let Some(found) = parsed.find_column(column) else {
                    return Err(Error::UnsupportedSchema {
                        table: table.to_string(),
                        reason: format!("column `{column}` is not declared in the table DDL"),
                    });
                };

                // SQLite `INTEGER PRIMARY KEY` aliases the rowid, which
                // increments on insert whether or not AUTOINCREMENT is
                // spelled out.
                let is_key = parsed.primary_key.iter().any(|k| k == column);

                Ok(ColumnMeta {
                    scalar_type: parsed_scalar_type(found),
                    auto_increment: is_key && found.is_integer_type(),
                })
            }
            _ => self.info_schema_column_meta(table, column).await,
        }
    }
}
