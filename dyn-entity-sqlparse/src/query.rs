use sqlparser::{
    ast::Statement,
    dialect::SQLiteDialect,
    parser::{Parser, ParserError},
};

use crate::schema::SqlTable;

/// Parse a single `CREATE TABLE` statement into an [`SqlTable`].
///
/// # Errors
///
/// If the input is not valid SQL, or contains no `CREATE TABLE` statement.
pub fn parse_create_table(query: &str) -> Result<SqlTable, ParserError> {
    let ast = Parser::parse_sql(&SQLiteDialect {}, query)?;

    let create_table = ast
        .iter()
        .find_map(|e| {
            if let Statement::CreateTable(statement) = e {
                Some(statement)
            } else {
                None
            }
        })
        .ok_or_else(|| {
            ParserError::ParserError("input contains no CREATE TABLE statement".to_string())
        })?;

    Ok(create_table.into())
}

#[cfg(test)]
mod test {
    use super::parse_create_table;

    #[test]
    fn test_create_table() {
        let query = "CREATE TABLE `widgets`(
          `widget_id` INTEGER NOT NULL PRIMARY KEY,
          `name` TEXT NOT NULL,
          `weight` REAL
        )";

        let parsed = parse_create_table(query).expect("Failed to parse query");

        assert_eq!(parsed.name, "widgets");
        assert_eq!(parsed.primary_key, vec!["widget_id".to_string()]);

        let key = parsed.find_column("widget_id").expect("Missing key column");
        assert!(key.is_integer_type());
        assert!(!key.is_text_type());

        let name = parsed.find_column("name").expect("Missing name column");
        assert!(name.is_text_type());
    }

    #[test]
    fn test_text_primary_key() {
        let query = "CREATE TABLE tags(
          slug VARCHAR(64) NOT NULL PRIMARY KEY,
          label TEXT
        )";

        let parsed = parse_create_table(query).expect("Failed to parse query");

        assert_eq!(parsed.primary_key, vec!["slug".to_string()]);
        assert!(
            parsed
                .find_column("slug")
                .is_some_and(crate::schema::SqlColumn::is_text_type)
        );
    }

    #[test]
    fn test_composite_primary_key_constraint() {
        let query = "CREATE TABLE memberships(
          user_id INTEGER NOT NULL,
          group_id INTEGER NOT NULL,
          PRIMARY KEY (user_id, group_id)
        )";

        let parsed = parse_create_table(query).expect("Failed to parse query");

        assert_eq!(
            parsed.primary_key,
            vec!["user_id".to_string(), "group_id".to_string()]
        );
    }

    #[test]
    fn test_no_primary_key() {
        let query = "CREATE TABLE log_lines(line TEXT)";

        let parsed = parse_create_table(query).expect("Failed to parse query");

        assert!(parsed.primary_key.is_empty());
    }

    #[test]
    fn test_not_a_create_table() {
        assert!(parse_create_table("SELECT 1").is_err());
    }
}
