use serde::{Deserialize, Serialize};
use sqlparser::ast::{ColumnDef, ColumnOption, CreateTable, DataType, ObjectNamePart, TableConstraint};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SqlColumn {
    pub name: String,
    pub column_type: DataType,
    pub primary_key: bool,
}

impl SqlColumn {
    /// Whether this column's declared type maps to a textual key.
    #[must_use]
    pub fn is_text_type(&self) -> bool {
        is_text_type(&self.column_type)
    }

    #[must_use]
    pub fn is_integer_type(&self) -> bool {
        is_integer_type(&self.column_type)
    }
}

impl From<&ColumnDef> for SqlColumn {
    fn from(value: &ColumnDef) -> Self {
        Self {
            name: value.name.value.clone(),
            column_type: value.data_type.clone(),
            primary_key: value
                .options
                .iter()
                .find_map(|e| {
                    if let ColumnOption::Unique {
                        is_primary: true,
                        characteristics: _,
                    } = e.option
                    {
                        Some(true)
                    } else {
                        None
                    }
                })
                .unwrap_or(false),
        }
    }
}

#[must_use]
pub fn is_text_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::TinyText
            | DataType::MediumText
            | DataType::LongText
            | DataType::String(_)
            | DataType::FixedString(_)
            | DataType::Text
            | DataType::Uuid
            | DataType::Nvarchar(_)
            | DataType::Varchar(_)
            | DataType::CharVarying(_)
            | DataType::CharacterVarying(_)
            | DataType::Char(_)
            | DataType::Character(_)
    )
}

#[must_use]
pub fn is_integer_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::TinyInt(_)
            | DataType::SmallInt(_)
            | DataType::MediumInt(_)
            | DataType::Int(_)
            | DataType::Integer(_)
            | DataType::BigInt(_)
            | DataType::Int2(_)
            | DataType::Int4(_)
            | DataType::Int8(_)
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
    )
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SqlTable {
    pub name: String,
    pub columns: Vec<SqlColumn>,
    /// All declared primary key columns, in declaration order. Empty when the
    /// table declares no primary key, more than one entry for composite keys.
    pub primary_key: Vec<String>,
}

impl SqlTable {
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&SqlColumn> {
        self.columns.iter().find(|e| e.name.eq(name))
    }
}

impl From<&CreateTable> for SqlTable {
    fn from(create_table: &CreateTable) -> Self {
        let columns: Vec<SqlColumn> = create_table.columns.iter().map(SqlColumn::from).collect();

        let mut primary_key = columns
            .iter()
            .filter(|e| e.primary_key)
            .map(|e| e.name.clone())
            .collect::<Vec<_>>();

        if primary_key.is_empty() {
            // Table-level `PRIMARY KEY (a, b)` constraint.
            primary_key = create_table
                .constraints
                .iter()
                .find_map(|e| {
                    if let TableConstraint::PrimaryKey { columns, .. } = e {
                        Some(
                            columns
                                .iter()
                                .map(|c| {
                                    c.to_string()
                                        .trim_matches(|ch| ch == '"' || ch == '`' || ch == '\'')
                                        .to_string()
                                })
                                .collect(),
                        )
                    } else {
                        None
                    }
                })
                .unwrap_or_default();
        }

        SqlTable {
            name: create_table
                .name
                .0
                .iter()
                .map(|e| {
                    let ObjectNamePart::Identifier(ident) = e;

                    ident.value.clone()
                })
                .next()
                .unwrap_or_default(),
            primary_key,
            columns,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SqlSchema {
    pub tables: Vec<SqlTable>,
}

impl SqlSchema {
    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<&SqlTable> {
        self.tables.iter().find(|e| e.name.eq(name))
    }
}
