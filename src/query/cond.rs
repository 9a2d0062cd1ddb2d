use crate::{
    query::{
        BinaryExpr, BinaryExprOperand, BracketsExpr, ColumnName, PushToQuery, SingletonExpr,
        SingletonExprOperand,
    },
    value::ScalarValue,
};

/// A `WHERE` condition over runtime column names.
///
/// Dynamic entities have no typed column markers, so conditions are built
/// from column name strings and [`ScalarValue`]s instead.
pub struct Cond {
    inner: Box<dyn PushToQuery>,
}

impl Cond {
    fn wrap(inner: impl PushToQuery + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    fn binary(column: &str, value: impl Into<ScalarValue>, operand: BinaryExprOperand) -> Self {
        Self::wrap(BinaryExpr::new(
            ColumnName::new(column.to_string()),
            value.into(),
            operand,
        ))
    }

    /// `column = value`, or `column IS NULL` when passed [`ScalarValue::Null`].
    #[must_use]
    pub fn eq(column: &str, value: impl Into<ScalarValue>) -> Self {
        match value.into() {
            ScalarValue::Null => Self::is_null(column),
            value => Self::binary(column, value, BinaryExprOperand::Equals),
        }
    }

    /// `column != value`, or `column IS NOT NULL` when passed [`ScalarValue::Null`].
    #[must_use]
    pub fn ne(column: &str, value: impl Into<ScalarValue>) -> Self {
        match value.into() {
            ScalarValue::Null => Self::is_not_null(column),
            value => Self::binary(column, value, BinaryExprOperand::DoesNotEqual),
        }
    }

    #[must_use]
    pub fn gt(column: &str, value: impl Into<ScalarValue>) -> Self {
        Self::binary(column, value, BinaryExprOperand::Gt)
    }

    #[must_use]
    pub fn lt(column: &str, value: impl Into<ScalarValue>) -> Self {
        Self::binary(column, value, BinaryExprOperand::Lt)
    }

    #[must_use]
    pub fn geq(column: &str, value: impl Into<ScalarValue>) -> Self {
        Self::binary(column, value, BinaryExprOperand::Geq)
    }

    #[must_use]
    pub fn leq(column: &str, value: impl Into<ScalarValue>) -> Self {
        Self::binary(column, value, BinaryExprOperand::Leq)
    }

    #[must_use]
    pub fn like(column: &str, pattern: &str) -> Self {
        Self::binary(column, pattern, BinaryExprOperand::Like)
    }

    #[must_use]
    pub fn is_null(column: &str) -> Self {
        Self::wrap(SingletonExpr::new(
            ColumnName::new(column.to_string()),
            SingletonExprOperand::IsNull,
        ))
    }

    #[must_use]
    pub fn is_not_null(column: &str) -> Self {
        Self::wrap(SingletonExpr::new(
            ColumnName::new(column.to_string()),
            SingletonExprOperand::IsNotNull,
        ))
    }

    /// `column IN (values)`. An empty value list never matches.
    #[must_use]
    pub fn is_in<I>(column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ScalarValue>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();

        if values.is_empty() {
            return Self::wrap("1 = 0".to_string());
        }

        Self::wrap(BinaryExpr::new(
            ColumnName::new(column.to_string()),
            values,
            BinaryExprOperand::In,
        ))
    }

    /// Glue two conditions together with `AND`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::wrap(BinaryExpr::new(self, other, BinaryExprOperand::And))
    }

    /// Glue two conditions together with `OR`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::wrap(BinaryExpr::new(self, other, BinaryExprOperand::Or))
    }

    /// Wrap the condition into brackets `()`.
    #[must_use]
    pub fn brackets(self) -> Self {
        Self::wrap(BracketsExpr::new(self.inner))
    }
}

impl PushToQuery for Cond {
    fn push_to(&self, builder: &mut sqlx::QueryBuilder<'_, sqlx::Any>) {
        self.inner.push_to(builder);
    }
}

#[cfg(test)]
mod test {
    use sqlx::{Any, QueryBuilder};

    use super::Cond;
    use crate::{query::PushToQuery, value::ScalarValue};

    fn render(cond: &Cond) -> String {
        let mut builder = QueryBuilder::<Any>::new("");
        cond.push_to(&mut builder);
        builder.into_sql()
    }

    #[test]
    fn test_eq_binds_value() {
        assert_eq!(render(&Cond::eq("name", "August")), "\"name\" = ?");
    }

    #[test]
    fn test_eq_null_becomes_is_null() {
        assert_eq!(render(&Cond::eq("name", ScalarValue::Null)), "\"name\" IS NULL");
        assert_eq!(
            render(&Cond::ne("name", ScalarValue::Null)),
            "\"name\" IS NOT NULL"
        );
    }

    #[test]
    fn test_composition() {
        let cond = Cond::gt("qty", 5).and(Cond::like("name", "bolt%")).brackets();
        assert_eq!(render(&cond), "(\"qty\" > ? AND \"name\" LIKE ?)");
    }

    #[test]
    fn test_is_in() {
        assert_eq!(render(&Cond::is_in("id", [1, 2, 3])), "\"id\" IN (?, ?, ?)");
    }

    #[test]
    fn test_is_in_empty_never_matches() {
        assert_eq!(render(&Cond::is_in("id", Vec::<i64>::new())), "1 = 0");
    }
}
