pub mod cond;
pub mod select;

use std::{fmt::Display, ops::Deref, sync::Arc};

use sqlx::{Any, QueryBuilder};

use crate::value::ScalarValue;

/// This trait represents anything that can be pushed into a [`QueryBuilder`], i.e. any kind of
/// query fragment, like a condition or a list of values.
pub trait PushToQuery {
    /// Push the object's contents into a query builder.
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>);
}

impl PushToQuery for Box<dyn PushToQuery> {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        self.deref().push_to(builder);
    }
}

impl PushToQuery for Arc<dyn PushToQuery> {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        self.deref().push_to(builder);
    }
}

impl PushToQuery for String {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push(self);
    }
}

/// A column reference, quoted, optionally qualified with its table name.
pub struct ColumnName {
    table: Option<String>,
    column_name: String,
}

impl ColumnName {
    #[must_use]
    pub const fn new(column_name: String) -> Self {
        Self {
            table: None,
            column_name,
        }
    }

    #[must_use]
    pub const fn new_with_table(table: String, column_name: String) -> Self {
        Self {
            table: Some(table),
            column_name,
        }
    }
}

impl Display for ColumnName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(table) = &self.table {
            write!(f, "\"{table}\".")?;
        }
        write!(f, "\"{}\"", self.column_name)
    }
}

impl PushToQuery for ColumnName {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push(self.to_string());
    }
}

impl PushToQuery for ScalarValue {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        match self {
            Self::Int(v) => {
                builder.push_bind(*v);
            }
            Self::Float(v) => {
                builder.push_bind(*v);
            }
            Self::Text(v) => {
                builder.push_bind(v.clone());
            }
            Self::Bool(v) => {
                builder.push_bind(*v);
            }
            Self::Null => {
                builder.push("NULL");
            }
        }
    }
}

impl PushToQuery for Vec<ScalarValue> {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push("(");
        self.iter().enumerate().for_each(|(i, e)| {
            if i > 0 {
                builder.push(", ");
            }
            e.push_to(builder);
        });
        builder.push(")");
    }
}

pub(crate) struct BracketsExpr<T: PushToQuery>(T);

impl<T: PushToQuery> BracketsExpr<T> {
    pub(crate) const fn new(inner: T) -> Self {
        BracketsExpr(inner)
    }
}

impl<T: PushToQuery> PushToQuery for BracketsExpr<T> {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push("(");
        self.0.push_to(builder);
        builder.push(")");
    }
}

pub(crate) enum BinaryExprOperand {
    Equals,
    DoesNotEqual,
    Like,
    And,
    Or,
    In,
    Gt,
    Lt,
    Geq,
    Leq,
}

impl Display for BinaryExprOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BinaryExprOperand::Equals => "=",
                BinaryExprOperand::DoesNotEqual => "!=",
                BinaryExprOperand::Like => "LIKE",
                BinaryExprOperand::And => "AND",
                BinaryExprOperand::Or => "OR",
                BinaryExprOperand::In => "IN",
                BinaryExprOperand::Gt => ">",
                BinaryExprOperand::Lt => "<",
                BinaryExprOperand::Geq => ">=",
                BinaryExprOperand::Leq => "<=",
            }
        )
    }
}

/// A binary SQL expression, glued together with an operator.
///
/// Example: `left-side [operator] right-side`
pub(crate) struct BinaryExpr<T, C>
where
    T: PushToQuery,
    C: PushToQuery,
{
    a: T,
    b: C,
    operand: BinaryExprOperand,
}

impl<T, C> BinaryExpr<T, C>
where
    T: PushToQuery,
    C: PushToQuery,
{
    pub(crate) const fn new(left: T, right: C, operand: BinaryExprOperand) -> Self {
        Self {
            a: left,
            b: right,
            operand,
        }
    }
}

impl<T, C> PushToQuery for BinaryExpr<T, C>
where
    T: PushToQuery,
    C: PushToQuery,
{
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        self.a.push_to(builder);
        builder.push(format_args!(" {} ", self.operand));
        self.b.push_to(builder);
    }
}

pub(crate) enum SingletonExprOperand {
    IsNull,
    IsNotNull,
}

impl Display for SingletonExprOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SingletonExprOperand::IsNull => "IS NULL",
                SingletonExprOperand::IsNotNull => "IS NOT NULL",
            }
        )
    }
}

pub(crate) struct SingletonExpr<T>
where
    T: PushToQuery,
{
    inner: T,
    operand: SingletonExprOperand,
}

impl<T> SingletonExpr<T>
where
    T: PushToQuery,
{
    pub(crate) const fn new(inner: T, operand: SingletonExprOperand) -> Self {
        Self { inner, operand }
    }
}

impl<T> PushToQuery for SingletonExpr<T>
where
    T: PushToQuery,
{
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        self.inner.push_to(builder);
        builder.push(format_args!(" {}", self.operand));
    }
}
