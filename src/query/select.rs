use std::{marker::PhantomData, sync::Arc};

use futures::StreamExt;
use sqlx::{AnyPool, QueryBuilder};

use crate::{
    entity::{
        DynamicEntity,
        binding::Binding,
        kind::{DefaultKind, EntityKind},
    },
    error::Error,
    query::{BinaryExpr, BinaryExprOperand, BracketsExpr, PushToQuery, cond::Cond},
};

/// A `SELECT` statement scoped to the table a dynamic entity resolved at
/// bind time. Every row it returns hydrates into an entity carrying the
/// same binding that produced the statement.
pub struct Select<K = DefaultKind>
where
    K: EntityKind,
{
    marker: PhantomData<K>,
    binding: Binding,
    conditions: Vec<Arc<dyn PushToQuery>>,
}

impl<K> Select<K>
where
    K: EntityKind,
{
    pub(crate) fn new(binding: Binding) -> Self {
        Self {
            marker: PhantomData,
            binding,
            conditions: vec![],
        }
    }

    /// The binding this statement is scoped to.
    #[must_use]
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Append a new `WHERE` condition using an `AND` statement as glue. The passed condition is
    /// wrapped in `()` brackets.
    #[must_use]
    pub fn filter(mut self, condition: Cond) -> Self {
        self.conditions.push(Arc::new(condition));
        self
    }

    /// Scope the statement to a single record by its primary key value.
    #[must_use]
    pub fn by_key(self, key: impl Into<crate::value::ScalarValue>) -> Self {
        let column = self.binding.primary_key().to_string();
        self.filter(Cond::eq(&column, key))
    }

    /// Return the raw SQL query of this statement. Note that the returned query is
    /// backend-agnostic, e.g. query parameters will be substituted with `?` instead of `$1` (in
    /// the case of postgres).
    ///
    /// This is mainly useful for debugging purposes, and not intended to produce queries to be run
    /// on an actual database.
    #[must_use]
    pub fn query(&self) -> String {
        let mut builder = QueryBuilder::new("");
        self.push_to(&mut builder);
        builder.into_sql()
    }

    /// Execute the query, returning a single result.
    ///
    /// # Errors
    ///
    /// If no entry could be found, or if there's been a problem communicating with the database.
    /// See [`sqlx::Error`] for more information.
    pub async fn one(self, pool: &AnyPool) -> Result<DynamicEntity<K>, Error> {
        let mut builder = QueryBuilder::new("");
        self.push_to(&mut builder);

        let row = builder.build().fetch_one(pool).await?;
        DynamicEntity::hydrate(self.binding.clone(), &row)
    }

    /// Execute the query, returning all results.
    ///
    /// # Errors
    ///
    /// If there's been a problem communicating with the database. See [`sqlx::Error`] for more
    /// information.
    pub async fn all(self, pool: &AnyPool) -> Result<Vec<DynamicEntity<K>>, Error> {
        let mut builder = QueryBuilder::new("");
        self.push_to(&mut builder);

        let rows = builder
            .build()
            .fetch(pool)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|row| DynamicEntity::hydrate(self.binding.clone(), row))
            .collect()
    }
}

impl<K> PushToQuery for Select<K>
where
    K: EntityKind,
{
    // Unwraps are checked beforehand
    #[allow(clippy::unwrap_used)]
    fn push_to(&self, builder: &mut QueryBuilder<'_, sqlx::Any>) {
        builder.push(format_args!(
            "SELECT * FROM \"{}\"",
            self.binding.table()
        ));

        if !self.conditions.is_empty() {
            let mut conditions = self.conditions.clone();

            builder.push(" WHERE ");
            if self.conditions.len() == 1 {
                BracketsExpr::new(conditions.pop().unwrap()).push_to(builder);
            } else {
                let left: Box<dyn PushToQuery> =
                    Box::new(BracketsExpr::new(conditions.pop().unwrap()));
                let right: Box<dyn PushToQuery> =
                    Box::new(BracketsExpr::new(conditions.pop().unwrap()));
                let init = BinaryExpr::new(left, right, BinaryExprOperand::And);
                let cond = conditions.into_iter().fold(init, |acc, curr| {
                    BinaryExpr::new(
                        Box::new(acc) as Box<dyn PushToQuery>,
                        Box::new(BracketsExpr::new(curr)) as Box<dyn PushToQuery>,
                        BinaryExprOperand::And,
                    )
                });
                cond.push_to(builder);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::Select;
    use crate::{
        entity::{binding::Binding, kind::DefaultKind},
        query::cond::Cond,
    };

    fn widgets_binding() -> Binding {
        Binding::for_tests("widgets", None, "widget_id", crate::entity::binding::KeyType::Integer, true)
    }

    #[test]
    fn test_bare_select() {
        let select = Select::<DefaultKind>::new(widgets_binding());
        assert_eq!(select.query(), "SELECT * FROM \"widgets\"");
    }

    #[test]
    fn test_single_condition() {
        let select = Select::<DefaultKind>::new(widgets_binding()).filter(Cond::eq("name", "bolt"));
        assert_eq!(
            select.query(),
            "SELECT * FROM \"widgets\" WHERE (\"name\" = ?)"
        );
    }

    #[test]
    fn test_conditions_are_and_glued() {
        let select = Select::<DefaultKind>::new(widgets_binding())
            .filter(Cond::gt("qty", 5))
            .filter(Cond::like("name", "bolt%"))
            .filter(Cond::is_not_null("weight"));
        let query = select.query();

        assert!(query.starts_with("SELECT * FROM \"widgets\" WHERE "));
        assert_eq!(query.matches(" AND ").count(), 2);
        assert!(query.contains("(\"qty\" > ?)"));
        assert!(query.contains("(\"name\" LIKE ?)"));
        assert!(query.contains("(\"weight\" IS NOT NULL)"));
    }

    #[test]
    fn test_by_key_uses_resolved_key_column() {
        let select = Select::<DefaultKind>::new(widgets_binding()).by_key(7);
        assert_eq!(
            select.query(),
            "SELECT * FROM \"widgets\" WHERE (\"widget_id\" = ?)"
        );
    }
}
