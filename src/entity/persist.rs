//! Persistence operations for dynamic entities.
//!
//! These delegate SQL construction and execution to the database layer;
//! the entity only contributes its resolved binding and attribute bag.

use itertools::Itertools;
use sqlx::{Any, AnyPool, QueryBuilder};
use tracing::debug;

use crate::{
    connection,
    entity::{DynamicEntity, kind::EntityKind},
    error::Error,
    query::{PushToQuery, cond::Cond},
    registry,
    schema::SchemaIntrospector,
    value::ScalarValue,
};

impl<K> DynamicEntity<K>
where
    K: EntityKind,
{
    /// Persist this instance: an `INSERT` when it does not exist in the
    /// database yet, otherwise an `UPDATE` of all attributes by key.
    ///
    /// After an insert into a table with an auto-incrementing key, the key
    /// attribute is back-filled from the generated value when the driver
    /// reports one.
    ///
    /// # Errors
    ///
    /// [`Error::MissingKeyValue`] when updating without a key value;
    /// database failures pass through.
    pub async fn save(&mut self, pool: &AnyPool) -> Result<(), Error> {
        if self.exists {
            self.update_row(pool).await
        } else {
            self.insert_row(pool).await
        }
    }

    async fn insert_row(&mut self, pool: &AnyPool) -> Result<(), Error> {
        let key_column = self.binding.primary_key().to_string();
        let values = self
            .attributes
            .iter()
            .filter(|(name, value)| !(**name == key_column && value.is_null()))
            .collect::<Vec<_>>();

        let mut builder = QueryBuilder::<Any>::new(format!("INSERT INTO \"{}\" ", self.table()));

        if values.is_empty() {
            builder.push("DEFAULT VALUES");
        } else {
            builder.push("(");
            builder.push(values.iter().map(|(name, _)| format!("\"{name}\"")).join(", "));
            builder.push(") VALUES (");
            values.iter().enumerate().for_each(|(i, (_, value))| {
                if i > 0 {
                    builder.push(", ");
                }
                value.push_to(&mut builder);
            });
            builder.push(")");
        }

        let result = builder.build().execute(pool).await?;

        if self.binding.incrementing() && self.key().is_none()
            && let Some(id) = result.last_insert_id()
        {
            self.set_attribute(&key_column, id);
        }

        self.exists = true;

        Ok(())
    }

    async fn update_row(&self, pool: &AnyPool) -> Result<(), Error> {
        let key_column = self.binding.primary_key().to_string();
        let key = self
            .key()
            .ok_or_else(|| Error::MissingKeyValue(key_column.clone()))?
            .clone();

        let values = self
            .attributes
            .iter()
            .filter(|(name, _)| **name != key_column)
            .collect::<Vec<_>>();

        if values.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Any>::new(format!("UPDATE \"{}\" SET ", self.table()));

        values.iter().enumerate().for_each(|(i, (name, value))| {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(format_args!("\"{name}\" = "));
            value.push_to(&mut builder);
        });

        builder.push(format_args!(" WHERE \"{key_column}\" = "));
        key.push_to(&mut builder);

        builder.build().execute(pool).await?;

        Ok(())
    }

    /// Delete this record. Returns whether a row was actually removed.
    ///
    /// # Errors
    ///
    /// [`Error::MissingKeyValue`] when the instance carries no key value;
    /// database failures pass through.
    pub async fn delete(&self, pool: &AnyPool) -> Result<bool, Error> {
        let key_column = self.binding.primary_key().to_string();
        let key = self
            .key()
            .ok_or(Error::MissingKeyValue(key_column.clone()))?
            .clone();

        let mut builder = QueryBuilder::<Any>::new(format!(
            "DELETE FROM \"{}\" WHERE \"{key_column}\" = ",
            self.table()
        ));
        key.push_to(&mut builder);

        let result = builder.build().execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete the records whose primary key is in `ids`, each one
    /// individually, on the connection this kind was last bound through.
    /// Returns the number of rows actually removed; keys that match no
    /// row are simply not counted.
    ///
    /// An empty id list returns 0 without touching the database.
    ///
    /// # Errors
    ///
    /// See [`DynamicEntity::rebind`]; database failures pass through.
    pub async fn destroy<I>(ids: I) -> Result<u64, Error>
    where
        I: IntoIterator,
        I::Item: Into<ScalarValue>,
    {
        let ids = ids.into_iter().map(Into::into).collect::<Vec<_>>();
        if ids.is_empty() {
            return Ok(0);
        }

        let last = registry::last_bound::<K>()?;
        let handle = connection::handle(last.connection.as_deref())?;
        let entity = Self::rebind().await?;

        entity.destroy_ids(handle.pool(), ids).await
    }

    /// [`Self::destroy`] through an explicit schema introspector and pool.
    ///
    /// # Errors
    ///
    /// See [`Self::destroy`].
    pub async fn destroy_with<S, I>(schema: &S, pool: &AnyPool, ids: I) -> Result<u64, Error>
    where
        S: SchemaIntrospector,
        I: IntoIterator,
        I::Item: Into<ScalarValue>,
    {
        let ids = ids.into_iter().map(Into::into).collect::<Vec<_>>();
        if ids.is_empty() {
            return Ok(0);
        }

        let entity = Self::rebind_with(schema).await?;

        entity.destroy_ids(pool, ids).await
    }

    async fn destroy_ids(self, pool: &AnyPool, ids: Vec<ScalarValue>) -> Result<u64, Error> {
        let key_column = self.binding.primary_key().to_string();

        let matching = self
            .select()
            .filter(Cond::is_in(&key_column, ids))
            .all(pool)
            .await?;

        let mut removed = 0;
        for record in matching {
            if record.delete(pool).await? {
                removed += 1;
            }
        }

        debug!(kind = K::NAME, table = self.table(), removed, "bulk delete finished");

        Ok(removed)
    }
}
