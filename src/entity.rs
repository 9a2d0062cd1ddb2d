pub mod binding;
pub mod kind;
pub mod persist;

use std::marker::PhantomData;

use sqlx::any::AnyRow;
use tracing::debug;

use crate::{
    connection,
    error::Error,
    query::select::Select,
    registry,
    schema::SchemaIntrospector,
    value::{Attributes, ScalarValue, row_to_attributes},
};
use binding::{Binding, KeyType};
use kind::{DefaultKind, EntityKind};

/// Timestamp columns stripped when replicating, mirroring the usual
/// bookkeeping column names.
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

/// An entity bound to a table chosen at runtime.
///
/// Where a regular mapped entity carries its table name in its definition,
/// a `DynamicEntity` resolves its storage mapping from live schema
/// metadata when it is constructed: the table is verified to exist, and
/// the primary key column, its type and its auto-increment flag are read
/// from the schema. See [`DynamicEntity::bind`].
///
/// The type parameter distinguishes independently bound entity subtypes,
/// see [`EntityKind`].
pub struct DynamicEntity<K = DefaultKind>
where
    K: EntityKind,
{
    marker: PhantomData<K>,
    binding: Binding,
    attributes: Attributes,
    exists: bool,
}

impl<K> DynamicEntity<K>
where
    K: EntityKind,
{
    /// Bind a fresh entity to `table` on the default connection.
    ///
    /// # Errors
    ///
    /// [`Error::MissingTable`] when the table does not exist,
    /// [`Error::UnsupportedSchema`] when its primary key is absent or
    /// composite, [`Error::UnknownConnection`] when no default connection
    /// is registered. Schema layer failures pass through unchanged.
    pub async fn bind(table: &str) -> Result<Self, Error> {
        Self::bind_on(table, None).await
    }

    /// Bind a fresh entity to `table`, consulting the named connection's
    /// schema (or the default connection's when `None`).
    ///
    /// # Errors
    ///
    /// See [`Self::bind`].
    pub async fn bind_on(table: &str, connection: Option<&str>) -> Result<Self, Error> {
        let handle = connection::handle(connection)?;
        Self::bind_with(&handle.schema(), table, connection, Attributes::new()).await
    }

    /// Bind a fresh entity to `table` on the default connection,
    /// pre-populated with attribute values.
    ///
    /// # Errors
    ///
    /// See [`Self::bind`].
    pub async fn bind_filled(table: &str, attributes: Attributes) -> Result<Self, Error> {
        let handle = connection::handle(None)?;
        Self::bind_with(&handle.schema(), table, None, attributes).await
    }

    /// Bind a fresh entity through an explicit schema introspector. This
    /// is the factory every other construction path funnels into; the
    /// convenience wrappers only differ in how they pick the introspector.
    ///
    /// Metadata is re-read from the introspector on every call. A binding
    /// therefore always reflects the schema as it was at bind time.
    ///
    /// # Errors
    ///
    /// See [`Self::bind`].
    pub async fn bind_with<S>(
        schema: &S,
        table: &str,
        connection: Option<&str>,
        attributes: Attributes,
    ) -> Result<Self, Error>
    where
        S: SchemaIntrospector,
    {
        registry::record::<K>(table, connection);

        if !schema.table_exists(table).await? {
            return Err(Error::MissingTable(table.to_string()));
        }

        let key_columns = schema.primary_key_columns(table).await?;
        let primary_key = match key_columns.as_slice() {
            [single] => single.clone(),
            [] => {
                return Err(Error::UnsupportedSchema {
                    table: table.to_string(),
                    reason: "the table declares no primary key".to_string(),
                });
            }
            _ => {
                return Err(Error::UnsupportedSchema {
                    table: table.to_string(),
                    reason: format!(
                        "composite primary key ({}), only single-column keys are supported",
                        key_columns.join(", ")
                    ),
                });
            }
        };

        let meta = schema.column_meta(table, &primary_key).await?;

        let binding = Binding::new(
            table.to_string(),
            connection.map(ToString::to_string),
            primary_key,
            KeyType::from(meta.scalar_type),
            meta.auto_increment,
        );

        debug!(
            kind = K::NAME,
            table,
            primary_key = binding.primary_key(),
            key_type = ?binding.key_type(),
            incrementing = binding.incrementing(),
            "resolved entity binding"
        );

        Ok(Self {
            marker: PhantomData,
            binding,
            attributes,
            exists: false,
        })
    }

    /// Construct a fresh instance bound to whatever table this kind was
    /// last bound to, re-reading schema metadata.
    ///
    /// # Errors
    ///
    /// [`Error::Unbound`] when nothing was bound for this kind yet,
    /// otherwise see [`Self::bind`].
    pub async fn rebind() -> Result<Self, Error> {
        let last = registry::last_bound::<K>()?;
        let handle = connection::handle(last.connection.as_deref())?;
        Self::bind_with(
            &handle.schema(),
            &last.table,
            last.connection.as_deref(),
            Attributes::new(),
        )
        .await
    }

    /// [`Self::rebind`] through an explicit schema introspector.
    ///
    /// # Errors
    ///
    /// See [`Self::rebind`].
    pub async fn rebind_with<S>(schema: &S) -> Result<Self, Error>
    where
        S: SchemaIntrospector,
    {
        let last = registry::last_bound::<K>()?;
        Self::bind_with(schema, &last.table, last.connection.as_deref(), Attributes::new()).await
    }

    /// A `SELECT` statement scoped to the last bound table, on its
    /// recorded connection.
    ///
    /// # Errors
    ///
    /// See [`Self::rebind`].
    pub async fn query() -> Result<Select<K>, Error> {
        Ok(Self::rebind().await?.select())
    }

    /// [`Self::query`] through an explicit schema introspector.
    ///
    /// # Errors
    ///
    /// See [`Self::rebind`].
    pub async fn query_with<S>(schema: &S) -> Result<Select<K>, Error>
    where
        S: SchemaIntrospector,
    {
        Ok(Self::rebind_with(schema).await?.select())
    }

    /// A `SELECT` statement scoped to the last bound table, consulting the
    /// named connection instead of the recorded one.
    ///
    /// # Errors
    ///
    /// See [`Self::rebind`].
    pub async fn on(connection: &str) -> Result<Select<K>, Error> {
        let last = registry::last_bound::<K>()?;
        let handle = connection::handle(Some(connection))?;
        let entity = Self::bind_with(
            &handle.schema(),
            &last.table,
            Some(connection),
            Attributes::new(),
        )
        .await?;

        Ok(entity.select())
    }

    /// A `SELECT` statement scoped to this instance's binding.
    #[must_use]
    pub fn select(&self) -> Select<K> {
        Select::new(self.binding.clone())
    }

    /// An unsaved copy of this entity: same binding, same attribute
    /// values except the primary key, the timestamp columns and any
    /// explicitly excluded ones.
    #[must_use]
    pub fn replicate(&self, except: &[&str]) -> Self {
        let mut attributes = self.attributes.clone();
        attributes.remove(self.binding.primary_key());
        attributes.remove(CREATED_AT);
        attributes.remove(UPDATED_AT);
        for column in except {
            attributes.remove(*column);
        }

        Self {
            marker: PhantomData,
            binding: self.binding.clone(),
            attributes,
            exists: false,
        }
    }

    pub(crate) fn hydrate(binding: Binding, row: &AnyRow) -> Result<Self, Error> {
        Ok(Self {
            marker: PhantomData,
            binding,
            attributes: row_to_attributes(row)?,
            exists: true,
        })
    }

    /// The resolved storage mapping of this instance.
    #[must_use]
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.binding.table()
    }

    #[must_use]
    pub fn connection(&self) -> Option<&str> {
        self.binding.connection()
    }

    #[must_use]
    pub fn primary_key(&self) -> &str {
        self.binding.primary_key()
    }

    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        self.binding.key_type()
    }

    #[must_use]
    pub const fn incrementing(&self) -> bool {
        self.binding.incrementing()
    }

    #[must_use]
    pub fn lookup_key(&self) -> &str {
        self.binding.lookup_key()
    }

    /// Whether this instance was hydrated from (or saved to) the database.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// The value of the primary key column, when present and non-null.
    #[must_use]
    pub fn key(&self) -> Option<&ScalarValue> {
        self.attributes
            .get(self.binding.primary_key())
            .filter(|v| !v.is_null())
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&ScalarValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<ScalarValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[cfg(test)]
mod test {
    use super::{DynamicEntity, binding::KeyType, kind::EntityKind};
    use crate::{
        error::Error,
        schema::{ScalarType, memory::MemorySchema, memory::TableDef},
        value::{Attributes, ScalarValue},
    };

    fn widget_schema() -> MemorySchema {
        MemorySchema::new()
            .with_table(
                "widgets",
                TableDef::new()
                    .primary_key("widget_id")
                    .column("widget_id", ScalarType::Integer, true)
                    .column("name", ScalarType::Text, false),
            )
            .with_table(
                "tags",
                TableDef::new()
                    .primary_key("slug")
                    .column("slug", ScalarType::Text, false)
                    .column("label", ScalarType::Text, false),
            )
            .with_table(
                "memberships",
                TableDef::new()
                    .primary_key("user_id")
                    .primary_key("group_id")
                    .column("user_id", ScalarType::Integer, false)
                    .column("group_id", ScalarType::Integer, false),
            )
            .with_table("log_lines", TableDef::new().column("line", ScalarType::Text, false))
    }

    struct Widgets;

    impl EntityKind for Widgets {
        const NAME: &'static str = "entity_test_widgets";
    }

    struct Tags;

    impl EntityKind for Tags {
        const NAME: &'static str = "entity_test_tags";
    }

    #[tokio::test]
    async fn test_bind_reads_integer_key_metadata() {
        let entity =
            DynamicEntity::<Widgets>::bind_with(&widget_schema(), "widgets", None, Attributes::new())
                .await
                .expect("bind should succeed");

        assert_eq!(entity.table(), "widgets");
        assert_eq!(entity.primary_key(), "widget_id");
        assert_eq!(entity.key_type(), KeyType::Integer);
        assert!(entity.incrementing());
        assert_eq!(entity.lookup_key(), "widget_id");
        assert!(!entity.exists());
    }

    #[tokio::test]
    async fn test_bind_reads_text_key_metadata() {
        let entity =
            DynamicEntity::<Tags>::bind_with(&widget_schema(), "tags", None, Attributes::new())
                .await
                .expect("bind should succeed");

        assert_eq!(entity.primary_key(), "slug");
        assert_eq!(entity.key_type(), KeyType::Text);
        assert!(!entity.incrementing());
    }

    #[tokio::test]
    async fn test_bind_missing_table_is_fatal() {
        struct Ghost;

        impl EntityKind for Ghost {
            const NAME: &'static str = "entity_test_ghost";
        }

        let result = DynamicEntity::<Ghost>::bind_with(
            &widget_schema(),
            "ghost_table",
            None,
            Attributes::new(),
        )
        .await;

        assert!(matches!(result, Err(Error::MissingTable(t)) if t == "ghost_table"));
    }

    #[tokio::test]
    async fn test_bind_rejects_composite_key() {
        struct Memberships;

        impl EntityKind for Memberships {
            const NAME: &'static str = "entity_test_memberships";
        }

        let result = DynamicEntity::<Memberships>::bind_with(
            &widget_schema(),
            "memberships",
            None,
            Attributes::new(),
        )
        .await;

        assert!(
            matches!(result, Err(Error::UnsupportedSchema { table, .. }) if table == "memberships")
        );
    }

    #[tokio::test]
    async fn test_bind_rejects_missing_key() {
        struct LogLines;

        impl EntityKind for LogLines {
            const NAME: &'static str = "entity_test_log_lines";
        }

        let result = DynamicEntity::<LogLines>::bind_with(
            &widget_schema(),
            "log_lines",
            None,
            Attributes::new(),
        )
        .await;

        assert!(matches!(result, Err(Error::UnsupportedSchema { .. })));
    }

    #[tokio::test]
    async fn test_rebind_survives_unrelated_binds() {
        struct Mine;
        struct Other;

        impl EntityKind for Mine {
            const NAME: &'static str = "entity_test_rebind_mine";
        }

        impl EntityKind for Other {
            const NAME: &'static str = "entity_test_rebind_other";
        }

        let schema = widget_schema();

        DynamicEntity::<Mine>::bind_with(&schema, "widgets", None, Attributes::new())
            .await
            .expect("bind should succeed");

        // Unrelated kinds binding other tables must not disturb ours.
        DynamicEntity::<Other>::bind_with(&schema, "tags", None, Attributes::new())
            .await
            .expect("bind should succeed");

        let rebound = DynamicEntity::<Mine>::rebind_with(&schema)
            .await
            .expect("rebind should succeed");

        assert_eq!(rebound.table(), "widgets");
        assert_eq!(rebound.primary_key(), "widget_id");
    }

    #[tokio::test]
    async fn test_rebind_without_bind_errors() {
        struct Unbound;

        impl EntityKind for Unbound {
            const NAME: &'static str = "entity_test_unbound";
        }

        assert!(matches!(
            DynamicEntity::<Unbound>::rebind_with(&widget_schema()).await,
            Err(Error::Unbound("entity_test_unbound"))
        ));
    }

    #[tokio::test]
    async fn test_query_scopes_to_last_bound_table() {
        struct Scoped;

        impl EntityKind for Scoped {
            const NAME: &'static str = "entity_test_scoped";
        }

        let schema = widget_schema();

        DynamicEntity::<Scoped>::bind_with(&schema, "tags", None, Attributes::new())
            .await
            .expect("bind should succeed");

        let select = DynamicEntity::<Scoped>::query_with(&schema)
            .await
            .expect("query should succeed");

        assert_eq!(select.query(), "SELECT * FROM \"tags\"");
    }

    #[tokio::test]
    async fn test_replicate_strips_key_and_timestamps() {
        struct Rep;

        impl EntityKind for Rep {
            const NAME: &'static str = "entity_test_replicate";
        }

        let mut attributes = Attributes::new();
        attributes.insert("widget_id".to_string(), ScalarValue::Int(7));
        attributes.insert("name".to_string(), ScalarValue::Text("bolt".to_string()));
        attributes.insert("created_at".to_string(), ScalarValue::Text("now".to_string()));
        attributes.insert("secret".to_string(), ScalarValue::Text("x".to_string()));

        let entity =
            DynamicEntity::<Rep>::bind_with(&widget_schema(), "widgets", None, attributes)
                .await
                .expect("bind should succeed");

        let copy = entity.replicate(&["secret"]);

        assert!(!copy.exists());
        assert!(copy.key().is_none());
        assert!(copy.attribute("created_at").is_none());
        assert!(copy.attribute("secret").is_none());
        assert_eq!(
            copy.attribute("name"),
            Some(&ScalarValue::Text("bolt".to_string()))
        );
        assert_eq!(copy.binding(), entity.binding());
    }

    #[tokio::test]
    async fn test_attribute_round_trip() {
        struct Attrs;

        impl EntityKind for Attrs {
            const NAME: &'static str = "entity_test_attrs";
        }

        let mut entity =
            DynamicEntity::<Attrs>::bind_with(&widget_schema(), "widgets", None, Attributes::new())
                .await
                .expect("bind should succeed");

        assert!(entity.key().is_none());

        entity.set_attribute("widget_id", 3);
        entity.set_attribute("name", "nut");

        assert_eq!(entity.key(), Some(&ScalarValue::Int(3)));
        assert_eq!(entity.attribute("name"), Some(&ScalarValue::Text("nut".to_string())));
    }
}
