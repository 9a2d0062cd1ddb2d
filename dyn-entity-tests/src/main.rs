#![allow(clippy::unwrap_used)]

//! End-to-end walkthrough against an in-memory SQLite database.

use dyn_entity::{
    connection,
    entity::{DynamicEntity, kind::EntityKind},
    query::cond::Cond,
    value::Attributes,
};
use dyn_entity_sqlparse::db::{DbType, get_database_url};
use sqlx::any::AnyPoolOptions;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{
    fmt::{format, layer},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

struct Widgets;

impl EntityKind for Widgets {
    const NAME: &'static str = "demo_widgets";
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(layer().event_format(format().without_time().with_target(false).compact()))
        .init();

    if let Err(e) = run().await {
        error!("Walkthrough failed: {e}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = get_database_url().unwrap_or_else(|| "sqlite::memory:".to_string());

    sqlx::any::install_default_drivers();

    // In-memory SQLite lives and dies with its connection, so the pool is
    // pinned to a single one.
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS widgets (
            widget_id INTEGER NOT NULL PRIMARY KEY,
            name TEXT NOT NULL,
            qty INTEGER NOT NULL
        )",
    )
    .execute(&pool)
    .await?;

    connection::register(
        "default",
        pool.clone(),
        DbType::from_connection_string(&database_url).unwrap_or(DbType::Sqlite),
    );

    let mut attributes = Attributes::new();
    attributes.insert("name".to_string(), "bolt".into());
    attributes.insert("qty".to_string(), 12_i64.into());

    let mut entity = DynamicEntity::<Widgets>::bind_filled("widgets", attributes).await?;
    info!(
        table = entity.table(),
        primary_key = entity.primary_key(),
        key_type = ?entity.key_type(),
        incrementing = entity.incrementing(),
        "bound entity"
    );

    entity.save(&pool).await?;
    info!(key = ?entity.key(), "saved entity");

    let mut copy = entity.replicate(&[]);
    copy.set_attribute("name", "nut");
    copy.save(&pool).await?;

    let found = DynamicEntity::<Widgets>::query()
        .await?
        .filter(Cond::gt("qty", 5))
        .all(&pool)
        .await?;
    info!(matches = found.len(), "queried widgets with qty > 5");

    for widget in &found {
        info!("row: {}", serde_json::to_string(widget.attributes())?);
    }

    let removed = DynamicEntity::<Widgets>::destroy(found.iter().filter_map(|w| w.key().cloned())).await?;
    info!(removed, "destroyed matching widgets");

    Ok(())
}
