//! Named connection registry.
//!
//! Binds may name the connection whose schema should be consulted; absent a
//! name, the default connection is used. Register pools up front, once, at
//! application startup.

use std::{
    collections::HashMap,
    sync::{Once, OnceLock, PoisonError, RwLock},
};

use dyn_entity_sqlparse::db::DbType;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use tracing::debug;

use crate::{error::Error, schema::live::LiveSchema};

const DEFAULT_LABEL: &str = "default";

/// A registered connection: the pool plus the backend kind its URL
/// identified, which decides how the live introspector queries the schema.
#[derive(Clone)]
pub struct Handle {
    pool: AnyPool,
    db_type: DbType,
}

impl Handle {
    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    #[must_use]
    pub const fn db_type(&self) -> DbType {
        self.db_type
    }

    /// The schema introspector for this connection.
    #[must_use]
    pub fn schema(&self) -> LiveSchema {
        LiveSchema::new(self.pool.clone(), self.db_type)
    }
}

fn pools() -> &'static RwLock<HashMap<String, Handle>> {
    static POOLS: OnceLock<RwLock<HashMap<String, Handle>>> = OnceLock::new();
    POOLS.get_or_init(|| RwLock::new(HashMap::new()))
}

fn install_drivers() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(sqlx::any::install_default_drivers);
}

/// Register a pre-built pool under a label.
pub fn register(label: &str, pool: AnyPool, db_type: DbType) {
    debug!(label, ?db_type, "registering connection");

    pools()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(label.to_string(), Handle { pool, db_type });
}

/// Connect to a database URL and register the pool as the default
/// connection.
///
/// # Errors
///
/// [`Error::UnknownDriver`] when the URL identifies no supported backend,
/// otherwise any connection failure from the database layer.
pub async fn connect(url: &str) -> Result<(), Error> {
    connect_as(DEFAULT_LABEL, url).await
}

/// Connect to a database URL and register the pool under a label.
///
/// # Errors
///
/// See [`connect`].
pub async fn connect_as(label: &str, url: &str) -> Result<(), Error> {
    let Some(db_type) = DbType::from_connection_string(url) else {
        return Err(Error::UnknownDriver(url.to_string()));
    };

    install_drivers();

    let pool = AnyPoolOptions::new().connect(url).await?;

    register(label, pool, db_type);

    Ok(())
}

/// Resolve a connection label (or the default connection) to its handle.
///
/// # Errors
///
/// [`Error::UnknownConnection`] when nothing is registered under the label.
pub fn handle(label: Option<&str>) -> Result<Handle, Error> {
    let label = label.unwrap_or(DEFAULT_LABEL);

    pools()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(label)
        .cloned()
        .ok_or_else(|| Error::UnknownConnection(label.to_string()))
}
