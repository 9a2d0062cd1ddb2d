//! Runtime schema-driven entity binding over `sqlx`.
//!
//! Most mapped entities carry their table name in their definition. A
//! [`DynamicEntity`](entity::DynamicEntity) instead receives its table
//! name at construction time and resolves the rest of its storage mapping
//! (primary key column, key type, auto-increment flag) from live schema
//! metadata, so application code can treat an arbitrary, not statically
//! known table as a first-class mapped entity.
//!
//! ```no_run
//! use dyn_entity::entity::{DynamicEntity, kind::EntityKind};
//! use dyn_entity::query::cond::Cond;
//!
//! struct Widgets;
//!
//! impl EntityKind for Widgets {
//!     const NAME: &'static str = "widgets";
//! }
//!
//! # async fn demo() -> Result<(), dyn_entity::Error> {
//! dyn_entity::connection::connect("sqlite://app.db").await?;
//!
//! let entity = DynamicEntity::<Widgets>::bind("widgets").await?;
//! assert_eq!(entity.primary_key(), "widget_id");
//!
//! let select = DynamicEntity::<Widgets>::query()
//!     .await?
//!     .filter(Cond::gt("qty", 5));
//! # let _ = select;
//! # Ok(())
//! # }
//! ```
//!
//! Binding is re-resolved from the schema on every construction; nothing
//! but the last bound table name per [entity kind](entity::kind) is cached
//! process-wide. That cache is what lets query hydration, replication and
//! bulk deletes reconstruct correctly bound instances without the caller
//! re-supplying the table name; it also means concurrently binding the
//! same kind to different tables is not supported.

pub mod connection;
pub mod entity;
pub mod error;
pub mod query;
pub(crate) mod registry;
pub mod schema;
pub mod value;

pub use entity::DynamicEntity;
pub use error::Error;

pub use sqlx;
