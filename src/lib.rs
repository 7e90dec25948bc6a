//! Declarative object-relational persistence on top of [`sqlx`].
//!
//! Entity types describe their table and attributes through [`Entity::declare`] (usually via
//! `#[derive(Entity)]`), are registered once in a [`Schema`], and are then stored, updated,
//! picked up and dropped through a [`DbStorage`].

extern crate self as db_storage;

pub mod config;
pub mod entity;
pub mod error;
pub mod query;
pub mod schema;
pub mod storage;
pub mod value;

pub use config::{Dialect, StorageConfig, get_database_url};
pub use entity::{
    Declaration, Entity, EntityRef,
    field::{Lazy, Related, RelatedMany},
    relation::RelationOptions,
};
pub use error::{Error, Result};
pub use query::{
    filter::{Direction, FilterValue, Filters, Limit, OrderBy},
    select::Select,
};
pub use schema::{EntityType, Schema};
pub use storage::DbStorage;
pub use value::{ColumnType, SqlValue, Value};

/// Derive macro implementing [`Entity`] from `#[entity(...)]` attributes.
pub use db_storage_macros::Entity;

pub use sqlx;
