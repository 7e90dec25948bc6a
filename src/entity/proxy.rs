//! Deferred loaders installed by the materializer for lazy relations and attributes.

use std::{fmt::Debug, marker::PhantomData};

use super::Entity;
use crate::{
    error::{Error, Result},
    query::filter::Filters,
    storage::DbStorage,
    value::{ColumnType, SqlValue},
};

/// Loads the single related object a lazy to-one relation points at.
pub struct ObjectProxy<T> {
    key: i64,
    filters: Filters,
    marker: PhantomData<fn() -> T>,
}

impl<T> ObjectProxy<T> {
    pub(crate) const fn new(key: i64, filters: Filters) -> Self {
        Self {
            key,
            filters,
            marker: PhantomData,
        }
    }

    /// The identity of the row this proxy points at.
    #[must_use]
    pub const fn key(&self) -> i64 {
        self.key
    }

    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.filters
    }
}

impl<T: Entity> ObjectProxy<T> {
    /// Issue one `pickup` for the identifying filters.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] unless exactly one row matches.
    pub async fn resolve(&self, storage: &DbStorage) -> Result<T> {
        storage.pickup_one::<T>(&self.filters).await
    }
}

impl<T> Clone for ObjectProxy<T> {
    fn clone(&self) -> Self {
        Self::new(self.key, self.filters.clone())
    }
}

impl<T> PartialEq for ObjectProxy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Debug for ObjectProxy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectProxy").field("key", &self.key).finish()
    }
}

/// Loads the children of a lazy to-many relation.
pub struct CollectionProxy<T> {
    filters: Filters,
    marker: PhantomData<fn() -> T>,
}

impl<T> CollectionProxy<T> {
    pub(crate) const fn new(filters: Filters) -> Self {
        Self {
            filters,
            marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.filters
    }
}

impl<T: Entity> CollectionProxy<T> {
    /// Issue one `pickup` for every row carrying the owner's backreference.
    ///
    /// # Errors
    ///
    /// If there's been a problem communicating with the database.
    pub async fn resolve(&self, storage: &DbStorage) -> Result<Vec<T>> {
        storage.pickup::<T>(&self.filters).await
    }
}

impl<T> Clone for CollectionProxy<T> {
    fn clone(&self) -> Self {
        Self::new(self.filters.clone())
    }
}

impl<T> PartialEq for CollectionProxy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.filters == other.filters
    }
}

impl<T> Debug for CollectionProxy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionProxy")
            .field("filters", &self.filters)
            .finish()
    }
}

/// Identifies one column of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarKey {
    pub(crate) table: &'static str,
    pub(crate) column: String,
    pub(crate) identity_column: String,
    pub(crate) key: i64,
    pub(crate) column_type: ColumnType,
}

/// Loads a single lazy scalar attribute.
pub struct ScalarProxy<V> {
    key: ScalarKey,
    marker: PhantomData<fn() -> V>,
}

impl<V> ScalarProxy<V> {
    pub(crate) const fn new(key: ScalarKey) -> Self {
        Self {
            key,
            marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &ScalarKey {
        &self.key
    }
}

impl<V: SqlValue> ScalarProxy<V> {
    /// Issue one scalar `SELECT` for the column.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] unless exactly one row matches, or [`Error::Decode`] if the stored
    /// value does not fit `V`.
    pub async fn resolve(&self, storage: &DbStorage) -> Result<V> {
        let value = storage.fetch_scalar(&self.key).await?;

        V::from_value(value).ok_or_else(|| Error::Decode {
            column: format!("{}.{}", self.key.table, self.key.column),
            reason: format!("expected a {} value", V::COLUMN_TYPE),
        })
    }
}

impl<V> Clone for ScalarProxy<V> {
    fn clone(&self) -> Self {
        Self::new(self.key.clone())
    }
}

impl<V> PartialEq for ScalarProxy<V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<V> Debug for ScalarProxy<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarProxy").field("key", &self.key).finish()
    }
}
