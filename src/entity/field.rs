//! Field wrappers for relations and lazily loaded attributes.

use super::{
    Entity,
    proxy::{CollectionProxy, ObjectProxy, ScalarProxy},
};
use crate::{
    error::Result,
    storage::DbStorage,
    value::SqlValue,
};

/// The value of a to-one relation field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Related<T> {
    /// Never assigned. Left out of inserts and updates.
    #[default]
    Unset,
    /// Explicitly empty. Written as `NULL`.
    Null,
    /// Points at a stored row that has not been fetched yet.
    Deferred(ObjectProxy<T>),
    Loaded(Box<T>),
}

impl<T> Related<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::Loaded(Box::new(value))
    }

    /// The related instance, if it has been loaded.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Loaded(e) => Some(e),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(e) => Some(e),
            _ => None,
        }
    }

    /// The identity of the related row, known without fetching it.
    #[must_use]
    pub const fn key(&self) -> Option<i64> {
        match self {
            Self::Deferred(proxy) => Some(proxy.key()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn set(&mut self, value: T) {
        *self = Self::new(value);
    }

    pub fn clear(&mut self) {
        *self = Self::Null;
    }
}

impl<T: Entity> Related<T> {
    /// Read the related instance, resolving a deferred reference on first access.
    ///
    /// # Errors
    ///
    /// If the referenced row no longer exists, or if there's been a problem communicating with
    /// the database.
    pub async fn fetch(&mut self, storage: &DbStorage) -> Result<Option<&T>> {
        if let Self::Deferred(proxy) = self {
            let loaded = proxy.resolve(storage).await?;
            *self = Self::new(loaded);
        }

        Ok(self.get())
    }
}

impl<T> From<T> for Related<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// The value of a to-many relation field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RelatedMany<T> {
    #[default]
    Unset,
    Deferred(CollectionProxy<T>),
    Loaded(Vec<T>),
}

impl<T> RelatedMany<T> {
    #[must_use]
    pub const fn new(values: Vec<T>) -> Self {
        Self::Loaded(values)
    }

    #[must_use]
    pub fn get(&self) -> Option<&[T]> {
        match self {
            Self::Loaded(e) => Some(e),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut Vec<T>> {
        match self {
            Self::Loaded(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Attach `value`, starting an empty collection if none is loaded.
    pub fn push(&mut self, value: T) {
        match self {
            Self::Loaded(e) => e.push(value),
            _ => *self = Self::Loaded(vec![value]),
        }
    }
}

impl<T: Entity> RelatedMany<T> {
    /// Read the children, resolving a deferred collection on first access.
    ///
    /// # Errors
    ///
    /// If there's been a problem communicating with the database.
    pub async fn fetch(&mut self, storage: &DbStorage) -> Result<&[T]> {
        if let Self::Deferred(proxy) = self {
            let loaded = proxy.resolve(storage).await?;
            *self = Self::Loaded(loaded);
        }

        Ok(self.get().unwrap_or_default())
    }
}

impl<T> From<Vec<T>> for RelatedMany<T> {
    fn from(value: Vec<T>) -> Self {
        Self::new(value)
    }
}

/// A scalar attribute that is only read from the database when asked for.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Lazy<V> {
    #[default]
    Unset,
    Deferred(ScalarProxy<V>),
    Loaded(V),
}

impl<V> Lazy<V> {
    #[must_use]
    pub const fn new(value: V) -> Self {
        Self::Loaded(value)
    }

    #[must_use]
    pub const fn get(&self) -> Option<&V> {
        match self {
            Self::Loaded(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn set(&mut self, value: V) {
        *self = Self::Loaded(value);
    }
}

impl<V: SqlValue> Lazy<V> {
    /// Read the value, issuing a single `SELECT` on first access.
    ///
    /// # Errors
    ///
    /// If the owning row no longer exists, or if there's been a problem communicating with the
    /// database.
    pub async fn fetch(&mut self, storage: &DbStorage) -> Result<Option<&V>> {
        if let Self::Deferred(proxy) = self {
            let loaded = proxy.resolve(storage).await?;
            *self = Self::Loaded(loaded);
        }

        Ok(self.get())
    }
}

impl<V> From<V> for Lazy<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}
