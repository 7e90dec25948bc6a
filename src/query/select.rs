use std::marker::PhantomData;

use sqlx::{AnyConnection, QueryBuilder, any::AnyRow};
use tracing::debug;

use super::{
    PushToQuery,
    filter::{FilterValue, Filters, OrderBy},
    plan::Plan,
};
use crate::{entity::Entity, error::Result, storage::DbStorage};

/// A `pickup` under construction, see [`DbStorage::find`].
pub struct Select<'s, T>
where
    T: Entity,
{
    storage: &'s DbStorage,
    filters: Filters,
    marker: PhantomData<fn() -> T>,
}

impl<'s, T> Select<'s, T>
where
    T: Entity,
{
    pub(crate) const fn new(storage: &'s DbStorage, filters: Filters) -> Self {
        Self {
            storage,
            filters,
            marker: PhantomData,
        }
    }

    /// Filter `attribute` on `value`. Filters on different attributes are `AND`-combined.
    #[must_use]
    pub fn filter(mut self, attribute: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(attribute, value);
        self
    }

    #[must_use]
    pub fn order_by(mut self, attribute: impl Into<String>, order: impl Into<OrderBy>) -> Self {
        self.filters = self.filters.order_by(attribute, order);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.filters = self.filters.limit(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.filters = self.filters.offset(offset);
        self
    }

    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Return the raw SQL query of this statement. Note that the returned query is
    /// backend-agnostic, e.g. query parameters will be substituted with `?` instead of `$1` (in
    /// the case of postgres).
    ///
    /// This is mainly useful for debugging purposes. Related objects in the filters must already
    /// be stored, since nothing is looked up.
    ///
    /// # Errors
    ///
    /// If the filters do not fit the entity's attributes.
    pub fn query(&self) -> Result<String> {
        let schema = self.storage.schema();
        Ok(Plan::build(schema, schema.entity::<T>()?, &self.filters)?.sql())
    }

    /// Execute the query, returning a single result.
    ///
    /// # Errors
    ///
    /// If not exactly one entry could be found, or if there's been a problem communicating with
    /// the database.
    pub async fn one(self) -> Result<T> {
        self.storage.pickup_one::<T>(&self.filters).await
    }

    /// Execute the query, returning all results.
    ///
    /// # Errors
    ///
    /// If there's been a problem communicating with the database.
    pub async fn all(self) -> Result<Vec<T>> {
        self.storage.pickup::<T>(&self.filters).await
    }
}

/// Run a planned `SELECT` on `connection`.
pub(crate) async fn fetch(connection: &mut AnyConnection, plan: &Plan) -> Result<Vec<AnyRow>> {
    let mut builder = QueryBuilder::new("");
    plan.push_to(&mut builder);

    debug!(sql = builder.sql(), "select");

    Ok(builder.build().fetch_all(connection).await?)
}
