//! The storage handle: reads, lazy resolution and table creation. Writes live in [`write`].

mod write;

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use sqlx::{AnyConnection, AnyPool, QueryBuilder};
use tracing::{debug, info};

use crate::{
    config::{Dialect, StorageConfig},
    entity::{
        Entity,
        access::Accessor,
        column::{ColumnName, Descriptor},
        proxy::ScalarKey,
    },
    error::{Error, Result},
    query::{
        BinaryExpr, BinaryExprOperand, PushToQuery,
        filter::{FilterValue, Filters, RelatedObject},
        materialize::Graph,
        plan::Plan,
        quote,
        select::{Select, fetch},
    },
    schema::{EntityType, Schema},
    value::Value,
};

/// A handle on a database and the schema of the entities stored in it.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DbStorage {
    pool: AnyPool,
    schema: Arc<Schema>,
    dialect: Dialect,
}

impl DbStorage {
    #[must_use]
    pub fn new(pool: AnyPool, dialect: Dialect, schema: Schema) -> Self {
        Self {
            pool,
            schema: Arc::new(schema),
            dialect,
        }
    }

    /// Open a connection pool as described by `config`.
    ///
    /// # Errors
    ///
    /// If the URL names an unsupported database, or the connection fails.
    pub async fn connect(config: &StorageConfig, schema: Schema) -> Result<Self> {
        let dialect = config.dialect()?;
        let pool = config
            .pool_options()
            .connect(&config.database_url)
            .await?;

        info!(?dialect, max_connections = config.max_connections, "connected");

        Ok(Self::new(pool, dialect, schema))
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Create the table of every registered type, unless it exists.
    ///
    /// # Errors
    ///
    /// If there's been a problem communicating with the database.
    pub async fn create_tables(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for ty in self.schema.types() {
            let sql = ty.create_table(self.dialect);
            debug!(sql, "create table");
            sqlx::query(&sql).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Start building a `pickup` of `T` rows.
    #[must_use]
    pub fn find<T: Entity>(&self) -> Select<'_, T> {
        Select::new(self, Filters::new())
    }

    /// All `T` instances matching `filters`, in first-seen row order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFilterValue`] or [`Error::UnknownAttribute`] if the filters do not fit
    /// `T`, [`Error::RelatedObjectNotFound`] if a related-object filter cannot be reduced to a
    /// single row.
    pub async fn pickup<T: Entity>(&self, filters: &Filters) -> Result<Vec<T>> {
        let ty = self.schema.entity::<T>()?;
        let mut connection = self.pool.acquire().await?;

        let filters = self.resolve_objects(&mut connection, ty, filters).await?;
        let plan = Plan::build(&self.schema, ty, &filters)?;
        let rows = fetch(&mut connection, &plan).await?;

        let graph = Graph::from_rows(&self.schema, &plan, &rows)?;
        graph.roots().iter().map(|e| graph.build::<T>(*e)).collect()
    }

    /// The only `T` matching `filters`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] unless exactly one instance matches.
    pub async fn pickup_one<T: Entity>(&self, filters: &Filters) -> Result<T> {
        let mut found = self.pickup::<T>(filters).await?;
        let count = found.len();

        match (found.pop(), count) {
            (Some(e), 1) => Ok(e),
            _ => Err(Error::NotFound {
                entity: T::TABLE,
                found: count,
            }),
        }
    }

    /// Identities of the `ty` rows matching `filters`, along with the materialized graph.
    async fn select_keys<'a>(
        &'a self,
        connection: &mut AnyConnection,
        ty: &EntityType,
        filters: &Filters,
    ) -> Result<(Vec<i64>, Graph<'a>)> {
        let plan = Plan::build(&self.schema, ty, filters)?;
        let rows = fetch(connection, &plan).await?;
        let graph = Graph::from_rows(&self.schema, &plan, &rows)?;

        Ok((
            graph.roots().iter().map(|e| graph.key(*e)).collect(),
            graph,
        ))
    }

    /// Replace every related-object filter whose instance has no identity by the identity of
    /// the single row matching its non-null columns.
    fn resolve_objects<'a>(
        &'a self,
        connection: &'a mut AnyConnection,
        ty: &'a EntityType,
        filters: &'a Filters,
    ) -> BoxFuture<'a, Result<Filters>> {
        async move {
            let mut resolved = filters.clone();

            for (name, value) in resolved.entries_mut() {
                let (_, attribute) = ty.require(name)?;
                let Descriptor::ToOne { target, .. } = attribute.descriptor() else {
                    continue;
                };
                let target = self.schema.get(*target)?;

                let replacement = match &*value {
                    FilterValue::Nested(nested) => Some(FilterValue::Nested(
                        self.resolve_objects(&mut *connection, target, nested).await?,
                    )),
                    FilterValue::Object(object) if object.entity == target.entity() => {
                        match target.identity_of(&*object.object)? {
                            Some(_) => None,
                            None => {
                                let key = self
                                    .probe(&mut *connection, ty, name, target, object)
                                    .await?;
                                Some(FilterValue::Eq(Value::Int(key)))
                            }
                        }
                    }
                    _ => None,
                };

                if let Some(replacement) = replacement {
                    *value = replacement;
                }
            }

            Ok(resolved)
        }
        .boxed()
    }

    async fn probe(
        &self,
        connection: &mut AnyConnection,
        owner: &EntityType,
        attribute: &str,
        target: &EntityType,
        object: &RelatedObject,
    ) -> Result<i64> {
        let mut filters = Filters::new();

        for (i, e) in target.attributes().iter().enumerate() {
            if i == target.identity_index() {
                continue;
            }

            if let (Descriptor::Column { .. }, Some(Accessor::Scalar(access))) =
                (e.descriptor(), e.accessor())
            {
                let value = access.get(&*object.object)?;
                if !value.is_null() {
                    filters.insert(e.name(), value);
                }
            }
        }

        let (keys, _) = self.select_keys(connection, target, &filters).await?;

        match keys.as_slice() {
            [key] => Ok(*key),
            _ => Err(Error::RelatedObjectNotFound {
                entity: owner.table(),
                attribute: attribute.to_string(),
                matches: keys.len(),
            }),
        }
    }

    /// Read one column of one row, for a lazy attribute.
    pub(crate) async fn fetch_scalar(&self, key: &ScalarKey) -> Result<Value> {
        let mut connection = self.pool.acquire().await?;

        let mut builder = QueryBuilder::new("SELECT ");
        ColumnName::new(&key.column).push_to(&mut builder);
        builder.push(" FROM ");
        builder.push(quote(key.table));
        builder.push(" WHERE ");
        BinaryExpr::new(
            ColumnName::new(&key.identity_column),
            Value::Int(key.key),
            BinaryExprOperand::Equals,
        )
        .push_to(&mut builder);

        debug!(sql = builder.sql(), "select scalar");

        let rows = builder.build().fetch_all(&mut *connection).await?;

        match rows.as_slice() {
            [row] => Value::decode(row, &key.column, key.column_type),
            _ => Err(Error::NotFound {
                entity: key.table,
                found: rows.len(),
            }),
        }
    }
}
