//! The transactional write path: `store`, `update` and `drop`.

use futures::{FutureExt, future::BoxFuture};
use sqlx::{AnyConnection, QueryBuilder, Row};
use tracing::{debug, info, warn};

use super::DbStorage;
use crate::{
    config::Dialect,
    entity::{
        Entity, Object,
        access::{Accessor, Reference},
        column::{ColumnName, Descriptor},
    },
    error::{Error, Result},
    query::{BinaryExpr, BinaryExprOperand, PushToQuery, filter::Filters, quote},
    schema::EntityType,
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WriteMode {
    cascading: bool,
    update: bool,
}

impl DbStorage {
    /// Insert `instances`, assigning each its generated identity.
    ///
    /// With `cascading`, loaded to-one targets are written before each instance and loaded
    /// to-many children after it, receiving the new identity as their backreference. Everything
    /// runs in one transaction.
    ///
    /// # Errors
    ///
    /// [`Error::IntegrityViolation`] if a constraint fails, [`Error::RelatedObjectNotFound`] if a
    /// loaded to-one target was never stored and `cascading` is off. The transaction is rolled
    /// back in either case.
    pub async fn store<T: Entity>(&self, instances: &mut [T], cascading: bool) -> Result<()> {
        self.write(
            instances,
            WriteMode {
                cascading,
                update: false,
            },
        )
        .await
    }

    /// Like [`store`](Self::store), but instances that already have an identity are updated in
    /// place.
    ///
    /// # Errors
    ///
    /// See [`store`](Self::store). Also [`Error::NotFound`] if an identity no longer exists.
    pub async fn update<T: Entity>(&self, instances: &mut [T], cascading: bool) -> Result<()> {
        self.write(
            instances,
            WriteMode {
                cascading,
                update: true,
            },
        )
        .await
    }

    async fn write<T: Entity>(&self, instances: &mut [T], mode: WriteMode) -> Result<()> {
        let ty = self.schema.entity::<T>()?;
        let mut tx = self.pool.begin().await?;

        for instance in instances.iter_mut() {
            if let Err(e) = self.write_object(&mut tx, ty, instance, None, mode).await {
                warn!(table = T::TABLE, error = %e, "rolling back write");
                tx.rollback().await?;
                return Err(e);
            }
        }

        tx.commit().await?;

        info!(
            table = T::TABLE,
            count = instances.len(),
            cascading = mode.cascading,
            update = mode.update,
            "stored"
        );

        Ok(())
    }

    /// Write one instance, returning its identity. `backref` is the attribute index and value of
    /// the backreference set by a parent being stored.
    fn write_object<'a>(
        &'a self,
        connection: &'a mut AnyConnection,
        ty: &'a EntityType,
        object: &'a mut Object,
        backref: Option<(usize, i64)>,
        mode: WriteMode,
    ) -> BoxFuture<'a, Result<i64>> {
        async move {
            if mode.cascading {
                for attribute in ty.attributes() {
                    let (Descriptor::ToOne { target, .. }, Some(Accessor::One(access))) =
                        (attribute.descriptor(), attribute.accessor())
                    else {
                        continue;
                    };

                    if let Some(related) = access.loaded_mut(&mut *object)? {
                        let target = self.schema.get(*target)?;
                        self.write_object(&mut *connection, target, related, None, mode)
                            .await?;
                    }
                }
            }

            let mut values = vec![];

            for (index, attribute) in ty.attributes().iter().enumerate() {
                if index == ty.identity_index() {
                    continue;
                }
                let Some(column) = attribute.descriptor().column() else {
                    continue;
                };

                let value = match (backref, attribute.accessor()) {
                    (Some((backref, key)), _) if backref == index => Some(Value::Int(key)),
                    (_, Some(Accessor::Scalar(access))) => Some(access.get(&*object)?),
                    (_, Some(Accessor::Lazy(access))) => access.get(&*object)?,
                    (_, Some(Accessor::One(access))) => {
                        match access.reference(&self.schema, &*object)? {
                            Reference::Skip => None,
                            Reference::Null => Some(Value::Null),
                            Reference::Key(key) => Some(Value::Int(key)),
                            Reference::Unresolved => {
                                return Err(Error::RelatedObjectNotFound {
                                    entity: ty.table(),
                                    attribute: attribute.name().to_string(),
                                    matches: 0,
                                });
                            }
                        }
                    }
                    (_, Some(Accessor::Many(_)) | None) => None,
                };

                if let Some(value) = value {
                    values.push((column, value));
                }
            }

            let key = match ty.identity_of(&*object)? {
                Some(key) if mode.update => {
                    self.update_row(&mut *connection, ty, key, &values).await?;
                    key
                }
                _ => {
                    let key = self.insert_row(&mut *connection, ty, &values).await?;
                    ty.set_identity(&mut *object, key)?;
                    key
                }
            };

            for attribute in ty.attributes() {
                let (Descriptor::ToMany { target, backref, .. }, Some(Accessor::Many(access))) =
                    (attribute.descriptor(), attribute.accessor())
                else {
                    continue;
                };

                let target = self.schema.get(*target)?;
                let (backref_index, backref_attribute) = target.require(backref)?;
                let filters = Filters::new().with(ty.identity_attribute().name(), key);

                for child in access.children_mut(&mut *object)? {
                    if let Some(Accessor::One(reference)) = backref_attribute.accessor() {
                        reference.refer(&mut *child, key, filters.clone())?;
                    }

                    if mode.cascading {
                        self.write_object(
                            &mut *connection,
                            target,
                            child,
                            Some((backref_index, key)),
                            mode,
                        )
                        .await?;
                    }
                }
            }

            Ok(key)
        }
        .boxed()
    }

    async fn insert_row(
        &self,
        connection: &mut AnyConnection,
        ty: &EntityType,
        values: &[(&str, Value)],
    ) -> Result<i64> {
        let mut builder = QueryBuilder::new("INSERT INTO ");
        builder.push(quote(ty.table()));

        if values.is_empty() {
            builder.push(match self.dialect {
                Dialect::MySql => " () VALUES ()",
                Dialect::Postgres | Dialect::Sqlite => " DEFAULT VALUES",
            });
        } else {
            builder.push(" ");
            values
                .iter()
                .map(|(column, _)| quote(column))
                .collect::<Vec<_>>()
                .push_to(&mut builder);
            builder.push(" VALUES ");
            values
                .iter()
                .map(|(_, value)| value)
                .collect::<Vec<_>>()
                .push_to(&mut builder);
        }

        if self.dialect.supports_returning() {
            builder.push(" RETURNING ");
            builder.push(quote(ty.identity_column()));

            debug!(sql = builder.sql(), "insert");

            let row = builder.build().fetch_one(&mut *connection).await?;
            Ok(row.try_get::<i64, _>(0)?)
        } else {
            debug!(sql = builder.sql(), "insert");

            let result = builder.build().execute(&mut *connection).await?;
            result.last_insert_id().ok_or_else(|| Error::Decode {
                column: format!("{}.{}", ty.table(), ty.identity_column()),
                reason: "the driver returned no generated identity".to_string(),
            })
        }
    }

    async fn update_row(
        &self,
        connection: &mut AnyConnection,
        ty: &EntityType,
        key: i64,
        values: &[(&str, Value)],
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::new("UPDATE ");
        builder.push(quote(ty.table()));
        builder.push(" SET ");

        values.iter().enumerate().for_each(|(i, (column, value))| {
            if i > 0 {
                builder.push(", ");
            }
            BinaryExpr::new(ColumnName::new(*column), value, BinaryExprOperand::Equals)
                .push_to(&mut builder);
        });

        builder.push(" WHERE ");
        BinaryExpr::new(
            ColumnName::new(ty.identity_column()),
            Value::Int(key),
            BinaryExprOperand::Equals,
        )
        .push_to(&mut builder);

        debug!(sql = builder.sql(), "update");

        let result = builder.build().execute(&mut *connection).await?;

        // MySQL only counts rows whose values changed.
        if result.rows_affected() == 0 && self.dialect != Dialect::MySql {
            return Err(Error::NotFound {
                entity: ty.table(),
                found: 0,
            });
        }

        Ok(())
    }

    /// Delete every `T` row matching `filters`, together with the rows reached through
    /// cascading relations, in one transaction.
    ///
    /// Cascading to-many dependents are deleted before the matched rows, cascading to-one targets
    /// after them.
    ///
    /// Returns whether at least one `T` row was removed.
    ///
    /// # Errors
    ///
    /// See [`pickup`](Self::pickup) for filter errors. The transaction is rolled back on any
    /// failure.
    pub async fn drop<T: Entity>(&self, filters: &Filters) -> Result<bool> {
        let ty = self.schema.entity::<T>()?;
        let mut tx = self.pool.begin().await?;

        match self.drop_rows(&mut tx, ty, filters).await {
            Ok(removed) => {
                tx.commit().await?;
                info!(table = T::TABLE, removed, "dropped");
                Ok(removed > 0)
            }
            Err(e) => {
                warn!(table = T::TABLE, error = %e, "rolling back drop");
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    fn drop_rows<'a>(
        &'a self,
        connection: &'a mut AnyConnection,
        ty: &'a EntityType,
        filters: &'a Filters,
    ) -> BoxFuture<'a, Result<u64>> {
        async move {
            let filters = self.resolve_objects(&mut *connection, ty, filters).await?;
            let (keys, graph) = self.select_keys(&mut *connection, ty, &filters).await?;

            if keys.is_empty() {
                return Ok(0);
            }

            let mut dependents = vec![];
            let mut targets = vec![];

            for (index, attribute) in ty.attributes().iter().enumerate() {
                if !attribute.descriptor().cascades() {
                    continue;
                }

                match attribute.descriptor() {
                    Descriptor::ToMany {
                        target, backref, ..
                    } => {
                        let target = self.schema.get(*target)?;
                        dependents.extend(
                            keys.iter()
                                .map(|e| (target, Filters::new().with(*backref, *e))),
                        );
                    }
                    Descriptor::ToOne { target, .. } => {
                        let target = self.schema.get(*target)?;
                        targets.extend(graph.roots().iter().filter_map(|e| {
                            graph.foreign_key(*e, index).map(|foreign| {
                                (
                                    target,
                                    Filters::new()
                                        .with(target.identity_attribute().name(), foreign),
                                )
                            })
                        }));
                    }
                    Descriptor::Column { .. } | Descriptor::LazyAttribute { .. } => {}
                }
            }

            for (target, filters) in &dependents {
                self.drop_rows(&mut *connection, target, filters).await?;
            }

            let mut builder = QueryBuilder::new("DELETE FROM ");
            builder.push(quote(ty.table()));
            builder.push(" WHERE ");
            BinaryExpr::new(
                ColumnName::new(ty.identity_column()),
                keys.iter().map(|e| Value::Int(*e)).collect::<Vec<_>>(),
                BinaryExprOperand::In,
            )
            .push_to(&mut builder);

            debug!(sql = builder.sql(), "delete");

            let removed = builder.build().execute(&mut *connection).await?.rows_affected();

            for (target, filters) in &targets {
                self.drop_rows(&mut *connection, target, filters).await?;
            }

            Ok(removed)
        }
        .boxed()
    }
}
