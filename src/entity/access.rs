//! Type-erased field accessors, built once per attribute at registration time.

use std::any::type_name;

use super::{
    Entity, Object, cast, cast_mut,
    field::{Lazy, Related, RelatedMany},
    proxy::{CollectionProxy, ObjectProxy, ScalarProxy},
};
use crate::{
    error::{Error, Result},
    query::{
        filter::Filters,
        materialize::{Graph, Slot},
    },
    schema::Schema,
    value::{SqlValue, Value},
};

pub(crate) enum Accessor {
    Scalar(Box<dyn ScalarAccess>),
    One(Box<dyn OneAccess>),
    Many(Box<dyn ManyAccess>),
    Lazy(Box<dyn LazyAccess>),
}

impl Accessor {
    /// Write one materialized slot into the field this accessor reaches.
    pub(crate) fn assign(&self, object: &mut Object, slot: &Slot, graph: &Graph<'_>) -> Result<()> {
        match self {
            Self::Scalar(access) => match slot {
                Slot::Value(value) => access.set(object, value.clone()),
                _ => Err(Error::Schema(
                    "a scalar attribute received relation data".to_string(),
                )),
            },
            Self::One(access) => access.assign(object, slot, graph),
            Self::Many(access) => access.assign(object, slot, graph),
            Self::Lazy(access) => access.assign(object, slot),
        }
    }
}

fn mismatch<E>(expected: &str) -> Error {
    Error::Schema(format!(
        "`{}` expected {expected} while materializing",
        type_name::<E>()
    ))
}

/// What a to-one field contributes to an insert or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reference {
    /// Leave the column out of the statement.
    Skip,
    /// Write `NULL`.
    Null,
    Key(i64),
    /// The related instance has not been stored yet.
    Unresolved,
}

pub(crate) trait ScalarAccess: Send + Sync {
    fn get(&self, object: &Object) -> Result<Value>;

    fn set(&self, object: &mut Object, value: Value) -> Result<()>;
}

pub(crate) struct ScalarField<E, V> {
    name: &'static str,
    get: fn(&E) -> &V,
    get_mut: fn(&mut E) -> &mut V,
}

impl<E, V> ScalarField<E, V> {
    pub(crate) const fn new(
        name: &'static str,
        get: fn(&E) -> &V,
        get_mut: fn(&mut E) -> &mut V,
    ) -> Self {
        Self { name, get, get_mut }
    }
}

impl<E, V> ScalarAccess for ScalarField<E, V>
where
    E: Entity,
    V: SqlValue,
{
    fn get(&self, object: &Object) -> Result<Value> {
        Ok((self.get)(cast::<E>(object)?).to_value())
    }

    fn set(&self, object: &mut Object, value: Value) -> Result<()> {
        let decoded = V::from_value(value).ok_or_else(|| Error::Decode {
            column: format!("{}.{}", E::TABLE, self.name),
            reason: format!("expected a {} value", V::COLUMN_TYPE),
        })?;
        *(self.get_mut)(cast_mut::<E>(object)?) = decoded;
        Ok(())
    }
}

pub(crate) trait OneAccess: Send + Sync {
    fn reference(&self, schema: &Schema, object: &Object) -> Result<Reference>;

    /// The related instance, if one is attached.
    fn loaded_mut<'a>(&self, object: &'a mut Object) -> Result<Option<&'a mut Object>>;

    fn assign(&self, object: &mut Object, slot: &Slot, graph: &Graph<'_>) -> Result<()>;

    /// Point the field at the row identified by `key`, leaving it to be resolved lazily.
    fn refer(&self, object: &mut Object, key: i64, filters: Filters) -> Result<()>;
}

pub(crate) struct OneField<E, T> {
    get: fn(&E) -> &Related<T>,
    get_mut: fn(&mut E) -> &mut Related<T>,
}

impl<E, T> OneField<E, T> {
    pub(crate) const fn new(
        get: fn(&E) -> &Related<T>,
        get_mut: fn(&mut E) -> &mut Related<T>,
    ) -> Self {
        Self { get, get_mut }
    }
}

impl<E, T> OneAccess for OneField<E, T>
where
    E: Entity,
    T: Entity,
{
    fn reference(&self, schema: &Schema, object: &Object) -> Result<Reference> {
        Ok(match (self.get)(cast::<E>(object)?) {
            Related::Unset => Reference::Skip,
            Related::Null => Reference::Null,
            Related::Deferred(proxy) => Reference::Key(proxy.key()),
            Related::Loaded(target) => match schema.entity::<T>()?.identity_of(&**target)? {
                Some(key) => Reference::Key(key),
                None => Reference::Unresolved,
            },
        })
    }

    fn loaded_mut<'a>(&self, object: &'a mut Object) -> Result<Option<&'a mut Object>> {
        Ok(match (self.get_mut)(cast_mut::<E>(object)?) {
            Related::Loaded(target) => Some(&mut **target as &mut Object),
            _ => None,
        })
    }

    fn assign(&self, object: &mut Object, slot: &Slot, graph: &Graph<'_>) -> Result<()> {
        let value = match slot {
            Slot::Null => Related::Null,
            Slot::One { index, .. } => Related::Loaded(Box::new(graph.build::<T>(*index)?)),
            Slot::Reference { key, filters } => {
                Related::Deferred(ObjectProxy::new(*key, filters.clone()))
            }
            _ => return Err(mismatch::<E>("a to-one reference")),
        };
        *(self.get_mut)(cast_mut::<E>(object)?) = value;
        Ok(())
    }

    fn refer(&self, object: &mut Object, key: i64, filters: Filters) -> Result<()> {
        *(self.get_mut)(cast_mut::<E>(object)?) = Related::Deferred(ObjectProxy::new(key, filters));
        Ok(())
    }
}

pub(crate) trait ManyAccess: Send + Sync {
    /// The attached child instances, empty unless the collection is loaded.
    fn children_mut<'a>(&self, object: &'a mut Object) -> Result<Vec<&'a mut Object>>;

    fn assign(&self, object: &mut Object, slot: &Slot, graph: &Graph<'_>) -> Result<()>;
}

pub(crate) struct ManyField<E, T> {
    get: fn(&E) -> &RelatedMany<T>,
    get_mut: fn(&mut E) -> &mut RelatedMany<T>,
}

impl<E, T> ManyField<E, T> {
    pub(crate) const fn new(
        get: fn(&E) -> &RelatedMany<T>,
        get_mut: fn(&mut E) -> &mut RelatedMany<T>,
    ) -> Self {
        Self { get, get_mut }
    }
}

impl<E, T> ManyAccess for ManyField<E, T>
where
    E: Entity,
    T: Entity,
{
    fn children_mut<'a>(&self, object: &'a mut Object) -> Result<Vec<&'a mut Object>> {
        Ok(match (self.get_mut)(cast_mut::<E>(object)?) {
            RelatedMany::Loaded(children) => children
                .iter_mut()
                .map(|e| -> &mut Object { e })
                .collect(),
            RelatedMany::Unset | RelatedMany::Deferred(_) => vec![],
        })
    }

    fn assign(&self, object: &mut Object, slot: &Slot, graph: &Graph<'_>) -> Result<()> {
        let value = match slot {
            Slot::Many(indices) => RelatedMany::Loaded(
                indices
                    .iter()
                    .map(|e| graph.build::<T>(*e))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Slot::Collection(filters) => RelatedMany::Deferred(CollectionProxy::new(filters.clone())),
            _ => return Err(mismatch::<E>("a to-many collection")),
        };
        *(self.get_mut)(cast_mut::<E>(object)?) = value;
        Ok(())
    }
}

pub(crate) trait LazyAccess: Send + Sync {
    /// The loaded value, or `None` while the attribute is unresolved.
    fn get(&self, object: &Object) -> Result<Option<Value>>;

    fn assign(&self, object: &mut Object, slot: &Slot) -> Result<()>;
}

pub(crate) struct LazyField<E, V> {
    get: fn(&E) -> &Lazy<V>,
    get_mut: fn(&mut E) -> &mut Lazy<V>,
}

impl<E, V> LazyField<E, V> {
    pub(crate) const fn new(get: fn(&E) -> &Lazy<V>, get_mut: fn(&mut E) -> &mut Lazy<V>) -> Self {
        Self { get, get_mut }
    }
}

impl<E, V> LazyAccess for LazyField<E, V>
where
    E: Entity,
    V: SqlValue,
{
    fn get(&self, object: &Object) -> Result<Option<Value>> {
        Ok((self.get)(cast::<E>(object)?).get().map(SqlValue::to_value))
    }

    fn assign(&self, object: &mut Object, slot: &Slot) -> Result<()> {
        let Slot::Scalar(key) = slot else {
            return Err(mismatch::<E>("a lazy scalar"));
        };
        *(self.get_mut)(cast_mut::<E>(object)?) = Lazy::Deferred(ScalarProxy::new(key.clone()));
        Ok(())
    }
}
