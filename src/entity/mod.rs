pub(crate) mod access;
pub mod column;
pub mod field;
pub mod proxy;
pub mod relation;

use std::{
    any::{Any, TypeId, type_name},
    marker::PhantomData,
};

use access::{Accessor, LazyField, ManyField, OneField, ScalarField};
use column::{Attribute, Descriptor};
use field::{Lazy, Related, RelatedMany};
use relation::RelationOptions;

use crate::{
    error::{Error, Result},
    schema::EntityType,
    value::{ColumnType, SqlValue},
};

/// A type-erased entity instance.
pub(crate) type Object = dyn Any + Send + Sync;

pub(crate) fn cast<E: Entity>(object: &Object) -> Result<&E> {
    object
        .downcast_ref::<E>()
        .ok_or(Error::UnregisteredType(type_name::<E>()))
}

pub(crate) fn cast_mut<E: Entity>(object: &mut Object) -> Result<&mut E> {
    object
        .downcast_mut::<E>()
        .ok_or(Error::UnregisteredType(type_name::<E>()))
}

/// A domain type persisted by [`DbStorage`](crate::DbStorage).
///
/// Usually implemented through `#[derive(Entity)]`.
pub trait Entity: Default + Send + Sync + 'static {
    /// The name of this entity's table in the database.
    const TABLE: &'static str;

    /// Declare the identity and every persisted attribute, in column order.
    fn declare(declaration: &mut Declaration<Self>);
}

/// A handle naming a registered entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    id: TypeId,
    name: &'static str,
}

impl EntityRef {
    #[must_use]
    pub fn of<E: Entity>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
        }
    }

    pub(crate) const fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Collects the attribute table of an entity type `E`.
///
/// Each attribute is registered with a pair of field accessors, which are type-erased once here
/// so that the planner, materializer and write path never need to know `E`.
pub struct Declaration<E: Entity> {
    identities: Vec<usize>,
    attributes: Vec<Attribute>,
    marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Declaration<E> {
    pub(crate) const fn new() -> Self {
        Self {
            identities: vec![],
            attributes: vec![],
            marker: PhantomData,
        }
    }

    fn push(&mut self, name: &'static str, descriptor: Descriptor, accessor: Accessor) -> &mut Self {
        self.attributes.push(Attribute {
            name,
            descriptor,
            accessor: Some(accessor),
        });
        self
    }

    /// Declare the integer identity, `None` until the instance is first stored.
    pub fn identity(
        &mut self,
        name: &'static str,
        column: &str,
        get: fn(&E) -> &Option<i64>,
        get_mut: fn(&mut E) -> &mut Option<i64>,
    ) -> &mut Self {
        self.identities.push(self.attributes.len());
        self.push(
            name,
            Descriptor::Column {
                column: column.to_string(),
                column_type: ColumnType::Integer,
                nullable: false,
                unique: true,
            },
            Accessor::Scalar(Box::new(ScalarField::new(name, get, get_mut))),
        )
    }

    pub fn column<V: SqlValue>(
        &mut self,
        name: &'static str,
        column: &str,
        get: fn(&E) -> &V,
        get_mut: fn(&mut E) -> &mut V,
    ) -> &mut Self {
        self.scalar(name, column, false, get, get_mut)
    }

    /// Like [`column`](Self::column), with a uniqueness constraint in the emitted DDL.
    pub fn unique_column<V: SqlValue>(
        &mut self,
        name: &'static str,
        column: &str,
        get: fn(&E) -> &V,
        get_mut: fn(&mut E) -> &mut V,
    ) -> &mut Self {
        self.scalar(name, column, true, get, get_mut)
    }

    fn scalar<V: SqlValue>(
        &mut self,
        name: &'static str,
        column: &str,
        unique: bool,
        get: fn(&E) -> &V,
        get_mut: fn(&mut E) -> &mut V,
    ) -> &mut Self {
        self.push(
            name,
            Descriptor::Column {
                column: column.to_string(),
                column_type: V::COLUMN_TYPE,
                nullable: V::NULLABLE,
                unique,
            },
            Accessor::Scalar(Box::new(ScalarField::new(name, get, get_mut))),
        )
    }

    /// A relation whose foreign key `column` lives in this entity's table.
    pub fn to_one<T: Entity>(
        &mut self,
        name: &'static str,
        column: &str,
        options: RelationOptions,
        get: fn(&E) -> &Related<T>,
        get_mut: fn(&mut E) -> &mut Related<T>,
    ) -> &mut Self {
        self.push(
            name,
            Descriptor::ToOne {
                target: EntityRef::of::<T>(),
                column: column.to_string(),
                options,
            },
            Accessor::One(Box::new(OneField::new(get, get_mut))),
        )
    }

    /// A relation whose rows carry a `<backref>_id` column pointing back at this entity.
    pub fn to_many<T: Entity>(
        &mut self,
        name: &'static str,
        backref: &'static str,
        options: RelationOptions,
        get: fn(&E) -> &RelatedMany<T>,
        get_mut: fn(&mut E) -> &mut RelatedMany<T>,
    ) -> &mut Self {
        self.push(
            name,
            Descriptor::ToMany {
                target: EntityRef::of::<T>(),
                backref,
                options,
            },
            Accessor::Many(Box::new(ManyField::new(get, get_mut))),
        )
    }

    /// A scalar column fetched on first access.
    pub fn lazy<V: SqlValue>(
        &mut self,
        name: &'static str,
        column: &str,
        get: fn(&E) -> &Lazy<V>,
        get_mut: fn(&mut E) -> &mut Lazy<V>,
    ) -> &mut Self {
        self.push(
            name,
            Descriptor::LazyAttribute {
                column: column.to_string(),
                column_type: V::COLUMN_TYPE,
                nullable: V::NULLABLE,
            },
            Accessor::Lazy(Box::new(LazyField::new(get, get_mut))),
        )
    }

    pub(crate) fn finish(self) -> Result<EntityType> {
        let entity = EntityRef::of::<E>();

        let identity = match self.identities.as_slice() {
            [identity] => *identity,
            [] => {
                return Err(Error::Schema(format!(
                    "`{}` does not declare an identity",
                    entity.name()
                )));
            }
            _ => {
                return Err(Error::Schema(format!(
                    "`{}` declares more than one identity",
                    entity.name()
                )));
            }
        };

        for (i, attribute) in self.attributes.iter().enumerate() {
            let rest = &self.attributes[i + 1..];

            if rest.iter().any(|e| e.name == attribute.name) {
                return Err(Error::Schema(format!(
                    "`{}` declares attribute `{}` twice",
                    entity.name(),
                    attribute.name
                )));
            }

            if let Some(column) = attribute.descriptor.column() {
                if rest.iter().any(|e| e.descriptor.column() == Some(column)) {
                    return Err(Error::Schema(format!(
                        "`{}` maps column `{column}` twice",
                        entity.name()
                    )));
                }
            }
        }

        Ok(EntityType::new(entity, E::TABLE, identity, self.attributes))
    }
}
