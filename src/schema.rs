//! The registration pass: collects every entity's attribute table and injects the
//! backreferences declared by to-many relations.

use std::{any::TypeId, collections::HashMap};

use itertools::Itertools;

use crate::{
    config::Dialect,
    entity::{
        Declaration, Entity, EntityRef, Object,
        access::Accessor,
        column::{Attribute, Descriptor, backref_column},
        relation::RelationOptions,
    },
    error::{Error, Result},
    query::quote,
    value::{ColumnType, Value},
};

/// The registered metadata of one entity type.
#[derive(Debug)]
pub struct EntityType {
    entity: EntityRef,
    table: &'static str,
    identity: usize,
    attributes: Vec<Attribute>,
}

impl EntityType {
    pub(crate) const fn new(
        entity: EntityRef,
        table: &'static str,
        identity: usize,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            entity,
            table,
            identity,
            attributes,
        }
    }

    #[must_use]
    pub const fn entity(&self) -> EntityRef {
        self.entity
    }

    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Every attribute in declaration order, injected backreferences last.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute and its position by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<(usize, &Attribute)> {
        self.attributes.iter().find_position(|e| e.name() == name)
    }

    pub(crate) fn require(&self, name: &str) -> Result<(usize, &Attribute)> {
        self.attribute(name)
            .ok_or_else(|| Error::unknown_attribute(self.table, name))
    }

    #[must_use]
    pub fn identity_attribute(&self) -> &Attribute {
        &self.attributes[self.identity]
    }

    #[must_use]
    pub fn identity_column(&self) -> &str {
        self.identity_attribute().descriptor().column().unwrap_or_default()
    }

    pub(crate) const fn identity_index(&self) -> usize {
        self.identity
    }

    /// The stored identity of `object`, `None` if it has not been inserted yet.
    pub(crate) fn identity_of(&self, object: &Object) -> Result<Option<i64>> {
        let Some(Accessor::Scalar(access)) = self.identity_attribute().accessor() else {
            return Err(Error::Schema(format!(
                "identity of `{}` has no field",
                self.table
            )));
        };

        match access.get(object)? {
            Value::Null => Ok(None),
            Value::Int(e) => Ok(Some(e)),
            _ => Err(Error::Decode {
                column: format!("{}.{}", self.table, self.identity_column()),
                reason: "identity is not an integer".to_string(),
            }),
        }
    }

    pub(crate) fn set_identity(&self, object: &mut Object, key: i64) -> Result<()> {
        let Some(Accessor::Scalar(access)) = self.identity_attribute().accessor() else {
            return Err(Error::Schema(format!(
                "identity of `{}` has no field",
                self.table
            )));
        };

        access.set(object, Value::Int(key))
    }

    /// Render the `CREATE TABLE` statement for this type.
    ///
    /// Foreign-key columns are plain integer columns: referential integrity is maintained by the
    /// write path, so that a non-cascading drop may leave dependents behind.
    #[must_use]
    pub fn create_table(&self, dialect: Dialect) -> String {
        let columns = self
            .attributes
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let column = e.descriptor().column()?;

                let definition = if i == self.identity {
                    dialect.identity_definition().to_string()
                } else {
                    match e.descriptor() {
                        Descriptor::Column {
                            column_type,
                            nullable,
                            unique,
                            ..
                        } => {
                            let mut definition = dialect.type_name(*column_type).to_string();
                            if !nullable {
                                definition.push_str(" NOT NULL");
                            }
                            if *unique {
                                definition.push_str(" UNIQUE");
                            }
                            definition
                        }
                        Descriptor::LazyAttribute {
                            column_type,
                            nullable,
                            ..
                        } => {
                            let mut definition = dialect.type_name(*column_type).to_string();
                            if !nullable {
                                definition.push_str(" NOT NULL");
                            }
                            definition
                        }
                        Descriptor::ToOne { .. } => dialect.type_name(ColumnType::Integer).to_string(),
                        Descriptor::ToMany { .. } => return None,
                    }
                };

                Some(format!("{} {definition}", quote(column)))
            })
            .join(", ");

        format!("CREATE TABLE IF NOT EXISTS {} ({columns})", quote(self.table))
    }
}

/// The immutable metadata of every registered entity type.
#[derive(Debug)]
pub struct Schema {
    types: Vec<EntityType>,
    index: HashMap<TypeId, usize>,
}

impl Schema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The metadata of `T`.
    ///
    /// # Errors
    ///
    /// If `T` was never registered.
    pub fn entity<T: Entity>(&self) -> Result<&EntityType> {
        self.get(EntityRef::of::<T>())
    }

    /// # Errors
    ///
    /// If `entity` was never registered.
    pub fn get(&self, entity: EntityRef) -> Result<&EntityType> {
        self.index
            .get(&entity.id())
            .map(|e| &self.types[*e])
            .ok_or(Error::UnregisteredType(entity.name()))
    }

    /// Every registered type, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &EntityType> {
        self.types.iter()
    }
}

/// Collects entity declarations; [`build`](Self::build) validates them and injects
/// backreferences.
#[derive(Default)]
pub struct SchemaBuilder {
    declared: Vec<Result<EntityType>>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn register<E: Entity>(mut self) -> Self {
        let mut declaration = Declaration::<E>::new();
        E::declare(&mut declaration);
        self.declared.push(declaration.finish());
        self
    }

    /// Finish registration.
    ///
    /// # Errors
    ///
    /// If a declaration is inconsistent, a type or table is registered twice, a relation targets
    /// an unregistered type, or a declared backreference does not match the to-many relation
    /// that injects it.
    pub fn build(self) -> Result<Schema> {
        let mut types = self.declared.into_iter().collect::<Result<Vec<_>>>()?;
        let mut index = HashMap::new();

        for (i, ty) in types.iter().enumerate() {
            if index.insert(ty.entity.id(), i).is_some() {
                return Err(Error::Schema(format!(
                    "`{}` is registered twice",
                    ty.entity.name()
                )));
            }
        }

        if let Some(table) = types.iter().map(|e| e.table).duplicates().next() {
            return Err(Error::Schema(format!(
                "table `{table}` is mapped by more than one type"
            )));
        }

        let mut backrefs = vec![];

        for ty in &types {
            for attribute in &ty.attributes {
                match attribute.descriptor() {
                    Descriptor::ToOne { target, .. } => {
                        if !index.contains_key(&target.id()) {
                            return Err(Error::UnregisteredType(target.name()));
                        }
                    }
                    Descriptor::ToMany {
                        target, backref, ..
                    } => {
                        let Some(target) = index.get(&target.id()) else {
                            return Err(Error::UnregisteredType(target.name()));
                        };
                        backrefs.push((*target, *backref, ty.entity));
                    }
                    Descriptor::Column { .. } | Descriptor::LazyAttribute { .. } => {}
                }
            }
        }

        for (target, backref, source) in backrefs {
            let ty = &mut types[target];
            let column = backref_column(backref);

            match ty.attribute(backref).map(|(_, e)| e.descriptor()) {
                Some(Descriptor::ToOne {
                    target,
                    column: declared,
                    ..
                }) if *target == source && *declared == column => {}
                Some(_) => {
                    return Err(Error::Schema(format!(
                        "`{}.{backref}` must be a to-one relation to `{}` over column `{column}`",
                        ty.table,
                        source.name()
                    )));
                }
                None => {
                    if ty
                        .attributes
                        .iter()
                        .any(|e| e.descriptor().column() == Some(column.as_str()))
                    {
                        return Err(Error::Schema(format!(
                            "backreference column `{}.{column}` is already mapped",
                            ty.table
                        )));
                    }

                    ty.attributes.push(Attribute {
                        name: backref,
                        descriptor: Descriptor::ToOne {
                            target: source,
                            column,
                            options: RelationOptions::lazy(),
                        },
                        accessor: None,
                    });
                }
            }
        }

        Ok(Schema { types, index })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::field::{Related, RelatedMany};

    #[derive(Default)]
    struct Shelf {
        id: Option<i64>,
        label: String,
        books: RelatedMany<Book>,
    }

    #[derive(Default)]
    struct Book {
        id: Option<i64>,
        title: String,
    }

    #[derive(Default)]
    struct Note {
        id: Option<i64>,
        shelf: Related<Shelf>,
    }

    impl Entity for Shelf {
        const TABLE: &'static str = "shelf";

        fn declare(declaration: &mut Declaration<Self>) {
            declaration
                .identity("id", "id", |e| &e.id, |e| &mut e.id)
                .unique_column("label", "label", |e| &e.label, |e| &mut e.label)
                .to_many(
                    "books",
                    "shelf",
                    RelationOptions::lazy(),
                    |e| &e.books,
                    |e| &mut e.books,
                );
        }
    }

    impl Entity for Book {
        const TABLE: &'static str = "book";

        fn declare(declaration: &mut Declaration<Self>) {
            declaration
                .identity("id", "id", |e| &e.id, |e| &mut e.id)
                .column("title", "title", |e| &e.title, |e| &mut e.title);
        }
    }

    impl Entity for Note {
        const TABLE: &'static str = "book";

        fn declare(declaration: &mut Declaration<Self>) {
            declaration
                .identity("id", "id", |e| &e.id, |e| &mut e.id)
                .to_one(
                    "shelf",
                    "shelf_id",
                    RelationOptions::eager(),
                    |e| &e.shelf,
                    |e| &mut e.shelf,
                );
        }
    }

    #[test]
    fn to_many_injects_shadow_backreference() {
        let schema = Schema::builder()
            .register::<Shelf>()
            .register::<Book>()
            .build()
            .unwrap();

        let book = schema.entity::<Book>().unwrap();
        let (index, attribute) = book.attribute("shelf").unwrap();

        assert_eq!(index, 2);
        assert!(attribute.is_shadow());
        assert_eq!(
            attribute.descriptor(),
            &Descriptor::ToOne {
                target: EntityRef::of::<Shelf>(),
                column: "shelf_id".to_string(),
                options: RelationOptions::lazy(),
            }
        );
    }

    #[test]
    fn unregistered_targets_are_rejected() {
        let result = Schema::builder().register::<Shelf>().build();

        assert!(matches!(result, Err(Error::UnregisteredType(_))));
    }

    #[test]
    fn tables_are_mapped_once() {
        let result = Schema::builder()
            .register::<Shelf>()
            .register::<Book>()
            .register::<Note>()
            .build();

        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn ddl_lists_local_columns() {
        let schema = Schema::builder()
            .register::<Shelf>()
            .register::<Book>()
            .build()
            .unwrap();

        assert_eq!(
            schema.entity::<Shelf>().unwrap().create_table(Dialect::Sqlite),
            r#"CREATE TABLE IF NOT EXISTS "shelf" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "label" TEXT NOT NULL UNIQUE)"#
        );
        assert_eq!(
            schema.entity::<Book>().unwrap().create_table(Dialect::Sqlite),
            r#"CREATE TABLE IF NOT EXISTS "book" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "title" TEXT NOT NULL, "shelf_id" INTEGER)"#
        );
    }
}
